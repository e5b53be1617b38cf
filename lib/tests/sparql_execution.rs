use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::vocab::rdf;
use oxigraph::model::*;
use oxigraph::store::Store;
use shacl_sparql::named_nodes::entailment;
use shacl_sparql::*;
use std::sync::Arc;

mod common;

const DATA: &str = r#"
@prefix ex: <http://example.com/ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

ex:Student rdfs:subClassOf ex:Person .

ex:alice a ex:Student ;
    rdfs:label "Alice" ;
    ex:age -1 .

ex:bob a ex:Person ;
    ex:age 42 .

ex:carol a ex:Person ;
    ex:age 150 .
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ex(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/ns#{local}"))
}

fn load_store() -> Store {
    let store = Store::new().unwrap();
    store
        .load_from_reader(RdfFormat::Turtle, DATA.as_bytes())
        .unwrap();
    store
}

fn parse_graph(turtle: &str) -> Graph {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(RdfFormat::Turtle).for_slice(turtle.as_bytes()) {
        graph.insert(&Triple::from(quad.unwrap()));
    }
    graph
}

fn config() -> ExecutionConfig {
    ExecutionConfig::default().with_prefix("ex", "http://example.com/ns#")
}

fn sorted_roots(results: &ValidationResults) -> Vec<Term> {
    let mut roots: Vec<Term> = results
        .violations()
        .into_iter()
        .filter_map(|violation| violation.root)
        .collect();
    roots.sort_by_key(|term| term.to_string());
    roots
}

/// Conformance to a "shape" means being typed with it.
struct TypeMembership {
    store: Store,
}

impl ShapeMembership for TypeMembership {
    fn has_shape(&self, focus: &Term, shape: &Term, _shapes_graph: Option<&Term>) -> Option<bool> {
        let subject: NamedOrBlankNodeRef<'_> = match focus {
            Term::NamedNode(nn) => nn.as_ref().into(),
            Term::BlankNode(bn) => bn.as_ref().into(),
            _ => return Some(false),
        };
        let found = self
            .store
            .quads_for_pattern(Some(subject), Some(rdf::TYPE), Some(shape.as_ref()), None)
            .next()
            .is_some();
        Some(found)
    }
}

#[test]
#[ntest::timeout(10000)]
fn native_constraint_on_a_focus_node() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let labels = StoreLabels::new(store.clone());
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &labels).with_config(config());

    let mut constraint = Constraint::new(ex("NonNegativeAge"))
        .with_sparql("SELECT $this ?value WHERE { $this ex:age ?value . FILTER(?value < 0) }")
        .with_message(Literal::new_simple_literal("{?this} has negative age {?value}"));
    constraint.predicate = Some(ex("age"));
    let shape = Shape::new(ex("PersonShape"));
    let results = ValidationResults::new();

    for focus in ["alice", "bob"] {
        let outcome = language
            .execute(
                &constraint.executable(),
                &shape,
                &ex("shapes").into(),
                &FocusTarget::Node(ex(focus).into()),
                &store,
                &results,
            )
            .unwrap();
        let expected = if focus == "alice" { 1 } else { 0 };
        assert_eq!(outcome, ExecutionOutcome::Executed { violations: expected });
    }

    let expected = parse_graph(
        r#"
        @prefix ex: <http://example.com/ns#> .
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        [] a sh:Error ;
            sh:source ex:NonNegativeAge ;
            sh:message "Alice has negative age -1" ;
            sh:predicate ex:age ;
            sh:root ex:alice .
        "#,
    );
    assert!(common::same_results(&results.to_graph(), &expected));
}

#[test]
#[ntest::timeout(10000)]
fn template_defaults_apply_across_all_nodes() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let statistics = StatisticsCollector::new(true);
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels)
        .with_config(config())
        .with_statistics(&statistics);

    let mut template = Template::new(ex("AgeRange"))
        .with_sparql(
            "SELECT ?this ?value WHERE { ?this ex:age ?value . FILTER(?value < ?min || ?value > ?max) }",
        )
        .with_argument(Argument::new(ex("min")).unwrap().default_value(Literal::from(0)))
        .with_argument(Argument::new(ex("max")).unwrap())
        .with_message(Literal::new_simple_literal("Age {?value} outside {?min}..{?max}"));
    template.label = Some("Age range".to_string());
    let constraint = Constraint::new(ex("ageRange"))
        .with_template(Arc::new(template))
        .with_value(ex("max"), Literal::from(120));
    let shape = Shape::new(ex("PersonShape"));
    let results = ValidationResults::new();

    let outcome = language
        .execute(
            &constraint.executable(),
            &shape,
            &ex("shapes").into(),
            &FocusTarget::Unbound,
            &store,
            &results,
        )
        .unwrap();
    assert_eq!(outcome, ExecutionOutcome::Executed { violations: 2 });
    assert_eq!(sorted_roots(&results), vec![Term::from(ex("alice")), Term::from(ex("carol"))]);

    let mut messages: Vec<String> = results
        .violations()
        .iter()
        .flat_map(|violation| violation.message_texts().into_iter().map(str::to_string))
        .collect();
    messages.sort();
    // ?min and ?max are not projected, so they are not in the row
    assert_eq!(messages, vec!["Age -1 outside ..", "Age 150 outside .."]);

    let entries = statistics.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "Age range (2 violations)");
    assert!(entries[0].query.contains("- ?max: "));
    assert_eq!(entries[0].context, Term::from(ex("AgeRange")));
}

#[test]
#[ntest::timeout(10000)]
fn rdfs_entailment_exposes_subclass_instances() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels).with_config(config());
    let shape = Shape::new(ex("PersonShape"));

    let plain = Constraint::new(ex("people")).with_sparql("SELECT ?this WHERE { ?this a ex:Person }");
    let mut entailed = plain.clone();
    entailed.entailment = Some(entailment::RDFS.into_owned());

    let plain_results = ValidationResults::new();
    let jobs = [ExecutionJob {
        constraint: &plain,
        shape: &shape,
        target: FocusTarget::Unbound,
    }];
    assert!(language
        .execute_all(&jobs, &ex("shapes").into(), &store, &plain_results)
        .is_empty());
    assert_eq!(plain_results.len(), 2);

    let entailed_results = ValidationResults::new();
    let jobs = [ExecutionJob {
        constraint: &entailed,
        shape: &shape,
        target: FocusTarget::Unbound,
    }];
    assert!(language
        .execute_all(&jobs, &ex("shapes").into(), &store, &entailed_results)
        .is_empty());
    assert_eq!(
        sorted_roots(&entailed_results),
        vec![
            Term::from(ex("alice")),
            Term::from(ex("bob")),
            Term::from(ex("carol"))
        ]
    );
}

#[test]
#[ntest::timeout(10000)]
fn rdfs_entailment_follows_subproperties_and_domains() {
    init_logging();
    let store = Store::new().unwrap();
    store
        .load_from_reader(
            RdfFormat::Turtle,
            r#"
            @prefix ex: <http://example.com/ns#> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            ex:hasMother rdfs:subPropertyOf ex:hasParent .
            ex:hasParent rdfs:domain ex:Person .
            ex:alice ex:hasMother ex:carol .
            "#
            .as_bytes(),
        )
        .unwrap();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels).with_config(config());
    let shape = Shape::new(ex("PersonShape"));

    for body in [
        "SELECT ?this WHERE { ?this ex:hasParent ?p }",
        "SELECT ?this WHERE { ?this a ex:Person }",
    ] {
        let mut constraint = Constraint::new(ex("parents")).with_sparql(body);
        constraint.entailment = Some(entailment::RDFS.into_owned());
        let results = ValidationResults::new();
        let outcome = language
            .execute(
                &constraint.executable(),
                &shape,
                &ex("shapes").into(),
                &FocusTarget::Unbound,
                &store,
                &results,
            )
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Executed { violations: 1 }, "{body}");
        assert_eq!(sorted_roots(&results), vec![Term::from(ex("alice"))]);
    }
}

#[test]
#[ntest::timeout(10000)]
fn unsupported_entailment_yields_a_fatal_error() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels).with_config(config());

    let mut constraint = Constraint::new(ex("owl")).with_sparql("SELECT ?this WHERE { ?this a ex:Person }");
    constraint.entailment = Some(NamedNode::new_unchecked(
        "http://www.w3.org/ns/entailment/OWL-RDF-Based",
    ));
    let shape = Shape::new(ex("PersonShape"));
    let results = ValidationResults::new();
    let jobs = [ExecutionJob {
        constraint: &constraint,
        shape: &shape,
        target: FocusTarget::Unbound,
    }];

    assert!(language
        .execute_all(&jobs, &ex("shapes").into(), &store, &results)
        .is_empty());
    let violations = results.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::FatalError);
    assert_eq!(violations[0].source, Term::from(ex("owl")));
    assert_eq!(
        violations[0].message_texts(),
        vec!["Unsupported SPARQL entailment http://www.w3.org/ns/entailment/OWL-RDF-Based"]
    );
}

#[test]
#[ntest::timeout(10000)]
fn scope_shapes_restrict_focus_nodes() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config())
        .with_shape_membership(Arc::new(TypeMembership { store: store.clone() }));
    let reasoner = RdfsEntailment::new();
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels).with_config(config());

    let constraint = Constraint::new(ex("aged"))
        .with_sparql("SELECT ?this WHERE { ?this ex:age ?value }")
        .with_scope_shape(ex("Student"));
    let shape = Shape::new(ex("PersonShape"));
    let results = ValidationResults::new();

    language
        .execute(
            &constraint.executable(),
            &shape,
            &ex("shapes").into(),
            &FocusTarget::Unbound,
            &store,
            &results,
        )
        .unwrap();
    assert_eq!(sorted_roots(&results), vec![Term::from(ex("alice"))]);
}

#[test]
#[ntest::timeout(10000)]
fn selector_validates_a_whole_class() {
    init_logging();
    let store = load_store();
    let engine = OxigraphEngine::from_config(&config());
    let reasoner = RdfsEntailment::new();
    let language = SparqlExecutionLanguage::new(&engine, &reasoner, &DisplayLabels).with_config(config());

    let constraint = Constraint::new(ex("tooOld"))
        .with_sparql("SELECT ?this ?value WHERE { ?this ex:age ?value . FILTER(?value > 100) }");
    let shape = Shape::new(ex("PersonShape"));
    let results = ValidationResults::new();
    let target = FocusTarget::Selector(Selector::new(rdf::TYPE.into_owned(), ex("Person")));

    language
        .execute(
            &constraint.executable(),
            &shape,
            &ex("shapes").into(),
            &target,
            &store,
            &results,
        )
        .unwrap();
    assert_eq!(sorted_roots(&results), vec![Term::from(ex("carol"))]);
}
