//! [`QueryEngine`] and [`EntailmentReasoner`] over an oxigraph [`Store`].

use crate::config::ExecutionConfig;
use crate::error::EngineError;
use crate::named_nodes::{entailment, vars, SHACL};
use crate::runtime::bindings::BindingEnvironment;
use crate::runtime::engine::{QueryEngine, ResultRows, Row};
use crate::runtime::entailment::EntailmentReasoner;
use crate::runtime::rewrite;
use oxigraph::model::vocab::{rdf, rdfs};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, Term};
use oxigraph::sparql::{QueryResults, SparqlEvaluator, Variable};
use oxigraph::store::Store;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use spargebra::Query;
use std::collections::HashMap;
use std::sync::Arc;

/// Answers `sh:hasShape(?focus, ?shape, ?shapesGraph)` calls made by rewritten queries.
pub trait ShapeMembership: Send + Sync {
    /// `None` leaves the call unbound, which makes the enclosing filter fail.
    fn has_shape(&self, focus: &Term, shape: &Term, shapes_graph: Option<&Term>) -> Option<bool>;
}

fn storage(e: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(e.to_string())
}

fn evaluation(e: impl std::fmt::Display) -> EngineError {
    EngineError::Evaluation(e.to_string())
}

/// Evaluates constraint queries against an oxigraph store.
#[derive(Clone)]
pub struct OxigraphEngine {
    union_default_graph: bool,
    membership: Option<Arc<dyn ShapeMembership>>,
}

impl Default for OxigraphEngine {
    fn default() -> Self {
        OxigraphEngine {
            union_default_graph: true,
            membership: None,
        }
    }
}

impl OxigraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        OxigraphEngine {
            union_default_graph: config.union_default_graph,
            membership: None,
        }
    }

    /// Registers `sh:hasShape`, backed by `membership`.
    pub fn with_shape_membership(mut self, membership: Arc<dyn ShapeMembership>) -> Self {
        self.membership = Some(membership);
        self
    }

    fn evaluator(&self) -> SparqlEvaluator {
        let evaluator = SparqlEvaluator::new();
        let Some(membership) = self.membership.clone() else {
            return evaluator;
        };
        evaluator.with_custom_function(SHACL::new().has_shape.into_owned(), move |args| {
            let (focus, shape) = (args.first()?, args.get(1)?);
            membership
                .has_shape(focus, shape, args.get(2))
                .map(|conforms| Literal::from(conforms).into())
        })
    }
}

impl QueryEngine for OxigraphEngine {
    type Dataset = Store;

    fn execute<'a>(
        &'a self,
        query: &Query,
        dataset: &'a Store,
        bindings: &BindingEnvironment,
    ) -> Result<ResultRows<'a>, EngineError> {
        // oxigraph only pre-binds projected variables
        let mentioned = rewrite::mentioned_variables(query);
        let projected = rewrite::projected_variables(query);
        let substitutions: Vec<&(Variable, Term)> = bindings
            .iter()
            .filter(|(var, _)| mentioned.contains(var.as_str()))
            .collect();
        let exposed: Vec<String> = substitutions
            .iter()
            .map(|(var, _)| var.as_str().to_string())
            .filter(|name| !projected.contains(name))
            .collect();
        let hidden: Vec<String> = exposed
            .iter()
            .filter(|name| name.as_str() != vars::THIS)
            .cloned()
            .collect();

        let text = rewrite::expose_variables(query, &exposed).to_string();
        let mut prepared = self
            .evaluator()
            .parse_query(&text)
            .map_err(|e| EngineError::Parse(e.to_string()))?;
        if self.union_default_graph {
            prepared.dataset_mut().set_default_graph_as_union();
        }

        let mut bound = prepared.on_store(dataset);
        for (var, value) in substitutions {
            bound = bound.substitute_variable(var.clone(), value.clone());
        }

        match bound.execute().map_err(evaluation)? {
            QueryResults::Solutions(solutions) => {
                log::trace!("Opened query session");
                Ok(ResultRows::new(solutions.map(move |solution| {
                    solution
                        .map(|s| {
                            s.iter()
                                .filter(|(var, _)| !hidden.iter().any(|name| name == var.as_str()))
                                .map(|(var, term)| (var.clone(), term.clone()))
                                .collect::<Row>()
                        })
                        .map_err(evaluation)
                })))
            }
            QueryResults::Boolean(_) => Err(EngineError::UnexpectedResults("a boolean")),
            QueryResults::Graph(_) => Err(EngineError::UnexpectedResults("a graph")),
        }
    }
}

/// Reachability over one schema relation (`rdfs:subClassOf` or
/// `rdfs:subPropertyOf`), merged across graphs.
struct Hierarchy {
    graph: DiGraph<Term, ()>,
    index: HashMap<Term, NodeIndex>,
}

impl Hierarchy {
    fn load(dataset: &Store, relation: NamedNodeRef<'_>) -> Result<Self, EngineError> {
        let mut hierarchy = Hierarchy {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };
        for quad in dataset.quads_for_pattern(None, Some(relation), None, None) {
            let quad = quad.map_err(storage)?;
            let sub = hierarchy.node(quad.subject.into());
            let sup = hierarchy.node(quad.object);
            hierarchy.graph.add_edge(sub, sup, ());
        }
        Ok(hierarchy)
    }

    fn node(&mut self, term: Term) -> NodeIndex {
        if let Some(&index) = self.index.get(&term) {
            return index;
        }
        let index = self.graph.add_node(term.clone());
        self.index.insert(term, index);
        index
    }

    /// `term` itself followed by everything above it.
    fn ancestors(&self, term: &Term) -> Vec<Term> {
        let Some(&start) = self.index.get(term) else {
            return vec![term.clone()];
        };
        let mut bfs = Bfs::new(&self.graph, start);
        let mut found = Vec::new();
        while let Some(node) = bfs.next(&self.graph) {
            if let Some(term) = self.graph.node_weight(node) {
                found.push(term.clone());
            }
        }
        found
    }
}

fn schema(dataset: &Store, relation: NamedNodeRef<'_>) -> Result<HashMap<Term, Vec<Term>>, EngineError> {
    let mut declared: HashMap<Term, Vec<Term>> = HashMap::new();
    for quad in dataset.quads_for_pattern(None, Some(relation), None, None) {
        let quad = quad.map_err(storage)?;
        declared.entry(quad.subject.into()).or_default().push(quad.object);
    }
    Ok(declared)
}

fn resource(term: &Term) -> Option<NamedOrBlankNode> {
    match term {
        Term::NamedNode(node) => Some(node.clone().into()),
        Term::BlankNode(node) => Some(node.clone().into()),
        _ => None,
    }
}

/// Supports simple and RDFS entailment over a [`Store`].
///
/// RDFS copies the dataset into a fresh in-memory store and adds, in the graph
/// of the statement they follow from:
/// - statements implied by `rdfs:subPropertyOf` (rdfs7),
/// - `rdf:type` statements implied by `rdfs:domain` and `rdfs:range` (rdfs2, rdfs3),
/// - `rdf:type` statements implied by `rdfs:subClassOf` (rdfs9).
///
/// The entailed copy is built once per dataset handle and reused until
/// [`clear`](RdfsEntailment::clear) is called.
pub struct RdfsEntailment {
    entailed: papaya::HashMap<usize, Store>,
}

impl Default for RdfsEntailment {
    fn default() -> Self {
        Self::new()
    }
}

impl RdfsEntailment {
    pub fn new() -> Self {
        RdfsEntailment {
            entailed: papaya::HashMap::new(),
        }
    }

    /// Forgets every entailed copy. Call after the underlying data changed.
    pub fn clear(&self) {
        self.entailed.pin().clear();
    }

    fn entailed(&self, dataset: &Store) -> Result<Store, EngineError> {
        let key = dataset as *const Store as usize;
        let cache = self.entailed.pin();
        if let Some(store) = cache.get(&key) {
            return Ok(store.clone());
        }
        let store = Self::materialize(dataset)?;
        Ok(cache.get_or_insert(key, store).clone())
    }

    fn materialize(dataset: &Store) -> Result<Store, EngineError> {
        let store = Store::new().map_err(storage)?;
        for quad in dataset.iter() {
            store.insert(&quad.map_err(storage)?).map_err(storage)?;
        }

        let properties = Hierarchy::load(dataset, rdfs::SUB_PROPERTY_OF)?;
        let classes = Hierarchy::load(dataset, rdfs::SUB_CLASS_OF)?;
        let domains = schema(dataset, rdfs::DOMAIN)?;
        let ranges = schema(dataset, rdfs::RANGE)?;
        let mut inferred = 0usize;
        let mut add = |quad: Quad| -> Result<(), EngineError> {
            if !store.contains(&quad).map_err(storage)? {
                store.insert(&quad).map_err(storage)?;
                inferred += 1;
            }
            Ok(())
        };

        let mut super_properties: HashMap<NamedNode, Vec<Term>> = HashMap::new();
        for quad in dataset.iter() {
            let quad = quad.map_err(storage)?;
            let above = super_properties
                .entry(quad.predicate.clone())
                .or_insert_with(|| properties.ancestors(&quad.predicate.clone().into()));
            for property in above.iter() {
                if let Term::NamedNode(property) = property {
                    if *property != quad.predicate {
                        add(Quad::new(
                            quad.subject.clone(),
                            property.clone(),
                            quad.object.clone(),
                            quad.graph_name.clone(),
                        ))?;
                    }
                }
                for class in domains.get(property).into_iter().flatten() {
                    add(Quad::new(
                        quad.subject.clone(),
                        rdf::TYPE,
                        class.clone(),
                        quad.graph_name.clone(),
                    ))?;
                }
                if let Some(object) = resource(&quad.object) {
                    for class in ranges.get(property).into_iter().flatten() {
                        add(Quad::new(
                            object.clone(),
                            rdf::TYPE,
                            class.clone(),
                            quad.graph_name.clone(),
                        ))?;
                    }
                }
            }
        }

        // types asserted or inferred so far, then their superclasses
        let typed = store
            .quads_for_pattern(None, Some(rdf::TYPE), None, None)
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        for quad in typed {
            for class in classes.ancestors(&quad.object).into_iter().skip(1) {
                add(Quad::new(
                    quad.subject.clone(),
                    rdf::TYPE,
                    class,
                    quad.graph_name.clone(),
                ))?;
            }
        }

        log::debug!("RDFS entailment added {inferred} statement(s)");
        Ok(store)
    }
}

impl EntailmentReasoner<Store> for RdfsEntailment {
    fn apply(&self, dataset: &Store, regime: &NamedNode) -> Result<Option<Store>, EngineError> {
        if regime.as_ref() == entailment::SIMPLE {
            Ok(Some(dataset.clone()))
        } else if regime.as_ref() == entailment::RDFS {
            self.entailed(dataset).map(Some)
        } else {
            Ok(None)
        }
    }
}
