use crate::named_nodes::SHACL;
use crate::types::Severity;
use oxigraph::model::vocab::rdf;
use oxigraph::model::{BlankNode, Graph, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use std::sync::{Mutex, PoisonError};

/// One constraint failure, built from a single result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub severity: Severity,
    /// The constraint instance that produced the violation (`sh:source`).
    pub source: Term,
    pub messages: Vec<Term>,
    pub predicate: Option<Term>,
    pub subject: Option<Term>,
    pub object: Option<Term>,
    pub root: Option<Term>,
}

impl Violation {
    pub fn new(severity: Severity, source: Term) -> Self {
        Violation {
            severity,
            source,
            messages: Vec::new(),
            predicate: None,
            subject: None,
            object: None,
            root: None,
        }
    }

    /// Message texts, regardless of the term type they were reported as.
    pub fn message_texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .map(|term| match term {
                Term::Literal(lit) => lit.value(),
                Term::NamedNode(nn) => nn.as_str(),
                Term::BlankNode(bn) => bn.as_str(),
                #[allow(unreachable_patterns)]
                _ => "",
            })
            .collect()
    }
}

/// Destination for violations. Shared across concurrent executions.
pub trait ResultsSink: Send + Sync {
    fn append(&self, violation: Violation);
}

/// In-memory violation collection, safe to append to from several threads.
#[derive(Debug, Default)]
pub struct ValidationResults {
    violations: Mutex<Vec<Violation>>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders every violation as a blank node typed with its severity class.
    pub fn to_graph(&self) -> Graph {
        let shacl = SHACL::new();
        let mut graph = Graph::new();

        for violation in self.violations() {
            let node: NamedOrBlankNode = BlankNode::default().into();
            graph.insert(&Triple::new(
                node.clone(),
                rdf::TYPE,
                violation.severity.iri().into_owned(),
            ));
            graph.insert(&Triple::new(node.clone(), shacl.source, violation.source));

            for message in violation.messages {
                graph.insert(&Triple::new(node.clone(), shacl.message, message));
            }
            if let Some(term) = violation.predicate {
                graph.insert(&Triple::new(node.clone(), shacl.predicate, term));
            }
            if let Some(term) = violation.subject {
                graph.insert(&Triple::new(node.clone(), shacl.subject, term));
            }
            if let Some(term) = violation.object {
                graph.insert(&Triple::new(node.clone(), shacl.object, term));
            }
            if let Some(term) = violation.root {
                graph.insert(&Triple::new(node.clone(), shacl.root, term));
            }
        }

        graph
    }
}

impl ResultsSink for ValidationResults {
    fn append(&self, violation: Violation) {
        self.violations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(violation);
    }
}

/// Builds the violation reported when a requested entailment regime is unsupported.
pub(crate) fn unsupported_entailment(regime: &NamedNode, constraint: &Term) -> Violation {
    let mut violation = Violation::new(Severity::FatalError, constraint.clone());
    violation.messages.push(
        Literal::new_simple_literal(format!(
            "Unsupported SPARQL entailment {}",
            regime.as_str()
        ))
        .into(),
    );
    violation
}
