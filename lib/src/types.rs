use crate::named_nodes::SHACL;
use oxigraph::model::{NamedNode, NamedNodeRef, Term};
use std::fmt;

/// Represents the severity level of a violation, corresponding to `sh:severity`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// Corresponds to `sh:Info`.
    Info,
    /// Corresponds to `sh:Warning`.
    Warning,
    /// Corresponds to `sh:Violation`.
    Violation,
    /// Corresponds to `sh:Error`. Used when a constraint declares no severity.
    #[default]
    Error,
    /// Corresponds to `sh:FatalError`. Produced by the engine itself, e.g. for
    /// unsupported entailment regimes.
    FatalError,
}

impl Severity {
    /// Creates a `Severity` from a `Term` if it matches a SHACL severity IRI.
    pub fn from_term(term: &Term) -> Option<Self> {
        if let Term::NamedNode(nn) = term {
            Self::from_named_node(nn.as_ref())
        } else {
            None
        }
    }

    pub fn from_named_node(nn: NamedNodeRef<'_>) -> Option<Self> {
        let shacl = SHACL::new();
        if nn == shacl.info {
            Some(Severity::Info)
        } else if nn == shacl.warning {
            Some(Severity::Warning)
        } else if nn == shacl.violation {
            Some(Severity::Violation)
        } else if nn == shacl.error {
            Some(Severity::Error)
        } else if nn == shacl.fatal_error {
            Some(Severity::FatalError)
        } else {
            None
        }
    }

    /// The class IRI a violation of this severity is typed with.
    pub fn iri(&self) -> NamedNodeRef<'static> {
        let shacl = SHACL::new();
        match self {
            Severity::Info => shacl.info,
            Severity::Warning => shacl.warning,
            Severity::Violation => shacl.violation,
            Severity::Error => shacl.error,
            Severity::FatalError => shacl.fatal_error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iri())
    }
}

/// Binds focus nodes of a whole class at once: `?this <property> ?typeClass`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The edge label linking a focus node to its type.
    pub property: NamedNode,
    /// The value `?typeClass` is bound to.
    pub object: Term,
}

impl Selector {
    pub fn new(property: NamedNode, object: impl Into<Term>) -> Self {
        Selector {
            property,
            object: object.into(),
        }
    }
}

/// Which nodes one execution validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    /// A single, known focus node; `?this` is pre-bound.
    Node(Term),
    /// Every node reachable through a selector property; `?this` stays unbound.
    Selector(Selector),
    /// No focus restriction; the query decides what `?this` is.
    Unbound,
}

impl FocusTarget {
    pub fn focus_node(&self) -> Option<&Term> {
        match self {
            FocusTarget::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn selector(&self) -> Option<&Selector> {
        match self {
            FocusTarget::Selector(selector) => Some(selector),
            _ => None,
        }
    }
}
