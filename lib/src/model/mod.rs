//! Read-only view of shapes, constraint instances and templates.
//!
//! Loading these from a shapes graph happens elsewhere; the execution language
//! only reads them.

use std::collections::HashMap;
use std::sync::Arc;

use oxigraph::model::{Literal, NamedNode, Term};

use crate::types::Severity;

pub mod executable;
pub mod templates;

pub use executable::ConstraintExecutable;
use templates::{PrefixDeclaration, Template};

/// A shape under validation.
#[derive(Debug, Clone)]
pub struct Shape {
    /// The shape's identity, bound to `?currentShape`.
    pub node: Term,
    /// Shape-level `sh:scopeShape` values.
    pub scope_shapes: Vec<Term>,
}

impl Shape {
    pub fn new(node: impl Into<Term>) -> Self {
        Shape {
            node: node.into(),
            scope_shapes: Vec::new(),
        }
    }

    pub fn with_scope_shape(mut self, shape: impl Into<Term>) -> Self {
        self.scope_shapes.push(shape.into());
        self
    }
}

/// The statement pointing at an anonymous constraint node, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ReferencingStatement {
    pub subject: Term,
    pub predicate: NamedNode,
}

/// A constraint declared on a shape: either a native SPARQL constraint or a
/// template call supplying argument values.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// The constraint node; reported as `sh:source` of every violation.
    pub node: Term,
    /// Where the constraint node is referenced from, if known.
    pub referenced_by: Option<ReferencingStatement>,
    /// Native query text (`sh:sparql`). Only literals are usable.
    pub sparql: Option<Term>,
    /// The template this constraint instantiates.
    pub template: Option<Arc<Template>>,
    /// Property values of the constraint node, consumed as template arguments.
    pub values: HashMap<NamedNode, Vec<Term>>,
    /// Constraint-level `sh:scopeShape` values.
    pub scope_shapes: Vec<Term>,
    pub severity: Option<Severity>,
    pub messages: Vec<Literal>,
    pub predicate: Option<NamedNode>,
    pub entailment: Option<NamedNode>,
    pub prefixes: Vec<PrefixDeclaration>,
}

impl Constraint {
    pub fn new(node: impl Into<Term>) -> Self {
        Constraint {
            node: node.into(),
            referenced_by: None,
            sparql: None,
            template: None,
            values: HashMap::new(),
            scope_shapes: Vec::new(),
            severity: None,
            messages: Vec::new(),
            predicate: None,
            entailment: None,
            prefixes: Vec::new(),
        }
    }

    pub fn with_sparql(mut self, query: &str) -> Self {
        self.sparql = Some(Literal::new_simple_literal(query).into());
        self
    }

    pub fn with_template(mut self, template: Arc<Template>) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_value(mut self, predicate: NamedNode, value: impl Into<Term>) -> Self {
        self.values.entry(predicate).or_default().push(value.into());
        self
    }

    pub fn with_scope_shape(mut self, shape: impl Into<Term>) -> Self {
        self.scope_shapes.push(shape.into());
        self
    }

    pub fn with_message(mut self, message: Literal) -> Self {
        self.messages.push(message);
        self
    }

    /// First value supplied for `predicate`.
    pub fn value(&self, predicate: &NamedNode) -> Option<&Term> {
        self.values.get(predicate).and_then(|values| values.first())
    }

    pub fn has_value(&self, predicate: &NamedNode) -> bool {
        self.value(predicate).is_some()
    }

    pub fn executable(&self) -> ConstraintExecutable<'_> {
        ConstraintExecutable::for_constraint(self)
    }
}
