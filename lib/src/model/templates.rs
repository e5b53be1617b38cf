use crate::error::ModelError;
use crate::labels::local_name;
use crate::types::Severity;
use oxigraph::model::{Literal, NamedNode, Term};
use oxigraph::sparql::Variable;
use std::sync::Arc;

/// Describes an argument declared on a constraint template (`sh:argument`).
#[derive(Debug, Clone)]
pub struct Argument {
    /// The predicate through which constraint instances supply a value.
    pub predicate: NamedNode,
    /// The query variable bound to the argument's value.
    pub variable: Variable,
    /// Whether the argument may be omitted (`sh:optional true`).
    pub optional: bool,
    /// Value used when the constraint instance supplies none (`sh:defaultValue`).
    pub default_value: Option<Term>,
    /// `sh:optionalWhenInherited true`.
    pub optional_when_inherited: bool,
}

impl Argument {
    /// A required argument without default, bound to the local name of `predicate`.
    pub fn new(predicate: NamedNode) -> Result<Self, ModelError> {
        let name = local_name(&predicate);
        Self::with_var_name(predicate, &name)
    }

    /// Like [`Argument::new`] but binds `name` instead of the predicate's local name.
    pub fn with_var_name(predicate: NamedNode, name: &str) -> Result<Self, ModelError> {
        let variable = Variable::new(name).map_err(|_| ModelError::InvalidVariable {
            name: name.to_string(),
            predicate: predicate.as_str().to_string(),
        })?;
        Ok(Argument {
            predicate,
            variable,
            optional: false,
            default_value: None,
            optional_when_inherited: false,
        })
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn default_value(mut self, value: impl Into<Term>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn optional_when_inherited(mut self, flag: bool) -> Self {
        self.optional_when_inherited = flag;
        self
    }

    pub fn name(&self) -> &str {
        self.variable.as_str()
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    /// True when `template` itself declares this argument as optional.
    pub fn is_optional_at(&self, template: &Template) -> bool {
        template
            .arguments
            .iter()
            .any(|arg| arg.predicate == self.predicate && arg.optional)
    }
}

/// Represents a `sh:PrefixDeclaration` prepended to query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDeclaration {
    pub prefix: String,
    pub namespace: String,
}

impl PrefixDeclaration {
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        PrefixDeclaration {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }
}

/// A reusable, parameterised constraint backed by a SELECT query.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template IRI.
    pub iri: NamedNode,
    /// Optional human-readable label (`rdfs:label`).
    pub label: Option<String>,
    /// The query body (`sh:sparql`). Only literals are usable.
    pub sparql: Option<Term>,
    /// Arguments declared directly on this template.
    pub arguments: Vec<Argument>,
    /// Template this one inherits arguments from.
    pub parent: Option<Arc<Template>>,
    pub severity: Option<Severity>,
    pub messages: Vec<Literal>,
    pub predicate: Option<NamedNode>,
    /// Requested entailment regime (`sh:sparqlEntailment`).
    pub entailment: Option<NamedNode>,
    pub prefixes: Vec<PrefixDeclaration>,
}

impl Template {
    pub fn new(iri: NamedNode) -> Self {
        Template {
            iri,
            label: None,
            sparql: None,
            arguments: Vec::new(),
            parent: None,
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

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_parent(mut self, parent: Arc<Template>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_message(mut self, message: Literal) -> Self {
        self.messages.push(message);
        self
    }

    /// Own arguments first, then those inherited through the parent chain.
    pub fn effective_arguments(&self) -> Vec<&Argument> {
        let mut arguments: Vec<&Argument> = self.arguments.iter().collect();
        let mut parent = self.parent.as_deref();
        while let Some(template) = parent {
            arguments.extend(template.arguments.iter());
            parent = template.parent.as_deref();
        }
        arguments
    }

    /// Label used in statistics: `rdfs:label` if declared, else the IRI's local name.
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| local_name(&self.iri))
    }
}
