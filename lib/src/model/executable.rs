use crate::model::templates::{PrefixDeclaration, Template};
use crate::model::Constraint;
use crate::types::Severity;
use oxigraph::model::{Literal, NamedNode, Term};

/// A constraint as seen by an execution language: either carrying its own query
/// (`Native`) or delegating query text and arguments to a template (`Template`).
#[derive(Debug, Clone, Copy)]
pub enum ConstraintExecutable<'a> {
    Native {
        constraint: &'a Constraint,
    },
    Template {
        constraint: &'a Constraint,
        template: &'a Template,
    },
}

impl<'a> ConstraintExecutable<'a> {
    pub fn for_constraint(constraint: &'a Constraint) -> Self {
        match constraint.template.as_deref() {
            Some(template) => ConstraintExecutable::Template {
                constraint,
                template,
            },
            None => ConstraintExecutable::Native { constraint },
        }
    }

    /// The constraint instance, reported as the source of violations.
    pub fn constraint(&self) -> &'a Constraint {
        match self {
            ConstraintExecutable::Native { constraint }
            | ConstraintExecutable::Template { constraint, .. } => constraint,
        }
    }

    pub fn template(&self) -> Option<&'a Template> {
        match self {
            ConstraintExecutable::Native { .. } => None,
            ConstraintExecutable::Template { template, .. } => Some(template),
        }
    }

    /// The declared `sh:sparql` value, whatever its term type.
    pub fn sparql(&self) -> Option<&'a Term> {
        match self {
            ConstraintExecutable::Native { constraint } => constraint.sparql.as_ref(),
            ConstraintExecutable::Template { template, .. } => template.sparql.as_ref(),
        }
    }

    /// True when the constraint (or its template) declares a SPARQL query body.
    pub fn is_applicable(&self) -> bool {
        self.sparql().is_some()
    }

    pub fn severity(&self) -> Severity {
        let declared = match self {
            ConstraintExecutable::Native { constraint } => constraint.severity,
            ConstraintExecutable::Template { template, .. } => template.severity,
        };
        declared.unwrap_or_default()
    }

    pub fn messages(&self) -> &'a [Literal] {
        match self {
            ConstraintExecutable::Native { constraint } => &constraint.messages,
            ConstraintExecutable::Template { template, .. } => &template.messages,
        }
    }

    pub fn predicate(&self) -> Option<&'a NamedNode> {
        match self {
            ConstraintExecutable::Native { constraint } => constraint.predicate.as_ref(),
            ConstraintExecutable::Template { template, .. } => template.predicate.as_ref(),
        }
    }

    /// Constraint-level scope shapes. Shape-level ones are appended by the caller.
    pub fn scope_shapes(&self) -> &'a [Term] {
        &self.constraint().scope_shapes
    }

    pub fn entailment(&self) -> Option<&'a NamedNode> {
        match self {
            ConstraintExecutable::Native { constraint } => constraint.entailment.as_ref(),
            ConstraintExecutable::Template { template, .. } => template.entailment.as_ref(),
        }
    }

    pub fn prefixes(&self) -> &'a [PrefixDeclaration] {
        match self {
            ConstraintExecutable::Native { constraint } => &constraint.prefixes,
            ConstraintExecutable::Template { template, .. } => &template.prefixes,
        }
    }

    /// Checks that every required argument without a default has a value.
    ///
    /// An unsupplied argument is excused when it is flagged
    /// `sh:optionalWhenInherited` and the template itself declares it optional.
    /// Native constraints are always complete.
    pub fn is_complete(&self) -> bool {
        let (constraint, template) = match self {
            ConstraintExecutable::Native { .. } => return true,
            ConstraintExecutable::Template {
                constraint,
                template,
            } => (constraint, template),
        };
        template.effective_arguments().into_iter().all(|arg| {
            arg.optional
                || arg.has_default()
                || constraint.has_value(&arg.predicate)
                || (arg.optional_when_inherited && arg.is_optional_at(template))
        })
    }
}
