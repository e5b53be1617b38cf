use crate::model::{ConstraintExecutable, Shape};
use crate::named_nodes::vars;
use crate::types::FocusTarget;
use oxigraph::model::Term;
use oxigraph::sparql::Variable;
use std::fmt::Write;

/// Pre-bound variables handed to the query engine. Each variable is bound at
/// most once; later attempts to bind it again are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingEnvironment {
    bindings: Vec<(Variable, Term)>,
}

impl BindingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `variable` unless it already has a value. Returns whether it was bound.
    pub fn bind(&mut self, variable: Variable, value: Term) -> bool {
        if self.contains(variable.as_str()) {
            return false;
        }
        self.bindings.push((variable, value));
        true
    }

    fn bind_name(&mut self, name: &str, value: Term) -> bool {
        self.bind(Variable::new_unchecked(name), value)
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|(var, _)| var.as_str() == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Variable, Term)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// `\nBindings:` followed by one `\n- ?name: value` line per binding, or
    /// nothing when empty.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if self.bindings.is_empty() {
            return out;
        }
        out.push_str("\nBindings:");
        for (var, value) in &self.bindings {
            let _ = write!(out, "\n- ?{}: {}", var.as_str(), value);
        }
        out
    }
}

impl IntoIterator for BindingEnvironment {
    type Item = (Variable, Term);
    type IntoIter = std::vec::IntoIter<(Variable, Term)>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}

/// Constraint-level scope shapes followed by shape-level ones, in declaration order.
pub fn scope_shapes(executable: &ConstraintExecutable<'_>, shape: &Shape) -> Vec<Term> {
    executable
        .scope_shapes()
        .iter()
        .chain(shape.scope_shapes.iter())
        .cloned()
        .collect()
}

/// Assembles the variables pre-bound for one execution.
///
/// System variables are bound first so a template argument can never shadow
/// them. Template arguments take the constraint's explicit value, else the
/// argument's default, else stay unbound.
pub fn build_bindings(
    executable: &ConstraintExecutable<'_>,
    shape: &Shape,
    shapes_graph: &Term,
    target: &FocusTarget,
    scopes: &[Term],
) -> BindingEnvironment {
    let mut env = BindingEnvironment::new();

    if let Some(focus) = target.focus_node() {
        env.bind_name(vars::THIS, focus.clone());
    }
    env.bind_name(vars::CURRENT_SHAPE, shape.node.clone());
    env.bind_name(vars::SHAPES_GRAPH, shapes_graph.clone());
    for (i, scope) in scopes.iter().enumerate() {
        env.bind_name(&vars::scope(i), scope.clone());
    }
    if let Some(selector) = target.selector() {
        env.bind_name(vars::TYPE_CLASS, selector.object.clone());
    }

    if let ConstraintExecutable::Template {
        constraint,
        template,
    } = executable
    {
        for arg in template.effective_arguments() {
            let value = constraint
                .value(&arg.predicate)
                .or(arg.default_value.as_ref());
            if let Some(value) = value {
                env.bind(arg.variable.clone(), value.clone());
            }
        }
    }

    env
}
