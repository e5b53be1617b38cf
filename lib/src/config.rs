use crate::model::templates::PrefixDeclaration;

/// Settings shared by every execution in a validation run.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Shapes-graph-wide prefixes prepended to every constraint query.
    pub prefixes: Vec<PrefixDeclaration>,
    /// Evaluate queries against the union of all graphs in the dataset.
    pub union_default_graph: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            prefixes: Vec::new(),
            union_default_graph: true,
        }
    }
}

impl ExecutionConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push(PrefixDeclaration::new(prefix, namespace));
        self
    }

    pub fn with_union_default_graph(mut self, union: bool) -> Self {
        self.union_default_graph = union;
        self
    }
}
