//! The seam between the execution language and whatever evaluates its queries.

use crate::error::EngineError;
use crate::runtime::bindings::BindingEnvironment;
use oxigraph::model::Term;
use oxigraph::sparql::Variable;
use spargebra::Query;

/// Parses and evaluates SELECT queries against a dataset.
pub trait QueryEngine: Send + Sync {
    type Dataset: Clone + Send + Sync;

    /// Parses query text into its algebra. Fails with a diagnostic on malformed text.
    fn parse(&self, text: &str) -> Result<Query, EngineError> {
        Query::parse(text, None).map_err(|e| EngineError::Parse(e.to_string()))
    }

    /// Evaluates `query` with `bindings` pre-bound. The returned rows hold the
    /// query session open until they are dropped.
    fn execute<'a>(
        &'a self,
        query: &Query,
        dataset: &'a Self::Dataset,
        bindings: &BindingEnvironment,
    ) -> Result<ResultRows<'a>, EngineError>;
}

/// One solution of a SELECT query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<(Variable, Term)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Term>) -> Self {
        self.values.push((Variable::new_unchecked(name), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Term> {
        self.values
            .iter()
            .find(|(var, _)| var.as_str() == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Variable, Term)> {
        self.values.iter()
    }
}

impl FromIterator<(Variable, Term)> for Row {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}

type ReleaseHook<'a> = Box<dyn FnOnce() + Send + 'a>;

/// An open query session yielding rows in engine order.
///
/// The session is released when this value is dropped, whether iteration ran to
/// the end, stopped early, or bailed out on an error.
pub struct ResultRows<'a> {
    rows: Box<dyn Iterator<Item = Result<Row, EngineError>> + 'a>,
    on_release: Option<ReleaseHook<'a>>,
}

impl<'a> ResultRows<'a> {
    pub fn new(rows: impl Iterator<Item = Result<Row, EngineError>> + 'a) -> Self {
        ResultRows {
            rows: Box::new(rows),
            on_release: None,
        }
    }

    /// Runs `hook` once the session is released.
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'a) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }
}

impl Iterator for ResultRows<'_> {
    type Item = Result<Row, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl Drop for ResultRows<'_> {
    fn drop(&mut self) {
        log::trace!("Releasing query session");
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}
