//! Error types for executing SPARQL-based constraints.

use thiserror::Error;

/// Failures raised by a [`QueryEngine`](crate::runtime::engine::QueryEngine) or an
/// entailment reasoner.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to parse query: {0}")]
    Parse(String),

    #[error("query evaluation failed: {0}")]
    Evaluation(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// The engine returned something other than a solution sequence.
    #[error("expected a solution sequence but the query produced {0}")]
    UnexpectedResults(&'static str),
}

/// Errors local to one constraint's execution. None of them abort a validation run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The constraint (or its template) is not usable as declared.
    #[error("{message}")]
    Configuration { message: String },

    /// The query text does not parse.
    #[error("Invalid SPARQL constraint ({message}):\n{query}")]
    InvalidQuery { message: String, query: String },

    /// The query parsed, but is not a SELECT query.
    #[error("SHACL constraints must be SELECT queries:\n{query}")]
    NotSelect { query: String },

    /// The query has no graph pattern the scope/selector clauses can be added to.
    #[error("Cannot find a top-level graph pattern in query: {query}")]
    Rewrite { query: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ExecutionError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ExecutionError::Configuration {
            message: message.into(),
        }
    }
}

/// Errors raised while assembling the shape/template model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("'{name}' is not a valid SPARQL variable name for argument <{predicate}>")]
    InvalidVariable { name: String, predicate: String },
}

pub type Result<T, E = ExecutionError> = std::result::Result<T, E>;
