//! SPARQL execution language for SHACL constraints and constraint templates.
//!
//! Given a constraint (native `sh:sparql` or a template call), a shape and a
//! focus target, [`SparqlExecutionLanguage`] decides whether the constraint can
//! run, applies the requested entailment regime, adds scope-shape and selector
//! clauses to the query, pre-binds the system and argument variables, evaluates
//! the query through a [`QueryEngine`] and turns every result row into a
//! [`Violation`].
//!
//! The bundled [`OxigraphEngine`] and [`RdfsEntailment`] evaluate against an
//! oxigraph [`Store`](oxigraph::store::Store).
#![deny(clippy::all)]

pub mod config;
pub mod error;
pub mod labels;
pub mod model;
pub mod named_nodes;
pub mod report;
pub mod runtime;
pub mod statistics;
pub mod types;

pub use config::ExecutionConfig;
pub use error::{EngineError, ExecutionError, ModelError};
pub use labels::{DisplayLabels, LabelProvider, StoreLabels};
pub use model::templates::{Argument, PrefixDeclaration, Template};
pub use model::{Constraint, ConstraintExecutable, ReferencingStatement, Shape};
pub use report::{ResultsSink, ValidationResults, Violation};
pub use runtime::engine::{QueryEngine, ResultRows, Row};
pub use runtime::entailment::{EntailmentReasoner, SimpleEntailment};
pub use runtime::oxigraph::{OxigraphEngine, RdfsEntailment, ShapeMembership};
pub use runtime::validators::{
    ConstraintFailure, ExecutionJob, ExecutionLanguage, ExecutionOutcome, SparqlExecutionLanguage,
};
pub use statistics::{NullStatistics, StatisticsCollector, StatisticsEntry, StatisticsSink};
pub use types::{FocusTarget, Selector, Severity};
