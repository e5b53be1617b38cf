pub mod sparql;

pub use sparql::{
    ConstraintFailure, ExecutionJob, ExecutionLanguage, ExecutionOutcome, SparqlExecutionLanguage,
};
