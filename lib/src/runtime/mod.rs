//! Execution of SPARQL-based constraints: binding, rewriting, evaluation and
//! interpretation of results.

pub mod bindings;
pub mod engine;
pub mod entailment;
pub mod interpret;
pub mod message;
pub mod oxigraph;
pub mod rewrite;
pub mod validators;
