use crate::config::ExecutionConfig;
use crate::error::{EngineError, ExecutionError};
use crate::labels::LabelProvider;
use crate::model::{Constraint, ConstraintExecutable, Shape};
use crate::report::{self, ResultsSink};
use crate::runtime::bindings::{build_bindings, scope_shapes, BindingEnvironment};
use crate::runtime::engine::QueryEngine;
use crate::runtime::entailment::{Entailed, EntailmentGate, EntailmentReasoner};
use crate::runtime::interpret::interpret_rows;
use crate::runtime::rewrite;
use crate::statistics::{NullStatistics, StatisticsEntry, StatisticsSink};
use crate::types::FocusTarget;
use log::{debug, info, warn};
use oxigraph::model::Term;
use rayon::prelude::*;
use spargebra::Query;
use std::time::{Instant, SystemTime};

static NO_STATISTICS: NullStatistics = NullStatistics;

/// A language that can turn constraint declarations into violations.
pub trait ExecutionLanguage<D>: Send + Sync {
    /// Whether this language can run `executable` at all.
    fn is_applicable(&self, executable: &ConstraintExecutable<'_>) -> bool;

    fn execute(
        &self,
        executable: &ConstraintExecutable<'_>,
        shape: &Shape,
        shapes_graph: &Term,
        target: &FocusTarget,
        dataset: &D,
        results: &dyn ResultsSink,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The query ran; one violation was reported per result row.
    Executed { violations: usize },
    /// A template lacked required argument values and was not run.
    SkippedIncomplete,
    /// The requested entailment regime is unsupported; a fatal error was reported instead.
    UnsupportedEntailment,
}

/// One constraint to run against one target.
#[derive(Debug, Clone)]
pub struct ExecutionJob<'j> {
    pub constraint: &'j Constraint,
    pub shape: &'j Shape,
    pub target: FocusTarget,
}

/// A constraint whose execution failed. The run carries on without it.
#[derive(Debug)]
pub struct ConstraintFailure {
    pub constraint: Term,
    pub error: ExecutionError,
}

/// Runs SPARQL-based constraints and constraint templates.
///
/// Holds no state of its own beyond its collaborators, so one value can serve
/// any number of concurrent executions.
pub struct SparqlExecutionLanguage<'a, E: QueryEngine> {
    engine: &'a E,
    reasoner: &'a dyn EntailmentReasoner<E::Dataset>,
    labels: &'a dyn LabelProvider,
    statistics: &'a dyn StatisticsSink,
    config: ExecutionConfig,
}

impl<'a, E: QueryEngine> SparqlExecutionLanguage<'a, E> {
    pub fn new(
        engine: &'a E,
        reasoner: &'a dyn EntailmentReasoner<E::Dataset>,
        labels: &'a dyn LabelProvider,
    ) -> Self {
        SparqlExecutionLanguage {
            engine,
            reasoner,
            labels,
            statistics: &NO_STATISTICS,
            config: ExecutionConfig::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: &'a dyn StatisticsSink) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Runs every applicable job, in parallel. Constraints that fail are
    /// returned; they never stop the others.
    pub fn execute_all(
        &self,
        jobs: &[ExecutionJob<'_>],
        shapes_graph: &Term,
        dataset: &E::Dataset,
        results: &dyn ResultsSink,
    ) -> Vec<ConstraintFailure> {
        let failures: Vec<ConstraintFailure> = jobs
            .par_iter()
            .filter_map(|job| {
                let executable = job.constraint.executable();
                if !self.is_applicable(&executable) {
                    debug!(
                        "Constraint {} has no SPARQL query, leaving it to another execution language",
                        job.constraint.node
                    );
                    return None;
                }
                match self.execute(&executable, job.shape, shapes_graph, &job.target, dataset, results) {
                    Ok(_) => None,
                    Err(error) => {
                        warn!("SPARQL constraint {} failed: {}", job.constraint.node, error);
                        Some(ConstraintFailure {
                            constraint: job.constraint.node.clone(),
                            error,
                        })
                    }
                }
            })
            .collect();
        info!(
            "Executed {} SPARQL constraint job(s), {} failed",
            jobs.len(),
            failures.len()
        );
        failures
    }

    /// `Missing sh:sparql of <label>`, plus where an anonymous constraint is
    /// referenced from when that is known.
    fn missing_query(&self, executable: &ConstraintExecutable<'_>) -> ExecutionError {
        let constraint = executable.constraint();
        let owner: Term = match executable.template() {
            Some(template) => template.iri.clone().into(),
            None => constraint.node.clone(),
        };
        let mut message = format!("Missing sh:sparql of {}", self.labels.label_of(&owner));
        if let (Term::BlankNode(_), Some(referenced_by)) = (&owner, &constraint.referenced_by) {
            message.push_str(&format!(
                " at {} via {}",
                self.labels.label_of(&referenced_by.subject),
                self.labels.label_of(&referenced_by.predicate.clone().into())
            ));
        }
        ExecutionError::configuration(message)
    }

    /// Shapes-graph prefixes followed by the constraint's own, as `PREFIX` lines.
    fn prefix_block(&self, executable: &ConstraintExecutable<'_>) -> Result<String, ExecutionError> {
        let mut collected: Vec<(&str, &str)> = Vec::new();
        for declaration in self.config.prefixes.iter().chain(executable.prefixes()) {
            let existing = collected
                .iter()
                .find(|(prefix, _)| *prefix == declaration.prefix)
                .map(|(_, namespace)| *namespace);
            match existing {
                Some(namespace) if namespace != declaration.namespace => {
                    return Err(ExecutionError::configuration(format!(
                        "Duplicate prefix '{}' with different namespaces: '{}' and '{}'",
                        declaration.prefix, namespace, declaration.namespace
                    )));
                }
                Some(_) => {}
                None => collected.push((declaration.prefix.as_str(), declaration.namespace.as_str())),
            }
        }
        Ok(collected
            .iter()
            .map(|(prefix, namespace)| format!("PREFIX {prefix}: <{namespace}>"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn parse(&self, text: &str) -> Result<Query, ExecutionError> {
        let query = self.engine.parse(text).map_err(|e| ExecutionError::InvalidQuery {
            message: match e {
                EngineError::Parse(message) => message,
                other => other.to_string(),
            },
            query: text.to_string(),
        })?;
        match query {
            Query::Select { .. } => Ok(query),
            _ => Err(ExecutionError::NotSelect {
                query: text.to_string(),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record_statistics(
        &self,
        executable: &ConstraintExecutable<'_>,
        target: &FocusTarget,
        body: &str,
        env: &BindingEnvironment,
        violations: usize,
        started: SystemTime,
        elapsed: std::time::Duration,
    ) {
        let (label, query, fallback_context): (String, String, Term) = match executable {
            ConstraintExecutable::Native { constraint } => (
                format!("SHACL SPARQL Constraint ({violations} violations)"),
                body.to_string(),
                constraint.node.clone(),
            ),
            ConstraintExecutable::Template { template, .. } => (
                format!("{} ({violations} violations)", template.display_label()),
                format!("{body}{}", env.describe()),
                template.iri.clone().into(),
            ),
        };
        self.statistics.add(vec![StatisticsEntry {
            label,
            query,
            duration: elapsed,
            started,
            context: target.focus_node().cloned().unwrap_or(fallback_context),
        }]);
    }
}

impl<E: QueryEngine> ExecutionLanguage<E::Dataset> for SparqlExecutionLanguage<'_, E> {
    fn is_applicable(&self, executable: &ConstraintExecutable<'_>) -> bool {
        executable.is_applicable()
    }

    fn execute(
        &self,
        executable: &ConstraintExecutable<'_>,
        shape: &Shape,
        shapes_graph: &Term,
        target: &FocusTarget,
        dataset: &E::Dataset,
        results: &dyn ResultsSink,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let constraint = executable.constraint();

        if !executable.is_complete() {
            debug!(
                "Skipping template constraint {}: required arguments are missing",
                constraint.node
            );
            return Ok(ExecutionOutcome::SkippedIncomplete);
        }

        let gate = EntailmentGate::new(self.reasoner);
        let dataset = match gate.apply(dataset, executable.entailment())? {
            Entailed::Dataset(dataset) => dataset,
            Entailed::Unsupported(regime) => {
                results.append(report::unsupported_entailment(&regime, &constraint.node));
                return Ok(ExecutionOutcome::UnsupportedEntailment);
            }
        };

        let body = match executable.sparql() {
            Some(Term::Literal(lit)) => lit.value(),
            _ => return Err(self.missing_query(executable)),
        };
        let prefixes = self.prefix_block(executable)?;
        let query_text = if prefixes.is_empty() {
            body.to_string()
        } else {
            format!("{prefixes}\n{body}")
        };
        let query = self.parse(&query_text)?;

        let scopes = scope_shapes(executable, shape);
        let query = match target.selector() {
            Some(selector) => rewrite::with_selector_clause(&query, scopes.len(), &selector.property)?,
            None if !scopes.is_empty() => rewrite::with_scope_clause(&query, scopes.len())?,
            None => query,
        };
        let env = build_bindings(executable, shape, shapes_graph, target, &scopes);

        let started = SystemTime::now();
        let timer = Instant::now();
        let rows = self.engine.execute(&query, &dataset, &env)?;
        let violations = interpret_rows(rows, executable, self.labels, results)?;
        debug!(
            "SPARQL constraint {} produced {violations} violation(s)",
            constraint.node
        );

        if self.statistics.is_recording() {
            self.record_statistics(
                executable,
                target,
                body,
                &env,
                violations,
                started,
                timer.elapsed(),
            );
        }
        Ok(ExecutionOutcome::Executed { violations })
    }
}
