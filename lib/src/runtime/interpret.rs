use crate::error::ExecutionError;
use crate::labels::LabelProvider;
use crate::model::ConstraintExecutable;
use crate::named_nodes::vars;
use crate::report::{ResultsSink, Violation};
use crate::runtime::engine::{ResultRows, Row};
use crate::runtime::message;
use oxigraph::model::Term;

fn is_node(term: &Term) -> bool {
    !matches!(term, Term::Literal(_))
}

/// Builds the violation reported for one result row.
pub fn build_violation(
    row: &Row,
    executable: &ConstraintExecutable<'_>,
    labels: &dyn LabelProvider,
) -> Violation {
    let mut violation = Violation::new(executable.severity(), executable.constraint().node.clone());

    // an explicit ?message replaces the declared messages
    violation.messages = match row.get(vars::MESSAGE) {
        Some(message) => vec![message.clone()],
        None => executable
            .messages()
            .iter()
            .map(|template| message::substitute(template, row, labels).into())
            .collect(),
    };

    violation.predicate = [vars::PREDICATE, vars::PATH]
        .into_iter()
        .filter_map(|name| row.get(name))
        .find(|term| is_node(term))
        .cloned()
        .or_else(|| executable.predicate().cloned().map(Term::from));

    violation.object = row.get(vars::OBJECT).cloned();
    violation.subject = row.get(vars::SUBJECT).filter(|term| is_node(term)).cloned();
    violation.root = row
        .get(vars::ROOT)
        .or_else(|| row.get(vars::THIS))
        .cloned();

    violation
}

/// Appends one violation per row, in engine order, and returns the row count.
///
/// The session held by `rows` is released when this returns, on every path.
pub fn interpret_rows(
    rows: ResultRows<'_>,
    executable: &ConstraintExecutable<'_>,
    labels: &dyn LabelProvider,
    sink: &dyn ResultsSink,
) -> Result<usize, ExecutionError> {
    let mut count = 0;
    for row in rows {
        let row = row?;
        sink.append(build_violation(&row, executable, labels));
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::labels::DisplayLabels;
    use crate::model::Constraint;
    use crate::report::ValidationResults;
    use crate::types::Severity;
    use oxigraph::model::{Literal, NamedNode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/ns#{local}"))
    }

    fn constraint() -> Constraint {
        let mut constraint = Constraint::new(ex("c"))
            .with_sparql("SELECT ?this WHERE {}")
            .with_message(Literal::new_simple_literal("{?this} has bad value {?value}"));
        constraint.predicate = Some(ex("age"));
        constraint.severity = Some(Severity::Warning);
        constraint
    }

    #[test]
    fn default_messages_are_templated_and_static_fields_fill_in() {
        let constraint = constraint();
        let row = Row::new()
            .with("this", ex("alice"))
            .with("value", Literal::from(-3));

        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.severity, Severity::Warning);
        assert_eq!(violation.source, Term::from(ex("c")));
        assert_eq!(violation.message_texts(), vec!["alice has bad value -3"]);
        assert_eq!(violation.predicate, Some(ex("age").into()));
        assert_eq!(violation.root, Some(ex("alice").into()));
        assert_eq!(violation.subject, None);
        assert_eq!(violation.object, None);
    }

    #[test]
    fn row_message_replaces_declared_messages_verbatim() {
        let constraint = constraint();
        let row = Row::new().with("message", Literal::new_simple_literal("custom {?this}"));
        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.message_texts(), vec!["custom {?this}"]);
    }

    #[test]
    fn row_bindings_take_precedence_over_declarations() {
        let constraint = constraint();
        let row = Row::new()
            .with("this", ex("alice"))
            .with("root", ex("root"))
            .with("path", ex("knows"))
            .with("subject", ex("bob"))
            .with("object", Literal::from(7));

        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.predicate, Some(ex("knows").into()));
        assert_eq!(violation.root, Some(ex("root").into()));
        assert_eq!(violation.subject, Some(ex("bob").into()));
        assert_eq!(violation.object, Some(Literal::from(7).into()));
    }

    #[test]
    fn literal_predicate_and_subject_are_ignored() {
        let constraint = constraint();
        let row = Row::new()
            .with("predicate", Literal::new_simple_literal("not a node"))
            .with("subject", Literal::new_simple_literal("nor this"));

        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.predicate, Some(ex("age").into()));
        assert_eq!(violation.subject, None);
        assert_eq!(violation.root, None);
    }

    #[test]
    fn literal_path_falls_back_to_static_predicate() {
        let constraint = constraint();
        let row = Row::new()
            .with("this", ex("alice"))
            .with("path", Literal::new_simple_literal("age"));

        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.predicate, Some(ex("age").into()));

        let mut bare = constraint.clone();
        bare.predicate = None;
        let violation = build_violation(&row, &bare.executable(), &DisplayLabels);
        assert_eq!(violation.predicate, None);

        let row = Row::new()
            .with("predicate", Literal::from(1))
            .with("path", ex("knows"));
        let violation = build_violation(&row, &constraint.executable(), &DisplayLabels);
        assert_eq!(violation.predicate, Some(ex("knows").into()));
    }

    #[test]
    fn rows_are_counted_and_session_released_on_error() {
        let constraint = constraint();
        let results = ValidationResults::new();
        let released = AtomicUsize::new(0);

        let rows = ResultRows::new(
            vec![Ok(Row::new().with("this", ex("a"))), Ok(Row::new().with("this", ex("b")))]
                .into_iter(),
        )
        .on_release(|| {
            released.fetch_add(1, Ordering::SeqCst);
        });
        let count = interpret_rows(rows, &constraint.executable(), &DisplayLabels, &results).unwrap();
        assert_eq!(count, 2);
        assert_eq!(results.violations()[1].root, Some(ex("b").into()));

        let failing = ResultRows::new(
            vec![Ok(Row::new()), Err(EngineError::Evaluation("timeout".into()))].into_iter(),
        )
        .on_release(|| {
            released.fetch_add(1, Ordering::SeqCst);
        });
        assert!(interpret_rows(failing, &constraint.executable(), &DisplayLabels, &results).is_err());
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }
}
