//! Adds scope-shape and selector clauses to a parsed SELECT query, and exposes
//! pre-bound variables in its projection.
//!
//! The clauses are joined into the root graph pattern of the query algebra, so
//! text that merely looks like `WHERE {` inside string literals, IRIs or comments
//! never influences where they land.

use crate::error::ExecutionError;
use crate::named_nodes::{vars, SHACL};
use oxigraph::model::NamedNode;
use spargebra::algebra::{
    AggregateExpression, Expression, Function, GraphPattern, OrderExpression,
};
use spargebra::term::{
    NamedNode as AlgebraNamedNode, NamedNodePattern, TermPattern, TriplePattern, Variable,
};
use spargebra::Query;
use std::collections::HashSet;

fn variable(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

/// `sh:hasShape(?this, ?scopeI, ?shapesGraph)`
fn has_shape_call(index: usize) -> Expression {
    let has_shape = AlgebraNamedNode::new_unchecked(SHACL::new().has_shape.as_str());
    Expression::FunctionCall(
        Function::Custom(has_shape),
        vec![
            Expression::Variable(variable(vars::THIS)),
            Expression::Variable(variable(&vars::scope(index))),
            Expression::Variable(variable(vars::SHAPES_GRAPH)),
        ],
    )
}

fn empty_group() -> GraphPattern {
    GraphPattern::Bgp {
        patterns: Vec::new(),
    }
}

fn join(left: GraphPattern, right: GraphPattern) -> GraphPattern {
    GraphPattern::Join {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// One independent `{ FILTER sh:hasShape(...) }` group per scope shape.
fn scope_block(scope_count: usize) -> Option<GraphPattern> {
    (0..scope_count)
        .map(|i| GraphPattern::Filter {
            expr: has_shape_call(i),
            inner: Box::new(empty_group()),
        })
        .reduce(join)
}

/// `{ ?this <selector> ?typeClass . FILTER sh:hasShape(...) ... }`
fn selector_block(scope_count: usize, selector: &NamedNode) -> GraphPattern {
    let binding = TriplePattern {
        subject: TermPattern::Variable(variable(vars::THIS)),
        predicate: NamedNodePattern::NamedNode(AlgebraNamedNode::new_unchecked(
            selector.as_str(),
        )),
        object: TermPattern::Variable(variable(vars::TYPE_CLASS)),
    };
    (0..scope_count).fold(
        GraphPattern::Bgp {
            patterns: vec![binding],
        },
        |inner, i| GraphPattern::Filter {
            expr: has_shape_call(i),
            inner: Box::new(inner),
        },
    )
}

/// True when `pattern` is a chain of SELECT expressions / HAVING filters over
/// a GROUP BY, i.e. not yet the WHERE clause itself.
fn leads_to_group(pattern: &GraphPattern) -> bool {
    match pattern {
        GraphPattern::Group { .. } => true,
        GraphPattern::Extend { inner, .. } | GraphPattern::Filter { inner, .. } => {
            leads_to_group(inner)
        }
        _ => false,
    }
}

/// Joins `block` in front of the root WHERE pattern, descending through the
/// solution modifiers of the outermost SELECT only. Subqueries are left alone.
fn inject(pattern: GraphPattern, block: GraphPattern, projected: bool) -> GraphPattern {
    match pattern {
        GraphPattern::Distinct { inner } if !projected => GraphPattern::Distinct {
            inner: Box::new(inject(*inner, block, projected)),
        },
        GraphPattern::Reduced { inner } if !projected => GraphPattern::Reduced {
            inner: Box::new(inject(*inner, block, projected)),
        },
        GraphPattern::Slice {
            inner,
            start,
            length,
        } if !projected => GraphPattern::Slice {
            inner: Box::new(inject(*inner, block, projected)),
            start,
            length,
        },
        GraphPattern::Project { inner, variables } if !projected => GraphPattern::Project {
            inner: Box::new(inject(*inner, block, true)),
            variables,
        },
        GraphPattern::OrderBy { inner, expression } => GraphPattern::OrderBy {
            inner: Box::new(inject(*inner, block, projected)),
            expression,
        },
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } if leads_to_group(&inner) => GraphPattern::Extend {
            inner: Box::new(inject(*inner, block, projected)),
            variable,
            expression,
        },
        GraphPattern::Filter { expr, inner } if leads_to_group(&inner) => GraphPattern::Filter {
            expr,
            inner: Box::new(inject(*inner, block, projected)),
        },
        GraphPattern::Group {
            inner,
            variables,
            aggregates,
        } => GraphPattern::Group {
            inner: Box::new(join(block, *inner)),
            variables,
            aggregates,
        },
        other => join(block, other),
    }
}

fn rewrite_select(query: &Query, block: GraphPattern) -> Result<Query, ExecutionError> {
    match query {
        Query::Select {
            dataset,
            pattern,
            base_iri,
        } => Ok(Query::Select {
            dataset: dataset.clone(),
            pattern: inject(pattern.clone(), block, false),
            base_iri: base_iri.clone(),
        }),
        _ => Err(ExecutionError::Rewrite {
            query: query.to_string(),
        }),
    }
}

/// Restricts `?this` to nodes conforming to every scope shape `?scope0..?scopeN-1`.
pub fn with_scope_clause(query: &Query, scope_count: usize) -> Result<Query, ExecutionError> {
    match scope_block(scope_count) {
        Some(block) => {
            log::debug!("Adding {scope_count} scope clause(s) to query");
            rewrite_select(query, block)
        }
        None => match query {
            Query::Select { .. } => Ok(query.clone()),
            _ => Err(ExecutionError::Rewrite {
                query: query.to_string(),
            }),
        },
    }
}

/// Binds `?this` through `selector` to `?typeClass`, then applies the scope
/// shape tests, all in one block at the start of the root pattern.
pub fn with_selector_clause(
    query: &Query,
    scope_count: usize,
    selector: &NamedNode,
) -> Result<Query, ExecutionError> {
    log::debug!(
        "Adding selector clause via <{}> with {scope_count} scope clause(s)",
        selector.as_str()
    );
    rewrite_select(query, selector_block(scope_count, selector))
}

fn add_term_variable(term: &TermPattern, out: &mut HashSet<String>) {
    if let TermPattern::Variable(v) = term {
        out.insert(v.as_str().to_string());
    }
}

fn expression_variables(expr: &Expression, out: &mut HashSet<String>) {
    match expr {
        Expression::Variable(v) | Expression::Bound(v) => {
            out.insert(v.as_str().to_string());
        }
        Expression::NamedNode(_) | Expression::Literal(_) => {}
        Expression::Or(a, b)
        | Expression::And(a, b)
        | Expression::Equal(a, b)
        | Expression::SameTerm(a, b)
        | Expression::Greater(a, b)
        | Expression::GreaterOrEqual(a, b)
        | Expression::Less(a, b)
        | Expression::LessOrEqual(a, b)
        | Expression::Add(a, b)
        | Expression::Subtract(a, b)
        | Expression::Multiply(a, b)
        | Expression::Divide(a, b) => {
            expression_variables(a, out);
            expression_variables(b, out);
        }
        Expression::UnaryPlus(a) | Expression::UnaryMinus(a) | Expression::Not(a) => {
            expression_variables(a, out)
        }
        Expression::If(a, b, c) => {
            expression_variables(a, out);
            expression_variables(b, out);
            expression_variables(c, out);
        }
        Expression::In(a, list) => {
            expression_variables(a, out);
            list.iter().for_each(|e| expression_variables(e, out));
        }
        Expression::Coalesce(list) | Expression::FunctionCall(_, list) => {
            list.iter().for_each(|e| expression_variables(e, out))
        }
        Expression::Exists(pattern) => pattern_variables(pattern, out),
    }
}

fn pattern_variables(pattern: &GraphPattern, out: &mut HashSet<String>) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for triple in patterns {
                add_term_variable(&triple.subject, out);
                if let NamedNodePattern::Variable(v) = &triple.predicate {
                    out.insert(v.as_str().to_string());
                }
                add_term_variable(&triple.object, out);
            }
        }
        GraphPattern::Path {
            subject, object, ..
        } => {
            add_term_variable(subject, out);
            add_term_variable(object, out);
        }
        GraphPattern::Join { left, right }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right } => {
            pattern_variables(left, out);
            pattern_variables(right, out);
        }
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => {
            pattern_variables(left, out);
            pattern_variables(right, out);
            if let Some(expr) = expression {
                expression_variables(expr, out);
            }
        }
        GraphPattern::Filter { expr, inner } => {
            expression_variables(expr, out);
            pattern_variables(inner, out);
        }
        GraphPattern::Graph { name, inner } => {
            if let NamedNodePattern::Variable(v) = name {
                out.insert(v.as_str().to_string());
            }
            pattern_variables(inner, out);
        }
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => {
            out.insert(variable.as_str().to_string());
            expression_variables(expression, out);
            pattern_variables(inner, out);
        }
        GraphPattern::Values { variables, .. } => {
            out.extend(variables.iter().map(|v| v.as_str().to_string()));
        }
        GraphPattern::OrderBy { inner, expression } => {
            for order in expression {
                match order {
                    OrderExpression::Asc(e) | OrderExpression::Desc(e) => expression_variables(e, out),
                }
            }
            pattern_variables(inner, out);
        }
        GraphPattern::Project { inner, variables } => {
            out.extend(variables.iter().map(|v| v.as_str().to_string()));
            pattern_variables(inner, out);
        }
        GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => pattern_variables(inner, out),
        GraphPattern::Group {
            inner,
            variables,
            aggregates,
        } => {
            out.extend(variables.iter().map(|v| v.as_str().to_string()));
            for (target, aggregate) in aggregates {
                out.insert(target.as_str().to_string());
                if let AggregateExpression::FunctionCall { expr, .. } = aggregate {
                    expression_variables(expr, out);
                }
            }
            pattern_variables(inner, out);
        }
        // federated patterns are evaluated remotely
        _ => {}
    }
}

fn root_pattern(query: &Query) -> &GraphPattern {
    match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => pattern,
    }
}

/// Every variable named anywhere in `query`, subqueries included.
pub fn mentioned_variables(query: &Query) -> HashSet<String> {
    let mut out = HashSet::new();
    pattern_variables(root_pattern(query), &mut out);
    out
}

/// The variables of the outermost SELECT projection, in order.
pub fn projected_variables(query: &Query) -> Vec<String> {
    fn find(pattern: &GraphPattern) -> Vec<String> {
        match pattern {
            GraphPattern::Distinct { inner }
            | GraphPattern::Reduced { inner }
            | GraphPattern::Slice { inner, .. } => find(inner),
            GraphPattern::Project { variables, .. } => {
                variables.iter().map(|v| v.as_str().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }
    match query {
        Query::Select { pattern, .. } => find(pattern),
        _ => Vec::new(),
    }
}

fn add_missing(variables: &mut Vec<Variable>, names: &[String], skip: &[&Variable]) {
    for name in names {
        if !variables.iter().chain(skip.iter().copied()).any(|v| v.as_str() == name) {
            variables.push(variable(name));
        }
    }
}

fn widen(pattern: GraphPattern, names: &[String], projected: bool) -> GraphPattern {
    match pattern {
        GraphPattern::Distinct { inner } if !projected => GraphPattern::Distinct {
            inner: Box::new(widen(*inner, names, projected)),
        },
        GraphPattern::Reduced { inner } if !projected => GraphPattern::Reduced {
            inner: Box::new(widen(*inner, names, projected)),
        },
        GraphPattern::Slice {
            inner,
            start,
            length,
        } if !projected => GraphPattern::Slice {
            inner: Box::new(widen(*inner, names, projected)),
            start,
            length,
        },
        GraphPattern::Project {
            inner,
            mut variables,
        } if !projected => {
            add_missing(&mut variables, names, &[]);
            GraphPattern::Project {
                inner: Box::new(widen(*inner, names, true)),
                variables,
            }
        }
        GraphPattern::OrderBy { inner, expression } if projected => GraphPattern::OrderBy {
            inner: Box::new(widen(*inner, names, projected)),
            expression,
        },
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } if projected && leads_to_group(&inner) => GraphPattern::Extend {
            inner: Box::new(widen(*inner, names, projected)),
            variable,
            expression,
        },
        GraphPattern::Filter { expr, inner } if projected && leads_to_group(&inner) => {
            GraphPattern::Filter {
                expr,
                inner: Box::new(widen(*inner, names, projected)),
            }
        }
        // a pre-bound variable is constant, so grouping by it keeps the groups
        GraphPattern::Group {
            inner,
            mut variables,
            aggregates,
        } if projected => {
            let targets: Vec<&Variable> = aggregates.iter().map(|(target, _)| target).collect();
            add_missing(&mut variables, names, &targets);
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            }
        }
        other => other,
    }
}

/// Adds `names` to the outermost SELECT projection, and to its grouping keys
/// when the query aggregates, so that engines which only pre-bind projected
/// variables can bind them. Other query forms are returned unchanged.
pub fn expose_variables(query: &Query, names: &[String]) -> Query {
    match query {
        Query::Select {
            dataset,
            pattern,
            base_iri,
        } if !names.is_empty() => Query::Select {
            dataset: dataset.clone(),
            pattern: widen(pattern.clone(), names, false),
            base_iri: base_iri.clone(),
        },
        _ => query.clone(),
    }
}
