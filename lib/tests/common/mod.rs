//! Helpers shared by the integration tests.

use oxigraph::model::{Graph, NamedNode, Term};
use petgraph::algo::is_isomorphic_matching;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Subjects and objects as nodes, one predicate-labelled edge per triple.
fn to_digraph(graph: &Graph) -> DiGraph<Term, NamedNode> {
    let mut digraph = DiGraph::new();
    let mut nodes: HashMap<Term, NodeIndex> = HashMap::new();
    let mut node = |term: Term, digraph: &mut DiGraph<Term, NamedNode>| {
        *nodes
            .entry(term.clone())
            .or_insert_with(|| digraph.add_node(term))
    };
    for triple in graph.iter() {
        let subject = node(triple.subject.into_owned().into(), &mut digraph);
        let object = node(triple.object.into_owned(), &mut digraph);
        digraph.add_edge(subject, object, triple.predicate.into_owned());
    }
    digraph
}

/// Whether two result graphs agree once the blank nodes standing for
/// violations are matched up.
pub fn same_results(actual: &Graph, expected: &Graph) -> bool {
    is_isomorphic_matching(
        &to_digraph(actual),
        &to_digraph(expected),
        |left, right| match (left, right) {
            (Term::BlankNode(_), Term::BlankNode(_)) => true,
            _ => left == right,
        },
        |left, right| left == right,
    )
}
