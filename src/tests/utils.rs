use petgraph::{graph::UnGraph, visit::EdgeRef};

use crate::core::{FactorGraph, FactorNode, NodeId, VariableNode};

pub(super) fn vnode(i: usize) -> VariableNode {
    VariableNode::new(format!("x{i}"))
}

pub(super) fn fnode(j: usize, function: Option<()>) -> FactorNode<()> {
    FactorNode::new(format!("f{j}"), function)
}

/// Node weights and edge endpoints of a graph, used to check that a graph is unchanged
pub(super) fn snapshot<N: Clone, E>(graph: &UnGraph<N, E>) -> (Vec<N>, Vec<(usize, usize)>) {
    let nodes = graph.node_weights().cloned().collect();
    let edges = graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .collect();
    (nodes, edges)
}

/// Labels of neighbors of a node sorted alphabetically
pub(super) fn neighbor_labels<M, P>(fg: &FactorGraph<M, P>, id: NodeId) -> Vec<String> {
    let mut labels: Vec<_> = fg
        .neighbors(id)
        .unwrap()
        .into_iter()
        .map(|n| fg.node(n).unwrap().label().to_owned())
        .collect();
    labels.sort();
    labels
}

/// Checks that every edge connects a variable and a factor
pub(super) fn assert_bipartite<M, P>(fg: &FactorGraph<M, P>) {
    fg.validate().unwrap();
    for edge in fg.edges() {
        let (s, t) = edge.endpoints();
        assert_ne!(fg.kind(s).unwrap(), fg.kind(t).unwrap());
    }
}
