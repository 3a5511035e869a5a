use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use rand::{thread_rng, Rng};

use crate::{
    core::{
        convert_to_fg, convert_to_fg_par, ConvertError, FactorGraph, FactorNode, Labeled,
        NodeKind, Origin, VariableNode,
    },
    generators::{gnp, path, random_bipartite},
    tests::utils::{assert_bipartite, fnode, neighbor_labels, snapshot, vnode},
};

type FG = FactorGraph<f64, ()>;

// ------------------------------------------------------------------------------------------

#[test]
fn path_of_three_nodes() {
    let mut graph = UnGraph::<&str, ()>::new_undirected();
    let a = graph.add_node("a");
    let b = graph.add_node("b");
    let c = graph.add_node("c");
    graph.add_edge(a, b, ());
    graph.add_edge(b, c, ());
    let fg: FG = convert_to_fg(&graph, vnode, fnode, false).unwrap();
    assert_eq!(fg.get_vnodes().len(), 3);
    assert_eq!(fg.get_fnodes().len(), 2);
    assert_eq!(fg.edge_count(), 4);
    for f in fg.get_fnodes() {
        assert_eq!(fg.degree(f).unwrap(), 2);
    }
    assert_bipartite(&fg);
    // --------------------------------------------------------------------------------------
    // the j-th factor replaces the j-th edge
    let f0 = fg.find("f0").unwrap();
    let f1 = fg.find("f1").unwrap();
    assert_eq!(neighbor_labels(&fg, f0), ["x0", "x1"]);
    assert_eq!(neighbor_labels(&fg, f1), ["x1", "x2"]);
    assert_eq!(fg.origin(f0), Some(Origin::Edge(EdgeIndex::new(0))));
    assert_eq!(fg.origin(f1), Some(Origin::Edge(EdgeIndex::new(1))));
    for (label, origin) in [("x0", a), ("x1", b), ("x2", c)] {
        let x = fg.find(label).unwrap();
        assert_eq!(fg.origin(x), Some(Origin::Node(origin)));
    }
}

#[test]
fn labeled_bipartite_graph() {
    let mut graph = UnGraph::<Labeled<&str>, ()>::new_undirected();
    let v1 = graph.add_node(Labeled::variable("v1"));
    let v2 = graph.add_node(Labeled::variable("v2"));
    let f1 = graph.add_node(Labeled::factor("f1"));
    graph.add_edge(v1, f1, ());
    graph.add_edge(v2, f1, ());
    let fg: FG = convert_to_fg(&graph, vnode, fnode, true).unwrap();
    assert_eq!(fg.get_vnodes().len(), 2);
    assert_eq!(fg.get_fnodes().len(), 1);
    assert_eq!(fg.edge_count(), 2);
    assert_bipartite(&fg);
    // --------------------------------------------------------------------------------------
    let f = fg.get_fnodes()[0];
    assert_eq!(fg.node(f).unwrap().label(), "f0");
    assert_eq!(fg.origin(f), Some(Origin::Node(f1)));
    assert_eq!(graph[fg.origin(f).unwrap().node().unwrap()].id, "f1");
    assert_eq!(neighbor_labels(&fg, f), ["x0", "x1"]);
}

#[test]
fn factory_numbers_follow_input_order() {
    let mut graph = UnGraph::<Labeled<usize>, ()>::new_undirected();
    let fa = graph.add_node(Labeled::factor(0));
    let va = graph.add_node(Labeled::variable(1));
    let fb = graph.add_node(Labeled::factor(2));
    let vb = graph.add_node(Labeled::variable(3));
    graph.add_edge(va, fa, ());
    graph.add_edge(fb, vb, ());
    graph.add_edge(va, fb, ());
    let mut vcalls = Vec::new();
    let mut fcalls = Vec::new();
    let fg: FG = convert_to_fg(
        &graph,
        |i| {
            vcalls.push(i);
            vnode(i)
        },
        |j, f| {
            fcalls.push(j);
            fnode(j, f)
        },
        true,
    )
    .unwrap();
    assert_eq!(vcalls, [0, 1]);
    assert_eq!(fcalls, [0, 1]);
    for (label, origin) in [("f0", fa), ("x0", va), ("f1", fb), ("x1", vb)] {
        let id = fg.find(label).unwrap();
        assert_eq!(fg.origin(id), Some(Origin::Node(origin)));
    }
    let labels: Vec<_> = fg.nodes().map(|(_, n)| n.label().to_owned()).collect();
    assert_eq!(labels, ["f0", "x0", "f1", "x1"]);
    assert_eq!(neighbor_labels(&fg, fg.find("f1").unwrap()), ["x0", "x1"]);
}

#[test]
fn random_graphs_expand_edges() {
    let mut rng = thread_rng();
    for _ in 0..20 {
        let nodes_number = rng.gen_range(1..40);
        let p = rng.gen::<f64>();
        let graph = gnp(nodes_number, p, &mut rng).unwrap();
        let before = snapshot(&graph);
        let fg: FG = convert_to_fg(&graph, vnode, fnode, false).unwrap();
        assert_eq!(snapshot(&graph), before);
        // --------------------------------------------------------------------------------------
        assert_eq!(fg.get_vnodes().len(), graph.node_count());
        assert_eq!(fg.get_fnodes().len(), graph.edge_count());
        assert_eq!(fg.edge_count(), 2 * graph.edge_count());
        assert_bipartite(&fg);
        for f in fg.get_fnodes() {
            assert_eq!(fg.degree(f).unwrap(), 2);
            assert!(matches!(fg.origin(f), Some(Origin::Edge(_))));
        }
        for x in fg.get_vnodes() {
            let origin = fg.origin(x).unwrap().node().unwrap();
            assert_eq!(
                fg.degree(x).unwrap(),
                graph.neighbors(origin).count(),
            );
        }
        assert_origins_are_bijective(&fg, graph.node_count());
    }
}

#[test]
fn random_bipartite_graphs_keep_parts() {
    let mut rng = thread_rng();
    for _ in 0..20 {
        let variables_number = rng.gen_range(0..20);
        let factors_number = rng.gen_range(0..20);
        let graph =
            random_bipartite(variables_number, factors_number, rng.gen::<f64>(), &mut rng).unwrap();
        let before = snapshot(&graph);
        let fg: FG = convert_to_fg(&graph, vnode, fnode, true).unwrap();
        assert_eq!(snapshot(&graph), before);
        // --------------------------------------------------------------------------------------
        assert_eq!(fg.get_vnodes().len(), variables_number);
        assert_eq!(fg.get_fnodes().len(), factors_number);
        assert_eq!(fg.edge_count(), graph.edge_count());
        assert_bipartite(&fg);
        for (id, node) in fg.nodes() {
            let origin = fg.origin(id).unwrap().node().unwrap();
            let expected = match graph[origin].bipartite {
                Some(0) => NodeKind::Variable,
                _ => NodeKind::Factor,
            };
            assert_eq!(node.kind(), expected);
        }
        assert_origins_are_bijective(&fg, graph.node_count());
    }
}

#[test]
fn parallel_conversion_matches_sequential() {
    let mut rng = thread_rng();
    let graph = gnp(50, 0.2, &mut rng).unwrap();
    let seq: FG = convert_to_fg(&graph, vnode, fnode, false).unwrap();
    let par: FG = convert_to_fg_par(&graph, vnode, fnode, false).unwrap();
    assert_eq!(seq.summary(), par.summary());
    for ((s, sn), (p, pn)) in seq.nodes().zip(par.nodes()) {
        assert_eq!(sn.label(), pn.label());
        assert_eq!(seq.origin(s), par.origin(p));
        assert_eq!(neighbor_labels(&seq, s), neighbor_labels(&par, p));
    }
    // --------------------------------------------------------------------------------------
    let graph = random_bipartite(10, 5, 0.5, &mut rng).unwrap();
    let seq: FG = convert_to_fg(&graph, vnode, fnode, true).unwrap();
    let par: FG = convert_to_fg_par(&graph, vnode, fnode, true).unwrap();
    assert_eq!(seq.summary(), par.summary());
    for ((_, sn), (_, pn)) in seq.nodes().zip(par.nodes()) {
        assert_eq!(sn.label(), pn.label());
    }
}

#[test]
fn empty_graph() {
    let graph = UnGraph::<usize, ()>::new_undirected();
    let fg: FG = convert_to_fg(&graph, vnode, fnode, false).unwrap();
    assert_eq!(fg.node_count(), 0);
    let fg: FG = convert_to_fg(&path(1), vnode, fnode, false).unwrap();
    assert_eq!(fg.get_vnodes().len(), 1);
    assert_eq!(fg.edge_count(), 0);
}

// errors -----------------------------------------------------------------------------------

#[test]
fn bipartite_conversion_requires_labels() {
    let mut graph = UnGraph::<Labeled<usize>, ()>::new_undirected();
    let v = graph.add_node(Labeled::variable(0));
    let u = graph.add_node(Labeled::unlabeled(1));
    graph.add_edge(v, u, ());
    let result: Result<FG, _> = convert_to_fg(&graph, vnode, fnode, true);
    assert_eq!(result.unwrap_err(), ConvertError::MissingLabel { node: 1 });
    // plain node weights have no labels at all
    let result: Result<FG, _> = convert_to_fg(&path(2), vnode, fnode, true);
    assert_eq!(result.unwrap_err(), ConvertError::MissingLabel { node: 0 });
    // but they are fine without bipartite labels
    let result: Result<FG, _> = convert_to_fg(&graph, vnode, fnode, false);
    assert!(result.is_ok());
}

#[test]
fn bipartite_conversion_rejects_bad_labels() {
    let mut graph = UnGraph::<Labeled<usize>, ()>::new_undirected();
    graph.add_node(Labeled::variable(0));
    graph.add_node(Labeled {
        id: 1,
        bipartite: Some(2),
    });
    let result: Result<FG, _> = convert_to_fg(&graph, vnode, fnode, true);
    assert_eq!(
        result.unwrap_err(),
        ConvertError::InvalidLabel { node: 1, label: 2 }
    );
}

#[test]
fn bipartite_conversion_rejects_edges_inside_a_part() {
    let mut graph = UnGraph::<Labeled<usize>, ()>::new_undirected();
    let v = graph.add_node(Labeled::variable(0));
    let w = graph.add_node(Labeled::variable(1));
    let f = graph.add_node(Labeled::factor(2));
    graph.add_edge(v, f, ());
    graph.add_edge(v, w, ());
    let mut calls = 0;
    let result: Result<FG, _> = convert_to_fg(
        &graph,
        |i| {
            calls += 1;
            vnode(i)
        },
        fnode,
        true,
    );
    assert_eq!(
        result.unwrap_err(),
        ConvertError::SamePartitionEdge {
            source: 0,
            target: 1
        }
    );
    assert_eq!(calls, 0);
}

#[test]
fn self_loops_are_rejected() {
    let mut graph = path(3);
    graph.add_edge(NodeIndex::new(2), NodeIndex::new(2), ());
    let result: Result<FG, _> = convert_to_fg(&graph, vnode, fnode, false);
    assert_eq!(result.unwrap_err(), ConvertError::SelfLoop { node: 2 });
}

#[test]
fn parallel_edges_get_own_factors() {
    let mut graph = path(2);
    graph.add_edge(NodeIndex::new(1), NodeIndex::new(0), ());
    let fg: FG = convert_to_fg(&graph, vnode, fnode, false).unwrap();
    assert_eq!(fg.get_vnodes().len(), 2);
    assert_eq!(fg.get_fnodes().len(), 2);
    assert_eq!(fg.edge_count(), 4);
    assert_bipartite(&fg);
    let f0 = fg.find("f0").unwrap();
    let f1 = fg.find("f1").unwrap();
    assert_eq!(fg.origin(f0), Some(Origin::Edge(EdgeIndex::new(0))));
    assert_eq!(fg.origin(f1), Some(Origin::Edge(EdgeIndex::new(1))));
    assert_eq!(neighbor_labels(&fg, f0), ["x0", "x1"]);
    assert_eq!(neighbor_labels(&fg, f1), ["x0", "x1"]);
}

#[test]
fn bipartite_conversion_rejects_parallel_edges() {
    let mut graph = UnGraph::<Labeled<usize>, ()>::new_undirected();
    let x = graph.add_node(Labeled::variable(0));
    let f = graph.add_node(Labeled::factor(1));
    graph.add_edge(x, f, ());
    graph.add_edge(f, x, ());
    let result: Result<FG, _> = convert_to_fg(&graph, vnode, fnode, true);
    assert_eq!(
        result.unwrap_err(),
        ConvertError::ParallelEdge {
            source: f.index(),
            target: x.index(),
        }
    );
    // a single edge between them is fine
    graph.remove_edge(EdgeIndex::new(1));
    let fg: FG = convert_to_fg(&graph, vnode, fnode, true).unwrap();
    assert_eq!(fg.edge_count(), 1);
}

#[test]
fn duplicate_labels_are_rejected() {
    let result: Result<FG, _> = convert_to_fg(
        &path(3),
        |_| VariableNode::new("x"),
        |j, f| FactorNode::new(format!("f{j}"), f),
        false,
    );
    assert_eq!(
        result.unwrap_err(),
        ConvertError::DuplicateLabel("x".into())
    );
    // variables and factors share a namespace
    let result: Result<FG, _> = convert_to_fg(
        &path(3),
        |i| VariableNode::new(format!("n{i}")),
        |j, f| FactorNode::new(format!("n{j}"), f),
        false,
    );
    assert_eq!(
        result.unwrap_err(),
        ConvertError::DuplicateLabel("n0".into())
    );
}

// ------------------------------------------------------------------------------------------

fn assert_origins_are_bijective(fg: &FG, input_nodes_number: usize) {
    let origins: Vec<NodeIndex> = fg.origins().filter_map(|(_, o)| o.node()).collect();
    let unique: HashSet<_> = origins.iter().copied().collect();
    assert_eq!(origins.len(), input_nodes_number);
    assert_eq!(unique.len(), input_nodes_number);
    assert!(unique.iter().all(|n| n.index() < input_nodes_number));
    // every node of the result has an origin
    assert_eq!(fg.origins().count(), fg.node_count());
}
