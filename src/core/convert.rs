use std::{collections::HashSet, error::Error, fmt::Display};

use petgraph::{graph::UnGraph, visit::EdgeRef};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    factor_graph::{FGError, FactorGraph, NodeId, Origin},
    node::{FactorNode, Node, NodeKind, VariableNode},
};

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Errors that could appear while converting a graph to a factor graph
pub enum ConvertError {
    /// A node of a bipartite input graph has no part label
    MissingLabel {
        /// Index of the node in the input graph
        node: usize,
    },

    /// A part label is neither 0 (variable) nor 1 (factor)
    InvalidLabel {
        /// Index of the node in the input graph
        node: usize,

        /// The label found
        label: u8,
    },

    /// An edge of a bipartite input graph connects two nodes of the same part
    SamePartitionEdge {
        /// Index of the first endpoint in the input graph
        source: usize,

        /// Index of the second endpoint in the input graph
        target: usize,
    },

    /// Two edges of a bipartite input graph connect the same pair of nodes
    ParallelEdge {
        /// Index of the first endpoint in the input graph
        source: usize,

        /// Index of the second endpoint in the input graph
        target: usize,
    },

    /// A non-bipartite input graph has a self-loop
    SelfLoop {
        /// Index of the node in the input graph
        node: usize,
    },

    /// Node factories produced two nodes with the same label
    DuplicateLabel(String),

    /// A factor graph's method failed
    Graph(FGError),
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::MissingLabel { node } => write!(
                f,
                "Node {} of a bipartite graph has no part label (0 for variables, 1 for factors)",
                node,
            ),
            ConvertError::InvalidLabel { node, label } => write!(
                f,
                "Node {} has part label {}, must be either 0 (variable) or 1 (factor)",
                node, label,
            ),
            ConvertError::SamePartitionEdge { source, target } => write!(
                f,
                "Edge ({}, {}) connects two nodes of the same part",
                source, target,
            ),
            ConvertError::ParallelEdge { source, target } => write!(
                f,
                "Nodes {} and {} are connected more than once, a variable and a factor share at most one edge",
                source, target,
            ),
            ConvertError::SelfLoop { node } => {
                write!(f, "Node {} has a self-loop, it can not be replaced by a factor", node)
            }
            ConvertError::DuplicateLabel(label) => {
                write!(f, "Node factories produced label {:?} more than once", label)
            }
            ConvertError::Graph(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConvertError::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FGError> for ConvertError {
    fn from(err: FGError) -> Self {
        ConvertError::Graph(err)
    }
}

/// Conversion result type
pub type ConvertResult<T> = Result<T, ConvertError>;

// ------------------------------------------------------------------------------------------

/// Node weights of an input graph that may carry a bipartite part label:
/// 0 marks a variable, 1 marks a factor.
///
/// Only bipartite conversion reads the label, so plain node types
/// implement this trait with the default method.
pub trait PartLabel {
    #[inline]
    fn part_label(&self) -> Option<u8> {
        None
    }
}

macro_rules! impl_unlabeled {
    ($($t:ty),* $(,)?) => {
        $(impl PartLabel for $t {})*
    };
}

impl_unlabeled!(usize, u8, u16, u32, u64, isize, i32, i64, char, String, &str, ());

/// An input graph node weight with an explicit part label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Labeled<T> {
    /// Caller's identity of the node
    pub id: T,

    /// Part label, 0 for variables and 1 for factors
    pub bipartite: Option<u8>,
}

impl<T> Labeled<T> {
    pub const VARIABLE: u8 = 0;
    pub const FACTOR: u8 = 1;

    #[inline]
    pub fn variable(id: T) -> Self {
        Labeled {
            id,
            bipartite: Some(Self::VARIABLE),
        }
    }

    #[inline]
    pub fn factor(id: T) -> Self {
        Labeled {
            id,
            bipartite: Some(Self::FACTOR),
        }
    }

    #[inline]
    pub fn unlabeled(id: T) -> Self {
        Labeled {
            id,
            bipartite: None,
        }
    }
}

impl<T> PartLabel for Labeled<T> {
    #[inline]
    fn part_label(&self) -> Option<u8> {
        self.bipartite
    }
}

// public functions -------------------------------------------------------------------------

/// Converts an arbitrary undirected graph to a factor graph
///
/// # Arguments
///
/// * `graph` - An input graph, it is never modified
/// * `vnode` - A factory of variable nodes taking a variable's number
/// * `fnode` - A factory of factor nodes taking a factor's number and
///     an optional function (conversion always passes None)
/// * `bipartite` - Whether nodes of `graph` are labeled by parts
///
/// # Notes
///
/// If `bipartite` is true, every input node must have a part label,
/// nodes labeled 0 are replaced by variables and nodes labeled 1 by factors.
/// Parallel edges are rejected in this mode. Otherwise every input node is
/// replaced by a variable and every input edge, parallel ones included,
/// by its own factor connected to both of its variables.
///
/// Nodes are visited in the input graph's index order and edges in its
/// edge index order, the i-th visited variable is created by `vnode(i)` and
/// the j-th factor by `fnode(j, None)`. Every node of the result has an
/// origin: the input node it replaces or the input edge it was created for
///
/// # Example
///
/// ```
/// use fgrs::core::{convert_to_fg, FactorGraph, FactorNode, Origin, VariableNode};
/// use petgraph::graph::UnGraph;
///
/// // a path a - b - c
/// let mut graph = UnGraph::<&str, ()>::new_undirected();
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// let c = graph.add_node("c");
/// graph.add_edge(a, b, ());
/// graph.add_edge(b, c, ());
///
/// let fg: FactorGraph<f64, ()> = convert_to_fg(
///     &graph,
///     |i| VariableNode::new(format!("x{i}")),
///     |j, f| FactorNode::new(format!("f{j}"), f),
///     false,
/// ).unwrap();
///
/// assert_eq!(fg.get_vnodes().len(), 3);
/// assert_eq!(fg.get_fnodes().len(), 2);
/// assert_eq!(fg.edge_count(), 4);
/// let x1 = fg.find("x1").unwrap();
/// assert_eq!(fg.origin(x1), Some(Origin::Node(b)));
/// ```
pub fn convert_to_fg<N, E, M, P>(
    graph: &UnGraph<N, E>,
    mut vnode: impl FnMut(usize) -> VariableNode,
    mut fnode: impl FnMut(usize, Option<P>) -> FactorNode<P>,
    bipartite: bool,
) -> ConvertResult<FactorGraph<M, P>>
where
    N: PartLabel,
    M: Clone,
{
    let plan = Plan::new(graph, bipartite)?;
    let variables = (0..plan.variables_number).map(&mut vnode).collect();
    let factors = (0..plan.factors_number).map(|j| fnode(j, None)).collect();
    plan.assemble(graph, variables, factors)
}

/// Converts an arbitrary undirected graph to a factor graph calling
/// node factories in parallel.
///
/// # Notes
///
/// Factories run on the rayon thread pool, nodes and edges are inserted
/// afterwards on the calling thread in the same order as `convert_to_fg` does,
/// so both functions return equal graphs for equal factories.
///
/// # Example
///
/// ```
/// use fgrs::core::{convert_to_fg_par, FactorGraph, FactorNode, VariableNode};
/// use fgrs::generators::path;
///
/// let graph = path(100);
/// let fg: FactorGraph<f64, ()> = convert_to_fg_par(
///     &graph,
///     |i| VariableNode::new(format!("x{i}")),
///     |j, f| FactorNode::new(format!("f{j}"), f),
///     false,
/// ).unwrap();
/// assert_eq!(fg.get_fnodes().len(), 99);
/// ```
pub fn convert_to_fg_par<N, E, M, P>(
    graph: &UnGraph<N, E>,
    vnode: impl Fn(usize) -> VariableNode + Sync,
    fnode: impl Fn(usize, Option<P>) -> FactorNode<P> + Sync,
    bipartite: bool,
) -> ConvertResult<FactorGraph<M, P>>
where
    N: PartLabel,
    M: Clone,
    P: Send,
{
    let plan = Plan::new(graph, bipartite)?;
    let variables = (0..plan.variables_number)
        .into_par_iter()
        .map(|i| vnode(i))
        .collect();
    let factors = (0..plan.factors_number)
        .into_par_iter()
        .map(|j| fnode(j, None))
        .collect();
    plan.assemble(graph, variables, factors)
}

// private ----------------------------------------------------------------------------------

// Validated shape of a conversion, computed before any node is created
struct Plan {
    // kind of each input node, None when every input edge becomes a factor
    parts: Option<Vec<NodeKind>>,
    variables_number: usize,
    factors_number: usize,
}

impl Plan {
    fn new<N, E>(graph: &UnGraph<N, E>, bipartite: bool) -> ConvertResult<Self>
    where
        N: PartLabel,
    {
        debug!(
            bipartite,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "converting a graph to a factor graph"
        );
        if !bipartite {
            if let Some(e) = graph.edge_references().find(|e| e.source() == e.target()) {
                return Err(ConvertError::SelfLoop {
                    node: e.source().index(),
                });
            }
            return Ok(Plan {
                parts: None,
                variables_number: graph.node_count(),
                factors_number: graph.edge_count(),
            });
        }
        let parts = graph
            .node_indices()
            .map(|i| match graph[i].part_label() {
                Some(0) => Ok(NodeKind::Variable),
                Some(1) => Ok(NodeKind::Factor),
                Some(label) => Err(ConvertError::InvalidLabel {
                    node: i.index(),
                    label,
                }),
                None => Err(ConvertError::MissingLabel { node: i.index() }),
            })
            .collect::<ConvertResult<Vec<_>>>()?;
        let mut pairs = HashSet::with_capacity(graph.edge_count());
        for e in graph.edge_references() {
            let (s, t) = (e.source().index(), e.target().index());
            if parts[s] == parts[t] {
                return Err(ConvertError::SamePartitionEdge {
                    source: s,
                    target: t,
                });
            }
            if !pairs.insert((s.min(t), s.max(t))) {
                return Err(ConvertError::ParallelEdge {
                    source: s,
                    target: t,
                });
            }
        }
        let variables_number = parts.iter().filter(|&&k| k == NodeKind::Variable).count();
        Ok(Plan {
            variables_number,
            factors_number: parts.len() - variables_number,
            parts: Some(parts),
        })
    }

    fn assemble<N, E, M, P>(
        self,
        graph: &UnGraph<N, E>,
        variables: Vec<VariableNode>,
        factors: Vec<FactorNode<P>>,
    ) -> ConvertResult<FactorGraph<M, P>>
    where
        M: Clone,
    {
        check_labels(&variables, &factors)?;
        let edges_capacity = match self.parts {
            Some(_) => graph.edge_count(),
            None => 2 * graph.edge_count(),
        };
        let mut fg = FactorGraph::with_capacity(
            variables.len() + factors.len(),
            edges_capacity,
        );
        let mut variables = variables.into_iter();
        let mut factors = factors.into_iter();

        // ids[i] is the factor graph node replacing the i-th input node
        let mut ids = Vec::with_capacity(graph.node_count());
        for i in graph.node_indices() {
            let kind = match &self.parts {
                Some(parts) => parts[i.index()],
                None => NodeKind::Variable,
            };
            let node: Option<Node<P>> = match kind {
                NodeKind::Variable => variables.next().map(Node::from),
                NodeKind::Factor => factors.next().map(Node::from),
            };
            // factories' outputs are sized by the plan's counts of each kind
            let Some(node) = node else {
                unreachable!("the plan has fewer {} nodes than the input graph", kind);
            };
            let id = fg.set_node(node)?;
            fg.set_origin(id, Origin::Node(i))?;
            ids.push(id);
        }

        // a copy of the input graph with nodes relabeled to their replacements
        let relabeled: UnGraph<NodeId, ()> = graph.map(|i, _| ids[i.index()], |_, _| ());
        match self.parts {
            Some(_) => {
                for e in relabeled.edge_references() {
                    fg.set_edge(relabeled[e.source()], relabeled[e.target()], None)?;
                }
            }
            None => {
                for (e, factor) in relabeled.edge_references().zip(factors) {
                    let f = fg.set_node(factor)?;
                    fg.set_origin(f, Origin::Edge(e.id()))?;
                    fg.set_edge(relabeled[e.source()], f, None)?;
                    fg.set_edge(f, relabeled[e.target()], None)?;
                }
            }
        }

        debug!(
            variables = fg.get_vnodes().len(),
            factors = fg.get_fnodes().len(),
            edges = fg.edge_count(),
            "conversion finished"
        );
        Ok(fg)
    }
}

#[inline]
fn check_labels<P>(variables: &[VariableNode], factors: &[FactorNode<P>]) -> ConvertResult<()> {
    let mut seen = HashSet::with_capacity(variables.len() + factors.len());
    let labels = variables
        .iter()
        .map(|v| v.label())
        .chain(factors.iter().map(|f| f.label()));
    for label in labels {
        if !seen.insert(label) {
            return Err(ConvertError::DuplicateLabel(label.to_owned()));
        }
    }
    Ok(())
}
