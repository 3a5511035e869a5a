use std::{
    collections::{BTreeMap, HashMap},
    error::Error,
    fmt::Display,
};

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{
    edge::Edge,
    node::{FactorNode, GraphId, Node, NodeKind},
};

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Errors that could appear in factor graph's methods
pub enum FGError {
    /// A node id does not refer to a node of this graph
    DanglingReference {
        /// Index of the unknown node
        node: usize,
    },

    /// An edge connects two nodes of the same kind
    InvariantViolation {
        /// Index of the first endpoint
        source: usize,

        /// Index of the second endpoint
        target: usize,

        /// Kind shared by both endpoints
        kind: NodeKind,
    },

    /// There is no edge between two nodes
    NoSuchEdge {
        /// Index of the first endpoint
        source: usize,

        /// Index of the second endpoint
        target: usize,
    },

    /// A label is already taken by a node of another kind
    KindMismatch {
        /// Index of the existing node
        node: usize,

        /// Kind of the existing node
        kind: NodeKind,
    },
}

impl Display for FGError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FGError::DanglingReference { node } => write!(
                f,
                "Node {} does not belong to the factor graph, insert it with `set_node` first",
                node,
            ),
            FGError::InvariantViolation {
                source,
                target,
                kind,
            } => write!(
                f,
                "Edge ({}, {}) connects two {} nodes, every edge must connect a variable and a factor",
                source, target, kind,
            ),
            FGError::NoSuchEdge { source, target } => {
                write!(f, "There is no edge between nodes {} and {}", source, target)
            }
            FGError::KindMismatch { node, kind } => write!(
                f,
                "Node {} is a {} node, its kind can not be changed",
                node, kind,
            ),
        }
    }
}

impl Error for FGError {}

/// Factor graph's methods result type
pub type FGResult<T> = Result<T, FGError>;

// ------------------------------------------------------------------------------------------

/// Identifier of a node inside a particular factor graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    graph: GraphId,
    index: NodeIndex,
}

impl NodeId {
    /// Position of the node in the graph's node iteration order
    #[inline]
    pub fn index(&self) -> usize {
        self.index.index()
    }

    /// The graph that issued this id
    #[inline]
    pub fn graph(&self) -> GraphId {
        self.graph
    }
}

/// A value of a user supplied node attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Where a node of a converted factor graph came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The node replaces this node of the input graph
    Node(NodeIndex),

    /// The factor node was synthesized for this edge of the input graph
    Edge(EdgeIndex),
}

impl Origin {
    #[inline]
    pub fn node(&self) -> Option<NodeIndex> {
        match self {
            Origin::Node(n) => Some(*n),
            Origin::Edge(_) => None,
        }
    }
}

/// Short description of a factor graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Number of variable nodes
    pub variables_number: usize,

    /// Number of factor nodes
    pub factors_number: usize,

    /// Number of edges
    pub edges_number: usize,

    /// Maximal number of factors adjacent to a variable
    pub max_variable_degree: usize,

    /// Maximal number of variables adjacent to a factor
    pub max_factor_degree: usize,
}

impl Display for GraphSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Factor graph with {} variables, {} factors and {} edges",
            self.variables_number, self.factors_number, self.edges_number,
        )
    }
}

// ------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeEntry<P> {
    node: Node<P>,
    attrs: BTreeMap<String, AttrValue>,
    origin: Option<Origin>,
}

/// A factor graph.
///
/// A bipartite graph whose nodes are variables and factors,
/// and whose edges carry messages. E.g. the factorization
/// f(x1, x2, x3) = fa(x1, x2) fb(x2, x3) is represented as
///
/// ```text
/// (x1) --- [fa] --- (x2) --- [fb] --- (x3)
/// ```
///
/// Nodes are identified by their labels: inserting a node with a label
/// that is already present replaces the stored node.
#[derive(Debug)]
pub struct FactorGraph<M, P> {
    id: GraphId,
    graph: UnGraph<NodeEntry<P>, Edge<M>>,
    labels: HashMap<String, NodeIndex>,
}

impl<M, P> Default for FactorGraph<M, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, P> Clone for FactorGraph<M, P>
where
    M: Clone,
    P: Clone,
{
    // a clone is a different graph, so every node and edge is restamped
    fn clone(&self) -> Self {
        let id = GraphId::fresh();
        let graph = self.graph.map(
            |_, entry| {
                let mut entry = entry.clone();
                entry.node.stamp(id);
                entry
            },
            |_, edge| {
                let (source, target) = edge.endpoints();
                let mut edge = edge.clone();
                edge.restamp(
                    NodeId { graph: id, index: source.index },
                    NodeId { graph: id, index: target.index },
                );
                edge
            },
        );
        FactorGraph {
            id,
            graph,
            labels: self.labels.clone(),
        }
    }
}

// public methods ---------------------------------------------------------------------------

impl<M, P> FactorGraph<M, P> {
    /// Creates an empty factor graph
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::FactorGraph;
    ///
    /// let fg = FactorGraph::<f64, ()>::new();
    /// assert_eq!(fg.node_count(), 0);
    /// ```
    #[inline]
    pub fn new() -> Self {
        FactorGraph {
            id: GraphId::fresh(),
            graph: UnGraph::new_undirected(),
            labels: HashMap::new(),
        }
    }

    /// Creates an empty factor graph with preallocated memory
    ///
    /// # Arguments
    ///
    /// * `nodes` - A number of nodes we need to preallocate memory for
    /// * `edges` - A number of edges we need to preallocate memory for
    #[inline]
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        FactorGraph {
            id: GraphId::fresh(),
            graph: UnGraph::with_capacity(nodes, edges),
            labels: HashMap::with_capacity(nodes),
        }
    }

    #[inline]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Adds a single node to a factor graph and returns its id
    ///
    /// # Notes
    ///
    /// The node is stamped with the id of this graph. If a node with
    /// the same label is already present, it is replaced
    /// and its attributes are kept. Fails with `FGError::KindMismatch`
    /// if the present node is of another kind, the graph is left unchanged then
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{FactorGraph, FactorNode, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg.set_node(VariableNode::new("x")).unwrap();
    /// let f = fg.set_node(FactorNode::new("f", None)).unwrap();
    /// assert_eq!(fg.node(x).unwrap().graph(), Some(fg.id()));
    /// assert_eq!(fg.set_node(VariableNode::new("x")).unwrap(), x);
    /// assert!(fg.set_node(FactorNode::new("x", None)).is_err());
    /// assert_eq!(fg.get_vnodes(), vec![x]);
    /// assert_eq!(fg.get_fnodes(), vec![f]);
    /// ```
    #[inline]
    pub fn set_node(&mut self, node: impl Into<Node<P>>) -> FGResult<NodeId> {
        self.set_node_with_attrs(node, std::iter::empty::<(String, AttrValue)>())
    }

    /// Adds a single node with additional attributes to a factor graph
    ///
    /// # Arguments
    ///
    /// * `node` - A node
    /// * `attrs` - Attributes stored alongside the node, existing attributes
    ///     with the same names are overwritten
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{AttrValue, FactorGraph, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg
    ///     .set_node_with_attrs(VariableNode::new("x"), [("cardinality", 2i64)])
    ///     .unwrap();
    /// assert_eq!(fg.attribute(x, "cardinality"), Some(&AttrValue::Int(2)));
    /// ```
    pub fn set_node_with_attrs<K, V>(
        &mut self,
        node: impl Into<Node<P>>,
        attrs: impl IntoIterator<Item = (K, V)>,
    ) -> FGResult<NodeId>
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut node = node.into();
        node.stamp(self.id);
        let attrs = attrs.into_iter().map(|(k, v)| (k.into(), v.into()));
        let index = match self.labels.get(node.label()).copied() {
            Some(index) => {
                let entry = &mut self.graph[index];
                let kind = entry.node.kind();
                if kind != node.kind() {
                    return Err(FGError::KindMismatch {
                        node: index.index(),
                        kind,
                    });
                }
                entry.node = node;
                entry.attrs.extend(attrs);
                index
            }
            None => {
                let label = node.label().to_owned();
                let index = self.graph.add_node(NodeEntry {
                    node,
                    attrs: attrs.collect(),
                    origin: None,
                });
                self.labels.insert(label, index);
                index
            }
        };
        Ok(self.node_id(index))
    }

    /// Adds multiple nodes in the given order and returns their ids,
    /// stops at the first node that can not be inserted
    #[inline]
    pub fn set_nodes<N>(&mut self, nodes: impl IntoIterator<Item = N>) -> FGResult<Vec<NodeId>>
    where
        N: Into<Node<P>>,
    {
        nodes.into_iter().map(|n| self.set_node(n)).collect()
    }

    /// Adds a single edge to a factor graph
    ///
    /// # Arguments
    ///
    /// * `source` - Source node of the edge
    /// * `target` - Target node of the edge
    /// * `init` - Initial message stored in both directions
    ///
    /// # Notes
    ///
    /// Both endpoints must be nodes of this graph, otherwise the method
    /// returns `FGError::DanglingReference`. The kinds of endpoints are not
    /// checked here, use `validate` for that. Adding an edge that already
    /// exists replaces it
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{FactorGraph, FactorNode, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg.set_node(VariableNode::new("x")).unwrap();
    /// let f = fg.set_node(FactorNode::new("f", None)).unwrap();
    /// fg.set_edge(x, f, Some(1f64)).unwrap();
    /// assert_eq!(fg.edge_count(), 1);
    ///
    /// let mut other = FactorGraph::<f64, ()>::new();
    /// let y = other.set_node(VariableNode::new("y")).unwrap();
    /// assert!(fg.set_edge(y, f, None).is_err());
    /// ```
    pub fn set_edge(&mut self, source: NodeId, target: NodeId, init: Option<M>) -> FGResult<()>
    where
        M: Clone,
    {
        let s = self.resolve(source)?;
        let t = self.resolve(target)?;
        let edge = Edge::new(source, target, init);
        if let Some(e) = self.graph.find_edge(s, t) {
            trace!(
                source = s.index(),
                target = t.index(),
                "replacing an existing edge"
            );
            self.graph[e] = edge;
        } else {
            self.graph.add_edge(s, t, edge);
        }
        Ok(())
    }

    /// Adds multiple edges without initial messages in the given order
    #[inline]
    pub fn set_edges(&mut self, edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> FGResult<()>
    where
        M: Clone,
    {
        for (source, target) in edges {
            self.set_edge(source, target, None)?;
        }
        Ok(())
    }

    /// Returns variable nodes in the node iteration (insertion) order
    #[inline]
    pub fn get_vnodes(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeKind::Variable)
    }

    /// Returns factor nodes in the node iteration (insertion) order
    #[inline]
    pub fn get_fnodes(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeKind::Factor)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_ok()
    }

    /// Looks a node up by its label
    #[inline]
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.labels.get(label).map(|&i| self.node_id(i))
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<P>> {
        self.resolve(id).ok().map(|i| &self.graph[i].node)
    }

    /// Mutable access to a factor node, e.g. to attach a function to it.
    /// Returns None for variable nodes
    #[inline]
    pub fn factor_mut(&mut self, id: NodeId) -> Option<&mut FactorNode<P>> {
        let i = self.resolve(id).ok()?;
        self.graph[i].node.as_factor_mut()
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind())
    }

    /// Iterates over all nodes in the node iteration order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<P>)> + '_ {
        self.graph
            .node_indices()
            .map(move |i| (self.node_id(i), &self.graph[i].node))
    }

    /// Iterates over all edges in the insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge<M>> + '_ {
        self.graph.edge_weights()
    }

    /// Returns an edge between two nodes (in any direction)
    #[inline]
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<&Edge<M>> {
        let e = self.find_edge(a, b)?;
        Some(&self.graph[e])
    }

    #[inline]
    pub fn edge_mut(&mut self, a: NodeId, b: NodeId) -> Option<&mut Edge<M>> {
        let e = self.find_edge(a, b)?;
        Some(&mut self.graph[e])
    }

    /// Returns neighbors of a node sorted by the node iteration order
    pub fn neighbors(&self, id: NodeId) -> FGResult<Vec<NodeId>> {
        let i = self.resolve(id)?;
        let mut neighbors: Vec<_> = self
            .graph
            .neighbors(i)
            .map(|n| self.node_id(n))
            .collect();
        neighbors.sort_unstable();
        Ok(neighbors)
    }

    /// Returns a number of edges adjacent to a node
    #[inline]
    pub fn degree(&self, id: NodeId) -> FGResult<usize> {
        let i = self.resolve(id)?;
        Ok(self.graph.edges(i).count())
    }

    /// Returns a user supplied attribute of a node
    #[inline]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        let i = self.resolve(id).ok()?;
        self.graph[i].attrs.get(name)
    }

    /// Sets a user supplied attribute of a node returning the previous value
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> FGResult<Option<AttrValue>> {
        let i = self.resolve(id)?;
        Ok(self.graph[i].attrs.insert(name.into(), value.into()))
    }

    /// Returns the origin of a node if the graph was built by a conversion
    #[inline]
    pub fn origin(&self, id: NodeId) -> Option<Origin> {
        let i = self.resolve(id).ok()?;
        self.graph[i].origin
    }

    /// Iterates over all nodes that have an origin
    pub fn origins(&self) -> impl Iterator<Item = (NodeId, Origin)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |i| self.graph[i].origin.map(|o| (self.node_id(i), o)))
    }

    /// Initializes messages in both directions of every edge
    ///
    /// # Arguments
    ///
    /// * `message_initializer` - An object that initializes messages
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{FactorGraph, FactorNode, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg.set_node(VariableNode::new("x")).unwrap();
    /// let f = fg.set_node(FactorNode::new("f", None)).unwrap();
    /// fg.set_edge(x, f, None).unwrap();
    /// fg.init_messages(|| 0.5);
    /// assert_eq!(fg.edge(f, x).unwrap().message(f, x), Some(&0.5));
    /// ```
    pub fn init_messages(&mut self, mut message_initializer: impl FnMut() -> M)
    where
        M: Clone,
    {
        for edge in self.graph.edge_weights_mut() {
            edge.reset(message_initializer());
        }
    }

    /// Checks that every edge connects a variable and a factor
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{FactorGraph, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg.set_node(VariableNode::new("x")).unwrap();
    /// let y = fg.set_node(VariableNode::new("y")).unwrap();
    /// fg.set_edge(x, y, None).unwrap();
    /// assert!(fg.validate().is_err());
    /// ```
    pub fn validate(&self) -> FGResult<()> {
        for e in self.graph.edge_indices() {
            if let Some((s, t)) = self.graph.edge_endpoints(e) {
                let kind = self.graph[s].node.kind();
                if kind == self.graph[t].node.kind() {
                    return Err(FGError::InvariantViolation {
                        source: s.index(),
                        target: t.index(),
                        kind,
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns a short description of a factor graph
    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            variables_number: 0,
            factors_number: 0,
            edges_number: self.graph.edge_count(),
            max_variable_degree: 0,
            max_factor_degree: 0,
        };
        for i in self.graph.node_indices() {
            let degree = self.graph.edges(i).count();
            match self.graph[i].node {
                Node::Variable(_) => {
                    summary.variables_number += 1;
                    summary.max_variable_degree = summary.max_variable_degree.max(degree);
                }
                Node::Factor(_) => {
                    summary.factors_number += 1;
                    summary.max_factor_degree = summary.max_factor_degree.max(degree);
                }
            }
        }
        summary
    }
}

// private methods --------------------------------------------------------------------------

impl<M, P> FactorGraph<M, P> {
    #[inline(always)]
    fn node_id(&self, index: NodeIndex) -> NodeId {
        NodeId {
            graph: self.id,
            index,
        }
    }

    #[inline(always)]
    fn resolve(&self, id: NodeId) -> FGResult<NodeIndex> {
        if id.graph == self.id && id.index.index() < self.graph.node_count() {
            Ok(id.index)
        } else {
            Err(FGError::DanglingReference { node: id.index() })
        }
    }

    #[inline(always)]
    fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeIndex> {
        let a = self.resolve(a).ok()?;
        let b = self.resolve(b).ok()?;
        self.graph.find_edge(a, b)
    }

    #[inline]
    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&i| self.graph[i].node.kind() == kind)
            .map(|i| self.node_id(i))
            .collect()
    }

    #[inline]
    pub(crate) fn set_origin(&mut self, id: NodeId, origin: Origin) -> FGResult<()> {
        let i = self.resolve(id)?;
        self.graph[i].origin = Some(origin);
        Ok(())
    }
}
