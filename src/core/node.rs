use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    sync::atomic::{AtomicUsize, Ordering},
};

// ------------------------------------------------------------------------------------------

/// Kind of a factor graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// A node representing a variable of a factorized function
    Variable,

    /// A node representing a local factor of a factorized function
    Factor,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Variable => write!(f, "variable"),
            NodeKind::Factor => write!(f, "factor"),
        }
    }
}

// ------------------------------------------------------------------------------------------

static NEXT_GRAPH_ID: AtomicUsize = AtomicUsize::new(0);

/// Process unique identifier of a factor graph.
/// Nodes are stamped with it when they are inserted into a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(usize);

impl GraphId {
    #[inline]
    pub(crate) fn fresh() -> Self {
        GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// ------------------------------------------------------------------------------------------

/// A variable node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNode {
    label: String,
    graph: Option<GraphId>,
}

impl VariableNode {
    /// Creates a new variable node that does not belong to any graph yet
    ///
    /// # Arguments
    ///
    /// * `label` - A label identifying the node inside a factor graph
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::VariableNode;
    ///
    /// let x = VariableNode::new("x1");
    /// assert_eq!(x.label(), "x1");
    /// assert!(x.graph().is_none());
    /// ```
    #[inline]
    pub fn new(label: impl Into<String>) -> Self {
        VariableNode {
            label: label.into(),
            graph: None,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the graph this node was inserted into
    #[inline]
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }
}

/// A factor node, optionally carrying an associated function
/// (a potential, a distribution, etc). The function is opaque to the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorNode<P> {
    label: String,
    function: Option<P>,
    graph: Option<GraphId>,
}

impl<P> FactorNode<P> {
    /// Creates a new factor node that does not belong to any graph yet
    ///
    /// # Arguments
    ///
    /// * `label` - A label identifying the node inside a factor graph
    /// * `function` - An optional function associated with the factor
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::FactorNode;
    ///
    /// let fa = FactorNode::new("fa", Some([[0.9, 0.1], [0.1, 0.9]]));
    /// assert_eq!(fa.label(), "fa");
    /// assert!(fa.function().is_some());
    /// ```
    #[inline]
    pub fn new(label: impl Into<String>, function: Option<P>) -> Self {
        FactorNode {
            label: label.into(),
            function,
            graph: None,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn function(&self) -> Option<&P> {
        self.function.as_ref()
    }

    #[inline]
    pub fn function_mut(&mut self) -> Option<&mut P> {
        self.function.as_mut()
    }

    /// Replaces the associated function returning the previous one
    #[inline]
    pub fn set_function(&mut self, function: Option<P>) -> Option<P> {
        std::mem::replace(&mut self.function, function)
    }

    /// Returns the graph this node was inserted into
    #[inline]
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }
}

// ------------------------------------------------------------------------------------------

/// A node of a factor graph: either a variable or a factor
#[derive(Debug, Clone, PartialEq)]
pub enum Node<P> {
    Variable(VariableNode),
    Factor(FactorNode<P>),
}

impl<P> Node<P> {
    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Variable(_) => NodeKind::Variable,
            Node::Factor(_) => NodeKind::Factor,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        match self {
            Node::Variable(v) => v.label(),
            Node::Factor(f) => f.label(),
        }
    }

    /// Returns the graph this node was inserted into
    #[inline]
    pub fn graph(&self) -> Option<GraphId> {
        match self {
            Node::Variable(v) => v.graph,
            Node::Factor(f) => f.graph,
        }
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    #[inline]
    pub fn is_factor(&self) -> bool {
        matches!(self, Node::Factor(_))
    }

    #[inline]
    pub fn as_variable(&self) -> Option<&VariableNode> {
        match self {
            Node::Variable(v) => Some(v),
            Node::Factor(_) => None,
        }
    }

    #[inline]
    pub fn as_factor(&self) -> Option<&FactorNode<P>> {
        match self {
            Node::Variable(_) => None,
            Node::Factor(f) => Some(f),
        }
    }

    #[inline]
    pub fn as_factor_mut(&mut self) -> Option<&mut FactorNode<P>> {
        match self {
            Node::Variable(_) => None,
            Node::Factor(f) => Some(f),
        }
    }

    #[inline(always)]
    pub(crate) fn stamp(&mut self, graph: GraphId) {
        match self {
            Node::Variable(v) => v.graph = Some(graph),
            Node::Factor(f) => f.graph = Some(graph),
        }
    }
}

impl<P> From<VariableNode> for Node<P> {
    #[inline]
    fn from(node: VariableNode) -> Self {
        Node::Variable(node)
    }
}

impl<P> From<FactorNode<P>> for Node<P> {
    #[inline]
    fn from(node: FactorNode<P>) -> Self {
        Node::Factor(node)
    }
}
