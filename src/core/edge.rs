use crate::core::factor_graph::{FGError, FGResult, NodeId};

/// An undirected edge of a factor graph carrying a message in each direction.
///
/// Slot 0 holds the message sent from `source` to `target`,
/// slot 1 holds the message sent from `target` to `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<M> {
    source: NodeId,
    target: NodeId,
    messages: [Option<M>; 2],
}

impl<M> Edge<M> {
    #[inline]
    pub(crate) fn new(source: NodeId, target: NodeId, init: Option<M>) -> Self
    where
        M: Clone,
    {
        Edge {
            source,
            target,
            messages: [init.clone(), init],
        }
    }

    #[inline]
    pub fn source(&self) -> NodeId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    #[inline]
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    /// Returns the opposite endpoint, or None if `node` is not an endpoint
    #[inline]
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.source {
            Some(self.target)
        } else if node == self.target {
            Some(self.source)
        } else {
            None
        }
    }

    /// Checks whether the edge connects `a` and `b` in any direction
    #[inline]
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Returns the message sent from `from` to `to`
    ///
    /// # Example
    ///
    /// ```
    /// use fgrs::core::{FactorGraph, FactorNode, VariableNode};
    ///
    /// let mut fg = FactorGraph::<f64, ()>::new();
    /// let x = fg.set_node(VariableNode::new("x")).unwrap();
    /// let f = fg.set_node(FactorNode::new("f", None)).unwrap();
    /// fg.set_edge(x, f, Some(0.5)).unwrap();
    ///
    /// let edge = fg.edge_mut(x, f).unwrap();
    /// edge.set_message(f, x, 0.25).unwrap();
    /// assert_eq!(edge.message(x, f), Some(&0.5));
    /// assert_eq!(edge.message(f, x), Some(&0.25));
    /// ```
    #[inline]
    pub fn message(&self, from: NodeId, to: NodeId) -> Option<&M> {
        self.slot(from, to).and_then(|i| self.messages[i].as_ref())
    }

    #[inline]
    pub fn message_mut(&mut self, from: NodeId, to: NodeId) -> Option<&mut M> {
        match self.slot(from, to) {
            Some(i) => self.messages[i].as_mut(),
            None => None,
        }
    }

    /// Stores a message sent from `from` to `to` returning the previous one
    ///
    /// # Notes
    ///
    /// Fails with `FGError::NoSuchEdge` if `from` and `to` are not the endpoints of the edge
    #[inline]
    pub fn set_message(&mut self, from: NodeId, to: NodeId, message: M) -> FGResult<Option<M>> {
        let i = self.slot_or_err(from, to)?;
        Ok(self.messages[i].replace(message))
    }

    /// Removes the message sent from `from` to `to` and returns it
    #[inline]
    pub fn take_message(&mut self, from: NodeId, to: NodeId) -> FGResult<Option<M>> {
        let i = self.slot_or_err(from, to)?;
        Ok(self.messages[i].take())
    }

    #[inline]
    pub(crate) fn reset(&mut self, init: M)
    where
        M: Clone,
    {
        self.messages = [Some(init.clone()), Some(init)];
    }

    #[inline(always)]
    pub(crate) fn restamp(&mut self, source: NodeId, target: NodeId) {
        self.source = source;
        self.target = target;
    }

    #[inline(always)]
    fn slot(&self, from: NodeId, to: NodeId) -> Option<usize> {
        if from == self.source && to == self.target {
            Some(0)
        } else if from == self.target && to == self.source {
            Some(1)
        } else {
            None
        }
    }

    #[inline(always)]
    fn slot_or_err(&self, from: NodeId, to: NodeId) -> FGResult<usize> {
        self.slot(from, to).ok_or(FGError::NoSuchEdge {
            source: from.index(),
            target: to.index(),
        })
    }
}
