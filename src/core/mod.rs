mod convert;
mod edge;
mod factor_graph;
mod message;
mod node;

pub use convert::{convert_to_fg, convert_to_fg_par, ConvertError, ConvertResult, Labeled, PartLabel};
pub use edge::Edge;
pub use factor_graph::{AttrValue, FGError, FGResult, FactorGraph, GraphSummary, NodeId, Origin};
pub use message::{random_message_initializer, Message};
pub use node::{FactorNode, GraphId, Node, NodeKind, VariableNode};
