use pipewright_config::{Branch, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("node not found: {0}")]
  NodeNotFound(NodeId),

  #[error("duplicate node id: {0}")]
  DuplicateNodeId(NodeId),

  #[error("invalid node '{name}': {message}")]
  InvalidNode { name: String, message: String },

  #[error("invalid edge {from} -> {to}: {reason}")]
  InvalidEdge {
    from: NodeId,
    to: NodeId,
    reason: EdgeRejection,
  },

  #[error("edge not found: {from} -> {to} ({branch:?})")]
  EdgeNotFound {
    from: NodeId,
    to: NodeId,
    branch: Branch,
  },
}

/// Why an edge was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeRejection {
  #[error("a node cannot connect to itself")]
  SelfLoop,

  #[error("{kind} nodes have no failure output")]
  FailureBranchNotAllowed { kind: &'static str },

  #[error("the {branch:?} output is already connected")]
  BranchTaken { branch: Branch },
}
