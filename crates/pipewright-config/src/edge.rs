use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// Which outcome of the source node triggers the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
  #[default]
  Success,
  Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: NodeId,
  pub to: NodeId,
  #[serde(rename = "type", default)]
  pub branch: Branch,
}

impl Edge {
  pub fn new(from: NodeId, to: NodeId, branch: Branch) -> Self {
    Self { from, to, branch }
  }

  /// True if `node_id` is either endpoint of this edge.
  pub fn touches(&self, node_id: NodeId) -> bool {
    self.from == node_id || self.to == node_id
  }
}
