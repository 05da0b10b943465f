use std::collections::HashMap;

use pipewright_config::{Edge, NodeId};

/// Read-only adjacency view of a pipeline for traversal.
///
/// Downstream edges keep their insertion order, which is the order the
/// compiler emits steps in.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: node_id -> outgoing edges.
  adjacency: HashMap<NodeId, Vec<Edge>>,
  /// Reverse adjacency: node_id -> incoming edges.
  reverse_adjacency: HashMap<NodeId, Vec<Edge>>,
  /// Nodes with no incoming edges, in node order.
  entry_points: Vec<NodeId>,
}

impl Graph {
  /// Build a graph from node ids (in node order) and edges.
  pub fn new(node_ids: impl IntoIterator<Item = NodeId>, edges: &[Edge]) -> Self {
    let node_ids: Vec<NodeId> = node_ids.into_iter().collect();
    let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();
    let mut reverse_adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();

    for node_id in &node_ids {
      adjacency.entry(*node_id).or_default();
      reverse_adjacency.entry(*node_id).or_default();
    }

    for edge in edges {
      adjacency.entry(edge.from).or_default().push(*edge);
      reverse_adjacency.entry(edge.to).or_default().push(*edge);
    }

    let entry_points = node_ids
      .into_iter()
      .filter(|id| reverse_adjacency.get(id).is_none_or(|v| v.is_empty()))
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
    }
  }

  /// Nodes with no incoming edges.
  pub fn entry_points(&self) -> &[NodeId] {
    &self.entry_points
  }

  /// Outgoing edges of a node, in insertion order.
  pub fn downstream(&self, node_id: NodeId) -> &[Edge] {
    self
      .adjacency
      .get(&node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Incoming edges of a node, in insertion order.
  pub fn upstream(&self, node_id: NodeId) -> &[Edge] {
    self
      .reverse_adjacency
      .get(&node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
