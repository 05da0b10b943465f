use indexmap::IndexMap;
use pipewright_config::{Branch, Edge, Node, NodeId, NodeKind, NodeSpec, Pipeline, Position};
use tracing::debug;

use crate::error::{EdgeRejection, GraphError};
use crate::graph::Graph;

/// The pipeline currently being edited.
///
/// Nodes live in an arena keyed by id (insertion order preserved); edges are
/// a flat list referring to ids. Every mutation bumps `revision` so derived
/// output (compiled workflows) can tell it is stale. The store never
/// recompiles on its own.
#[derive(Debug, Clone)]
pub struct GraphStore {
  name: String,
  nodes: IndexMap<NodeId, Node>,
  edges: Vec<Edge>,
  next_id: NodeId,
  revision: u64,
}

impl GraphStore {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      nodes: IndexMap::new(),
      edges: Vec::new(),
      next_id: 1,
      revision: 0,
    }
  }

  /// Build a store from a saved pipeline.
  ///
  /// Nodes and edges are checked against the same invariants as interactive
  /// edits. Id assignment resumes after the largest loaded id.
  pub fn from_pipeline(pipeline: Pipeline) -> Result<Self, GraphError> {
    let mut store = Self::new(pipeline.name);

    for node in pipeline.nodes {
      validate_refs(&node)?;
      if store.nodes.contains_key(&node.id) {
        return Err(GraphError::DuplicateNodeId(node.id));
      }
      store.next_id = store.next_id.max(node.id + 1);
      store.nodes.insert(node.id, node);
    }

    for edge in pipeline.edges {
      store.check_edge(edge.from, edge.to, edge.branch)?;
      store.edges.push(edge);
    }

    store.revision = 0;
    Ok(store)
  }

  /// Snapshot the graph for saving.
  pub fn to_pipeline(&self) -> Pipeline {
    Pipeline {
      name: self.name.clone(),
      nodes: self.nodes.values().cloned().collect(),
      edges: self.edges.clone(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn rename(&mut self, name: impl Into<String>) {
    self.name = name.into();
    self.touch();
  }

  pub fn revision(&self) -> u64 {
    self.revision
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(&id)
  }

  /// Nodes in insertion order.
  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  /// Host nodes in insertion order.
  pub fn hosts(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values().filter(|n| n.is_host())
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Outgoing edges of `id`, in insertion order.
  pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
    self.edges.iter().filter(move |e| e.from == id)
  }

  /// Build the adjacency view used for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(self.nodes.keys().copied(), &self.edges)
  }

  /// Place a new node and return it. Ids are never reused in a session.
  pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node, GraphError> {
    let id = self.next_id;
    let node = spec.into_node(id);
    validate_refs(&node)?;

    debug!(node_id = id, kind = node.kind.label(), name = %node.name, "adding node");
    self.next_id += 1;
    self.nodes.insert(id, node);
    self.touch();

    Ok(&self.nodes[&id])
  }

  /// Remove a node together with every edge that touches it.
  pub fn delete_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
    let node = self
      .nodes
      .shift_remove(&id)
      .ok_or(GraphError::NodeNotFound(id))?;

    let before = self.edges.len();
    self.edges.retain(|e| !e.touches(id));
    debug!(
      node_id = id,
      edges_removed = before - self.edges.len(),
      "deleted node"
    );
    self.touch();

    Ok(node)
  }

  /// Update a node's canvas position. Topology is untouched.
  pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
    let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
    node.position = position;
    self.touch();
    Ok(())
  }

  /// Connect `from`'s `branch` output to `to`.
  ///
  /// Rejected edges leave the graph unchanged.
  pub fn add_edge(&mut self, from: NodeId, to: NodeId, branch: Branch) -> Result<Edge, GraphError> {
    self.check_edge(from, to, branch)?;

    let edge = Edge::new(from, to, branch);
    debug!(from, to, ?branch, "adding edge");
    self.edges.push(edge);
    self.touch();
    Ok(edge)
  }

  /// Disconnect an existing edge.
  pub fn remove_edge(&mut self, from: NodeId, to: NodeId, branch: Branch) -> Result<Edge, GraphError> {
    let index = self
      .edges
      .iter()
      .position(|e| e.from == from && e.to == to && e.branch == branch)
      .ok_or(GraphError::EdgeNotFound { from, to, branch })?;

    let edge = self.edges.remove(index);
    self.touch();
    Ok(edge)
  }

  fn check_edge(&self, from: NodeId, to: NodeId, branch: Branch) -> Result<(), GraphError> {
    let reject = |reason| GraphError::InvalidEdge { from, to, reason };

    if from == to {
      return Err(reject(EdgeRejection::SelfLoop));
    }

    let source = self.nodes.get(&from).ok_or(GraphError::NodeNotFound(from))?;
    if !self.nodes.contains_key(&to) {
      return Err(GraphError::NodeNotFound(to));
    }

    if branch == Branch::Failure && !source.kind.has_failure_output() {
      return Err(reject(EdgeRejection::FailureBranchNotAllowed {
        kind: source.kind.label(),
      }));
    }

    if self
      .edges
      .iter()
      .any(|e| e.from == from && e.branch == branch)
    {
      return Err(reject(EdgeRejection::BranchTaken { branch }));
    }

    Ok(())
  }

  fn touch(&mut self) {
    self.revision += 1;
  }
}

impl Default for GraphStore {
  fn default() -> Self {
    Self::new("")
  }
}

/// Hosts need a host reference; scripts need a script reference.
fn validate_refs(node: &Node) -> Result<(), GraphError> {
  let message = match node.kind {
    NodeKind::Host if node.host_ref.is_none() => "host nodes require a host reference",
    NodeKind::Script if node.script_ref.is_none() => "script nodes require a script reference",
    _ => return Ok(()),
  };

  Err(GraphError::InvalidNode {
    name: node.name.clone(),
    message: message.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pipewright_config::{NotifyChannel, ScriptRef};

  fn store_with_chain() -> (GraphStore, NodeId, NodeId, NodeId) {
    let mut store = GraphStore::new("test");
    let host = store.add_node(NodeSpec::host("web-1", "1")).unwrap().id;
    let script = store
      .add_node(NodeSpec::script("deploy", ScriptRef::local("1")))
      .unwrap()
      .id;
    let notify = store
      .add_node(NodeSpec::notify("ping", NotifyChannel::Discord))
      .unwrap()
      .id;
    store.add_edge(host, script, Branch::Success).unwrap();
    store.add_edge(script, notify, Branch::Failure).unwrap();
    (store, host, script, notify)
  }

  #[test]
  fn test_add_node_assigns_increasing_ids() {
    let mut store = GraphStore::new("test");
    let a = store.add_node(NodeSpec::conditional("a")).unwrap().id;
    let b = store.add_node(NodeSpec::conditional("b")).unwrap().id;
    store.delete_node(b).unwrap();
    let c = store.add_node(NodeSpec::conditional("c")).unwrap().id;

    assert_eq!(a, 1);
    assert_eq!(b, 2);
    assert_eq!(c, 3);
  }

  #[test]
  fn test_add_node_requires_references() {
    let mut store = GraphStore::new("test");
    let mut spec = NodeSpec::host("web-1", "1");
    spec.host_ref = None;

    let result = store.add_node(spec);
    assert!(matches!(result, Err(GraphError::InvalidNode { .. })));
    assert!(store.is_empty());
    assert_eq!(store.revision(), 0);
  }

  #[test]
  fn test_delete_node_cascades_edges() {
    let (mut store, host, script, notify) = store_with_chain();

    store.delete_node(script).unwrap();

    assert!(store.edges().iter().all(|e| !e.touches(script)));
    assert!(store.node(host).is_some());
    assert!(store.node(notify).is_some());
    assert!(store.edges().is_empty());
  }

  #[test]
  fn test_self_loop_rejected_without_mutation() {
    let (mut store, host, _, _) = store_with_chain();
    let edges_before = store.edges().to_vec();
    let revision = store.revision();

    let result = store.add_edge(host, host, Branch::Success);

    assert!(matches!(
      result,
      Err(GraphError::InvalidEdge {
        reason: EdgeRejection::SelfLoop,
        ..
      })
    ));
    assert_eq!(store.edges(), edges_before.as_slice());
    assert_eq!(store.revision(), revision);
  }

  #[test]
  fn test_failure_branch_only_from_scripts_and_conditionals() {
    let (mut store, host, _, notify) = store_with_chain();
    let check = store.add_node(NodeSpec::conditional("check")).unwrap().id;

    assert!(matches!(
      store.add_edge(host, check, Branch::Failure),
      Err(GraphError::InvalidEdge {
        reason: EdgeRejection::FailureBranchNotAllowed { kind: "host" },
        ..
      })
    ));
    assert!(matches!(
      store.add_edge(notify, check, Branch::Failure),
      Err(GraphError::InvalidEdge { .. })
    ));
    assert!(store.add_edge(check, notify, Branch::Failure).is_ok());
  }

  #[test]
  fn test_one_edge_per_branch() {
    let (mut store, host, _, notify) = store_with_chain();

    let result = store.add_edge(host, notify, Branch::Success);
    assert!(matches!(
      result,
      Err(GraphError::InvalidEdge {
        reason: EdgeRejection::BranchTaken { .. },
        ..
      })
    ));
  }

  #[test]
  fn test_edge_to_unknown_node() {
    let (mut store, _, _, notify) = store_with_chain();
    assert_eq!(
      store.add_edge(notify, 99, Branch::Success),
      Err(GraphError::NodeNotFound(99))
    );
  }

  #[test]
  fn test_move_node_only_changes_position() {
    let (mut store, host, _, _) = store_with_chain();
    let edges = store.edges().to_vec();

    store.move_node(host, Position::new(5.0, 6.0)).unwrap();

    assert_eq!(store.node(host).unwrap().position, Position::new(5.0, 6.0));
    assert_eq!(store.edges(), edges.as_slice());
  }

  #[test]
  fn test_remove_edge() {
    let (mut store, host, script, _) = store_with_chain();

    store.remove_edge(host, script, Branch::Success).unwrap();
    assert_eq!(store.outgoing(host).count(), 0);
    assert!(matches!(
      store.remove_edge(host, script, Branch::Success),
      Err(GraphError::EdgeNotFound { .. })
    ));
  }

  #[test]
  fn test_pipeline_roundtrip_resumes_ids() {
    let (store, _, _, _) = store_with_chain();
    let pipeline = store.to_pipeline();

    let mut loaded = GraphStore::from_pipeline(pipeline.clone()).unwrap();
    assert_eq!(loaded.to_pipeline(), pipeline);
    assert_eq!(loaded.revision(), 0);

    let next = loaded.add_node(NodeSpec::conditional("next")).unwrap().id;
    assert_eq!(next, 4);
  }

  #[test]
  fn test_from_pipeline_rejects_duplicate_ids() {
    let (store, _, _, _) = store_with_chain();
    let mut pipeline = store.to_pipeline();
    let copy = pipeline.nodes[0].clone();
    pipeline.nodes.push(copy);

    assert_eq!(
      GraphStore::from_pipeline(pipeline).unwrap_err(),
      GraphError::DuplicateNodeId(1)
    );
  }

  #[test]
  fn test_from_pipeline_rejects_self_loop() {
    let (store, _, script, _) = store_with_chain();
    let mut pipeline = store.to_pipeline();
    pipeline.edges.push(Edge::new(script, script, Branch::Success));

    assert!(matches!(
      GraphStore::from_pipeline(pipeline),
      Err(GraphError::InvalidEdge { .. })
    ));
  }

  #[test]
  fn test_from_pipeline_saved_by_web_editor() {
    let pipeline = pipewright_config::Pipeline::from_json(
      r#"{"name":"nightly","nodes":[
        {"id":1,"name":"web-1","type":"host","x":0,"y":0,"scriptId":null,"hostId":"7"},
        {"id":2,"name":"deploy","type":"script","x":80,"y":0,"scriptId":"3","hostId":null}
      ],"edges":[{"from":1,"to":2,"type":"success"}]}"#,
    )
    .unwrap();

    let store = GraphStore::from_pipeline(pipeline).unwrap();
    assert_eq!(
      store.node(2).unwrap().script_ref,
      Some(ScriptRef::local("3"))
    );
    assert_eq!(store.to_pipeline().edges.len(), 1);
  }
}
