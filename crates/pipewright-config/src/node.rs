use serde::{Deserialize, Serialize};

use crate::script::ScriptRef;

/// Node identifier, unique within a pipeline.
pub type NodeId = u64;

/// Identifier of a host record in the external host inventory.
pub type HostRef = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyChannel {
  Discord,
  Email,
  AiAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
  /// A target machine. Every host node owns one compiled job.
  Host,
  /// Runs a script on the upstream host.
  Script,
  /// Branch point with success and failure outputs.
  #[serde(alias = "if")]
  Conditional,
  /// Sends a notification or analysis of the previous step.
  Notify { channel: NotifyChannel },
}

impl NodeKind {
  /// Only scripts and conditionals expose a failure output.
  pub fn has_failure_output(&self) -> bool {
    matches!(self, Self::Script | Self::Conditional)
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Host => "host",
      Self::Script => "script",
      Self::Conditional => "conditional",
      Self::Notify { .. } => "notify",
    }
  }
}

/// A node as drawn in the editor.
///
/// Local script references travel as `"scriptId": "<id>"`, the field the
/// pipeline server's runner reads. Remote catalog references use
/// `"scriptRef": {"remote": "<path>"}`. Ids written as numbers are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
  pub id: NodeId,
  pub name: String,
  pub kind: NodeKind,
  pub position: Position,
  pub script_ref: Option<ScriptRef>,
  pub host_ref: Option<HostRef>,
}

impl Node {
  pub fn is_host(&self) -> bool {
    self.kind == NodeKind::Host
  }
}

/// Record ids saved by the editor may be strings or numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RecordId {
  Text(String),
  Number(u64),
}

impl From<RecordId> for String {
  fn from(id: RecordId) -> Self {
    match id {
      RecordId::Text(text) => text,
      RecordId::Number(n) => n.to_string(),
    }
  }
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
  id: NodeId,
  name: String,
  #[serde(flatten)]
  kind: NodeKind,
  #[serde(flatten)]
  position: Position,
  #[serde(rename = "scriptId", default, skip_serializing_if = "Option::is_none")]
  script_id: Option<RecordId>,
  #[serde(rename = "scriptRef", default, skip_serializing_if = "Option::is_none")]
  script_ref: Option<ScriptRef>,
  #[serde(rename = "hostId", default, skip_serializing_if = "Option::is_none")]
  host_id: Option<RecordId>,
}

impl From<NodeRecord> for Node {
  fn from(record: NodeRecord) -> Self {
    // An explicit reference wins over the bare library id.
    let script_ref = record
      .script_ref
      .or_else(|| record.script_id.map(|id| ScriptRef::Local(id.into())));

    Self {
      id: record.id,
      name: record.name,
      kind: record.kind,
      position: record.position,
      script_ref,
      host_ref: record.host_id.map(String::from),
    }
  }
}

impl From<Node> for NodeRecord {
  fn from(node: Node) -> Self {
    let (script_id, script_ref) = match node.script_ref {
      Some(ScriptRef::Local(id)) => (Some(RecordId::Text(id)), None),
      Some(remote) => (None, Some(remote)),
      None => (None, None),
    };

    Self {
      id: node.id,
      name: node.name,
      kind: node.kind,
      position: node.position,
      script_id,
      script_ref,
      host_id: node.host_ref.map(RecordId::Text),
    }
  }
}

/// Everything needed to place a new node; the graph store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
  pub name: String,
  pub kind: NodeKind,
  pub position: Position,
  pub script_ref: Option<ScriptRef>,
  pub host_ref: Option<HostRef>,
}

impl NodeSpec {
  fn bare(name: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      name: name.into(),
      kind,
      position: Position::default(),
      script_ref: None,
      host_ref: None,
    }
  }

  pub fn host(name: impl Into<String>, host_ref: impl Into<HostRef>) -> Self {
    Self {
      host_ref: Some(host_ref.into()),
      ..Self::bare(name, NodeKind::Host)
    }
  }

  pub fn script(name: impl Into<String>, script_ref: ScriptRef) -> Self {
    Self {
      script_ref: Some(script_ref),
      ..Self::bare(name, NodeKind::Script)
    }
  }

  pub fn conditional(name: impl Into<String>) -> Self {
    Self::bare(name, NodeKind::Conditional)
  }

  pub fn notify(name: impl Into<String>, channel: NotifyChannel) -> Self {
    Self::bare(name, NodeKind::Notify { channel })
  }

  pub fn at(mut self, x: f64, y: f64) -> Self {
    self.position = Position::new(x, y);
    self
  }

  pub fn into_node(self, id: NodeId) -> Node {
    Node {
      id,
      name: self.name,
      kind: self.kind,
      position: self.position,
      script_ref: self.script_ref,
      host_ref: self.host_ref,
    }
  }
}
