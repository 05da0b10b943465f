use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::Node;

/// Identity assigned by the external pipeline store on first save.
pub type PipelineId = u64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

impl Pipeline {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Branch, NodeKind, NotifyChannel, ScriptRef};

  #[test]
  fn test_parse_editor_json() {
    let json = r#"{
      "name": "deploy web",
      "nodes": [
        {"id": 1, "name": "web-1", "type": "host", "x": 10, "y": 20, "hostId": "7"},
        {"id": 2, "name": "deploy", "type": "script", "x": 90.5, "y": 20,
         "scriptRef": {"local": "3"}},
        {"id": 3, "name": "check", "type": "if", "x": 0, "y": 0},
        {"id": 4, "name": "ping", "type": "notify", "channel": "ai_analysis", "x": 0, "y": 0}
      ],
      "edges": [
        {"from": 1, "to": 2, "type": "success"},
        {"from": 2, "to": 3, "type": "failure"},
        {"from": 3, "to": 4}
      ]
    }"#;

    let pipeline = Pipeline::from_json(json).unwrap();

    assert_eq!(pipeline.name, "deploy web");
    assert_eq!(pipeline.nodes.len(), 4);
    assert_eq!(pipeline.nodes[0].kind, NodeKind::Host);
    assert_eq!(pipeline.nodes[0].host_ref.as_deref(), Some("7"));
    assert_eq!(pipeline.nodes[1].position.x, 90.5);
    assert_eq!(pipeline.nodes[1].script_ref, Some(ScriptRef::local("3")));
    assert_eq!(pipeline.nodes[2].kind, NodeKind::Conditional);
    assert_eq!(
      pipeline.nodes[3].kind,
      NodeKind::Notify {
        channel: NotifyChannel::AiAnalysis
      }
    );
    assert_eq!(pipeline.edges[1].branch, Branch::Failure);
    assert_eq!(pipeline.edges[2].branch, Branch::Success);
  }

  #[test]
  fn test_serialize_keeps_editor_field_names() {
    let json = r#"{"name":"p","nodes":[
      {"id":5,"name":"lint","type":"script","x":1,"y":2,"scriptRef":{"remote":"bash_scripts/lint.sh"}}
    ],"edges":[]}"#;
    let pipeline = Pipeline::from_json(json).unwrap();

    let value = serde_json::to_value(&pipeline).unwrap();
    let node = &value["nodes"][0];
    assert_eq!(node["type"], "script");
    assert_eq!(node["scriptRef"]["remote"], "bash_scripts/lint.sh");
    assert!(node.get("hostId").is_none());
    assert!(node.get("scriptId").is_none());
  }

  #[test]
  fn test_parse_saved_by_web_editor() {
    // Shape written by the browser editor: library ids under scriptId,
    // null for whichever of scriptId/hostId does not apply.
    let json = r#"{"name":"nightly","nodes":[
      {"id":1,"name":"web-1","type":"host","x":10,"y":20,"scriptId":null,"hostId":"7"},
      {"id":2,"name":"deploy","type":"script","x":90,"y":20,"scriptId":"3","hostId":null},
      {"id":3,"name":"migrate","type":"script","x":170,"y":20,"scriptId":12,"hostId":null}
    ],"edges":[{"from":1,"to":2,"type":"success"},{"from":2,"to":3,"type":"success"}]}"#;

    let pipeline = Pipeline::from_json(json).unwrap();

    assert_eq!(pipeline.nodes[0].script_ref, None);
    assert_eq!(pipeline.nodes[0].host_ref.as_deref(), Some("7"));
    assert_eq!(pipeline.nodes[1].script_ref, Some(ScriptRef::local("3")));
    assert_eq!(pipeline.nodes[1].host_ref, None);
    assert_eq!(pipeline.nodes[2].script_ref, Some(ScriptRef::local("12")));
  }

  #[test]
  fn test_local_script_written_as_script_id() {
    let mut pipeline = Pipeline::new("p");
    pipeline.nodes.push(crate::NodeSpec::script("deploy", ScriptRef::local("3")).into_node(2));

    let value = serde_json::to_value(&pipeline).unwrap();
    let node = &value["nodes"][0];
    assert_eq!(node["scriptId"], "3");
    assert!(node.get("scriptRef").is_none());

    let back: Pipeline = serde_json::from_value(value).unwrap();
    assert_eq!(back, pipeline);
  }
}
