use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SourceError;

/// A script from the local script library, content included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalScript {
  #[serde(deserialize_with = "string_or_number")]
  pub id: String,
  pub name: String,
  /// e.g. "bash-script", "python-script", "ansible-playbook"
  #[serde(rename = "type")]
  pub script_type: String,
  pub content: String,
}

/// An entry of the remote catalog. Content is fetched separately by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScript {
  pub path: String,
  pub name: String,
  /// Catalog directory the script lives in, e.g. "bash_scripts"
  #[serde(rename = "type")]
  pub script_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sha: Option<String>,
}

/// Directories of the remote catalog that hold scripts and pipelines.
pub const CATALOG_DIRECTORIES: [&str; 4] = [
  "bash_scripts",
  "python_scripts",
  "ansible_playbooks",
  "pipelines",
];

/// Where script content comes from.
///
/// This is the script content API: a local library listed once with its
/// content, and a remote catalog whose content is fetched per path.
#[async_trait]
pub trait ScriptSource: Send + Sync {
  /// List every local script, including content.
  async fn list_local_scripts(&self) -> Result<Vec<LocalScript>, SourceError>;

  /// List the remote catalog (no content).
  async fn list_remote_scripts(&self) -> Result<Vec<RemoteScript>, SourceError>;

  /// Fetch the content of one remote catalog script.
  async fn fetch_remote_content(&self, path: &str) -> Result<String, SourceError>;
}

#[async_trait]
impl<S: ScriptSource + ?Sized> ScriptSource for std::sync::Arc<S> {
  async fn list_local_scripts(&self) -> Result<Vec<LocalScript>, SourceError> {
    (**self).list_local_scripts().await
  }

  async fn list_remote_scripts(&self) -> Result<Vec<RemoteScript>, SourceError> {
    (**self).list_remote_scripts().await
  }

  async fn fetch_remote_content(&self, path: &str) -> Result<String, SourceError> {
    (**self).fetch_remote_content(path).await
  }
}

/// Script ids arrive as numbers from the API and as strings from the editor.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Id {
    Text(String),
    Number(u64),
  }

  Ok(match Id::deserialize(deserializer)? {
    Id::Text(s) => s,
    Id::Number(n) => n.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_local_script_accepts_numeric_id() {
    let script: LocalScript = serde_json::from_str(
      r#"{"id": 3, "name": "deploy", "type": "bash-script", "content": "echo hi"}"#,
    )
    .unwrap();
    assert_eq!(script.id, "3");

    let script: LocalScript = serde_json::from_str(
      r#"{"id": "abc", "name": "deploy", "type": "bash-script", "content": ""}"#,
    )
    .unwrap();
    assert_eq!(script.id, "abc");
  }
}
