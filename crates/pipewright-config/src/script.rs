use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference from a script node to the script it runs.
///
/// Serialized externally tagged:
/// `{"local": "3"}` or `{"remote": "bash_scripts/deploy.sh"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptRef {
  /// Identifier of a script saved in the local script library.
  Local(String),

  /// Path of a script inside the remote catalog, e.g. "bash_scripts/deploy.sh"
  Remote(String),
}

impl ScriptRef {
  pub fn local(id: impl Into<String>) -> Self {
    Self::Local(id.into())
  }

  pub fn remote(path: impl Into<String>) -> Self {
    Self::Remote(path.into())
  }

  pub fn is_remote(&self) -> bool {
    matches!(self, Self::Remote(_))
  }
}

impl fmt::Display for ScriptRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Local(id) => write!(f, "local:{}", id),
      Self::Remote(path) => write!(f, "remote:{}", path),
    }
  }
}
