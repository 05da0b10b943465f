use std::fmt;

use pipewright_config::{NodeId, ScriptRef};

/// Something the compiler worked around instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
  /// Script content was unavailable; the step carries a placeholder.
  ScriptUnresolved {
    job_key: String,
    node_id: NodeId,
    script: ScriptRef,
    message: String,
  },

  /// A node was reached again on its own path; the branch was cut there.
  CycleDetected { job_key: String, node_id: NodeId },

  /// Two hosts slug to the same job key; the later job replaced the earlier.
  DuplicateJobKey { job_key: String },
}

impl Diagnostic {
  pub fn job_key(&self) -> &str {
    match self {
      Self::ScriptUnresolved { job_key, .. }
      | Self::CycleDetected { job_key, .. }
      | Self::DuplicateJobKey { job_key } => job_key,
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ScriptUnresolved {
        job_key,
        node_id,
        script,
        message,
      } => write!(
        f,
        "{}: script {} for node {} unresolved: {}",
        job_key, script, node_id, message
      ),
      Self::CycleDetected { job_key, node_id } => {
        write!(f, "{}: cycle detected at node {}", job_key, node_id)
      }
      Self::DuplicateJobKey { job_key } => {
        write!(f, "{}: job key produced by more than one host", job_key)
      }
    }
  }
}
