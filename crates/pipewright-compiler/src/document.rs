//! Declarative workflow document.
//!
//! A pure projection of compiled jobs into the shape an executor consumes:
//!
//! ```yaml
//! name: deploy web
//! on: workflow_dispatch
//! jobs:
//!   run-on-web-1:
//!     runs-on: web-1
//!     steps:
//!     - name: Run deploy
//!       run: echo hi
//! ```
//!
//! No validation happens here; the compiler's output is trusted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::job::{CompiledJob, StepKind};

/// Trigger written into every document.
pub const TRIGGER: &str = "workflow_dispatch";

/// Name used when the pipeline has none.
pub const DEFAULT_NAME: &str = "unnamed-pipeline";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDocument {
  pub name: String,
  pub on: String,
  pub jobs: IndexMap<String, JobDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDocument {
  #[serde(rename = "runs-on")]
  pub runs_on: String,
  pub steps: Vec<StepDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDocument {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub run: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uses: Option<String>,
}

/// Project compiled jobs into a document, keeping job order.
pub fn serialize(name: &str, jobs: &IndexMap<String, CompiledJob>) -> WorkflowDocument {
  let name = match name.trim() {
    "" => DEFAULT_NAME.to_string(),
    _ => name.to_string(),
  };

  let jobs = jobs
    .iter()
    .map(|(key, job)| {
      let steps = job
        .steps
        .iter()
        .map(|step| match &step.kind {
          StepKind::Run { command } => StepDocument {
            name: step.name.clone(),
            run: Some(command.clone()),
            uses: None,
          },
          StepKind::Use { action } => StepDocument {
            name: step.name.clone(),
            run: None,
            uses: Some(action.clone()),
          },
        })
        .collect();

      (
        key.clone(),
        JobDocument {
          runs_on: job.runs_on.clone(),
          steps,
        },
      )
    })
    .collect();

  WorkflowDocument {
    name,
    on: TRIGGER.to_string(),
    jobs,
  }
}

impl WorkflowDocument {
  pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(self)
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

/// Catalog location a pipeline document is published to.
///
/// `"Deploy Web"` becomes `pipelines/deploy_web.yml`.
pub fn catalog_path(pipeline_name: &str) -> String {
  format!(
    "pipelines/{}.yml",
    pipeline_name.replace(' ', "_").to_lowercase()
  )
}
