use indexmap::IndexMap;
use pipewright_config::{NodeKind, NotifyChannel};

use crate::diagnostic::Diagnostic;
use crate::document::{self, WorkflowDocument};

/// What a step does when the job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
  /// Run a shell payload on the job's host.
  Run { command: String },
  /// Invoke a packaged action by identifier.
  Use { action: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub name: String,
  pub kind: StepKind,
}

impl Step {
  pub fn run(name: impl Into<String>, command: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Run {
        command: command.into(),
      },
    }
  }

  pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: StepKind::Use {
        action: action.into(),
      },
    }
  }
}

/// The linear step sequence derived for one host node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledJob {
  pub job_key: String,
  pub runs_on: String,
  pub steps: Vec<Step>,
}

/// Output of one compilation.
///
/// Jobs are keyed by job key in the order the compiler produced them.
/// `revision` is the graph revision the output was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledWorkflow {
  pub name: String,
  pub revision: u64,
  pub jobs: IndexMap<String, CompiledJob>,
  pub diagnostics: Vec<Diagnostic>,
}

impl CompiledWorkflow {
  /// Project into the declarative workflow document.
  pub fn document(&self) -> WorkflowDocument {
    document::serialize(&self.name, &self.jobs)
  }

  pub fn job(&self, job_key: &str) -> Option<&CompiledJob> {
    self.jobs.get(job_key)
  }
}

/// Fixed action identifier for nodes compiled into `uses` steps.
pub fn action_for(kind: &NodeKind) -> Option<&'static str> {
  match kind {
    NodeKind::Conditional => Some("pipewright/conditional@v1"),
    NodeKind::Notify { channel } => Some(match channel {
      NotifyChannel::Discord => "pipewright/notify-discord@v1",
      NotifyChannel::Email => "pipewright/notify-email@v1",
      NotifyChannel::AiAnalysis => "pipewright/ai-analysis@v1",
    }),
    NodeKind::Host | NodeKind::Script => None,
  }
}
