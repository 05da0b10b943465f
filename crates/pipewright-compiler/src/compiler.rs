//! Graph to workflow compilation.
//!
//! Compilation runs in two phases:
//! 1. Planning walks the graph from every host node and records the steps
//!    to emit, without touching script content.
//! 2. Every distinct script reference in the plan is resolved concurrently,
//!    then the planned steps are materialized into jobs.
//!
//! Compilation never fails. Unresolvable scripts and cycles are reported as
//! diagnostics and show up in the document as comment-only steps.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use indexmap::IndexMap;
use pipewright_config::{Node, NodeId, NodeKind, ScriptRef};
use pipewright_graph::{Graph, GraphStore};
use pipewright_resolver::{ResolveError, Resolver};
use tracing::{debug, warn};

use crate::diagnostic::Diagnostic;
use crate::job::{CompiledJob, CompiledWorkflow, Step, action_for};
use crate::slug::job_key;

/// A step decided during planning, before script content is known.
#[derive(Debug, Clone)]
enum PlannedStep {
  Run {
    node_id: NodeId,
    name: String,
    script: Option<ScriptRef>,
  },
  Use {
    name: String,
    action: &'static str,
  },
  Cycle {
    node_id: NodeId,
    name: String,
  },
}

#[derive(Debug)]
struct PlannedJob {
  job_key: String,
  runs_on: String,
  steps: Vec<PlannedStep>,
}

/// Compiles a pipeline graph into per-host jobs.
pub struct Compiler<R: Resolver> {
  resolver: R,
}

impl<R: Resolver> Compiler<R> {
  pub fn new(resolver: R) -> Self {
    Self { resolver }
  }

  pub fn resolver(&self) -> &R {
    &self.resolver
  }

  /// Compile the current graph.
  pub async fn compile(&self, store: &GraphStore) -> CompiledWorkflow {
    let plan = plan(store);

    let mut scripts: Vec<ScriptRef> = Vec::new();
    let mut seen = HashSet::new();
    for step in plan.iter().flat_map(|job| &job.steps) {
      if let PlannedStep::Run {
        script: Some(script),
        ..
      } = step
        && seen.insert(script)
      {
        scripts.push(script.clone());
      }
    }

    debug!(scripts = scripts.len(), "resolving scripts");
    let results = join_all(scripts.iter().map(|s| self.resolver.resolve(s))).await;
    let resolved: HashMap<ScriptRef, Result<String, ResolveError>> =
      scripts.into_iter().zip(results).collect();

    materialize(store, plan, &resolved)
  }
}

/// Plan the steps of every host job, in host order.
fn plan(store: &GraphStore) -> Vec<PlannedJob> {
  let graph = store.graph();

  store
    .hosts()
    .map(|host| PlannedJob {
      job_key: job_key(&host.name),
      runs_on: host.name.clone(),
      steps: walk(store, &graph, host),
    })
    .collect()
}

/// Depth-first walk from `host`, following every outgoing edge in insertion
/// order regardless of branch label.
///
/// Each frame on the explicit stack is `(node, next edge index)`. `on_path`
/// holds the nodes of the current branch only, so a node may be reached again
/// through a different branch, but reaching a node that is already on the
/// path emits a cycle step and cuts that branch.
fn walk(store: &GraphStore, graph: &Graph, host: &Node) -> Vec<PlannedStep> {
  let mut steps = Vec::new();
  let mut stack: Vec<(NodeId, usize)> = vec![(host.id, 0)];
  let mut on_path: HashSet<NodeId> = HashSet::from([host.id]);

  while let Some(&(node_id, cursor)) = stack.last() {
    let Some(edge) = graph.downstream(node_id).get(cursor) else {
      stack.pop();
      on_path.remove(&node_id);
      continue;
    };
    if let Some(top) = stack.last_mut() {
      top.1 += 1;
    }

    let Some(next) = store.node(edge.to) else {
      continue;
    };

    if on_path.contains(&next.id) {
      warn!(host = %host.name, node_id = next.id, "cycle detected, cutting branch");
      steps.push(PlannedStep::Cycle {
        node_id: next.id,
        name: next.name.clone(),
      });
      continue;
    }

    match next.kind {
      // A downstream host owns its own job.
      NodeKind::Host => continue,
      NodeKind::Script => steps.push(PlannedStep::Run {
        node_id: next.id,
        name: next.name.clone(),
        script: next.script_ref.clone(),
      }),
      NodeKind::Conditional | NodeKind::Notify { .. } => {
        if let Some(action) = action_for(&next.kind) {
          steps.push(PlannedStep::Use {
            name: use_step_name(next),
            action,
          });
        }
      }
    }

    on_path.insert(next.id);
    stack.push((next.id, 0));
  }

  steps
}

fn use_step_name(node: &Node) -> String {
  match node.kind {
    NodeKind::Conditional => format!("Check {}", node.name),
    _ => format!("Notify {}", node.name),
  }
}

fn materialize(
  store: &GraphStore,
  plan: Vec<PlannedJob>,
  resolved: &HashMap<ScriptRef, Result<String, ResolveError>>,
) -> CompiledWorkflow {
  let mut jobs: IndexMap<String, CompiledJob> = IndexMap::new();
  let mut diagnostics = Vec::new();

  for planned in plan {
    let mut steps = Vec::with_capacity(planned.steps.len());

    for step in planned.steps {
      match step {
        PlannedStep::Run {
          node_id,
          name,
          script,
        } => {
          let content = match script.as_ref().map(|s| (s, resolved.get(s))) {
            Some((_, Some(Ok(content)))) => content.clone(),
            Some((script, outcome)) => {
              let message = match outcome {
                Some(Err(e)) => e.to_string(),
                _ => "not resolved".to_string(),
              };
              warn!(job_key = %planned.job_key, node_id, error = %message, "script unresolved");
              diagnostics.push(Diagnostic::ScriptUnresolved {
                job_key: planned.job_key.clone(),
                node_id,
                script: script.clone(),
                message,
              });
              missing_script_placeholder(&name)
            }
            None => missing_script_placeholder(&name),
          };
          steps.push(Step::run(format!("Run {}", name), content));
        }
        PlannedStep::Use { name, action } => steps.push(Step::uses(name, action)),
        PlannedStep::Cycle { node_id, name } => {
          diagnostics.push(Diagnostic::CycleDetected {
            job_key: planned.job_key.clone(),
            node_id,
          });
          steps.push(Step::run(
            format!("Cycle detected at {}", name),
            format!(
              "# Cycle detected: '{}' is already on this path; traversal stopped.",
              name
            ),
          ));
        }
      }
    }

    if steps.is_empty() {
      debug!(job_key = %planned.job_key, "host has no reachable steps, omitting job");
      continue;
    }

    let job = CompiledJob {
      job_key: planned.job_key.clone(),
      runs_on: planned.runs_on,
      steps,
    };
    if jobs.insert(planned.job_key.clone(), job).is_some() {
      warn!(job_key = %planned.job_key, "duplicate job key, later host wins");
      diagnostics.push(Diagnostic::DuplicateJobKey {
        job_key: planned.job_key,
      });
    }
  }

  CompiledWorkflow {
    name: store.name().to_string(),
    revision: store.revision(),
    jobs,
    diagnostics,
  }
}

fn missing_script_placeholder(name: &str) -> String {
  format!("# Script content for '{}' not found.", name)
}
