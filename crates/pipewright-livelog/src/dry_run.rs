//! Dry-run event producer.
//!
//! Walks the pipeline the way an executor would and emits the events a real
//! run would produce, without executing anything. Script content is resolved
//! and echoed as output.

use std::collections::HashSet;

use pipewright_config::{Branch, Node, NodeId, NodeKind};
use pipewright_graph::{Graph, GraphStore};
use pipewright_resolver::Resolver;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::LogError;
use crate::event::LogEvent;
use crate::view::STEP_PREFIX;

/// Emits a dry run of a pipeline into an event channel.
pub struct DryRunExecutor<R: Resolver> {
  resolver: R,
}

impl<R: Resolver> DryRunExecutor<R> {
  pub fn new(resolver: R) -> Self {
    Self { resolver }
  }

  /// Emit the full dry-run event sequence for `store`.
  ///
  /// Every node without incoming edges starts a walk. A step that succeeds
  /// continues along its success edge, a failed step along its failure
  /// edge. Returns `LogError::ChannelClosed` as soon as the consumer stops
  /// draining.
  pub async fn run(
    &self,
    store: &GraphStore,
    events: &mpsc::Sender<LogEvent>,
  ) -> Result<(), LogError> {
    let run_id = Uuid::new_v4();
    let graph = store.graph();
    info!(run_id = %run_id, pipeline = %store.name(), "starting dry run");

    emit(events, LogEvent::info(format!("Starting pipeline: '{}'", store.name()))).await?;
    emit(
      events,
      LogEvent::info("*** This is a DRY RUN. No commands will be executed. ***"),
    )
    .await?;

    let starts = graph.entry_points();
    if starts.is_empty() {
      emit(
        events,
        LogEvent::error("Pipeline has no starting point (e.g., a Host node)."),
      )
      .await?;
      return Ok(());
    }

    for &start in starts {
      self.walk(store, &graph, start, events).await?;
    }

    emit(events, LogEvent::info("Pipeline execution finished.")).await?;
    info!(run_id = %run_id, "dry run finished");
    Ok(())
  }

  async fn walk(
    &self,
    store: &GraphStore,
    graph: &Graph,
    start: NodeId,
    events: &mpsc::Sender<LogEvent>,
  ) -> Result<(), LogError> {
    let Some(node) = store.node(start) else {
      return Ok(());
    };

    let mut on_path = HashSet::from([start]);
    let next = self.step(store, graph, node, events).await?;
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(start, next, 0)];

    while let Some((node_id, next, cursor)) = stack.last_mut() {
      let node_id = *node_id;
      let Some(&target) = next.get(*cursor) else {
        on_path.remove(&node_id);
        stack.pop();
        continue;
      };
      *cursor += 1;

      let Some(node) = store.node(target) else {
        continue;
      };

      if on_path.contains(&target) {
        emit(
          events,
          LogEvent::error(format!("Cycle detected at '{}', stopping branch.", node.name)),
        )
        .await?;
        continue;
      }

      let next = self.step(store, graph, node, events).await?;
      on_path.insert(target);
      stack.push((target, next, 0));
    }

    Ok(())
  }

  /// Emit the events of one step and return the nodes to continue with.
  async fn step(
    &self,
    store: &GraphStore,
    graph: &Graph,
    node: &Node,
    events: &mpsc::Sender<LogEvent>,
  ) -> Result<Vec<NodeId>, LogError> {
    emit(events, LogEvent::info(format!("{} {}", STEP_PREFIX, node.name))).await?;

    let succeeded = match node.kind {
      NodeKind::Host => {
        emit(events, LogEvent::success(format!("Targeting host: {}", node.name))).await?;
        true
      }
      NodeKind::Script => self.script_step(store, graph, node, events).await?,
      NodeKind::Conditional | NodeKind::Notify { .. } => true,
    };

    let branch = if succeeded {
      Branch::Success
    } else {
      Branch::Failure
    };
    debug!(node_id = node.id, ?branch, "dry-run step done");

    Ok(
      graph
        .downstream(node.id)
        .iter()
        .filter(|e| e.branch == branch)
        .map(|e| e.to)
        .collect(),
    )
  }

  async fn script_step(
    &self,
    store: &GraphStore,
    graph: &Graph,
    node: &Node,
    events: &mpsc::Sender<LogEvent>,
  ) -> Result<bool, LogError> {
    let Some(host) = host_for(store, graph, node.id) else {
      emit(
        events,
        LogEvent::error(format!("No host found for script: {}", node.name)),
      )
      .await?;
      return Ok(false);
    };

    let content = match &node.script_ref {
      Some(script) => self.resolver.resolve(script).await,
      None => {
        emit(
          events,
          LogEvent::error(format!("Script '{}' has no script reference.", node.name)),
        )
        .await?;
        return Ok(false);
      }
    };

    match content {
      Ok(content) => {
        emit(
          events,
          LogEvent::info(format!(
            "[DRY RUN] Would execute script '{}' on host '{}'.",
            node.name, host.name
          )),
        )
        .await?;
        emit(events, LogEvent::output(content)).await?;
        Ok(true)
      }
      Err(e) => {
        emit(
          events,
          LogEvent::error(format!("Script '{}' not found: {}", node.name, e)),
        )
        .await?;
        Ok(false)
      }
    }
  }
}

/// Follow the first incoming edge upstream until a host is reached.
fn host_for<'a>(store: &'a GraphStore, graph: &Graph, node_id: NodeId) -> Option<&'a Node> {
  let mut seen = HashSet::from([node_id]);
  let mut current = node_id;

  loop {
    let edge = graph.upstream(current).first()?;
    let previous = store.node(edge.from)?;
    if previous.is_host() {
      return Some(previous);
    }
    if !seen.insert(previous.id) {
      return None;
    }
    current = previous.id;
  }
}

async fn emit(events: &mpsc::Sender<LogEvent>, event: LogEvent) -> Result<(), LogError> {
  events.send(event).await.map_err(|_| LogError::ChannelClosed)
}
