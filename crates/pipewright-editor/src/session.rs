use std::sync::Arc;

use pipewright_compiler::{CompiledWorkflow, Compiler};
use pipewright_config::{Branch, Edge, Node, NodeId, NodeSpec, PipelineId, Position};
use pipewright_graph::{GraphError, GraphStore};
use pipewright_resolver::Resolver;
use tracing::{debug, info, warn};

use crate::api::{CatalogPublisher, PipelineStore, RunSubmitter};
use crate::error::{ApiError, EditorError};
use crate::notice::{NoopNotifier, Notice, Notifier};
use crate::preview::Preview;

/// One pipeline being edited.
///
/// Owns the graph, compiles it into a live preview and talks to the
/// persistence and run APIs. [`edit`](Self::edit) applies a graph change and
/// recompiles the preview. The single-purpose edit methods only change the
/// graph and mark the preview stale, for callers that batch several edits
/// before one [`recompile`](Self::recompile). Failed API calls emit exactly
/// one error notice and leave the session as it was.
pub struct EditorSession {
  store: GraphStore,
  pipeline_id: Option<PipelineId>,
  compiler: Compiler<Arc<dyn Resolver>>,
  preview: Preview,
  pipelines: Arc<dyn PipelineStore>,
  runs: Arc<dyn RunSubmitter>,
  notifier: Arc<dyn Notifier>,
}

impl EditorSession {
  /// Start a session on a new, unsaved pipeline.
  pub fn new(
    resolver: Arc<dyn Resolver>,
    pipelines: Arc<dyn PipelineStore>,
    runs: Arc<dyn RunSubmitter>,
  ) -> Self {
    Self {
      store: GraphStore::default(),
      pipeline_id: None,
      compiler: Compiler::new(resolver),
      preview: Preview::new(),
      pipelines,
      runs,
      notifier: Arc::new(NoopNotifier),
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn store(&self) -> &GraphStore {
    &self.store
  }

  pub fn pipeline_id(&self) -> Option<PipelineId> {
    self.pipeline_id
  }

  pub fn rename(&mut self, name: impl Into<String>) {
    self.store.rename(name);
  }

  pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId, EditorError> {
    Ok(self.store.add_node(spec)?.id)
  }

  pub fn delete_node(&mut self, id: NodeId) -> Result<Node, EditorError> {
    Ok(self.store.delete_node(id)?)
  }

  pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), EditorError> {
    Ok(self.store.move_node(id, position)?)
  }

  pub fn add_edge(&mut self, from: NodeId, to: NodeId, branch: Branch) -> Result<Edge, EditorError> {
    Ok(self.store.add_edge(from, to, branch)?)
  }

  pub fn remove_edge(
    &mut self,
    from: NodeId,
    to: NodeId,
    branch: Branch,
  ) -> Result<Edge, EditorError> {
    Ok(self.store.remove_edge(from, to, branch)?)
  }

  /// Apply a change to the graph and recompile the preview.
  ///
  /// A rejected change leaves both the graph and the preview untouched.
  pub async fn edit<T>(
    &mut self,
    change: impl FnOnce(&mut GraphStore) -> Result<T, GraphError>,
  ) -> Result<T, EditorError> {
    let value = change(&mut self.store)?;
    self.recompile().await;
    Ok(value)
  }

  /// Compile the current graph and publish it as the preview.
  ///
  /// Returns the workflow if it became the preview; `None` when a
  /// compilation issued later has already published.
  pub async fn recompile(&self) -> Option<Arc<CompiledWorkflow>> {
    let ticket = self.preview.issue();
    let snapshot = self.store.clone();
    debug!(ticket, revision = snapshot.revision(), "compiling preview");

    let workflow = self.compiler.compile(&snapshot).await;
    let published = self.preview.publish(ticket, workflow);
    if published.is_none() {
      debug!(ticket, "superseded compilation discarded");
    }
    published
  }

  /// The most recently published preview.
  pub fn preview(&self) -> Option<Arc<CompiledWorkflow>> {
    self.preview.current()
  }

  /// Whether the graph changed since the preview was compiled.
  pub fn is_stale(&self) -> bool {
    self
      .preview
      .current()
      .is_none_or(|w| w.revision != self.store.revision())
  }

  /// Save the pipeline, creating it on first save.
  pub async fn save(&mut self) -> Result<PipelineId, EditorError> {
    if self.store.name().trim().is_empty() {
      return Err(self.fail(EditorError::MissingName));
    }

    let pipeline = self.store.to_pipeline();
    let saved = match self.pipelines.save(&pipeline, self.pipeline_id).await {
      Ok(saved) => saved,
      Err(e) => return Err(self.fail_api("save", e)),
    };

    info!(pipeline_id = saved.id, name = %pipeline.name, "pipeline saved");
    self.pipeline_id = Some(saved.id);
    self.notifier.notify(Notice::info(match saved.message.as_str() {
      "" => "Pipeline saved.".to_string(),
      message => message.to_string(),
    }));
    Ok(saved.id)
  }

  /// Replace the session's graph with a stored pipeline.
  ///
  /// The previous preview is discarded; callers recompile.
  pub async fn load(&mut self, id: PipelineId) -> Result<(), EditorError> {
    let pipeline = match self.pipelines.load(id).await {
      Ok(pipeline) => pipeline,
      Err(e) => return Err(self.fail_api("load", e)),
    };
    let store = match GraphStore::from_pipeline(pipeline) {
      Ok(store) => store,
      Err(e) => return Err(self.fail(e.into())),
    };

    info!(pipeline_id = id, nodes = store.len(), "pipeline loaded");
    self.store = store;
    self.pipeline_id = Some(id);
    self.preview.clear();
    Ok(())
  }

  /// Submit the saved pipeline for execution.
  pub async fn run(&self, dry_run: bool) -> Result<PipelineId, EditorError> {
    let Some(id) = self.pipeline_id else {
      return Err(self.fail(EditorError::NotSaved));
    };

    if let Err(e) = self.runs.start_run(id, dry_run).await {
      return Err(self.fail_api("run", e));
    }

    info!(pipeline_id = id, dry_run, "run submitted");
    self.notifier.notify(Notice::info("Pipeline execution started."));
    Ok(id)
  }

  /// Compile the current graph and push the document to the catalog.
  pub async fn publish(&self, publisher: &dyn CatalogPublisher) -> Result<(), EditorError> {
    let workflow = self.compiler.compile(&self.store).await;
    let document = workflow.document();
    let yaml = match document.to_yaml() {
      Ok(yaml) => yaml,
      Err(e) => return Err(self.fail(EditorError::Render(e.to_string()))),
    };

    if let Err(e) = publisher.publish(&document.name, &yaml).await {
      return Err(self.fail_api("publish", e));
    }

    info!(name = %document.name, "pipeline published");
    self.notifier.notify(Notice::info("Pipeline pushed to catalog."));
    Ok(())
  }

  fn fail(&self, error: EditorError) -> EditorError {
    self.notifier.notify(Notice::error(error.to_string()));
    error
  }

  fn fail_api(&self, operation: &str, error: ApiError) -> EditorError {
    warn!(operation, error = %error, "api call failed");
    self.fail(EditorError::Api(error))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use pipewright_config::{Pipeline, ScriptRef};
  use pipewright_resolver::ResolveError;
  use std::collections::HashMap;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;
  use tokio::sync::mpsc;

  use crate::api::Saved;
  use crate::notice::{ChannelNotifier, NoticeLevel};

  /// In-memory pipeline store.
  #[derive(Default)]
  struct MemoryStore {
    pipelines: Mutex<HashMap<PipelineId, Pipeline>>,
    runs: Mutex<Vec<(PipelineId, bool)>>,
    offline: bool,
  }

  impl MemoryStore {
    fn offline() -> Self {
      Self {
        offline: true,
        ..Self::default()
      }
    }

    fn check(&self) -> Result<(), ApiError> {
      if self.offline {
        return Err(ApiError::Transport("connection refused".to_string()));
      }
      Ok(())
    }
  }

  #[async_trait]
  impl PipelineStore for MemoryStore {
    async fn save(&self, pipeline: &Pipeline, id: Option<PipelineId>) -> Result<Saved, ApiError> {
      self.check()?;
      let mut pipelines = self.pipelines.lock().unwrap();
      let id = id.unwrap_or(pipelines.len() as PipelineId + 1);
      pipelines.insert(id, pipeline.clone());
      Ok(Saved {
        id,
        message: "Pipeline saved successfully!".to_string(),
      })
    }

    async fn load(&self, id: PipelineId) -> Result<Pipeline, ApiError> {
      self.check()?;
      self
        .pipelines
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or(ApiError::NotFound(id))
    }
  }

  #[async_trait]
  impl RunSubmitter for MemoryStore {
    async fn start_run(&self, id: PipelineId, dry_run: bool) -> Result<(), ApiError> {
      self.check()?;
      self.runs.lock().unwrap().push((id, dry_run));
      Ok(())
    }
  }

  #[async_trait]
  impl CatalogPublisher for MemoryStore {
    async fn publish(&self, _name: &str, _document: &str) -> Result<(), ApiError> {
      self.check()
    }
  }

  /// First resolution is slow and returns "old"; later ones return "new".
  #[derive(Default)]
  struct SlowFirstResolver {
    calls: AtomicUsize,
  }

  #[async_trait]
  impl Resolver for SlowFirstResolver {
    async fn resolve(&self, _script: &ScriptRef) -> Result<String, ResolveError> {
      if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        return Ok("old".to_string());
      }
      Ok("new".to_string())
    }
  }

  fn session_with(
    backend: Arc<MemoryStore>,
  ) -> (EditorSession, mpsc::UnboundedReceiver<Notice>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let session = EditorSession::new(
      Arc::new(SlowFirstResolver::default()),
      backend.clone(),
      backend,
    )
    .with_notifier(Arc::new(ChannelNotifier::new(sender)));
    (session, receiver)
  }

  fn build_deploy(session: &mut EditorSession) {
    session.rename("deploy");
    let host = session.add_node(NodeSpec::host("web-1", "1")).unwrap();
    let script = session
      .add_node(NodeSpec::script("deploy", ScriptRef::local("1")))
      .unwrap();
    session.add_edge(host, script, Branch::Success).unwrap();
  }

  #[tokio::test]
  async fn test_edit_recompiles_preview() {
    let (mut session, _notices) = session_with(Arc::new(MemoryStore::default()));

    let host = session
      .edit(|graph| graph.add_node(NodeSpec::host("web-1", "1")).map(|n| n.id))
      .await
      .unwrap();
    assert!(!session.is_stale());

    let script = session
      .edit(|graph| {
        graph
          .add_node(NodeSpec::script("deploy", ScriptRef::local("1")))
          .map(|n| n.id)
      })
      .await
      .unwrap();
    session
      .edit(|graph| graph.add_edge(host, script, Branch::Success))
      .await
      .unwrap();

    let preview = session.preview().unwrap();
    assert!(!session.is_stale());
    assert_eq!(preview.revision, session.store().revision());
    assert_eq!(preview.job("run-on-web-1").unwrap().steps.len(), 1);

    let rejected = session
      .edit(|graph| graph.add_edge(script, script, Branch::Success))
      .await;
    assert!(matches!(
      rejected,
      Err(EditorError::Graph(GraphError::InvalidEdge { .. }))
    ));
    assert!(!session.is_stale());
    assert!(Arc::ptr_eq(&session.preview().unwrap(), &preview));
  }

  fn drain(receiver: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = receiver.try_recv() {
      notices.push(notice);
    }
    notices
  }

  #[tokio::test]
  async fn test_later_compilation_wins() {
    let (mut session, _notices) = session_with(Arc::new(MemoryStore::default()));
    build_deploy(&mut session);

    let (first, second) = tokio::join!(session.recompile(), session.recompile());

    assert!(first.is_none());
    let second = second.unwrap();
    let job = second.job("run-on-web-1").unwrap();
    assert_eq!(job.steps[0], pipewright_compiler::Step::run("Run deploy", "new"));
    assert_eq!(session.preview().unwrap(), second);
    assert!(!session.is_stale());
  }

  #[tokio::test]
  async fn test_edit_makes_preview_stale() {
    let (mut session, _notices) = session_with(Arc::new(MemoryStore::default()));
    build_deploy(&mut session);
    session.recompile().await.unwrap();

    session.move_node(1, Position::new(5.0, 5.0)).unwrap();
    assert!(session.is_stale());
  }

  #[tokio::test]
  async fn test_invalid_edge_is_rejected_without_mutation() {
    let (mut session, _notices) = session_with(Arc::new(MemoryStore::default()));
    build_deploy(&mut session);
    let revision = session.store().revision();

    assert!(matches!(
      session.add_edge(2, 2, Branch::Success),
      Err(EditorError::Graph(_))
    ));
    assert_eq!(session.store().revision(), revision);
    assert_eq!(session.store().edges().len(), 1);
  }

  #[tokio::test]
  async fn test_save_requires_name() {
    let (mut session, mut notices) = session_with(Arc::new(MemoryStore::default()));

    assert!(matches!(session.save().await, Err(EditorError::MissingName)));
    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
  }

  #[tokio::test]
  async fn test_save_assigns_id_then_updates() {
    let backend = Arc::new(MemoryStore::default());
    let (mut session, mut notices) = session_with(backend.clone());
    build_deploy(&mut session);

    let id = session.save().await.unwrap();
    assert_eq!(session.pipeline_id(), Some(id));

    session.rename("deploy v2");
    assert_eq!(session.save().await.unwrap(), id);
    assert_eq!(backend.pipelines.lock().unwrap()[&id].name, "deploy v2");

    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0], Notice::info("Pipeline saved successfully!"));
  }

  #[tokio::test]
  async fn test_failed_save_leaves_state_unchanged() {
    let (mut session, mut notices) = session_with(Arc::new(MemoryStore::offline()));
    build_deploy(&mut session);
    let revision = session.store().revision();

    assert!(matches!(
      session.save().await,
      Err(EditorError::Api(ApiError::Transport(_)))
    ));
    assert_eq!(session.pipeline_id(), None);
    assert_eq!(session.store().revision(), revision);

    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
  }

  #[tokio::test]
  async fn test_load_replaces_graph_and_resumes_ids() {
    let backend = Arc::new(MemoryStore::default());
    let (mut source, _) = session_with(backend.clone());
    build_deploy(&mut source);
    let id = source.save().await.unwrap();

    let (mut session, _) = session_with(backend);
    session.add_node(NodeSpec::conditional("scratch")).unwrap();
    session.recompile().await;

    session.load(id).await.unwrap();

    assert_eq!(session.store().name(), "deploy");
    assert_eq!(session.store().len(), 2);
    assert_eq!(session.pipeline_id(), Some(id));
    assert!(session.preview().is_none());
    assert_eq!(session.add_node(NodeSpec::conditional("next")).unwrap(), 3);
  }

  #[tokio::test]
  async fn test_failed_load_keeps_current_graph() {
    let (mut session, mut notices) = session_with(Arc::new(MemoryStore::default()));
    build_deploy(&mut session);

    assert!(matches!(
      session.load(42).await,
      Err(EditorError::Api(ApiError::NotFound(42)))
    ));
    assert_eq!(session.store().name(), "deploy");
    assert_eq!(session.store().len(), 2);
    assert_eq!(drain(&mut notices).len(), 1);
  }

  #[tokio::test]
  async fn test_run_requires_saved_pipeline() {
    let backend = Arc::new(MemoryStore::default());
    let (mut session, mut notices) = session_with(backend.clone());
    build_deploy(&mut session);

    assert!(matches!(session.run(true).await, Err(EditorError::NotSaved)));
    assert_eq!(
      drain(&mut notices),
      vec![Notice::error("Please save the pipeline before running.")]
    );

    let id = session.save().await.unwrap();
    session.run(true).await.unwrap();
    assert_eq!(*backend.runs.lock().unwrap(), vec![(id, true)]);
  }

  #[tokio::test]
  async fn test_publish_failure_notifies_once() {
    let (mut session, mut notices) = session_with(Arc::new(MemoryStore::default()));
    build_deploy(&mut session);

    let offline = MemoryStore::offline();
    assert!(session.publish(&offline).await.is_err());
    assert_eq!(drain(&mut notices).len(), 1);

    session.publish(&MemoryStore::default()).await.unwrap();
    assert_eq!(
      drain(&mut notices),
      vec![Notice::info("Pipeline pushed to catalog.")]
    );
  }
}
