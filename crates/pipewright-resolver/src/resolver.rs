use async_trait::async_trait;
use pipewright_config::ScriptRef;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::cache::ScriptCache;
use crate::error::ResolveError;
use crate::source::{RemoteScript, ScriptSource};

/// Resolver turns a script reference into script content.
#[async_trait]
pub trait Resolver: Send + Sync {
  /// Resolve a reference to its content.
  async fn resolve(&self, script: &ScriptRef) -> Result<String, ResolveError>;
}

/// Resolver backed by a [`ScriptSource`] with a session cache.
///
/// The local script library is loaded once, by
/// [`initialize`](Self::initialize) or else on the first local lookup.
/// Remote catalog paths are fetched lazily on first use and then served
/// from the cache.
pub struct CachingResolver<S: ScriptSource> {
  source: S,
  cache: ScriptCache,
  local: OnceCell<usize>,
}

impl<S: ScriptSource> CachingResolver<S> {
  /// Create a new resolver over the given source.
  pub fn new(source: S) -> Self {
    Self {
      source,
      cache: ScriptCache::new(),
      local: OnceCell::new(),
    }
  }

  /// Load the local script library into the cache.
  ///
  /// Returns the number of local scripts loaded. Later calls return the
  /// same count without asking the source again.
  pub async fn initialize(&self) -> Result<usize, ResolveError> {
    let count = self.local.get_or_try_init(|| self.load_local()).await?;
    Ok(*count)
  }

  /// List the remote catalog.
  pub async fn remote_catalog(&self) -> Result<Vec<RemoteScript>, ResolveError> {
    Ok(self.source.list_remote_scripts().await?)
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  pub fn cache(&self) -> &ScriptCache {
    &self.cache
  }

  async fn load_local(&self) -> Result<usize, ResolveError> {
    let scripts = self.source.list_local_scripts().await?;
    let count = scripts.len();

    self
      .cache
      .extend(
        scripts
          .into_iter()
          .map(|s| (ScriptRef::Local(s.id), s.content)),
      )
      .await;

    info!(scripts = count, "loaded local script library");
    Ok(count)
  }

  async fn fetch_remote(&self, path: &str) -> Result<String, ResolveError> {
    debug!(path = %path, "fetching remote script content");

    self
      .source
      .fetch_remote_content(path)
      .await
      .map_err(|source| ResolveError::Fetch {
        path: path.to_string(),
        source,
      })
  }
}

#[async_trait]
impl<S: ScriptSource> Resolver for CachingResolver<S> {
  async fn resolve(&self, script: &ScriptRef) -> Result<String, ResolveError> {
    match script {
      ScriptRef::Local(id) => {
        self.initialize().await?;
        self
          .cache
          .get(script)
          .await
          .ok_or_else(|| ResolveError::LocalScriptNotFound { id: id.clone() })
      }
      ScriptRef::Remote(path) => {
        self
          .cache
          .get_or_try_fill(script, || self.fetch_remote(path))
          .await
      }
    }
  }
}

#[async_trait]
impl<R: Resolver + ?Sized> Resolver for std::sync::Arc<R> {
  async fn resolve(&self, script: &ScriptRef) -> Result<String, ResolveError> {
    (**self).resolve(script).await
  }
}
