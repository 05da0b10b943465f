//! Session cache of script content.
//!
//! Entries are keyed by reference identity and never invalidated: once a
//! remote path is fetched its content is reused for the rest of the session,
//! even if the catalog changes underneath.
//!
//! Each key owns a single cell. A lookup that finds the key still being
//! filled waits for that fill instead of starting its own.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use pipewright_config::ScriptRef;
use tokio::sync::{OnceCell, RwLock};

type Cell = Arc<OnceCell<String>>;

#[derive(Clone, Default)]
pub struct ScriptCache {
  cells: Arc<RwLock<HashMap<ScriptRef, Cell>>>,
}

impl ScriptCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn get(&self, key: &ScriptRef) -> Option<String> {
    self
      .cells
      .read()
      .await
      .get(key)
      .and_then(|cell| cell.get().cloned())
  }

  /// Return the cached content, running `fill` when the key has none yet.
  ///
  /// At most one fill per key runs at a time. A failed fill leaves the key
  /// empty and the next caller tries again.
  pub async fn get_or_try_fill<F, Fut, E>(&self, key: &ScriptRef, fill: F) -> Result<String, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, E>>,
  {
    let cell = self.cell(key).await;
    cell.get_or_try_init(fill).await.cloned()
  }

  pub async fn extend(&self, entries: impl IntoIterator<Item = (ScriptRef, String)>) {
    let mut cells = self.cells.write().await;
    for (key, content) in entries {
      cells.insert(key, Arc::new(OnceCell::from(content)));
    }
  }

  /// Number of keys holding content.
  pub async fn len(&self) -> usize {
    self
      .cells
      .read()
      .await
      .values()
      .filter(|cell| cell.initialized())
      .count()
  }

  pub async fn is_empty(&self) -> bool {
    self.len().await == 0
  }

  async fn cell(&self, key: &ScriptRef) -> Cell {
    if let Some(cell) = self.cells.read().await.get(key) {
      return cell.clone();
    }
    self
      .cells
      .write()
      .await
      .entry(key.clone())
      .or_default()
      .clone()
  }
}
