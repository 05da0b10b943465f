//! Seams to the services an editing session talks to.

use async_trait::async_trait;
use pipewright_config::{Pipeline, PipelineId};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Answer to a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saved {
  pub id: PipelineId,
  /// Human-readable confirmation from the store.
  #[serde(default)]
  pub message: String,
}

/// Graph persistence API.
#[async_trait]
pub trait PipelineStore: Send + Sync {
  /// Create the pipeline when `id` is `None`, otherwise overwrite it.
  async fn save(&self, pipeline: &Pipeline, id: Option<PipelineId>) -> Result<Saved, ApiError>;

  async fn load(&self, id: PipelineId) -> Result<Pipeline, ApiError>;
}

/// Run submission API.
#[async_trait]
pub trait RunSubmitter: Send + Sync {
  /// Ask the executor to run a saved pipeline. Events arrive separately.
  async fn start_run(&self, id: PipelineId, dry_run: bool) -> Result<(), ApiError>;
}

/// Publishes compiled workflow documents to the script catalog.
#[async_trait]
pub trait CatalogPublisher: Send + Sync {
  async fn publish(&self, name: &str, document: &str) -> Result<(), ApiError>;
}
