use pipewright_config::PipelineId;
use pipewright_graph::GraphError;
use thiserror::Error;

/// Errors reported by the persistence, run and publish APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// The service answered with an error message.
  #[error("{message}")]
  Rejected { status: u16, message: String },

  #[error("pipeline not found: {0}")]
  NotFound(PipelineId),

  /// The request never got an answer.
  #[error("request failed: {0}")]
  Transport(String),

  /// The answer could not be decoded.
  #[error("invalid response: {0}")]
  Decode(String),
}

/// Errors that can occur in an editing session.
#[derive(Debug, Error)]
pub enum EditorError {
  #[error("Please enter a name for the pipeline.")]
  MissingName,

  #[error("Please save the pipeline before running.")]
  NotSaved,

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  Api(#[from] ApiError),

  /// The compiled document could not be rendered.
  #[error("failed to render workflow document: {0}")]
  Render(String),
}
