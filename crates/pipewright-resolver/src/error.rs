use thiserror::Error;

/// Errors reported by a [`ScriptSource`](crate::ScriptSource).
#[derive(Debug, Error)]
pub enum SourceError {
  /// The requested script does not exist in the source.
  #[error("script not found: {0}")]
  NotFound(String),

  /// The source is not set up (e.g. no remote catalog configured).
  #[error("script source not configured: {0}")]
  NotConfigured(String),

  /// The backing service rejected or failed the request.
  #[error("request failed: {0}")]
  Request(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid script data: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Errors that can occur while resolving a script reference.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Local script id absent from the library loaded at initialization.
  #[error("local script not found: {id}")]
  LocalScriptNotFound { id: String },

  /// Fetching a remote catalog script failed.
  #[error("failed to fetch remote script '{path}'")]
  Fetch {
    path: String,
    #[source]
    source: SourceError,
  },

  /// Listing scripts from the source failed.
  #[error("script source error: {0}")]
  Source(#[from] SourceError),
}
