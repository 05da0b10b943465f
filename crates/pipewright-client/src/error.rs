use pipewright_editor::ApiError;
use pipewright_resolver::SourceError;
use thiserror::Error;

/// Errors that can occur talking to the HTTP API.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("invalid url: {0}")]
  Url(#[from] url::ParseError),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("{message}")]
  Status { status: u16, message: String },
}

impl From<ClientError> for ApiError {
  fn from(error: ClientError) -> Self {
    match error {
      ClientError::Status { status, message } => ApiError::Rejected { status, message },
      ClientError::Http(e) if e.is_decode() => ApiError::Decode(e.to_string()),
      other => ApiError::Transport(other.to_string()),
    }
  }
}

impl From<ClientError> for SourceError {
  fn from(error: ClientError) -> Self {
    SourceError::Request(error.to_string())
  }
}
