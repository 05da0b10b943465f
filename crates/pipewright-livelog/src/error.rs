use thiserror::Error;

/// Errors a log producer can run into.
#[derive(Debug, Error)]
pub enum LogError {
  /// The consumer stopped draining (view closed).
  #[error("event channel closed")]
  ChannelClosed,
}
