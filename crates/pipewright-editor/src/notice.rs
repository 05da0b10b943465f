//! User-visible notices.
//!
//! The session reports the outcome of save/load/run through a
//! [`Notifier`]; implementations decide how to show them (toast, stderr,
//! test capture).

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Info,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: NoticeLevel::Error,
      message: message.into(),
    }
  }
}

/// Trait for receiving session notices.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// A notifier that discards all notices.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _notice: Notice) {}
}

/// A notifier that forwards notices to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<Notice>) -> Self {
    Self { sender }
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notice: Notice) {
    // Receiver may have been dropped
    let _ = self.sender.send(notice);
  }
}
