//! Channel-driven log consumer.
//!
//! The `LogConsumer` owns the receiving end of a bounded event channel and
//! applies events to a [`LogView`] one at a time, in arrival order.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::LogEvent;
use crate::view::{LogUpdate, LogView};

/// Default number of events buffered between producer and consumer.
pub const DEFAULT_CAPACITY: usize = 100;

/// Receives the view after every applied event.
///
/// Implement this to draw the log somewhere (terminal, UI, test capture).
pub trait LogRenderer: Send {
  fn render(&mut self, view: &LogView, update: LogUpdate);
}

/// A renderer that draws nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopRenderer;

impl LogRenderer for NoopRenderer {
  fn render(&mut self, _view: &LogView, _update: LogUpdate) {}
}

/// Drains one run's event channel into a [`LogView`].
///
/// # Usage
///
/// ```ignore
/// let (sender, consumer) = LogConsumer::new(renderer);
///
/// // Hand the sender to whatever produces events
/// tokio::spawn(async move { executor.run(&store, sender).await });
///
/// // Closing the view cancels the token; the loop stops draining
/// let cancel = CancellationToken::new();
/// let view = consumer.run(cancel).await;
/// ```
pub struct LogConsumer<R: LogRenderer> {
  session_id: Uuid,
  receiver: mpsc::Receiver<LogEvent>,
  view: LogView,
  renderer: R,
}

impl<R: LogRenderer> LogConsumer<R> {
  /// Create a consumer and the sender for its channel.
  pub fn new(renderer: R) -> (mpsc::Sender<LogEvent>, Self) {
    Self::with_capacity(renderer, DEFAULT_CAPACITY)
  }

  /// Create a consumer with a custom channel capacity.
  pub fn with_capacity(renderer: R, capacity: usize) -> (mpsc::Sender<LogEvent>, Self) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let consumer = Self {
      session_id: Uuid::new_v4(),
      receiver,
      view: LogView::new(),
      renderer,
    };
    (sender, consumer)
  }

  pub fn session_id(&self) -> Uuid {
    self.session_id
  }

  /// Consume events until the token is cancelled or every sender is gone.
  ///
  /// Cancellation wins over pending events; nothing is drained after it.
  pub async fn run(mut self, cancel: CancellationToken) -> LogView {
    info!(session_id = %self.session_id, "attached to event channel");

    loop {
      tokio::select! {
        biased;

        _ = cancel.cancelled() => {
          info!(session_id = %self.session_id, "log view closed");
          break;
        }
        event = self.receiver.recv() => {
          match event {
            Some(event) => {
              debug!(session_id = %self.session_id, kind = ?event.kind, "log event");
              let update = self.view.apply(event);
              self.renderer.render(&self.view, update);
            }
            None => {
              info!(
                session_id = %self.session_id,
                entries = self.view.len(),
                "event channel closed"
              );
              break;
            }
          }
        }
      }
    }

    self.view
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, Mutex};
  use std::time::Duration;

  use crate::event::LogKind;

  /// Records every update it is handed.
  #[derive(Clone, Default)]
  struct Recorder {
    updates: Arc<Mutex<Vec<LogUpdate>>>,
  }

  impl LogRenderer for Recorder {
    fn render(&mut self, _view: &LogView, update: LogUpdate) {
      self.updates.lock().unwrap().push(update);
    }
  }

  #[tokio::test]
  async fn test_drains_in_order_until_closed() {
    let recorder = Recorder::default();
    let (sender, consumer) = LogConsumer::new(recorder.clone());

    let producer = tokio::spawn(async move {
      sender.send(LogEvent::info("Executing step: deploy")).await.unwrap();
      sender.send(LogEvent::output("hi")).await.unwrap();
      sender.send(LogEvent::success("deploy ok")).await.unwrap();
    });

    let view = consumer.run(CancellationToken::new()).await;
    producer.await.unwrap();

    let kinds: Vec<LogKind> = view.entries().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![LogKind::Info, LogKind::Output, LogKind::Success]);

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[2].finalized, Some(0));
  }

  #[tokio::test]
  async fn test_cancel_stops_draining() {
    let (sender, consumer) = LogConsumer::with_capacity(NoopRenderer, 4);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let handle = tokio::spawn(async move { consumer.run(cancel_clone).await });

    sender.send(LogEvent::info("before close")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let view = handle.await.unwrap();
    assert_eq!(view.len(), 1);

    // The producer is not told anything; sends just stop landing.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(sender.send(LogEvent::info("after close")).await.is_err());
  }

  #[tokio::test]
  async fn test_cancelled_before_start_applies_nothing() {
    let (sender, consumer) = LogConsumer::new(NoopRenderer);
    sender.send(LogEvent::info("queued")).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let view = consumer.run(cancel).await;
    assert!(view.is_empty());
  }
}
