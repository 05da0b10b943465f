//! Pipewright Live Log
//!
//! Consumes the execution event stream of a pipeline run and maintains the
//! live log state: rendered entries, collapsible details, the progress of
//! the step in flight and the scroll position.
//!
//! # Architecture
//!
//! ```text
//! producer (executor, DryRunExecutor, stdin)
//!         │  LogEvent {type, message}
//!         ▼
//!   bounded mpsc channel
//!         │
//!         ▼
//!   LogConsumer::run(cancel) ──▶ LogView::apply ──▶ LogRenderer::render
//! ```
//!
//! Events are applied strictly one at a time in arrival order. Closing the
//! view cancels the consumer's token; the producer is not signalled.

mod consumer;
mod dry_run;
mod error;
mod event;
mod view;

pub use consumer::{DEFAULT_CAPACITY, LogConsumer, LogRenderer, NoopRenderer};
pub use dry_run::DryRunExecutor;
pub use error::LogError;
pub use event::{LogEvent, LogKind};
pub use view::{
  Detail, Header, Icon, LogEntry, LogUpdate, LogView, NEAR_COMPLETE, Progress, STEP_PREFIX,
};
