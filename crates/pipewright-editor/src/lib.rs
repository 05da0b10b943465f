//! Pipewright Editor
//!
//! An [`EditorSession`] ties the pieces of the editor core together: the
//! graph being edited, the live workflow preview compiled from it, and the
//! persistence, run and publish APIs.
//!
//! Overlapping compilations are resolved last-write-wins: the compilation
//! issued last is the one whose result becomes the preview, whatever order
//! they finish in.

mod api;
mod error;
mod notice;
mod preview;
mod session;

pub use api::{CatalogPublisher, PipelineStore, RunSubmitter, Saved};
pub use error::{ApiError, EditorError};
pub use notice::{ChannelNotifier, NoopNotifier, Notice, NoticeLevel, Notifier};
pub use preview::Preview;
pub use session::EditorSession;
