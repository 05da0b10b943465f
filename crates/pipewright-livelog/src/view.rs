//! Live log state.
//!
//! [`LogView`] is a pure state machine over the event history: the same
//! events applied in the same order always produce the same entries.

use crate::event::{LogEvent, LogKind};

/// Headers starting with this mark the start of a step.
pub const STEP_PREFIX: &str = "Executing step:";

/// Progress a running step is animated toward. Never 100 until finalized.
pub const NEAR_COMPLETE: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
  Info,
  Success,
  Error,
}

impl Icon {
  fn for_kind(kind: LogKind) -> Self {
    match kind {
      LogKind::Success => Self::Success,
      LogKind::Error => Self::Error,
      _ => Self::Info,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
  pub icon: Icon,
  pub text: String,
}

/// Collapsible body of an output or error entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
  pub body: String,
  pub expanded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  pub percent: u8,
  /// Type of the event that finalized this step, once finalized.
  pub outcome: Option<LogKind>,
}

impl Progress {
  fn started() -> Self {
    Self {
      percent: NEAR_COMPLETE,
      outcome: None,
    }
  }

  pub fn is_finished(&self) -> bool {
    self.outcome.is_some()
  }
}

/// A rendered log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
  /// Arrival index, starting at 0.
  pub sequence: usize,
  /// Kind as rendered. Unknown event types become info.
  pub kind: LogKind,
  pub header: Option<Header>,
  pub detail: Option<Detail>,
  pub progress: Option<Progress>,
}

/// What one [`LogView::apply`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogUpdate {
  /// Index of the appended entry.
  pub appended: usize,
  /// Index of the entry whose progress was finalized, if any.
  pub finalized: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LogView {
  entries: Vec<LogEntry>,
  in_flight: Option<usize>,
  scroll_position: usize,
}

impl LogView {
  pub fn new() -> Self {
    Self::default()
  }

  /// Apply one event.
  ///
  /// A terminal event finalizes the in-flight step before its own entry is
  /// appended, so a terminal event that itself starts a step is left
  /// running.
  pub fn apply(&mut self, event: LogEvent) -> LogUpdate {
    let kind = match event.kind {
      LogKind::Unknown => LogKind::Info,
      kind => kind,
    };

    let header = match kind {
      LogKind::Output => None,
      _ => Some(Header {
        icon: Icon::for_kind(kind),
        text: event.message.clone(),
      }),
    };

    let detail = match kind {
      LogKind::Output | LogKind::Error => Some(Detail {
        body: event.message.clone(),
        expanded: false,
      }),
      _ => None,
    };

    let starts_step = header
      .as_ref()
      .is_some_and(|h| h.text.starts_with(STEP_PREFIX));

    let mut finalized = None;
    if kind.is_terminal()
      && let Some(index) = self.in_flight.take()
      && let Some(progress) = self.entries[index].progress.as_mut()
    {
      progress.percent = 100;
      progress.outcome = Some(kind);
      finalized = Some(index);
    }

    let sequence = self.entries.len();
    self.entries.push(LogEntry {
      sequence,
      kind,
      header,
      detail,
      progress: starts_step.then(Progress::started),
    });

    if starts_step {
      self.in_flight = Some(sequence);
    }
    self.scroll_position = sequence;

    LogUpdate {
      appended: sequence,
      finalized,
    }
  }

  /// Flip the expanded state of an entry's detail body.
  ///
  /// Returns the new state, or `None` when the entry has no detail.
  pub fn toggle_detail(&mut self, index: usize) -> Option<bool> {
    let detail = self.entries.get_mut(index)?.detail.as_mut()?;
    detail.expanded = !detail.expanded;
    Some(detail.expanded)
  }

  pub fn entries(&self) -> &[LogEntry] {
    &self.entries
  }

  pub fn entry(&self, index: usize) -> Option<&LogEntry> {
    self.entries.get(index)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Index of the step whose progress is still running.
  pub fn in_flight(&self) -> Option<usize> {
    self.in_flight
  }

  /// Index of the entry the view is scrolled to (always the newest).
  pub fn scroll_position(&self) -> usize {
    self.scroll_position
  }
}
