use pipewright_editor::{Notice, NoticeLevel, Notifier};
use pipewright_livelog::{Icon, LogEntry, LogKind, LogRenderer, LogUpdate, LogView};

/// Draws the live log to stdout, one line per event.
pub struct TerminalRenderer {
  expand: bool,
}

impl TerminalRenderer {
  /// With `expand`, output and error bodies are shown instead of collapsed.
  pub fn new(expand: bool) -> Self {
    Self { expand }
  }

  fn draw(&self, entry: &LogEntry) {
    if let Some(header) = &entry.header {
      let icon = match header.icon {
        Icon::Info => "i",
        Icon::Success => "+",
        Icon::Error => "x",
      };
      match entry.progress {
        Some(progress) => println!("[{}] {} [{:>3}%]", icon, header.text, progress.percent),
        None => println!("[{}] {}", icon, header.text),
      }
    }

    // Error bodies repeat the header; only show them when expanded.
    if let Some(detail) = &entry.detail {
      if self.expand {
        for line in detail.body.lines() {
          println!("    | {}", line);
        }
      } else if entry.kind == LogKind::Output {
        println!("    > output, {} line(s)", detail.body.lines().count());
      }
    }
  }
}

impl LogRenderer for TerminalRenderer {
  fn render(&mut self, view: &LogView, update: LogUpdate) {
    if let Some(index) = update.finalized
      && let Some(progress) = view.entry(index).and_then(|e| e.progress)
    {
      let outcome = match progress.outcome {
        Some(LogKind::Error) => "failed",
        _ => "done",
      };
      println!("    step #{} {} [100%]", index, outcome);
    }

    if let Some(entry) = view.entry(update.appended) {
      self.draw(entry);
    }
  }
}

/// Prints session notices to stderr.
#[derive(Debug, Clone, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Info => eprintln!("{}", notice.message),
      NoticeLevel::Error => eprintln!("error: {}", notice.message),
    }
  }
}
