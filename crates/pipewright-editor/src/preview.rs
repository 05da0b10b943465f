use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use pipewright_compiler::CompiledWorkflow;

/// Latest published compilation of the graph being edited.
///
/// Every compilation takes a ticket before it starts. A result is published
/// only when no later ticket has published yet, so when compilations
/// overlap the one issued last wins regardless of completion order.
#[derive(Debug, Default)]
pub struct Preview {
  issued: AtomicU64,
  slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
  ticket: u64,
  workflow: Option<Arc<CompiledWorkflow>>,
}

impl Preview {
  pub fn new() -> Self {
    Self::default()
  }

  /// Take the ticket for a compilation that is about to start.
  pub fn issue(&self) -> u64 {
    self.issued.fetch_add(1, Ordering::SeqCst) + 1
  }

  /// Publish a result. Returns it back if it became the current preview.
  pub fn publish(&self, ticket: u64, workflow: CompiledWorkflow) -> Option<Arc<CompiledWorkflow>> {
    let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
    if ticket <= slot.ticket {
      return None;
    }

    let workflow = Arc::new(workflow);
    slot.ticket = ticket;
    slot.workflow = Some(workflow.clone());
    Some(workflow)
  }

  pub fn current(&self) -> Option<Arc<CompiledWorkflow>> {
    let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
    slot.workflow.clone()
  }

  /// Drop the current preview and every compilation still in flight.
  pub fn clear(&self) {
    let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
    slot.ticket = self.issued.load(Ordering::SeqCst);
    slot.workflow = None;
  }
}
