//! Pending cross-model parameter overrides.

use cf_model::{Override, Stage};
use std::collections::HashMap;

/// Per-model, per-stage accumulator of overrides produced by variable
/// exchanges and consumed by the target model's next run in that stage.
///
/// Owned by the orchestrator; reset at the start of the run and again at
/// every time-window boundary, so a window only sees overrides produced
/// within it (the post-cosim stage sees what the tail of the last window
/// produced).
#[derive(Debug, Default)]
pub struct PendingOverrides {
    slots: HashMap<(String, Stage), Vec<Override>>,
}

impl PendingOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }

    pub fn push(&mut self, model: &str, stage: Stage, entry: Override) {
        self.slots
            .entry((model.to_string(), stage))
            .or_default()
            .push(entry);
    }

    /// Drain the overrides queued for `model` in `stage`. Draining makes
    /// each entry apply to exactly one run.
    pub fn take(&mut self, model: &str, stage: Stage) -> Vec<Override> {
        self.slots
            .remove(&(model.to_string(), stage))
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }
}
