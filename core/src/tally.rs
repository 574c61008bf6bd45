use std::rc::Rc;

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::convert::Preview;
use crate::models::{LogEntry, Nutrients};
use crate::storage::{Slot, Storage, TALLY_KEY};

/// Millisecond timestamp plus a random suffix, unique across rapid repeated
/// adds in one session.
fn generate_entry_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u64 = rand::rng().random();
    format!("{millis}-{suffix:016x}")
}

/// Today's running log of eaten entries, persisted after every change.
pub struct TallyStore {
    entries: Vec<LogEntry>,
    slot: Slot,
}

impl TallyStore {
    /// Load the tally from storage. A missing or malformed value is an empty
    /// tally.
    pub fn load(storage: Rc<dyn Storage>) -> Self {
        let slot = Slot::new(storage, TALLY_KEY);
        let entries: Vec<LogEntry> = slot.read().unwrap_or_default();
        debug!(count = entries.len(), "loaded tally");
        Self { entries, slot }
    }

    /// Append a new entry built from `preview` and persist.
    pub fn add(&mut self, preview: &Preview) -> LogEntry {
        let entry = LogEntry {
            id: generate_entry_id(),
            food_id: preview.food_id.clone(),
            food_name: preview.food_name.clone(),
            measure_id: preview.measure_id.clone(),
            measure_label: preview.measure_label.clone(),
            measure_kind: preview.measure_kind,
            amount: preview.amount,
            base_amount: preview.base_amount,
            totals: preview.totals,
        };
        debug!(id = %entry.id, food = %entry.food_id, "adding tally entry");
        self.entries.push(entry.clone());
        self.persist();
        entry
    }

    /// Remove the entry with `id`. Unknown ids are a no-op; returns whether
    /// anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        debug!(id, removed, "removing tally entry");
        self.persist();
        removed
    }

    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "clearing tally");
        self.entries.clear();
        self.persist();
    }

    /// Sum of every entry's totals, recomputed on each call.
    #[must_use]
    pub fn totals(&self) -> Nutrients {
        self.entries.iter().map(|e| &e.totals).sum()
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !self.slot.is_degraded()
    }

    fn persist(&self) {
        self.slot.write(&self.entries);
    }
}
