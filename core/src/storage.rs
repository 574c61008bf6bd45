use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Storage key for the live tally. The schema version is part of the key so a
/// future format can live next to this one.
pub const TALLY_KEY: &str = "macro_tally_v2";
/// Storage key for the day-summary history.
pub const HISTORY_KEY: &str = "history_v1";

/// A string key-value store holding JSON documents.
pub trait Storage {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// One store's handle on a single storage key.
///
/// Reads that fail or do not parse come back as `None`. Writes are
/// best-effort: the first failure is logged and the slot switches to
/// in-memory-only for the rest of the session.
pub(crate) struct Slot {
    storage: Rc<dyn Storage>,
    key: &'static str,
    degraded: Cell<bool>,
}

impl Slot {
    pub(crate) fn new(storage: Rc<dyn Storage>, key: &'static str) -> Self {
        Self {
            storage,
            key,
            degraded: Cell::new(false),
        }
    }

    pub(crate) fn read<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = match self.storage.load(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = self.key, error = %format!("{e:#}"), "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = self.key, error = %e, "ignoring malformed stored value");
                None
            }
        }
    }

    pub(crate) fn write<T: Serialize + ?Sized>(&self, value: &T) {
        if self.degraded.get() {
            return;
        }
        let result = serde_json::to_string(value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.save(self.key, &json));
        if let Err(e) = result {
            warn!(
                key = self.key,
                error = %format!("{e:#}"),
                "failed to persist, continuing in memory only"
            );
            self.degraded.set(true);
        }
    }

    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded.get()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    use anyhow::{Result, bail};

    use super::Storage;

    /// In-memory storage whose reads and writes can be made to fail.
    #[derive(Default)]
    pub(crate) struct FlakyStorage {
        pub values: RefCell<HashMap<String, String>>,
        pub fail_reads: Cell<bool>,
        pub fail_writes: Cell<bool>,
        pub writes: Cell<usize>,
    }

    impl Storage for FlakyStorage {
        fn load(&self, key: &str) -> Result<Option<String>> {
            if self.fail_reads.get() {
                bail!("storage unavailable");
            }
            Ok(self.values.borrow().get(key).cloned())
        }

        fn save(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.get() {
                bail!("quota exceeded");
            }
            self.writes.set(self.writes.get() + 1);
            self.values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}
