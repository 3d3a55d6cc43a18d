//! Time-record storage keyed by offset set, with atomic conditional updates.

use crate::models::{normalize_hour, OffsetKey, TimeRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// Where time records live. Writers must go through `compare_and_swap`.
pub trait TimeRecordStore: Send + Sync {
    fn get(&self, key: &OffsetKey) -> Option<TimeRecord>;

    /// Store `new` only if the current record still equals `expected`
    /// (`None` = no record yet). Returns whether the write happened.
    fn compare_and_swap(
        &self,
        key: &OffsetKey,
        expected: Option<&TimeRecord>,
        new: TimeRecord,
    ) -> bool;
}

/// In-process store: one flat map from offset set to record.
#[derive(Debug, Default)]
pub struct MemoryTimeStore {
    records: RwLock<HashMap<OffsetKey, TimeRecord>>,
}

impl MemoryTimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted records. Means are wrapped into `[0, 24)`; entries with an empty
    /// key, no matches, or a non-finite mean are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = (OffsetKey, TimeRecord)>) -> Self {
        let records = entries
            .into_iter()
            .filter_map(|(key, record)| {
                if key.is_empty() || record.count == 0 || !record.time.is_finite() {
                    log::warn!("Skipping unusable time record for {}", key);
                    return None;
                }
                let stdev = record.stdev.filter(|s| s.is_finite() && *s >= 0.0 && record.count >= 2);
                Some((
                    key,
                    TimeRecord {
                        time: normalize_hour(record.time),
                        stdev,
                        ..record
                    },
                ))
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// All records, sorted by key (for persistence and display).
    pub fn snapshot(&self) -> Vec<(OffsetKey, TimeRecord)> {
        let mut entries: Vec<_> = match self.records.read() {
            Ok(g) => g.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            Err(_) => Vec::new(),
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Records whose key has exactly `depth` offsets.
    pub fn at_depth(&self, depth: usize) -> Vec<(OffsetKey, TimeRecord)> {
        self.snapshot()
            .into_iter()
            .filter(|(k, _)| k.depth() == depth)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimeRecordStore for MemoryTimeStore {
    fn get(&self, key: &OffsetKey) -> Option<TimeRecord> {
        self.records.read().ok()?.get(key).copied()
    }

    fn compare_and_swap(
        &self,
        key: &OffsetKey,
        expected: Option<&TimeRecord>,
        new: TimeRecord,
    ) -> bool {
        let mut g = match self.records.write() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        if g.get(key) != expected {
            return false;
        }
        g.insert(key.clone(), new);
        true
    }
}
