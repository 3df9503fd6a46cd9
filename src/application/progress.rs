use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    domain::{ProgressKey, ProgressSnapshot},
    utils::parse_progress_percent,
};

/// In-memory progress of in-flight downloads, keyed by (video id, quality).
///
/// Runs that write different files can share a key (same video, different
/// titles), so each slot counts its live entries and is only removed when the
/// last one drops.
#[derive(Debug, Clone, Default)]
pub struct ProgressTable {
    entries: Arc<RwLock<HashMap<ProgressKey, Slot>>>,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    progress: f64,
    holders: usize,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the key at 0%. The entry lives until every returned guard
    /// for the key has dropped.
    pub fn begin(&self, key: ProgressKey) -> ProgressEntry {
        self.entries
            .write()
            .entry(key.clone())
            .and_modify(|slot| {
                slot.progress = 0.0;
                slot.holders += 1;
            })
            .or_insert(Slot {
                progress: 0.0,
                holders: 1,
            });
        ProgressEntry {
            table: self.clone(),
            key,
        }
    }

    pub fn snapshot(&self, key: &ProgressKey) -> ProgressSnapshot {
        match self.entries.read().get(key) {
            Some(slot) => ProgressSnapshot::from_progress(slot.progress),
            None => ProgressSnapshot::idle(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn set(&self, key: &ProgressKey, progress: f64) {
        if let Some(slot) = self.entries.write().get_mut(key) {
            slot.progress = progress;
        }
    }

    fn release(&self, key: &ProgressKey) {
        let mut entries = self.entries.write();
        if let Some(slot) = entries.get_mut(key) {
            slot.holders -= 1;
            if slot.holders == 0 {
                entries.remove(key);
            }
        }
    }
}

pub struct ProgressEntry {
    table: ProgressTable,
    key: ProgressKey,
}

impl ProgressEntry {
    /// Feed a chunk of tool output; the last percentage in it replaces the
    /// stored value, even when it is lower than before.
    pub fn observe(&self, chunk: &str) {
        if let Some(progress) = parse_progress_percent(chunk) {
            self.table.set(&self.key, progress);
        }
    }
}

impl Drop for ProgressEntry {
    fn drop(&mut self) {
        self.table.release(&self.key);
    }
}
