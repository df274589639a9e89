//! Per-level progress records and the sequential unlock chain.
//!
//! The core only tracks and updates these values; persisting them is the
//! game shell's job, which is why the records are serde values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Progress on a single level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Whether the level has ever been completed.
    pub completed: bool,
    /// Fastest completion in milliseconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time_ms: Option<u64>,
}

/// Progress for an ordered list of levels, with each level unlocked by
/// completing the one before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLedger {
    order: Vec<String>,
    entries: BTreeMap<String, LevelProgress>,
}

impl ProgressLedger {
    /// Create a ledger over `levels` in play order, all unplayed.
    pub fn new(levels: impl IntoIterator<Item = String>) -> Self {
        let order: Vec<String> = levels.into_iter().collect();
        let entries = order
            .iter()
            .map(|id| (id.clone(), LevelProgress::default()))
            .collect();
        ProgressLedger { order, entries }
    }

    /// The level ids in play order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Progress for `level_id`, if the ledger knows the level.
    pub fn progress(&self, level_id: &str) -> Option<LevelProgress> {
        self.entries.get(level_id).copied()
    }

    /// Record a completion in `time_ms`. Marks the level completed and
    /// keeps the faster time; returns `true` when a new best was set.
    ///
    /// # Panics
    ///  - If the ledger does not know `level_id`.
    pub fn record_result(&mut self, level_id: &str, time_ms: u64) -> bool {
        let entry = self
            .entries
            .get_mut(level_id)
            .unwrap_or_else(|| panic!("Unknown level id [{:?}].", level_id));

        entry.completed = true;
        match entry.best_time_ms {
            Some(best) if best <= time_ms => false,
            _ => {
                entry.best_time_ms = Some(time_ms);
                true
            }
        }
    }

    /// Whether `level_id` is playable: the first level always is, every
    /// other level unlocks when its predecessor has been completed.
    /// Unknown ids are locked.
    pub fn is_unlocked(&self, level_id: &str) -> bool {
        let Some(position) = self.order.iter().position(|id| id == level_id) else {
            return false;
        };
        if position == 0 {
            return true;
        }
        self.entries[&self.order[position - 1]].completed
    }

    /// How many levels have been completed.
    pub fn completed_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.completed).count()
    }
}
