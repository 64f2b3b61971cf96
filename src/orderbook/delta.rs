//! Pending-mutation tracking between publishes.
//!
//! Every book mutator records the level it touched and, where relevant, the
//! entry inside it. Repeated touches of the same level or entry are conflated
//! so that a delta carries at most one record per live level and one per entry:
//!
//! | recorded | then      | result                           |
//! |----------|-----------|----------------------------------|
//! | ADD      | UPDATE    | ADD                              |
//! | any      | DELETE    | DELETE (level drops its entries) |
//! | ADD      | DELETE    | entry record dropped             |
//! | DELETE   | ADD       | DELETE kept, new record appended |
//!
//! A level or entry deleted and re-created inside one window keeps its DELETE
//! record followed by a fresh one, so a consumer first removes the old state
//! and then rebuilds it in the same position the source book holds it.

use super::entry::Entry;
use super::types::{Action, Price, Side, Size};
use std::collections::HashMap;
use tracing::trace;

/// A touched entry and the conflated action to publish for it.
#[derive(Debug, Clone)]
pub struct EntryDelta {
    pub(crate) entry: Entry,
    pub(crate) action: Action,
}

impl EntryDelta {
    /// Entry state as of the last recorded mutation.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

/// A touched level with its touched entries, in recording order.
#[derive(Debug, Clone)]
pub struct LevelDelta {
    pub(crate) price: Price,
    pub(crate) side: Side,
    pub(crate) action: Action,
    /// Size change frozen when the level was deleted.
    pub(crate) deleted_size_change: Size,
    /// Event time frozen when the level was deleted.
    pub(crate) deleted_time: u64,
    pub(crate) entries: Vec<EntryDelta>,
}

impl LevelDelta {
    pub fn price(&self) -> Price {
        self.price
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn entries(&self) -> &[EntryDelta] {
        &self.entries
    }
}

/// Ordered record of levels and entries mutated since the last clear.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    levels: Vec<LevelDelta>,
    index: HashMap<(Side, Price), usize>,
    entry_count: usize,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of basic records: one per touched level without entry detail plus
    /// one per touched entry.
    pub fn len(&self) -> usize {
        self.levels
            .iter()
            .map(|level| level.entries.len().max(1))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of level records, which is the level count a delta publishes.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of entry records across all levels.
    pub fn num_entries(&self) -> usize {
        self.entry_count
    }

    pub fn levels(&self) -> &[LevelDelta] {
        &self.levels
    }

    /// Records a level-only mutation.
    pub fn record_level(&mut self, price: Price, side: Side, action: Action) {
        self.level_slot(price, side, action);
    }

    /// Records the deletion of a whole level, freezing the state a publisher
    /// needs once the level is gone.
    pub fn record_level_delete(&mut self, price: Price, side: Side, size_change: Size, time: u64) {
        let pos = self.level_slot(price, side, Action::Delete);
        let record = &mut self.levels[pos];
        record.deleted_size_change = size_change;
        record.deleted_time = time;
    }

    /// Records an entry mutation inside a level.
    pub fn record_entry(
        &mut self,
        price: Price,
        side: Side,
        level_action: Action,
        entry: &Entry,
        entry_action: Action,
    ) {
        let pos = self.level_slot(price, side, level_action);
        let record = &mut self.levels[pos];

        let latest = record
            .entries
            .iter()
            .rposition(|e| e.entry.id == entry.id);
        match latest.map(|pos| (pos, record.entries[pos].action)) {
            Some((pos, Action::Add)) if entry_action == Action::Delete => {
                record.entries.remove(pos);
                self.entry_count -= 1;
            }
            Some((pos, Action::Add)) => {
                record.entries[pos].entry.clone_from(entry);
            }
            Some((pos, previous)) if previous != Action::Delete => {
                let slot = &mut record.entries[pos];
                slot.entry.clone_from(entry);
                slot.action = entry_action;
            }
            Some((pos, _)) if entry_action != Action::Add => {
                record.entries[pos].entry.clone_from(entry);
            }
            _ => {
                record.entries.push(EntryDelta {
                    entry: entry.clone(),
                    action: entry_action,
                });
                self.entry_count += 1;
            }
        }
    }

    /// Drops every record, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.levels.clear();
        self.index.clear();
        self.entry_count = 0;
    }

    fn level_slot(&mut self, price: Price, side: Side, action: Action) -> usize {
        if let Some(&pos) = self.index.get(&(side, price)) {
            let record = &mut self.levels[pos];
            match (record.action, action) {
                (Action::Delete, Action::Delete) => return pos,
                (Action::Delete, _) => {}
                (_, Action::Delete) => {
                    self.entry_count -= record.entries.len();
                    record.entries.clear();
                    record.action = Action::Delete;
                    return pos;
                }
                (Action::Add, _) => return pos,
                (_, next) => {
                    record.action = next;
                    return pos;
                }
            }
        }

        trace!("delta: new {} level record {} {:?}", side, price, action);
        let pos = self.levels.len();
        self.levels.push(LevelDelta {
            price,
            side,
            action,
            deleted_size_change: 0.0,
            deleted_time: 0,
            entries: Vec::new(),
        });
        self.index.insert((side, price), pos);
        pos
    }
}
