//! All entries quoting one price on one side of the book.

use super::entry::Entry;
use super::error::BookError;
use super::types::{Action, Price, Side, Size};
use std::collections::HashMap;
use tracing::trace;

/// A price level holding its entries in insertion order.
///
/// `size` is normally the sum of the attached entry sizes, but feeds without
/// entry detail set it directly through [`PriceLevel::set_size`].
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub(super) price: Price,
    pub(super) side: Side,
    pub(super) size: Size,
    /// Size at the last publish; `size_change` is measured against it.
    pub(super) published_size: Size,
    pub(super) action: Action,
    pub(super) time: u64,
    pub(super) num_entries_total: u32,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl PriceLevel {
    /// Creates an empty level.
    pub fn new(price: Price, side: Side) -> Self {
        Self {
            price,
            side,
            size: 0.0,
            published_size: 0.0,
            action: Action::Add,
            time: 0,
            num_entries_total: 0,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates an empty level with an explicit size, for feeds without entry detail.
    pub fn with_size(price: Price, side: Side, size: Size, time: u64) -> Self {
        let mut level = Self::new(price, side);
        level.size = size;
        level.time = time;
        level
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Net size change since the level was last published.
    pub fn size_change(&self) -> Size {
        self.size - self.published_size
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// Number of entries currently attached.
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Count of attached entries as tracked by attach and detach.
    ///
    /// Incremented on every attach and decremented on every detach, so it
    /// agrees with [`PriceLevel::num_entries`].
    pub fn num_entries_total(&self) -> u32 {
        self.num_entries_total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were attached.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn find_entry(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains_entry(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The entry at `pos` in attach order, starting from 0.
    pub fn entry_at_position(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos)
    }

    /// Compares price, side, size, time and entries with `other`.
    ///
    /// # Errors
    ///
    /// [`BookError::BookMismatch`] naming the first difference.
    pub fn check_equal(&self, other: &PriceLevel) -> Result<(), BookError> {
        let mismatch = |what: String| -> Result<(), BookError> {
            Err(BookError::BookMismatch {
                reason: format!("{} level {}: {what}", self.side, self.price),
            })
        };
        if self.price != other.price {
            return mismatch(format!("price {} != {}", self.price, other.price));
        }
        if self.side != other.side {
            return mismatch(format!("side {} != {}", self.side, other.side));
        }
        if self.size != other.size {
            return mismatch(format!("size {} != {}", self.size, other.size));
        }
        if self.time != other.time {
            return mismatch(format!("time {} != {}", self.time, other.time));
        }
        if self.entries.len() != other.entries.len() {
            return mismatch(format!(
                "{} entries != {}",
                self.entries.len(),
                other.entries.len()
            ));
        }
        for (lhs, rhs) in self.entries.iter().zip(&other.entries) {
            if lhs.id != rhs.id {
                return mismatch(format!("entry {} != {}", lhs.id, rhs.id));
            }
            if lhs.size != rhs.size {
                return mismatch(format!("entry {} size {} != {}", lhs.id, lhs.size, rhs.size));
            }
            if lhs.time != rhs.time {
                return mismatch(format!("entry {} time {} != {}", lhs.id, lhs.time, rhs.time));
            }
            if lhs.status != rhs.status || lhs.reason != rhs.reason {
                return mismatch(format!("entry {} status differs", lhs.id));
            }
        }
        Ok(())
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn set_time(&mut self, time: u64) {
        self.time = time;
    }

    /// Returns the entry with `id`, attaching a new zero-size entry if absent.
    pub fn find_or_create_entry(&mut self, id: &str) -> &mut Entry {
        let pos = match self.index.get(id) {
            Some(&pos) => pos,
            None => {
                let entry = Entry::new(id, 0.0, Action::Add, self.time);
                self.attach(entry)
            }
        };
        &mut self.entries[pos]
    }

    /// Attaches a fully populated entry and adds its size to the level.
    pub fn add_entry(&mut self, entry: Entry) -> Result<(), BookError> {
        if self.index.contains_key(&entry.id) {
            return Err(BookError::DuplicateEntry {
                id: entry.id,
                price: self.price,
                side: self.side,
            });
        }
        self.size += entry.size;
        self.action = if self.num_entries_total > 0 {
            Action::Update
        } else {
            Action::Add
        };
        trace!(
            "level {} {}: add entry {} size {}",
            self.side, self.price, entry.id, entry.size
        );
        self.attach(entry);
        Ok(())
    }

    /// Replaces size, time, status and action of an attached entry.
    ///
    /// Returns the net change applied to the level size.
    pub fn update_entry(&mut self, entry: &Entry) -> Result<Size, BookError> {
        let price = self.price;
        let side = self.side;
        let existing = self
            .index
            .get(&entry.id)
            .map(|&pos| &mut self.entries[pos])
            .ok_or_else(|| BookError::EntryNotFound {
                id: entry.id.clone(),
                price,
                side,
            })?;

        let change = entry.size - existing.size;
        existing.size = entry.size;
        existing.time = entry.time;
        existing.status = entry.status;
        existing.action = Action::Update;
        if entry.reason.is_some() {
            existing.reason.clone_from(&entry.reason);
        }

        self.size += change;
        self.time = entry.time;
        self.action = Action::Update;
        Ok(change)
    }

    /// Detaches `entry` without recording a delete; see [`PriceLevel::remove_entry_by_id`].
    pub fn remove_entry(&mut self, entry: &Entry) -> Result<Entry, BookError> {
        self.remove_entry_by_id(&entry.id)
    }

    /// Detaches the entry with `id`, subtracting its size from the level.
    pub fn remove_entry_by_id(&mut self, id: &str) -> Result<Entry, BookError> {
        let pos = self
            .index
            .remove(id)
            .ok_or_else(|| BookError::EntryNotFound {
                id: id.to_string(),
                price: self.price,
                side: self.side,
            })?;

        let entry = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        self.size -= entry.size;
        self.num_entries_total = self.num_entries_total.saturating_sub(1);
        trace!(
            "level {} {}: removed entry {} size {}",
            self.side, self.price, entry.id, entry.size
        );
        Ok(entry)
    }

    /// Detaches every entry, leaving the level size untouched.
    pub fn clear_entries(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.num_entries_total = 0;
    }

    /// Marks the current size as published, resetting `size_change`.
    pub fn mark_published(&mut self) {
        self.published_size = self.size;
    }

    fn attach(&mut self, entry: Entry) -> usize {
        let pos = self.entries.len();
        self.index.insert(entry.id.clone(), pos);
        self.entries.push(entry);
        self.num_entries_total += 1;
        pos
    }
}
