//! Core OrderBook implementation for maintaining price levels and publishing changes

use super::delta::DeltaTracker;
use super::entry::Entry;
use super::error::BookError;
use super::level::PriceLevel;
use super::snapshot::{BookSnapshot, BookSnapshotPackage, EntrySnapshot, LevelSnapshot};
use super::types::{Action, Price, Side, Size};
use crate::config::{BookConfig, DeltaClearPolicy};
use crate::message::{BookFields, BookMessage, MemoryMessage};
use crate::publish::BookWriter;
use crate::utils::current_time_millis;
use std::collections::BTreeMap;
use tracing::trace;

/// Two-sided price ladder for one instrument.
///
/// Bids are iterated from the highest price down and asks from the lowest
/// price up. Every mutator records what it touched so that
/// [`OrderBook::populate_delta`] can publish only the net change since the
/// last publish, while [`OrderBook::populate_recap`] renders the whole book.
///
/// The book performs no locking: the owner serializes every mutator and
/// publish call.
pub struct OrderBook<M = MemoryMessage> {
    /// The symbol or identifier for this order book
    pub(super) symbol: String,

    /// Participant id for books that carry one
    pub(super) part_id: Option<String>,

    /// Bid side price levels keyed by price
    pub(super) bids: BTreeMap<Price, PriceLevel>,

    /// Ask side price levels keyed by price
    pub(super) asks: BTreeMap<Price, PriceLevel>,

    /// Time of the last event applied to the book
    pub(super) book_time: u64,

    /// Source time of the last event, published when non-zero
    pub(super) src_time: u64,

    /// Sequence number of the last published message
    pub(super) seq_num: u64,

    pub(super) config: BookConfig,

    /// Levels and entries touched since the last clear
    pub(super) deltas: DeltaTracker,

    /// Reusable scratch space for the publish path
    writer: BookWriter<M>,
}

impl<M: BookMessage> OrderBook<M> {
    /// Creates an empty book with the default configuration.
    pub fn new(symbol: &str) -> Self {
        Self::with_config(symbol, BookConfig::default())
    }

    /// Creates an empty book with `config`.
    pub fn with_config(symbol: &str, config: BookConfig) -> Self {
        Self {
            symbol: symbol.to_string(),
            part_id: None,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            book_time: 0,
            src_time: 0,
            seq_num: 0,
            config,
            deltas: DeltaTracker::new(),
            writer: BookWriter::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn set_symbol(&mut self, symbol: &str) {
        symbol.clone_into(&mut self.symbol);
    }

    pub fn part_id(&self) -> Option<&str> {
        self.part_id.as_deref()
    }

    pub fn set_part_id(&mut self, part_id: Option<String>) {
        self.part_id = part_id;
    }

    pub fn book_time(&self) -> u64 {
        self.book_time
    }

    pub fn set_book_time(&mut self, time: u64) {
        self.book_time = time;
    }

    pub fn src_time(&self) -> u64 {
        self.src_time
    }

    pub fn set_src_time(&mut self, time: u64) {
        self.src_time = time;
    }

    /// Sequence number of the last published message.
    pub fn seq_num(&self) -> u64 {
        self.seq_num
    }

    pub fn set_seq_num(&mut self, seq_num: u64) {
        self.seq_num = seq_num;
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn fields(&self) -> &BookFields {
        &self.config.fields
    }

    /// Enables or disables publishing.
    ///
    /// While disabled no deltas are recorded, `populate_recap` writes nothing
    /// and `populate_delta` returns `false`. Disabling discards pending deltas.
    pub fn generate_delta_msgs(&mut self, generate: bool) {
        if !generate {
            self.clear_delta_list();
        }
        self.config.generate_delta_msgs = generate;
    }

    pub fn generates_delta_msgs(&self) -> bool {
        self.config.generate_delta_msgs
    }

    pub fn num_bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn num_ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn total_num_levels(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Returns the level at `price` on `side`.
    pub fn level(&self, price: Price, side: Side) -> Option<&PriceLevel> {
        self.side_levels(side).get(&price)
    }

    /// Bid levels from the highest price down.
    pub fn bid_levels(&self) -> impl DoubleEndedIterator<Item = &PriceLevel> {
        self.bids.values().rev()
    }

    /// Ask levels from the lowest price up.
    pub fn ask_levels(&self) -> impl DoubleEndedIterator<Item = &PriceLevel> {
        self.asks.values()
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.values().next_back()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.values().next()
    }

    /// The level at `pos` from the top of `side`, where 0 is the best price.
    pub fn level_at_position(&self, pos: usize, side: Side) -> Option<&PriceLevel> {
        match side {
            Side::Bid => self.bid_levels().nth(pos),
            Side::Ask => self.ask_levels().nth(pos),
        }
    }

    /// The entry at `pos` counting through every entry of `side` from the
    /// best level down, in attach order within each level.
    pub fn entry_at_position(&self, pos: usize, side: Side) -> Option<&Entry> {
        match side {
            Side::Bid => nth_entry(self.bid_levels(), pos),
            Side::Ask => nth_entry(self.ask_levels(), pos),
        }
    }

    /// Compares this book's ladder against `other`, level by level.
    ///
    /// The symbol and participant id are only compared when this book has
    /// them set.
    ///
    /// # Errors
    ///
    /// [`BookError::BookMismatch`] naming the first difference found.
    pub fn check_equal<N: BookMessage>(&self, other: &OrderBook<N>) -> Result<(), BookError> {
        if !self.symbol.is_empty() && self.symbol != other.symbol {
            return Err(BookError::BookMismatch {
                reason: format!("symbol {} != {}", self.symbol, other.symbol),
            });
        }
        if self.part_id.is_some() && self.part_id != other.part_id {
            return Err(BookError::BookMismatch {
                reason: format!("participant {:?} != {:?}", self.part_id, other.part_id),
            });
        }
        for (side, lhs, rhs) in [
            (Side::Bid, &self.bids, &other.bids),
            (Side::Ask, &self.asks, &other.asks),
        ] {
            if lhs.len() != rhs.len() {
                return Err(BookError::BookMismatch {
                    reason: format!("{} {side} levels != {}", lhs.len(), rhs.len()),
                });
            }
            for (lhs_level, rhs_level) in lhs.values().zip(rhs.values()) {
                lhs_level.check_equal(rhs_level)?;
            }
        }
        Ok(())
    }

    /// Pending mutations since the last clear.
    pub fn pending_deltas(&self) -> &DeltaTracker {
        &self.deltas
    }

    /// Number of basic delta records pending publication.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Returns the level at `price` on `side`, creating an empty one if absent.
    ///
    /// A created level is recorded as a level ADD. The level is handed out
    /// read-only: changes to a book-owned level go through the book's
    /// mutators so that they are recorded for the next delta.
    pub fn find_or_create_level(&mut self, price: Price, side: Side) -> &PriceLevel {
        self.find_or_create_level_mut(price, side)
    }

    /// Mutable form of [`OrderBook::find_or_create_level`]. Callers record
    /// their own deltas or clear the pending list afterwards.
    pub(crate) fn find_or_create_level_mut(&mut self, price: Price, side: Side) -> &mut PriceLevel {
        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        if !levels.contains_key(&price) {
            trace!("{}: created {} level {}", self.symbol, side, price);
            if self.config.generate_delta_msgs {
                self.deltas.record_level(price, side, Action::Add);
            }
        }
        let book_time = self.book_time;
        levels.entry(price).or_insert_with(|| {
            let mut level = PriceLevel::new(price, side);
            level.time = book_time;
            level
        })
    }

    /// Inserts a fully built level together with its entries.
    ///
    /// # Errors
    ///
    /// [`BookError::LevelExists`] if a level is already present at that price.
    pub fn add_level(&mut self, mut level: PriceLevel) -> Result<(), BookError> {
        let price = level.price;
        let side = level.side;
        self.check_size(&price.to_string(), level.size)?;
        if self.side_levels(side).contains_key(&price) {
            return Err(BookError::LevelExists { price, side });
        }

        level.action = Action::Add;
        level.published_size = 0.0;
        self.book_time = level.time;
        if self.config.generate_delta_msgs {
            self.deltas.record_level(price, side, Action::Add);
            for entry in level.entries() {
                self.deltas
                    .record_entry(price, side, Action::Add, entry, Action::Add);
            }
        }
        trace!(
            "{}: added {} level {} size {}",
            self.symbol, side, price, level.size
        );
        self.side_levels_mut(side).insert(price, level);
        Ok(())
    }

    /// Sets the aggregate size of an existing level.
    ///
    /// A level left with no size and no entries is removed and published as
    /// a level DELETE.
    pub fn update_level(
        &mut self,
        price: Price,
        side: Side,
        size: Size,
        time: u64,
    ) -> Result<(), BookError> {
        self.check_size(&price.to_string(), size)?;
        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = levels
            .get_mut(&price)
            .ok_or(BookError::LevelNotFound { price, side })?;

        level.size = size;
        level.time = time;
        level.action = Action::Update;
        self.book_time = time;

        if size == 0.0 && level.is_empty() {
            let published = level.published_size;
            levels.remove(&price);
            if self.config.generate_delta_msgs {
                self.deltas
                    .record_level_delete(price, side, -published, time);
            }
        } else if self.config.generate_delta_msgs {
            self.deltas.record_level(price, side, Action::Update);
        }
        Ok(())
    }

    /// Removes a whole level with all of its entries.
    pub fn delete_level(
        &mut self,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<PriceLevel, BookError> {
        let mut level = self
            .side_levels_mut(side)
            .remove(&price)
            .ok_or(BookError::LevelNotFound { price, side })?;

        level.action = Action::Delete;
        level.time = time;
        self.book_time = time;
        if self.config.generate_delta_msgs {
            self.deltas
                .record_level_delete(price, side, -level.published_size, time);
        }
        trace!("{}: deleted {} level {}", self.symbol, side, price);
        Ok(level)
    }

    /// Attaches `entry` to the level at `price` on `side`, creating the level
    /// if needed.
    ///
    /// # Errors
    ///
    /// [`BookError::DuplicateEntry`] if the level already holds the entry id.
    /// Nothing is created when the add fails.
    pub fn add_entry(
        &mut self,
        mut entry: Entry,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<(), BookError> {
        self.check_size(&entry.id, entry.size)?;
        if let Some(level) = self.level(price, side)
            && level.contains_entry(&entry.id)
        {
            return Err(BookError::DuplicateEntry {
                id: entry.id,
                price,
                side,
            });
        }

        entry.action = Action::Add;
        entry.time = time;
        self.book_time = time;

        let created = !self.side_levels(side).contains_key(&price);
        let level = self.find_or_create_level_mut(price, side);
        level.add_entry(entry.clone())?;
        level.time = time;

        if self.config.generate_delta_msgs {
            let level_action = if created { Action::Add } else { Action::Update };
            self.deltas
                .record_entry(price, side, level_action, &entry, Action::Add);
        }
        Ok(())
    }

    /// Sets the size of an attached entry.
    pub fn update_entry(
        &mut self,
        id: &str,
        price: Price,
        side: Side,
        size: Size,
        time: u64,
    ) -> Result<(), BookError> {
        self.check_size(id, size)?;
        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = levels
            .get_mut(&price)
            .ok_or(BookError::LevelNotFound { price, side })?;
        let mut updated = level
            .find_entry(id)
            .cloned()
            .ok_or_else(|| BookError::EntryNotFound {
                id: id.to_string(),
                price,
                side,
            })?;

        updated.size = size;
        updated.time = time;
        level.update_entry(&updated)?;
        updated.action = Action::Update;
        self.book_time = time;

        if self.config.generate_delta_msgs {
            self.deltas
                .record_entry(price, side, Action::Update, &updated, Action::Update);
        }
        Ok(())
    }

    /// Deletes an entry, removing its level once the level is empty.
    ///
    /// Removing the last entry publishes a level DELETE; otherwise the level
    /// is published as an UPDATE carrying the entry DELETE.
    pub fn delete_entry(
        &mut self,
        id: &str,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<Entry, BookError> {
        let mut entry = self.detach_entry(id, price, side, time)?;
        entry.action = Action::Delete;
        Ok(entry)
    }

    /// Detaches `entry` and hands it back to the caller unchanged.
    ///
    /// Publishes like [`OrderBook::delete_entry`] but leaves the entry's own
    /// action as it was, for entries that move elsewhere.
    pub fn remove_entry(
        &mut self,
        entry: &Entry,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<Entry, BookError> {
        self.detach_entry(&entry.id, price, side, time)
    }

    /// Detaches the entry with `id`; see [`OrderBook::remove_entry`].
    pub fn remove_entry_by_id(
        &mut self,
        id: &str,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<Entry, BookError> {
        self.detach_entry(id, price, side, time)
    }

    /// Removes every level, publishing each as a level DELETE.
    pub fn clear(&mut self) {
        let time = self.book_time;
        if self.config.generate_delta_msgs {
            for (side, levels) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
                for level in levels.values() {
                    self.deltas.record_level_delete(
                        level.price,
                        side,
                        -level.published_size,
                        time,
                    );
                }
            }
        }
        self.bids.clear();
        self.asks.clear();
    }

    /// Discards pending mutations and marks touched levels as published.
    pub fn clear_delta_list(&mut self) {
        for record in self.deltas.levels() {
            let levels = match record.side {
                Side::Bid => &mut self.bids,
                Side::Ask => &mut self.asks,
            };
            if let Some(level) = levels.get_mut(&record.price) {
                level.mark_published();
            }
        }
        self.deltas.clear();
    }

    /// Writes the whole book into `msg`.
    ///
    /// Writes nothing while publishing is disabled.
    pub fn populate_recap(&mut self, msg: &mut M) {
        if !self.config.generate_delta_msgs {
            trace!("{}: recap requested while publishing is disabled", self.symbol);
            return;
        }
        let mut writer = std::mem::take(&mut self.writer);
        writer.write_recap(self, msg);
        self.writer = writer;
    }

    /// Writes the pending mutations into `msg`.
    ///
    /// Returns `false` without touching `msg` when nothing is pending or
    /// publishing is disabled. With [`DeltaClearPolicy::OnPublish`] the
    /// pending list is cleared after writing.
    pub fn populate_delta(&mut self, msg: &mut M) -> bool {
        if !self.config.generate_delta_msgs {
            trace!("{}: delta requested while publishing is disabled", self.symbol);
            return false;
        }
        if self.deltas.is_empty() {
            return false;
        }

        self.seq_num += 1;
        let mut writer = std::mem::take(&mut self.writer);
        writer.write_delta(self, msg);
        self.writer = writer;

        if self.config.clear_policy == DeltaClearPolicy::OnPublish {
            self.clear_delta_list();
        }
        true
    }

    /// Captures the current levels and entries.
    pub fn snapshot(&self) -> BookSnapshot {
        let capture = |level: &PriceLevel| LevelSnapshot {
            price: level.price,
            side: level.side,
            size: level.size,
            time: level.time,
            num_entries: level.num_entries(),
            entries: level
                .entries()
                .map(|entry| EntrySnapshot {
                    id: entry.id.clone(),
                    size: entry.size,
                    status: entry.status,
                    time: entry.time,
                    reason: entry.reason.clone(),
                })
                .collect(),
        };

        BookSnapshot {
            symbol: self.symbol.clone(),
            part_id: self.part_id.clone(),
            timestamp: current_time_millis(),
            book_time: self.book_time,
            bids: self.bid_levels().map(capture).collect(),
            asks: self.ask_levels().map(capture).collect(),
        }
    }

    /// Creates a checksummed snapshot package of the current state.
    pub fn enriched_snapshot(&self) -> Result<BookSnapshotPackage, BookError> {
        BookSnapshotPackage::new(self.snapshot())
    }

    /// Rebuilds a book from a snapshot. The restored book has nothing pending.
    pub fn from_snapshot(snapshot: BookSnapshot, config: BookConfig) -> Result<Self, BookError> {
        let mut book = Self::with_config(&snapshot.symbol, config);
        book.part_id = snapshot.part_id;
        book.book_time = snapshot.book_time;

        for level_snapshot in snapshot.bids.into_iter().chain(snapshot.asks) {
            let mut level = PriceLevel::with_size(
                level_snapshot.price,
                level_snapshot.side,
                0.0,
                level_snapshot.time,
            );
            for entry_snapshot in level_snapshot.entries {
                let mut entry = Entry::new(
                    entry_snapshot.id,
                    entry_snapshot.size,
                    Action::Add,
                    entry_snapshot.time,
                )
                .with_status(entry_snapshot.status);
                entry.reason = entry_snapshot.reason;
                level.add_entry(entry)?;
            }
            level.size = level_snapshot.size;
            level.time = level_snapshot.time;
            level.mark_published();

            let levels = book.side_levels_mut(level.side);
            if levels.contains_key(&level.price) {
                return Err(BookError::LevelExists {
                    price: level.price,
                    side: level.side,
                });
            }
            levels.insert(level.price, level);
        }
        Ok(book)
    }

    /// Restores a book from a validated snapshot package.
    pub fn restore_from_snapshot_package(
        package: BookSnapshotPackage,
        config: BookConfig,
    ) -> Result<Self, BookError> {
        let snapshot = package.into_snapshot()?;
        Self::from_snapshot(snapshot, config)
    }

    fn detach_entry(
        &mut self,
        id: &str,
        price: Price,
        side: Side,
        time: u64,
    ) -> Result<Entry, BookError> {
        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = levels
            .get_mut(&price)
            .ok_or(BookError::LevelNotFound { price, side })?;

        let mut entry = level.remove_entry_by_id(id)?;
        entry.time = time;
        level.time = time;
        level.action = Action::Update;
        self.book_time = time;

        if level.is_empty() {
            let published = level.published_size;
            levels.remove(&price);
            trace!("{}: {} level {} emptied", self.symbol, side, price);
            if self.config.generate_delta_msgs {
                self.deltas
                    .record_level_delete(price, side, -published, time);
            }
        } else if self.config.generate_delta_msgs {
            let mut published = entry.clone();
            published.action = Action::Delete;
            self.deltas
                .record_entry(price, side, Action::Update, &published, Action::Delete);
        }
        Ok(entry)
    }

    fn check_size(&self, id: &str, size: Size) -> Result<(), BookError> {
        if self.config.strict_checking && (size < 0.0 || size.is_nan()) {
            return Err(BookError::InvalidSize {
                id: id.to_string(),
                size,
            });
        }
        Ok(())
    }

    fn side_levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

fn nth_entry<'a>(
    levels: impl Iterator<Item = &'a PriceLevel>,
    mut pos: usize,
) -> Option<&'a Entry> {
    for level in levels {
        if pos < level.num_entries() {
            return level.entry_at_position(pos);
        }
        pos -= level.num_entries();
    }
    None
}
