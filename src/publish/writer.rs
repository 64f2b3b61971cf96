//! Renders book state into keyed-field messages.
//!
//! Both recaps and deltas are flattened: when only one level is in scope its
//! fields go straight onto the top-level message, and when a level carries a
//! single entry that entry's fields go straight onto the level message. The
//! level vector and entry vector fields only appear when there is more than
//! one element to carry.
//!
//! Fields holding their usual value are left out:
//! - level action when ADD, side when BID, time when equal to the book time,
//!   entry count when 1, attached count when 1
//! - entry time when equal to the level time, status when 0, reason when unset

use crate::message::{BookFields, BookMessage, MsgType};
use crate::orderbook::delta::{EntryDelta, LevelDelta};
use crate::orderbook::{Action, Entry, OrderBook, PriceLevel, Side};
use tracing::{trace, warn};

/// Reusable vector of sub-messages.
///
/// Grows to the largest count seen and never shrinks; `reset` only rewinds
/// the cursor, each message is cleared when handed out again.
#[derive(Debug)]
pub struct MsgHolder<M> {
    msgs: Vec<M>,
    len: usize,
}

impl<M> Default for MsgHolder<M> {
    fn default() -> Self {
        Self {
            msgs: Vec::new(),
            len: 0,
        }
    }
}

impl<M: BookMessage> MsgHolder<M> {
    /// Makes sure at least `count` messages are allocated.
    pub fn grow(&mut self, count: usize) {
        if self.msgs.len() < count {
            self.msgs.resize_with(count, M::default);
        }
    }

    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Hands out the next cleared message.
    pub fn next_msg(&mut self) -> &mut M {
        if self.len == self.msgs.len() {
            self.msgs.push(M::default());
        }
        let msg = &mut self.msgs[self.len];
        msg.clear();
        self.len += 1;
        msg
    }

    /// Messages handed out since the last reset.
    pub fn as_slice(&self) -> &[M] {
        &self.msgs[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated messages.
    pub fn capacity(&self) -> usize {
        self.msgs.len()
    }
}

/// Level header values written into a level message.
struct LevelFields {
    price: crate::orderbook::Price,
    side: Side,
    action: Action,
    size: f64,
    size_change: f64,
    time: u64,
    num_entries: usize,
}

impl LevelFields {
    fn from_level(level: &PriceLevel, action: Action) -> Self {
        Self {
            price: level.price(),
            side: level.side(),
            action,
            size: level.size(),
            size_change: level.size_change(),
            time: level.time(),
            num_entries: level.num_entries(),
        }
    }

    fn deleted(record: &LevelDelta) -> Self {
        Self {
            price: record.price,
            side: record.side,
            action: Action::Delete,
            size: 0.0,
            size_change: record.deleted_size_change,
            time: record.deleted_time,
            num_entries: 0,
        }
    }
}

/// Publish-side encoder holding the reusable level and entry scratch vectors.
#[derive(Debug)]
pub struct BookWriter<M> {
    levels: MsgHolder<M>,
    entries: MsgHolder<M>,
}

impl<M> Default for BookWriter<M> {
    fn default() -> Self {
        Self {
            levels: MsgHolder::default(),
            entries: MsgHolder::default(),
        }
    }
}

impl<M: BookMessage> BookWriter<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity of the level and entry scratch vectors.
    pub fn scratch_capacity(&self) -> (usize, usize) {
        (self.levels.capacity(), self.entries.capacity())
    }

    /// Writes every level of `book` into `msg`.
    pub fn write_recap(&mut self, book: &OrderBook<M>, msg: &mut M) {
        let fields = book.fields();
        let book_time = book.book_time();
        msg.set_u64(fields.msg_type, MsgType::BookInitial.code());

        let num_levels = book.total_num_levels();
        if num_levels == 0 {
            msg.set_u64(fields.num_levels, 0);
            return;
        }

        self.levels.reset();
        self.levels.grow(num_levels);
        if num_levels == 1 {
            if let Some(level) = book.bid_levels().chain(book.ask_levels()).next() {
                recap_level(msg, &mut self.entries, fields, level, book_time);
            }
        } else {
            for level in book.bid_levels().chain(book.ask_levels()) {
                let level_msg = self.levels.next_msg();
                recap_level(level_msg, &mut self.entries, fields, level, book_time);
            }
            msg.set_msg_vector(fields.price_levels, self.levels.as_slice());
        }

        msg.set_u64(fields.num_levels, num_levels as u64);
        msg.set_str(fields.symbol, book.symbol());
        if let Some(part_id) = book.part_id() {
            msg.set_str(fields.part_id, part_id);
        }
        msg.set_u64(fields.book_time, book_time);
        if book.seq_num() != 0 {
            msg.set_u64(fields.seq_num, book.seq_num());
        }
        trace!("{}: recap of {} levels", book.symbol(), num_levels);
    }

    /// Writes the pending delta records of `book` into `msg`.
    pub fn write_delta(&mut self, book: &OrderBook<M>, msg: &mut M) {
        let fields = book.fields();
        let book_time = book.book_time();
        let records = book.pending_deltas().levels();
        msg.set_u64(fields.msg_type, MsgType::BookUpdate.code());

        self.levels.reset();
        self.levels.grow(records.len());
        self.entries.grow(book.pending_deltas().num_entries());

        if let [record] = records {
            delta_level(msg, &mut self.entries, fields, book, record, book_time);
        } else {
            for record in records {
                let level_msg = self.levels.next_msg();
                delta_level(level_msg, &mut self.entries, fields, book, record, book_time);
            }
            msg.set_msg_vector(fields.price_levels, self.levels.as_slice());
        }

        msg.set_u64(fields.num_levels, records.len() as u64);
        msg.set_u64(fields.book_time, book_time);
        if book.src_time() != 0 {
            msg.set_u64(fields.src_time, book.src_time());
        }
        if book.seq_num() != 0 {
            msg.set_u64(fields.seq_num, book.seq_num());
        }
        trace!(
            "{}: delta of {} levels, {} entries",
            book.symbol(),
            records.len(),
            book.pending_deltas().num_entries()
        );
    }
}

fn recap_level<M: BookMessage>(
    target: &mut M,
    entries: &mut MsgHolder<M>,
    fields: &BookFields,
    level: &PriceLevel,
    book_time: u64,
) {
    add_level_fields(target, fields, &LevelFields::from_level(level, Action::Add), book_time);

    let count = level.num_entries();
    if count == 1 {
        if let Some(entry) = level.entries().next() {
            add_entry_fields(target, fields, entry, Action::Add, level.time());
        }
    } else if count > 1 {
        entries.reset();
        entries.grow(count);
        for entry in level.entries() {
            add_entry_fields(entries.next_msg(), fields, entry, Action::Add, level.time());
        }
        target.set_msg_vector(fields.pl_entries, entries.as_slice());
    }
    if count != 1 {
        target.set_u64(fields.pl_num_attach, count as u64);
    }
}

fn delta_level<M: BookMessage>(
    target: &mut M,
    entries: &mut MsgHolder<M>,
    fields: &BookFields,
    book: &OrderBook<M>,
    record: &LevelDelta,
    book_time: u64,
) {
    let header = match (record.action, book.level(record.price, record.side)) {
        (Action::Delete, _) => LevelFields::deleted(record),
        (action, Some(level)) => LevelFields::from_level(level, action),
        (_, None) => {
            warn!(
                "{}: pending {} level {} no longer in book, publishing as deleted",
                book.symbol(),
                record.side,
                record.price
            );
            LevelFields::deleted(record)
        }
    };
    add_level_fields(target, fields, &header, book_time);

    let level_time = header.time;
    match record.entries.as_slice() {
        [] => {}
        [only] => add_entry_delta(target, fields, only, level_time),
        many => {
            entries.reset();
            for delta in many {
                add_entry_delta(entries.next_msg(), fields, delta, level_time);
            }
            target.set_msg_vector(fields.pl_entries, entries.as_slice());
        }
    }
    if record.entries.len() != 1 {
        target.set_u64(fields.pl_num_attach, record.entries.len() as u64);
    }
}

fn add_entry_delta<M: BookMessage>(
    target: &mut M,
    fields: &BookFields,
    delta: &EntryDelta,
    level_time: u64,
) {
    add_entry_fields(target, fields, &delta.entry, delta.action, level_time);
}

fn add_level_fields<M: BookMessage>(
    msg: &mut M,
    fields: &BookFields,
    level: &LevelFields,
    book_time: u64,
) {
    msg.set_price(fields.pl_price, level.price);
    if level.action != Action::Add {
        msg.set_char(fields.pl_action, level.action.code());
    }
    if level.side != Side::Bid {
        msg.set_char(fields.pl_side, level.side.code());
    }
    msg.set_f64(fields.pl_size, level.size);
    msg.set_f64(fields.pl_size_change, level.size_change);
    if level.time != book_time {
        msg.set_u64(fields.pl_time, level.time);
    }
    if level.num_entries != 1 {
        msg.set_u64(fields.pl_num_entries, level.num_entries as u64);
    }
}

fn add_entry_fields<M: BookMessage>(
    msg: &mut M,
    fields: &BookFields,
    entry: &Entry,
    action: Action,
    level_time: u64,
) {
    msg.set_str(fields.entry_id, entry.id());
    msg.set_char(fields.entry_action, action.code());
    msg.set_f64(fields.entry_size, entry.size());
    if entry.time() != level_time {
        msg.set_u64(fields.entry_time, entry.time());
    }
    if entry.status() != 0 {
        msg.set_u64(fields.entry_status, u64::from(entry.status()));
    }
    if let Some(reason) = entry.reason() {
        msg.set_str(fields.entry_reason, reason);
    }
}
