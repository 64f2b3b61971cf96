//! Consuming side: decodes recap and delta messages into a mirror book.
//!
//! A recap replaces the mirror's whole state. A delta applies level and entry
//! actions on top of it. Decoding undoes the writer's flattening: a message
//! without a level vector is itself the single level, and a level without an
//! entry vector but with an entry id is itself the single entry.
//!
//! A sequence gap marks the mirror inconsistent. Deltas are then skipped,
//! unless `update_inconsistent_book` is set, until the next recap.

use crate::config::BookConfig;
use crate::message::{BookFields, BookMessage, MemoryMessage, MsgType};
use crate::orderbook::{Action, BookError, OrderBook, PriceLevel, Side};
use tracing::{debug, trace, warn};

/// Callbacks invoked after each applied message.
pub trait BookHandler<M: BookMessage> {
    /// A recap replaced the mirror book.
    fn on_recap(&mut self, _book: &OrderBook<M>) {}

    /// A delta was applied to the mirror book.
    fn on_delta(&mut self, _book: &OrderBook<M>) {}

    /// A delta arrived out of sequence.
    fn on_gap(&mut self, _symbol: &str, _expected: u64, _received: u64) {}
}

/// Maintains a mirror [`OrderBook`] from published messages.
pub struct BookListener<M: BookMessage = MemoryMessage> {
    book: OrderBook<M>,
    fields: BookFields,
    expected_seq: Option<u64>,
    gap_count: u64,
    consistent: bool,
    handlers: Vec<Box<dyn BookHandler<M> + Send>>,
}

impl<M: BookMessage> BookListener<M> {
    /// Creates a listener with default field ids.
    pub fn new(symbol: &str) -> Self {
        Self::with_config(symbol, BookConfig::default())
    }

    /// Creates a listener whose mirror uses `config`; the field ids come from
    /// `config.fields`.
    pub fn with_config(symbol: &str, config: BookConfig) -> Self {
        let fields = config.fields.clone();
        Self {
            book: OrderBook::with_config(symbol, config),
            fields,
            expected_seq: None,
            gap_count: 0,
            consistent: true,
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn BookHandler<M> + Send>) {
        self.handlers.push(handler);
    }

    /// The mirror book.
    pub fn book(&self) -> &OrderBook<M> {
        &self.book
    }

    /// Number of sequence gaps detected since creation.
    pub fn gap_count(&self) -> u64 {
        self.gap_count
    }

    /// False from a sequence gap until the next recap.
    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    /// Applies one recap or delta message to the mirror book.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidMessage`] when the message type is missing or not a
    /// book type, or when a level or entry lacks its price or id. Levels
    /// decoded before the failure stay applied.
    ///
    /// A delta reaching an inconsistent mirror is dropped and `Ok` returned,
    /// unless the configuration asks for inconsistent books to be updated.
    pub fn on_message(&mut self, msg: &M) -> Result<(), BookError> {
        let code = msg
            .get_u64(self.fields.msg_type)
            .ok_or_else(|| BookError::InvalidMessage {
                message: "missing message type".to_string(),
            })?;
        let msg_type = MsgType::from_code(code).ok_or_else(|| BookError::InvalidMessage {
            message: format!("unexpected message type {code}"),
        })?;

        let seq_num = msg.get_u64(self.fields.seq_num);
        if msg_type.is_recap() {
            self.book.clear();
            if let Some(symbol) = msg.get_str(self.fields.symbol) {
                self.book.set_symbol(symbol);
            }
            self.book
                .set_part_id(msg.get_str(self.fields.part_id).map(str::to_string));
            self.expected_seq = Some(seq_num.unwrap_or(0) + 1);
            if !self.consistent {
                debug!("{}: recap restored consistency", self.book.symbol());
            }
            self.consistent = true;
        } else {
            self.check_sequence(seq_num);
            if !self.consistent && !self.book.config().update_inconsistent_book {
                trace!(
                    "{}: delta {:?} dropped while inconsistent",
                    self.book.symbol(),
                    seq_num
                );
                return Ok(());
            }
        }

        let book_time = msg
            .get_u64(self.fields.book_time)
            .unwrap_or(self.book.book_time());
        let result = self.apply_levels(msg, book_time);

        self.book.set_book_time(book_time);
        if let Some(src_time) = msg.get_u64(self.fields.src_time) {
            self.book.set_src_time(src_time);
        }
        if let Some(seq) = seq_num {
            self.book.set_seq_num(seq);
        }
        self.book.clear_delta_list();
        result?;

        trace!(
            "{}: applied {:?}, {} levels",
            self.book.symbol(),
            msg_type,
            self.book.total_num_levels()
        );
        for handler in &mut self.handlers {
            if msg_type.is_recap() {
                handler.on_recap(&self.book);
            } else {
                handler.on_delta(&self.book);
            }
        }
        Ok(())
    }

    fn check_sequence(&mut self, seq_num: Option<u64>) {
        let Some(received) = seq_num else {
            return;
        };
        if let Some(expected) = self.expected_seq
            && received != expected
        {
            self.gap_count += 1;
            self.consistent = false;
            warn!(
                "{}: sequence gap, expected {} received {}",
                self.book.symbol(),
                expected,
                received
            );
            for handler in &mut self.handlers {
                handler.on_gap(self.book.symbol(), expected, received);
            }
        }
        self.expected_seq = Some(received + 1);
    }

    fn apply_levels(&mut self, msg: &M, book_time: u64) -> Result<(), BookError> {
        if let Some(levels) = msg.get_msg_vector(self.fields.price_levels) {
            for level_msg in levels {
                self.apply_level(level_msg, book_time)?;
            }
            return Ok(());
        }
        if msg.has_field(self.fields.pl_price) {
            return self.apply_level(msg, book_time);
        }

        let num_levels = msg.get_u64(self.fields.num_levels).unwrap_or(0);
        if num_levels != 0 {
            return Err(BookError::InvalidMessage {
                message: format!("{num_levels} levels announced but no level fields present"),
            });
        }
        Ok(())
    }

    fn apply_level(&mut self, msg: &M, book_time: u64) -> Result<(), BookError> {
        let fields = &self.fields;
        let price = msg
            .get_price(fields.pl_price)
            .ok_or_else(|| BookError::InvalidMessage {
                message: "level without price".to_string(),
            })?;
        let side = match msg.get_char(fields.pl_side) {
            None => Side::Bid,
            Some(code) => Side::from_code(code).ok_or_else(|| BookError::InvalidMessage {
                message: format!("unknown side code {code}"),
            })?,
        };
        let action = decode_action(msg.get_char(fields.pl_action))?;
        let time = msg.get_u64(fields.pl_time).unwrap_or(book_time);

        if action == Action::Delete {
            if self.book.level(price, side).is_some() {
                self.book.delete_level(price, side, time)?;
            } else {
                debug!(
                    "{}: delete for unknown {} level {} ignored",
                    self.book.symbol(),
                    side,
                    price
                );
            }
            return Ok(());
        }

        let num_attach = msg.get_u64(fields.pl_num_attach).unwrap_or(1);
        let level = self.book.find_or_create_level_mut(price, side);
        level.set_time(time);

        if let Some(entries) = msg.get_msg_vector(fields.pl_entries) {
            for entry_msg in entries {
                apply_entry(level, fields, entry_msg, time)?;
            }
        } else if num_attach > 0 && msg.has_field(fields.entry_id) {
            apply_entry(level, fields, msg, time)?;
        }

        if let Some(size) = msg.get_f64(fields.pl_size) {
            level.set_size(size);
        }
        level.set_action(action);

        let announced = msg.get_u64(fields.pl_num_entries).unwrap_or(1);
        if announced != level.num_entries() as u64 {
            debug!(
                "{} level {}: {} entries announced, {} attached",
                side,
                price,
                announced,
                level.num_entries()
            );
        }
        Ok(())
    }
}

fn apply_entry<M: BookMessage>(
    level: &mut PriceLevel,
    fields: &BookFields,
    msg: &M,
    level_time: u64,
) -> Result<(), BookError> {
    let id = msg
        .get_str(fields.entry_id)
        .ok_or_else(|| BookError::InvalidMessage {
            message: "entry without id".to_string(),
        })?;
    let action = decode_action(msg.get_char(fields.entry_action))?;

    if action == Action::Delete {
        if level.remove_entry_by_id(id).is_err() {
            debug!(
                "{} level {}: delete for unknown entry {} ignored",
                level.side(),
                level.price(),
                id
            );
        }
        return Ok(());
    }

    let status = match msg.get_u64(fields.entry_status) {
        None => 0,
        Some(status) => u16::try_from(status).map_err(|_| BookError::InvalidMessage {
            message: format!("entry status {status} out of range"),
        })?,
    };
    let entry = level.find_or_create_entry(id);
    entry.set_size(msg.get_f64(fields.entry_size).unwrap_or(0.0));
    entry.set_time(msg.get_u64(fields.entry_time).unwrap_or(level_time));
    entry.set_status(status);
    entry.set_reason(msg.get_str(fields.entry_reason).map(str::to_string));
    entry.set_action(action);
    Ok(())
}

fn decode_action(code: Option<char>) -> Result<Action, BookError> {
    match code {
        None => Ok(Action::Add),
        Some(code) => Action::from_code(code).ok_or_else(|| BookError::InvalidMessage {
            message: format!("unknown action code {code}"),
        }),
    }
}
