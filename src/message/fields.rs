//! Field ids for book messages, resolved through a field dictionary.

use super::Fid;
use crate::orderbook::error::BookError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message type carried in the message type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgType {
    /// Full snapshot sent when a subscription starts.
    BookInitial,
    /// Incremental update.
    BookUpdate,
    /// Full snapshot sent on request after the initial one.
    BookRecap,
}

impl MsgType {
    /// Numeric code on the wire.
    #[must_use]
    pub fn code(self) -> u64 {
        match self {
            MsgType::BookInitial => 16,
            MsgType::BookUpdate => 17,
            MsgType::BookRecap => 19,
        }
    }

    #[must_use]
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            16 => Some(MsgType::BookInitial),
            17 => Some(MsgType::BookUpdate),
            19 => Some(MsgType::BookRecap),
            _ => None,
        }
    }

    /// Whether the message replaces the whole book.
    #[must_use]
    pub fn is_recap(self) -> bool {
        matches!(self, MsgType::BookInitial | MsgType::BookRecap)
    }
}

/// Resolves field names to ids.
pub trait FieldDictionary {
    fn fid(&self, name: &str) -> Option<Fid>;
}

impl FieldDictionary for HashMap<String, Fid> {
    fn fid(&self, name: &str) -> Option<Fid> {
        self.get(name).copied()
    }
}

/// Every field id the writer and the listener use.
///
/// `Default` carries the ids observed on production feeds. Feeds with a
/// different dictionary build one through [`BookFields::from_dictionary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookFields {
    pub msg_type: Fid,
    pub msg_status: Fid,
    pub md_seq_num: Fid,
    pub sender_id: Fid,
    pub part_id: Fid,
    pub src_time: Fid,
    pub symbol: Fid,
    pub seq_num: Fid,
    pub num_levels: Fid,
    pub pl_action: Fid,
    pub pl_price: Fid,
    pub pl_side: Fid,
    pub pl_size: Fid,
    pub pl_size_change: Fid,
    pub pl_num_entries: Fid,
    pub pl_time: Fid,
    pub pl_num_attach: Fid,
    pub book_time: Fid,
    pub entry_id: Fid,
    pub entry_size: Fid,
    pub entry_action: Fid,
    pub entry_reason: Fid,
    pub entry_time: Fid,
    pub entry_status: Fid,
    /// Vector of level messages.
    pub price_levels: Fid,
    /// Vector of entry messages inside a level.
    pub pl_entries: Fid,
    pub book_type: Fid,
}

impl Default for BookFields {
    fn default() -> Self {
        Self {
            msg_type: 1,
            msg_status: 2,
            md_seq_num: 10,
            sender_id: 20,
            part_id: 429,
            src_time: 465,
            symbol: 470,
            seq_num: 498,
            num_levels: 651,
            pl_action: 652,
            pl_price: 653,
            pl_side: 654,
            pl_size: 655,
            pl_size_change: 656,
            pl_num_entries: 657,
            pl_time: 658,
            pl_num_attach: 659,
            book_time: 671,
            entry_id: 681,
            entry_size: 682,
            entry_action: 683,
            entry_reason: 684,
            entry_time: 685,
            entry_status: 686,
            price_levels: 699,
            pl_entries: 700,
            book_type: 4714,
        }
    }
}

impl BookFields {
    /// Resolves every field by its dictionary name.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::MissingField`] naming the first field the
    /// dictionary cannot resolve.
    pub fn from_dictionary(dictionary: &impl FieldDictionary) -> Result<Self, BookError> {
        let lookup = |name: &str| {
            dictionary.fid(name).ok_or_else(|| BookError::MissingField {
                name: name.to_string(),
            })
        };

        Ok(Self {
            msg_type: lookup("MdMsgType")?,
            msg_status: lookup("MdMsgStatus")?,
            md_seq_num: lookup("MdSeqNum")?,
            sender_id: lookup("MdSenderId")?,
            part_id: lookup("wPartId")?,
            src_time: lookup("wSrcTime")?,
            symbol: lookup("wSymbol")?,
            seq_num: lookup("wSeqNum")?,
            num_levels: lookup("wNumLevels")?,
            pl_action: lookup("wPlAction")?,
            pl_price: lookup("wPlPrice")?,
            pl_side: lookup("wPlSide")?,
            pl_size: lookup("wPlSize")?,
            pl_size_change: lookup("wPlSizeChange")?,
            pl_num_entries: lookup("wPlNumEntries")?,
            pl_time: lookup("wPlTime")?,
            pl_num_attach: lookup("wPlNumAttach")?,
            book_time: lookup("wBookTime")?,
            entry_id: lookup("wEntryId")?,
            entry_size: lookup("wEntrySize")?,
            entry_action: lookup("wEntryAction")?,
            entry_reason: lookup("wEntryReason")?,
            entry_time: lookup("wEntryTime")?,
            entry_status: lookup("wEntryStatus")?,
            price_levels: lookup("wPriceLevels")?,
            pl_entries: lookup("wPlEntries")?,
            book_type: lookup("wBookType")?,
        })
    }

    /// The default ids as a name to id dictionary.
    pub fn default_dictionary() -> HashMap<String, Fid> {
        let fields = Self::default();
        [
            ("MdMsgType", fields.msg_type),
            ("MdMsgStatus", fields.msg_status),
            ("MdSeqNum", fields.md_seq_num),
            ("MdSenderId", fields.sender_id),
            ("wPartId", fields.part_id),
            ("wSrcTime", fields.src_time),
            ("wSymbol", fields.symbol),
            ("wSeqNum", fields.seq_num),
            ("wNumLevels", fields.num_levels),
            ("wPlAction", fields.pl_action),
            ("wPlPrice", fields.pl_price),
            ("wPlSide", fields.pl_side),
            ("wPlSize", fields.pl_size),
            ("wPlSizeChange", fields.pl_size_change),
            ("wPlNumEntries", fields.pl_num_entries),
            ("wPlTime", fields.pl_time),
            ("wPlNumAttach", fields.pl_num_attach),
            ("wBookTime", fields.book_time),
            ("wEntryId", fields.entry_id),
            ("wEntrySize", fields.entry_size),
            ("wEntryAction", fields.entry_action),
            ("wEntryReason", fields.entry_reason),
            ("wEntryTime", fields.entry_time),
            ("wEntryStatus", fields.entry_status),
            ("wPriceLevels", fields.price_levels),
            ("wPlEntries", fields.pl_entries),
            ("wBookType", fields.book_type),
        ]
        .into_iter()
        .map(|(name, fid)| (name.to_string(), fid))
        .collect()
    }
}
