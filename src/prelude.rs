//! Commonly used types, for glob import.

pub use crate::config::{BookConfig, DeltaClearPolicy};
pub use crate::listener::{BookHandler, BookListener};
pub use crate::message::{BookFields, BookMessage, FieldDictionary, MemoryMessage, MsgType};
pub use crate::orderbook::{
    Action, BOOK_SNAPSHOT_FORMAT_VERSION, BookError, BookManager, BookSnapshot,
    BookSnapshotPackage, Entry, OrderBook, Price, PriceLevel, PublishEvent, Side, Size,
};
