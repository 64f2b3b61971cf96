//! OrderBook implementation for maintaining price levels and tracking changes between publishes.

pub mod book;
pub mod delta;
pub mod entry;
pub mod error;
pub mod level;
/// Multi-book management with centralized publish event routing.
pub mod manager;
pub mod snapshot;
mod types;

pub use book::OrderBook;
pub use delta::{DeltaTracker, EntryDelta, LevelDelta};
pub use entry::Entry;
pub use error::BookError;
pub use level::PriceLevel;
pub use manager::{BookManager, PublishEvent};
pub use snapshot::{
    BOOK_SNAPSHOT_FORMAT_VERSION, BookSnapshot, BookSnapshotPackage, EntrySnapshot,
    LevelSnapshot,
};
pub use types::{Action, Price, Side, Size};
