//! # Book Publisher
//!
//! An order book maintenance and publishing engine.
//!
//! An [`OrderBook`](orderbook::OrderBook) keeps a two-sided ladder of price
//! levels for one instrument, each level holding its entries in arrival
//! order. Upstream feed handlers mutate the book through `add_entry`,
//! `update_entry`, `delete_entry`, `add_level`, `update_level` and friends;
//! every mutation is recorded by a [`DeltaTracker`](orderbook::DeltaTracker)
//! until the next publish.
//!
//! Publishing renders the book into any [`BookMessage`](message::BookMessage)
//! implementation:
//!
//! - `populate_recap` writes the full book.
//! - `populate_delta` writes only what changed since the last publish and
//!   returns `false` when nothing did.
//!
//! Both apply the same flattening: a single level is written onto the top-level
//! message and a single entry onto its level message, so the level vector and
//! entry vector fields only appear when there is more than one element.
//!
//! On the consuming side a [`BookListener`](listener::BookListener) decodes
//! those messages back into a mirror book.
//!
//! ## Example
//!
//! ```
//! use book_publisher::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let mut book: OrderBook = OrderBook::new("ACME");
//! book.add_entry(
//!     Entry::new("jmg", 500.0, Action::Add, 1),
//!     Decimal::new(1000, 1),
//!     Side::Bid,
//!     1,
//! )?;
//!
//! let mut msg = MemoryMessage::new();
//! book.populate_recap(&mut msg);
//!
//! let mut listener: BookListener = BookListener::new("ACME");
//! listener.on_message(&msg)?;
//! assert!(listener.book().snapshot().same_levels(&book.snapshot()));
//! # Ok::<(), BookError>(())
//! ```
//!
//! ## Threading
//!
//! A book performs no locking. Its owner serializes mutator and publish calls;
//! [`BookManager`](orderbook::BookManager) shows one way to hand published
//! messages to another thread.

pub mod config;
pub mod listener;
pub mod message;
pub mod orderbook;
pub mod prelude;
pub mod publish;
pub mod utils;

pub use config::{BookConfig, DeltaClearPolicy};
pub use listener::{BookHandler, BookListener};
pub use orderbook::{BookError, OrderBook};
