//! Publish-side encoding of recaps and deltas.

mod writer;

pub use writer::{BookWriter, MsgHolder};
