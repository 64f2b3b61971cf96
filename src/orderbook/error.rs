//! Error types for order book maintenance and publishing.

use super::types::{Price, Side, Size};
use std::fmt;

/// Errors raised by order book mutators, the message layer and snapshot handling.
#[derive(Debug, Clone, PartialEq)]
pub enum BookError {
    /// An entry with the same id is already attached to the level.
    DuplicateEntry {
        /// Entry id that was added twice.
        id: String,
        /// Price of the level holding the entry.
        price: Price,
        /// Side of the level holding the entry.
        side: Side,
    },

    /// The entry targeted by an update or removal is not attached to the level.
    EntryNotFound {
        /// Entry id that was looked up.
        id: String,
        /// Price of the level that was searched.
        price: Price,
        /// Side of the level that was searched.
        side: Side,
    },

    /// The level targeted by an update or removal does not exist.
    LevelNotFound {
        /// Price that was looked up.
        price: Price,
        /// Side that was searched.
        side: Side,
    },

    /// A fully built level was added at a price that is already present.
    LevelExists {
        /// Price of the existing level.
        price: Price,
        /// Side of the existing level.
        side: Side,
    },

    /// A size rejected by strict checking.
    InvalidSize {
        /// Entry id, or the level price rendered as text for level sizes.
        id: String,
        /// The rejected size.
        size: Size,
    },

    /// A message could not be decoded into book state.
    InvalidMessage {
        /// Description of what was wrong with the message.
        message: String,
    },

    /// A field name could not be resolved through the field dictionary.
    MissingField {
        /// Dictionary name that failed to resolve.
        name: String,
    },

    /// Invalid operation for the current state.
    InvalidOperation {
        /// Description of the invalid operation.
        message: String,
    },

    /// Configuration could not be read or parsed.
    ConfigError {
        /// Description of the configuration problem.
        message: String,
    },

    /// Serialization error
    SerializationError {
        /// Underlying error message
        message: String,
    },

    /// Deserialization error
    DeserializationError {
        /// Underlying error message
        message: String,
    },

    /// Two books or levels that were expected to match differ.
    BookMismatch {
        /// First difference found.
        reason: String,
    },

    /// Checksum mismatch between a snapshot package and its payload.
    ChecksumMismatch {
        /// Checksum stored in the package.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::DuplicateEntry { id, price, side } => {
                write!(
                    f,
                    "attempted to add an existent entry: {id} at {side} level {price}"
                )
            }
            BookError::EntryNotFound { id, price, side } => {
                write!(f, "entry {id} does not exist at {side} level {price}")
            }
            BookError::LevelNotFound { price, side } => {
                write!(f, "{side} level {price} does not exist")
            }
            BookError::LevelExists { price, side } => {
                write!(f, "{side} level {price} already exists")
            }
            BookError::InvalidSize { id, size } => {
                write!(f, "invalid size {size} for {id}")
            }
            BookError::InvalidMessage { message } => {
                write!(f, "invalid book message: {message}")
            }
            BookError::MissingField { name } => {
                write!(f, "field {name} not found in dictionary")
            }
            BookError::InvalidOperation { message } => {
                write!(f, "invalid operation: {message}")
            }
            BookError::ConfigError { message } => {
                write!(f, "configuration error: {message}")
            }
            BookError::SerializationError { message } => {
                write!(f, "serialization error: {message}")
            }
            BookError::DeserializationError { message } => {
                write!(f, "deserialization error: {message}")
            }
            BookError::BookMismatch { reason } => {
                write!(f, "books differ: {reason}")
            }
            BookError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "snapshot checksum mismatch: expected {expected}, got {actual}"
                )
            }
        }
    }
}

impl std::error::Error for BookError {}
