//! Primitive book types shared by the book, the publisher and the listener.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level price. Decimal so that keys compare exactly and render without drift.
pub type Price = Decimal;

/// Entry and level quantity.
pub type Size = f64;

/// Side of the book a level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Buy side, iterated from the highest price down.
    Bid,
    /// Sell side, iterated from the lowest price up.
    Ask,
}

impl Side {
    /// Wire code written into the level side field.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Side::Bid => 'B',
            Side::Ask => 'A',
        }
    }

    /// Parses a wire code back into a side.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'B' => Some(Side::Bid),
            'A' => Some(Side::Ask),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Ask => write!(f, "ASK"),
        }
    }
}

/// Last mutation applied to a level or an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Newly created.
    #[default]
    Add,
    /// Changed in place.
    Update,
    /// Removed.
    Delete,
}

impl Action {
    /// Wire code written into the action fields.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Action::Add => 'A',
            Action::Update => 'U',
            Action::Delete => 'D',
        }
    }

    /// Parses a wire code back into an action.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'A' => Some(Action::Add),
            'U' => Some(Action::Update),
            'D' => Some(Action::Delete),
            _ => None,
        }
    }
}
