//! Order book snapshot for persistence and structural comparison

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

use super::error::BookError;
use super::types::{Price, Side, Size};

/// Captured state of one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub id: String,
    pub size: Size,
    pub status: u16,
    pub time: u64,
    pub reason: Option<String>,
}

/// Captured state of one price level, entries in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    pub side: Side,
    pub size: Size,
    pub time: u64,
    pub num_entries: usize,
    pub entries: Vec<EntrySnapshot>,
}

/// A snapshot of the order book state at a specific point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// The symbol or identifier for this order book
    pub symbol: String,

    /// Participant id, if the book carries one
    pub part_id: Option<String>,

    /// Timestamp when the snapshot was created (milliseconds since epoch)
    pub timestamp: u64,

    /// Time of the last event applied to the book
    pub book_time: u64,

    /// Bid levels, highest price first
    pub bids: Vec<LevelSnapshot>,

    /// Ask levels, lowest price first
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Whether both snapshots hold the same levels and entries, ignoring
    /// when they were taken.
    pub fn same_levels(&self, other: &BookSnapshot) -> bool {
        self.bids == other.bids && self.asks == other.asks
    }

    /// Get the best bid price and size
    pub fn best_bid(&self) -> Option<(Price, Size)> {
        let bid = self.bids.first().map(|level| (level.price, level.size));
        trace!("best_bid: {:?}", bid);
        bid
    }

    /// Get the best ask price and size
    pub fn best_ask(&self) -> Option<(Price, Size)> {
        let ask = self.asks.first().map(|level| (level.price, level.size));
        trace!("best_ask: {:?}", ask);
        ask
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn total_bid_size(&self) -> Size {
        self.bids.iter().map(|level| level.size).sum()
    }

    pub fn total_ask_size(&self) -> Size {
        self.asks.iter().map(|level| level.size).sum()
    }
}

/// Format version used for checksum-enabled book snapshots.
pub const BOOK_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Wrapper that provides checksum validation for `BookSnapshot` instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshotPackage {
    /// Version of the snapshot schema for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub snapshot: BookSnapshot,
    /// Hex-encoded checksum of the serialized snapshot.
    pub checksum: String,
}

impl BookSnapshotPackage {
    /// Creates a new snapshot package computing the checksum of the snapshot contents.
    pub fn new(snapshot: BookSnapshot) -> Result<Self, BookError> {
        let checksum = Self::compute_checksum(&snapshot)?;

        Ok(Self {
            version: BOOK_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to JSON.
    pub fn to_json(&self) -> Result<String, BookError> {
        serde_json::to_string(self).map_err(|error| BookError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserializes the package from JSON.
    pub fn from_json(data: &str) -> Result<Self, BookError> {
        serde_json::from_str(data).map_err(|error| BookError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Validates the checksum and version.
    pub fn validate(&self) -> Result<(), BookError> {
        if self.version != BOOK_SNAPSHOT_FORMAT_VERSION {
            return Err(BookError::InvalidOperation {
                message: format!(
                    "Unsupported snapshot version: {} (expected {})",
                    self.version, BOOK_SNAPSHOT_FORMAT_VERSION
                ),
            });
        }

        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(BookError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }

        Ok(())
    }

    /// Consumes the package and returns the validated snapshot.
    pub fn into_snapshot(self) -> Result<BookSnapshot, BookError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &BookSnapshot) -> Result<String, BookError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| BookError::SerializationError {
                message: error.to_string(),
            })?;

        let mut hasher = Sha256::new();
        hasher.update(payload);

        let checksum_bytes = hasher.finalize();
        Ok(checksum_bytes
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect())
    }
}
