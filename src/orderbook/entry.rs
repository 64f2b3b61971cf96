//! A single participant's contribution to a price level.

use super::types::{Action, Size};
use serde::{Deserialize, Serialize};

/// One order or participant quote attached to a [`PriceLevel`](super::PriceLevel).
///
/// Two entries are equal when their ids are equal, whatever their size or time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub(super) id: String,
    pub(super) size: Size,
    pub(super) action: Action,
    pub(super) status: u16,
    pub(super) time: u64,
    pub(super) reason: Option<String>,
}

impl Entry {
    /// Creates an entry with a zero status and no reason.
    pub fn new(id: impl Into<String>, size: Size, action: Action, time: u64) -> Self {
        Self {
            id: id.into(),
            size,
            action,
            status: 0,
            time,
            reason: None,
        }
    }

    /// Sets the opaque status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the reason text.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Time of the last mutation, milliseconds since epoch.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_time(&mut self, time: u64) {
        self.time = time;
    }

    pub fn set_reason(&mut self, reason: Option<String>) {
        self.reason = reason;
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}
