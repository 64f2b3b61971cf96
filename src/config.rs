//! Book configuration loaded from JSON and the environment.
//!
//! Every field has a default, so a JSON file only needs the keys it changes.
//! Four environment variables override the loaded values:
//! - `BOOK_GENERATE_DELTAS`: `true` or `false`
//! - `BOOK_STRICT_CHECKING`: `true` or `false`
//! - `BOOK_UPDATE_INCONSISTENT`: `true` or `false`
//! - `BOOK_CLEAR_POLICY`: `on_publish` or `manual`

use crate::message::BookFields;
use crate::orderbook::error::BookError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// When pending deltas are discarded after a delta publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaClearPolicy {
    /// `populate_delta` clears the pending list after writing.
    #[default]
    OnPublish,
    /// The caller clears the pending list with `clear_delta_list`.
    Manual,
}

impl DeltaClearPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on_publish" | "onpublish" => Some(DeltaClearPolicy::OnPublish),
            "manual" => Some(DeltaClearPolicy::Manual),
            _ => None,
        }
    }
}

/// Per-book settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// When false, publishing writes nothing and no deltas are recorded.
    pub generate_delta_msgs: bool,
    /// When the pending delta list is cleared.
    pub clear_policy: DeltaClearPolicy,
    /// Rejects negative sizes on top of the always-on duplicate and missing checks.
    pub strict_checking: bool,
    /// Lets a listener keep applying deltas after a sequence gap.
    pub update_inconsistent_book: bool,
    /// Field ids used by the writer and the listener.
    pub fields: BookFields,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            generate_delta_msgs: true,
            clear_policy: DeltaClearPolicy::OnPublish,
            strict_checking: false,
            update_inconsistent_book: false,
            fields: BookFields::default(),
        }
    }
}

impl BookConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_generate_delta_msgs(mut self, generate: bool) -> Self {
        self.generate_delta_msgs = generate;
        self
    }

    #[must_use]
    pub fn with_clear_policy(mut self, policy: DeltaClearPolicy) -> Self {
        self.clear_policy = policy;
        self
    }

    #[must_use]
    pub fn with_strict_checking(mut self, strict: bool) -> Self {
        self.strict_checking = strict;
        self
    }

    #[must_use]
    pub fn with_update_inconsistent_book(mut self, update: bool) -> Self {
        self.update_inconsistent_book = update;
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: BookFields) -> Self {
        self.fields = fields;
        self
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(data: &str) -> Result<Self, BookError> {
        serde_json::from_str(data).map_err(|error| BookError::ConfigError {
            message: error.to_string(),
        })
    }

    /// Loads a configuration file, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::ConfigError`] if the file cannot be read or parsed,
    /// or if an override variable holds an unrecognised value.
    pub fn load(path: &Path) -> Result<Self, BookError> {
        let contents = std::fs::read_to_string(path).map_err(|e| BookError::ConfigError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        let config = Self::from_json(&contents)?;
        debug!("loaded book config from {}", path.display());
        config.with_env_overrides()
    }

    /// Applies `BOOK_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, BookError> {
        self.with_overrides(non_empty_var)
    }

    fn with_overrides<F>(mut self, var: F) -> Result<Self, BookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("BOOK_GENERATE_DELTAS") {
            self.generate_delta_msgs = parse_bool("BOOK_GENERATE_DELTAS", &value)?;
        }
        if let Some(value) = var("BOOK_STRICT_CHECKING") {
            self.strict_checking = parse_bool("BOOK_STRICT_CHECKING", &value)?;
        }
        if let Some(value) = var("BOOK_UPDATE_INCONSISTENT") {
            self.update_inconsistent_book = parse_bool("BOOK_UPDATE_INCONSISTENT", &value)?;
        }
        if let Some(value) = var("BOOK_CLEAR_POLICY") {
            self.clear_policy =
                DeltaClearPolicy::parse(&value).ok_or_else(|| BookError::ConfigError {
                    message: format!("BOOK_CLEAR_POLICY has unknown value {value}"),
                })?;
        }
        Ok(self)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, BookError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BookError::ConfigError {
            message: format!("{name} must be a boolean, got {value}"),
        }),
    }
}
