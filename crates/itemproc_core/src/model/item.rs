//! Item domain model.
//!
//! # Responsibility
//! - Define the `Item` record and its `ItemStatus` lifecycle.
//! - Validate field constraints before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `name` is 2..=100 characters and not blank.
//! - `description` is at most 500 characters.
//! - `email` is non-blank and shaped like `local@domain`.
//! - Email uniqueness is a storage constraint, not checked here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").expect("valid email regex"));

/// Stable identifier for every item record.
pub type ItemId = Uuid;

/// Processing lifecycle of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Stored but not yet picked up.
    Pending,
    /// Claimed by a worker.
    Processing,
    /// Terminal: processed successfully.
    Processed,
    /// Terminal: processing gave up.
    Failed,
}

impl ItemStatus {
    /// Canonical upper-case name, shared by JSON and SQLite storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Failed)
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "PROCESSED" => Ok(Self::Processed),
            "FAILED" => Ok(Self::Failed),
            other => Err(ItemValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Field-level validation failures for `Item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilId,
    BlankName,
    NameLength { chars: usize },
    DescriptionTooLong { chars: usize },
    BlankEmail,
    InvalidEmail(String),
    UnknownStatus(String),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "item id must not be nil"),
            Self::BlankName => write!(f, "name is required"),
            Self::NameLength { chars } => write!(
                f,
                "name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters (got {chars})"
            ),
            Self::DescriptionTooLong { chars } => write!(
                f,
                "description cannot exceed {DESCRIPTION_MAX_CHARS} characters (got {chars})"
            ),
            Self::BlankEmail => write!(f, "email is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email format: `{value}`"),
            Self::UnknownStatus(value) => write!(
                f,
                "status must be one of PENDING, PROCESSING, PROCESSED, FAILED (got `{value}`)"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Free text; empty when the caller supplied none.
    #[serde(default)]
    pub description: String,
    pub status: ItemStatus,
    /// Contact address. Unique across all stored items.
    pub email: String,
}

impl Item {
    /// Creates a `PENDING` item with a generated stable ID.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, email)
    }

    /// Creates a `PENDING` item with a caller-provided ID.
    ///
    /// Does not validate; write paths call `validate()` before persistence.
    pub fn with_id(id: ItemId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            status: ItemStatus::Pending,
            email: email.into(),
        }
    }

    /// Sets the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the lifecycle status.
    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Transitions this item to the `PROCESSED` terminal state.
    pub fn mark_processed(&mut self) {
        self.status = ItemStatus::Processed;
    }

    /// Checks every field rule.
    ///
    /// # Errors
    /// - Returns the first violated rule in field order: id, name, description, email.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }

        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        let name_chars = self.name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
            return Err(ItemValidationError::NameLength { chars: name_chars });
        }

        let description_chars = self.description.chars().count();
        if description_chars > DESCRIPTION_MAX_CHARS {
            return Err(ItemValidationError::DescriptionTooLong {
                chars: description_chars,
            });
        }

        if self.email.trim().is_empty() {
            return Err(ItemValidationError::BlankEmail);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ItemValidationError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }
}
