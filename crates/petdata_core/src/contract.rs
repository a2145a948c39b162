//! Stable naming contract shared by gateway callers.
//!
//! # Responsibility
//! - Define the content authority, path segment and base URI for pets.
//! - Define table/column names and the content type tokens.
//! - Define the `Gender` code set accepted by write validation.
//!
//! # Invariants
//! - Gender codes are persisted as integers and must stay stable.
//! - Column names must match `db/migrations/0001_init.sql`.

use serde::{Deserialize, Serialize};

/// Content authority owning the pet addresses.
pub const CONTENT_AUTHORITY: &str = "com.example.android.pets";
/// Path segment addressing the pet collection.
pub const PATH_PETS: &str = "pets";
/// URI scheme for all gateway addresses.
pub const CONTENT_SCHEME: &str = "content";

/// Table backing the pet collection.
pub const TABLE_NAME: &str = "pets";
pub const COLUMN_ID: &str = "_id";
pub const COLUMN_NAME: &str = "name";
pub const COLUMN_BREED: &str = "breed";
pub const COLUMN_GENDER: &str = "gender";
pub const COLUMN_WEIGHT: &str = "weight";

const CURSOR_DIR_BASE_TYPE: &str = "vnd.android.cursor.dir";
const CURSOR_ITEM_BASE_TYPE: &str = "vnd.android.cursor.item";

/// Returns `content://<authority>/<path>` for the given authority.
pub fn base_content_uri(authority: &str) -> String {
    format!("{CONTENT_SCHEME}://{authority}/{PATH_PETS}")
}

/// Returns the content URI of the pet collection under the default authority.
pub fn pets_content_uri() -> String {
    base_content_uri(CONTENT_AUTHORITY)
}

/// Type token for a collection address under `authority`.
pub fn list_content_type(authority: &str) -> String {
    format!("{CURSOR_DIR_BASE_TYPE}/{authority}/{PATH_PETS}")
}

/// Type token for an item address under `authority`.
pub fn item_content_type(authority: &str) -> String {
    format!("{CURSOR_ITEM_BASE_TYPE}/{authority}/{PATH_PETS}")
}

/// Pet gender stored as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Persisted integer code.
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    /// Parses a persisted code; `None` for anything outside the code set.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }
}

/// Returns whether `code` is one of the accepted gender codes.
pub fn is_valid_gender(code: i64) -> bool {
    Gender::from_code(code).is_some()
}
