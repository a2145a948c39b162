//! Gateway configuration.
//!
//! # Responsibility
//! - Describe which authority the gateway answers for.
//! - Describe where the backing SQLite database lives.

use crate::contract::CONTENT_AUTHORITY;
use std::path::PathBuf;

/// Backing database location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// Static settings for one gateway instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Authority segment of every accepted address.
    pub authority: String,
    pub db_location: DbLocation,
}

impl GatewayConfig {
    /// File-backed config under the default authority.
    pub fn with_db_file(path: impl Into<PathBuf>) -> Self {
        Self {
            db_location: DbLocation::File(path.into()),
            ..Self::default()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            authority: CONTENT_AUTHORITY.to_string(),
            db_location: DbLocation::Memory,
        }
    }
}
