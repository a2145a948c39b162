//! Core data access for pet records.
//! This crate owns the URI-addressed gateway and every write-boundary rule.

pub mod address;
pub mod config;
pub mod contract;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;

pub use address::{Address, AddressMatcher};
pub use config::{DbLocation, GatewayConfig};
pub use contract::Gender;
pub use gateway::{GatewayError, GatewayResult, Operation, PetCursor, PetGateway};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::pet::{Field, Pet, PetId, PetValidationError, PetValues};
pub use notify::{
    notification_channel, notification_channel_with_capacity, ChangeDispatcher, ChangeEvent,
    ChangeFlag, ChangeNotifier, ChangeObserver, ObserverHandle, EVENT_QUEUE_CAPACITY,
};
pub use repo::pet_store::{Column, CursorRow, PetStore, SqlitePetStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
