//! Backing-store layer for the pets table.
//!
//! # Responsibility
//! - Define the table-level contract the gateway calls into.
//! - Isolate SQLite statement assembly from request dispatch.
//!
//! # Invariants
//! - The store persists whatever it is handed; validation happens upstream.

pub mod pet_store;
