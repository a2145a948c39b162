//! Pet domain model.
//!
//! # Responsibility
//! - Define the stored `Pet` record and the typed partial write payload.
//! - Own write-boundary validation rules.
//!
//! # Invariants
//! - A stored pet always has a non-null name and a valid gender code.
//! - Weight is either absent or non-negative.

pub mod pet;
