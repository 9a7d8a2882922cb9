//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract consumed by services and batch workers.
//! - Isolate SQLite query details from processing orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Item::validate()` before persistence.
//! - Uniqueness violations surface as semantic errors, not raw SQLite errors.

pub mod item_repo;
