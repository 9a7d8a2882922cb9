//! Domain model for processable item records.
//!
//! # Responsibility
//! - Define the canonical record shared by the CRUD and batch processing paths.
//! - Own field-level validation rules so every write path applies the same checks.
//!
//! # Invariants
//! - Every item is identified by a stable, non-nil `ItemId`.
//! - `status` is always one of the four `ItemStatus` variants.

pub mod item;
