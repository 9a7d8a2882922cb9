//! Core use-case services.
//!
//! # Responsibility
//! - Combine repository calls and batch processing into caller-facing APIs.
//! - Keep transport layers decoupled from storage and scheduling details.

pub mod item_service;
