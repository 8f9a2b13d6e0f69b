//! In-memory indexes rebuilt from repository snapshots.
//!
//! # Responsibility
//! - Hold read-optimized structures that SQL cannot express cheaply.
//!
//! # Invariants
//! - Indexes never hold references into the repository; they own copies.

pub mod activity_tree;
