//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract services depend on.
//! - Isolate SQLite query details from search and hierarchy logic.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod catalog_repo;
