//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records shared by repositories, the tree index and services.
//! - Define typed request models for search entry points.
//!
//! # Invariants
//! - Every record is identified by a stable integer id assigned by storage.
//! - Activity children are derived from parent links, never stored.

pub mod activity;
pub mod building;
pub mod organization;
pub mod query;
