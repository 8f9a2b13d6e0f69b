//! Runtime-adjustable catalog policies.
//!
//! # Responsibility
//! - Hold process-wide mutable settings that services read on every call.
//!
//! # Invariants
//! - Policies are injected into services (`Arc`), never read from globals.

pub mod depth_policy;
