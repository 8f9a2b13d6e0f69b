//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls, the activity index and geo predicates
//!   into use-case level APIs.
//! - Keep transport layers decoupled from storage details.

pub mod activity_service;
pub mod search_service;
