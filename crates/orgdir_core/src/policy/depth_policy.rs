//! Maximum activity-hierarchy depth.
//!
//! # Invariants
//! - The stored value is always a valid non-negative depth.
//! - Reads and writes are single atomic operations; a write racing an
//!   expansion may land before or after that expansion's read.
//! - A rejected write leaves the previous value untouched.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

/// Depth used when configuration does not override it.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

pub type DepthPolicyResult<T> = Result<T, DepthPolicyError>;

/// Rejected depth policy updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPolicyError {
    Negative(i64),
    OutOfRange(i64),
}

impl Display for DepthPolicyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative(value) => write!(f, "max depth must not be negative, got {value}"),
            Self::OutOfRange(value) => write!(f, "max depth {value} is out of range"),
        }
    }
}

impl Error for DepthPolicyError {}

/// Shared cell holding the maximum descendant-expansion depth.
#[derive(Debug)]
pub struct DepthPolicy {
    max_depth: AtomicU32,
}

impl DepthPolicy {
    pub fn new(initial_max_depth: u32) -> Self {
        Self {
            max_depth: AtomicU32::new(initial_max_depth),
        }
    }

    /// Returns the currently configured maximum depth.
    pub fn get_max_depth(&self) -> u32 {
        self.max_depth.load(Ordering::Acquire)
    }

    /// Replaces the maximum depth and returns the previous value.
    ///
    /// # Errors
    /// - `Negative` when `new_value < 0`.
    /// - `OutOfRange` when `new_value` does not fit the depth type.
    pub fn set_max_depth(&self, new_value: i64) -> DepthPolicyResult<u32> {
        let new_value = checked_depth(new_value)?;
        let previous = self.max_depth.swap(new_value, Ordering::AcqRel);
        info!(
            "event=depth_policy_update module=policy status=ok previous={previous} current={new_value}"
        );
        Ok(previous)
    }
}

/// Converts a caller-supplied depth into the stored representation.
pub fn checked_depth(value: i64) -> DepthPolicyResult<u32> {
    if value < 0 {
        return Err(DepthPolicyError::Negative(value));
    }
    u32::try_from(value).map_err(|_| DepthPolicyError::OutOfRange(value))
}

impl Default for DepthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
