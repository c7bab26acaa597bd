//! Argument validation errors.
//!
//! A fill has exactly one way to fail: its arguments are rejected before any
//! byte is written. Once a call passes validation it always completes.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, FillError>;

/// Error returned by the checked fill entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
}

/// What was wrong with the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("null destination for {len} elements")]
    NullDestination { len: usize },

    #[error("worker count must be at least 1, got {0}")]
    WorkerCount(i64),

    #[error("destination {addr:#x} is not aligned to {align} bytes")]
    Misaligned { addr: usize, align: usize },

    #[error("{len} elements of {size} bytes exceed the addressable range")]
    LengthOverflow { len: usize, size: usize },
}
