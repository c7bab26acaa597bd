//! fastfill: multi-threaded, vectorized fills of large `u8` and `u64` buffers.
//!
//! A fill splits the buffer into one contiguous range per worker, and each
//! worker writes an unaligned scalar prologue, a run of aligned 32-byte
//! vector stores and a scalar tail. Byte buffers under 2 MiB skip all of
//! that and are filled sequentially.
//!
//! The same routines are exported over the C ABI in [`ffi`].

pub mod advise;
pub mod config;
pub mod element;
pub mod error;
pub mod ffi;
pub mod fill;
pub mod partition;
pub mod plan;
pub mod simd;

pub use config::FillConfig;
pub use element::FillElement;
pub use error::{FillError, InvalidArgument, Result};
pub use fill::{FillPath, FillRequest, fill_bytes, fill_with, fill_words};
