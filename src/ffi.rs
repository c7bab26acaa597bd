//! C ABI entry points.
//!
//! ```c
//! void parallel_fill_u8(uint8_t *data, size_t size_bytes, uint8_t value, int num_threads);
//! void parallel_fill_u64(uint64_t *data, size_t num_elements, uint64_t value, int num_threads);
//! int32_t parallel_fill_u8_checked(uint8_t *data, size_t size_bytes, uint8_t value, int num_threads);
//! int32_t parallel_fill_u64_checked(uint64_t *data, size_t num_elements, uint64_t value, int num_threads);
//! ```
//!
//! All four validate their arguments before writing. The `void` forms log
//! a rejected call and return; the `_checked` forms report it as a
//! [`FillStatus`].

#![allow(unsafe_code)]

use core::ffi::c_int;
use core::num::NonZeroUsize;

use tracing::error;

use crate::config::FillConfig;
use crate::element::FillElement;
use crate::error::{FillError, InvalidArgument, Result};
use crate::fill::fill_with;

/// Status code returned by the `_checked` entry points.
///
/// `Ok` = 0, errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillStatus {
    /// The region was filled.
    Ok = 0,
    /// An argument was null, non-positive, misaligned or too large; nothing
    /// was written.
    InvalidArgument = -1,
}

impl From<&FillError> for FillStatus {
    fn from(e: &FillError) -> Self {
        match e {
            FillError::InvalidArgument(_) => FillStatus::InvalidArgument,
        }
    }
}

impl<T> From<&Result<T>> for FillStatus {
    fn from(r: &Result<T>) -> Self {
        match r {
            Ok(_) => FillStatus::Ok,
            Err(e) => e.into(),
        }
    }
}

/// Turn raw C arguments into a slice and worker count.
///
/// # Safety
///
/// If `data` is non-null, aligned and `len * size_of::<T>()` fits in
/// `isize`, it must point to `len` writable elements that nothing else
/// accesses for `'a`.
unsafe fn validate<'a, T: FillElement>(
    data: *mut T,
    len: usize,
    num_threads: c_int,
) -> Result<(&'a mut [T], NonZeroUsize)> {
    let workers = usize::try_from(num_threads)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(InvalidArgument::WorkerCount(num_threads.into()))?;

    if len == 0 {
        return Ok((&mut [], workers));
    }
    if data.is_null() {
        return Err(InvalidArgument::NullDestination { len }.into());
    }
    let align = core::mem::align_of::<T>();
    if data as usize % align != 0 {
        return Err(InvalidArgument::Misaligned { addr: data as usize, align }.into());
    }
    let size = core::mem::size_of::<T>();
    if len.checked_mul(size).is_none_or(|bytes| bytes > isize::MAX as usize) {
        return Err(InvalidArgument::LengthOverflow { len, size }.into());
    }

    // SAFETY: non-null, aligned, in-range; validity is the caller's contract.
    Ok((unsafe { core::slice::from_raw_parts_mut(data, len) }, workers))
}

unsafe fn fill_raw<T: FillElement>(
    data: *mut T,
    len: usize,
    value: T,
    num_threads: c_int,
) -> Result<()> {
    // SAFETY: forwarded from the extern entry point's contract.
    let (dst, workers) = unsafe { validate(data, len, num_threads)? };
    fill_with(dst, value, &FillConfig::with_workers(workers));
    Ok(())
}

fn log_rejected(entry: &str, result: Result<()>) {
    if let Err(err) = result {
        error!(entry, %err, "fill rejected");
    }
}

/// Fill `size_bytes` bytes at `data` with `value` using `num_threads` workers.
///
/// # Safety
///
/// `data` must be valid for writes of `size_bytes` bytes and not accessed by
/// anything else until the call returns.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn parallel_fill_u8(
    data: *mut u8,
    size_bytes: usize,
    value: u8,
    num_threads: c_int,
) {
    // SAFETY: forwarded caller contract.
    let result = unsafe { fill_raw(data, size_bytes, value, num_threads) };
    log_rejected("parallel_fill_u8", result);
}

/// Fill `num_elements` 64-bit words at `data` with `value` using
/// `num_threads` workers.
///
/// # Safety
///
/// `data` must be 8-byte aligned, valid for writes of `num_elements` words
/// and not accessed by anything else until the call returns.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn parallel_fill_u64(
    data: *mut u64,
    num_elements: usize,
    value: u64,
    num_threads: c_int,
) {
    // SAFETY: forwarded caller contract.
    let result = unsafe { fill_raw(data, num_elements, value, num_threads) };
    log_rejected("parallel_fill_u64", result);
}

/// [`parallel_fill_u8`] returning a [`FillStatus`].
///
/// # Safety
///
/// Same as [`parallel_fill_u8`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn parallel_fill_u8_checked(
    data: *mut u8,
    size_bytes: usize,
    value: u8,
    num_threads: c_int,
) -> FillStatus {
    // SAFETY: forwarded caller contract.
    let result = unsafe { fill_raw(data, size_bytes, value, num_threads) };
    FillStatus::from(&result)
}

/// [`parallel_fill_u64`] returning a [`FillStatus`].
///
/// # Safety
///
/// Same as [`parallel_fill_u64`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn parallel_fill_u64_checked(
    data: *mut u64,
    num_elements: usize,
    value: u64,
    num_threads: c_int,
) -> FillStatus {
    // SAFETY: forwarded caller contract.
    let result = unsafe { fill_raw(data, num_elements, value, num_threads) };
    FillStatus::from(&result)
}
