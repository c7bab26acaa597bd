//! Parallel fill: size dispatch, worker fan-out and the per-worker pipeline.
//!
//! A call either fills sequentially (small byte buffers) or advises huge
//! pages, partitions the buffer and runs one worker per range. Each worker
//! writes a scalar prologue up to the next vector boundary, streams aligned
//! blocks, then writes the scalar tail. Workers share nothing but the
//! read-only fill value; the call returns once all of them have joined.

use core::num::NonZeroUsize;
use std::thread;

use tracing::{debug, trace, warn};

use crate::advise::advise_huge_pages;
use crate::config::FillConfig;
use crate::element::FillElement;
use crate::error::Result;
use crate::partition::{WorkerRange, active_ranges};
use crate::plan::SpanPlan;
use crate::simd;

/// Which route a fill took.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillPath {
    /// Single-threaded scalar fill; no advisory, no workers.
    Scalar,
    /// Advisory plus a team of `workers` vectorized workers.
    Parallel { workers: NonZeroUsize },
}

impl FillPath {
    /// Pick the route for `len` elements of `T`.
    pub fn select<T: FillElement>(len: usize, workers: NonZeroUsize) -> Self {
        match T::SCALAR_CUTOFF_BYTES {
            Some(cutoff) if len.saturating_mul(core::mem::size_of::<T>()) < cutoff => {
                FillPath::Scalar
            }
            _ => FillPath::Parallel { workers },
        }
    }
}

/// One fill call: a borrowed destination, the value, and the settings.
pub struct FillRequest<'a, T: FillElement> {
    dst: &'a mut [T],
    value: T,
    config: FillConfig,
}

impl<'a, T: FillElement> FillRequest<'a, T> {
    pub fn new(dst: &'a mut [T], value: T, config: FillConfig) -> Self {
        Self { dst, value, config }
    }

    /// Fill the destination and return the route taken.
    pub fn run(self) -> FillPath {
        let FillRequest { dst, value, config } = self;
        let path = FillPath::select::<T>(dst.len(), config.workers());
        debug!(?path, len = dst.len(), elem_size = core::mem::size_of::<T>(), "fill");

        match path {
            FillPath::Scalar => dst.fill(value),
            FillPath::Parallel { workers } => {
                if config.huge_pages() {
                    advise_huge_pages(dst.as_ptr().cast(), core::mem::size_of_val(dst));
                }
                fan_out(dst, value, workers);
            }
        }
        path
    }
}

/// Run one worker per partition range and join them all.
///
/// The first non-empty range runs on the calling thread. A range whose
/// thread cannot be spawned is filled on the calling thread after the others
/// have joined.
fn fan_out<T: FillElement>(dst: &mut [T], value: T, workers: NonZeroUsize) {
    let orphaned: Vec<WorkerRange> = thread::scope(|scope| {
        let mut orphaned = Vec::new();
        let mut rest = &mut *dst;
        let mut own = None;

        // Non-empty ranges are contiguous from index 0.
        for range in active_ranges(rest.len(), workers) {
            let (chunk, tail) = core::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;

            if own.is_none() {
                own = Some((range, chunk));
                continue;
            }

            let spawned = thread::Builder::new()
                .name(format!("fastfill-{}", range.worker))
                .spawn_scoped(scope, move || run_worker(range, chunk, value));
            if let Err(err) = spawned {
                warn!(worker = range.worker, %err, "spawn failed, filling inline");
                orphaned.push(range);
            }
        }

        if let Some((range, chunk)) = own {
            run_worker(range, chunk, value);
        }
        orphaned
    });

    for range in orphaned {
        run_worker(range, &mut dst[range.as_range()], value);
    }
}

fn run_worker<T: FillElement>(range: WorkerRange, chunk: &mut [T], value: T) {
    trace!(worker = range.worker, start = range.start, end = range.end, "worker");
    fill_range(chunk, value);
}

/// Prologue, aligned body, tail over one worker's slice.
pub(crate) fn fill_range<T: FillElement>(chunk: &mut [T], value: T) {
    let plan = SpanPlan::for_slice(chunk);

    let (head, rest) = chunk.split_at_mut(plan.prologue);
    head.fill(value);

    let (body, tail) = rest.split_at_mut(plan.body_len::<T>());
    // SAFETY: the plan starts `body` on a vector boundary and sizes it in
    // whole blocks.
    unsafe { simd::fill_aligned_blocks(body, value) };

    tail.fill(value);
}

/// Fill `dst` according to `config`.
pub fn fill_with<T: FillElement>(dst: &mut [T], value: T, config: &FillConfig) -> FillPath {
    FillRequest::new(dst, value, *config).run()
}

/// Fill every byte of `dst` with `value` using up to `workers` threads.
///
/// Buffers under 2 MiB are filled sequentially.
///
/// # Examples
/// ```
/// use fastfill::{FillPath, fill_bytes};
/// let mut buf = vec![0u8; 4096];
/// assert_eq!(fill_bytes(&mut buf, 0xAB, 4).unwrap(), FillPath::Scalar);
/// assert!(buf.iter().all(|&b| b == 0xAB));
/// ```
pub fn fill_bytes(dst: &mut [u8], value: u8, workers: usize) -> Result<FillPath> {
    Ok(fill_with(dst, value, &FillConfig::new(workers)?))
}

/// Fill every word of `dst` with `value` using `workers` threads.
///
/// Always takes the parallel path.
pub fn fill_words(dst: &mut [u64], value: u64, workers: usize) -> Result<FillPath> {
    Ok(fill_with(dst, value, &FillConfig::new(workers)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_select_byte_cutoff() {
        let cutoff = crate::element::BYTE_SCALAR_CUTOFF;
        assert_eq!(FillPath::select::<u8>(cutoff - 1, nz(8)), FillPath::Scalar);
        assert_eq!(
            FillPath::select::<u8>(cutoff, nz(8)),
            FillPath::Parallel { workers: nz(8) }
        );
    }

    #[test]
    fn test_select_words_always_parallel() {
        assert_eq!(
            FillPath::select::<u64>(1, nz(2)),
            FillPath::Parallel { workers: nz(2) }
        );
        assert_eq!(
            FillPath::select::<u64>(0, nz(1)),
            FillPath::Parallel { workers: nz(1) }
        );
    }

    #[test]
    fn test_fill_range_all_offsets_u8() {
        let mut buf = vec![0xFFu8; 1200];
        for off in 0..64 {
            for n in [0, 1, 31, 32, 33, 127, 128, 129, 255, 256, 257, 1000] {
                buf.fill(0xFF);
                fill_range(&mut buf[off..off + n], 0x42u8);
                assert!(buf[..off].iter().all(|&b| b == 0xFF), "off={off} n={n}");
                assert!(buf[off..off + n].iter().all(|&b| b == 0x42), "off={off} n={n}");
                assert!(buf[off + n..].iter().all(|&b| b == 0xFF), "off={off} n={n}");
            }
        }
    }

    #[test]
    fn test_fill_range_all_offsets_u64() {
        let mut buf = vec![0u64; 300];
        for off in 0..8 {
            for n in [0, 1, 3, 4, 5, 15, 16, 17, 64, 250] {
                buf.fill(0);
                fill_range(&mut buf[off..off + n], u64::MAX);
                assert!(buf[..off].iter().all(|&w| w == 0));
                assert!(buf[off..off + n].iter().all(|&w| w == u64::MAX));
                assert!(buf[off + n..].iter().all(|&w| w == 0));
            }
        }
    }

    #[test]
    fn test_parallel_words_more_workers_than_elements() {
        let mut buf = vec![0u64; 5];
        let path = fill_words(&mut buf, 7, 16).unwrap();
        assert_eq!(path, FillPath::Parallel { workers: nz(16) });
        assert_eq!(buf, [7; 5]);
    }

    #[test]
    fn test_parallel_words_enormous_worker_count() {
        let mut buf = vec![0u64; 3];
        let path = fill_words(&mut buf, 11, i32::MAX as usize).unwrap();
        assert_eq!(path, FillPath::Parallel { workers: nz(i32::MAX as usize) });
        assert_eq!(buf, [11; 3]);
    }

    #[test]
    fn test_parallel_empty_buffer() {
        let mut buf: Vec<u64> = Vec::new();
        fill_words(&mut buf, 7, 4).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fill_with_advice_disabled() {
        let mut buf = vec![0u64; 10_001];
        let cfg = FillConfig::new(3).unwrap().with_huge_pages(false);
        fill_with(&mut buf, 0x1234, &cfg);
        assert!(buf.iter().all(|&w| w == 0x1234));
    }
}
