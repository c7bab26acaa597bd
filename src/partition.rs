//! Splitting an element count across a fixed team of workers.

use core::num::NonZeroUsize;
use core::ops::Range;

/// The slice of elements one worker owns for the duration of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerRange {
    pub worker: usize,
    pub start: usize,
    pub end: usize,
}

impl WorkerRange {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, len)` into exactly `workers` contiguous, disjoint ranges.
///
/// The first `workers - 1` ranges hold `len / workers` elements each and the
/// last one takes the remainder, so it is never shorter than the others.
/// When `workers > len` every range but the last is empty; an empty range is
/// a worker with nothing to do.
///
/// # Examples
/// ```
/// use core::num::NonZeroUsize;
/// use fastfill::partition::partition;
/// let lens: Vec<usize> = partition(1000, NonZeroUsize::new(3).unwrap())
///     .map(|r| r.len())
///     .collect();
/// assert_eq!(lens, [333, 333, 334]);
/// ```
pub fn partition(len: usize, workers: NonZeroUsize) -> impl ExactSizeIterator<Item = WorkerRange> {
    let workers = workers.get();
    let chunk = len / workers;
    (0..workers).map(move |worker| range_at(worker, workers, chunk, len))
}

/// The non-empty ranges of [`partition`], in order.
///
/// When `workers > len` only the last range holds elements, so this yields
/// it directly instead of walking past every empty one.
pub fn active_ranges(len: usize, workers: NonZeroUsize) -> impl Iterator<Item = WorkerRange> {
    let workers = workers.get();
    let chunk = len / workers;
    let first = if chunk == 0 { workers - 1 } else { 0 };
    (first..workers)
        .map(move |worker| range_at(worker, workers, chunk, len))
        .filter(|range| !range.is_empty())
}

#[inline]
fn range_at(worker: usize, workers: usize, chunk: usize, len: usize) -> WorkerRange {
    let start = worker * chunk;
    let end = if worker + 1 == workers { len } else { start + chunk };
    WorkerRange { worker, start, end }
}
