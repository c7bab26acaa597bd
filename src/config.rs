//! Per-call fill settings.

use core::num::NonZeroUsize;

use crate::error::{InvalidArgument, Result};

/// Worker count and advisory toggle for one fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillConfig {
    workers: NonZeroUsize,
    huge_pages: bool,
}

impl FillConfig {
    /// Config for `workers` threads with huge-page advice enabled.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = NonZeroUsize::new(workers).ok_or(InvalidArgument::WorkerCount(0))?;
        Ok(Self::with_workers(workers))
    }

    pub const fn with_workers(workers: NonZeroUsize) -> Self {
        Self {
            workers,
            huge_pages: true,
        }
    }

    /// Enable or disable the `MADV_HUGEPAGE` request issued before a
    /// parallel fill.
    pub const fn with_huge_pages(mut self, enabled: bool) -> Self {
        self.huge_pages = enabled;
        self
    }

    #[inline]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    #[inline]
    pub const fn huge_pages(&self) -> bool {
        self.huge_pages
    }
}

impl Default for FillConfig {
    /// One worker per available hardware thread.
    fn default() -> Self {
        let workers = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self::with_workers(workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FillError;

    #[test]
    fn test_config_rejects_zero_workers() {
        assert_eq!(
            FillConfig::new(0),
            Err(FillError::InvalidArgument(InvalidArgument::WorkerCount(0)))
        );
    }

    #[test]
    fn test_config_defaults() {
        let cfg = FillConfig::new(3).unwrap();
        assert_eq!(cfg.workers().get(), 3);
        assert!(cfg.huge_pages());
        assert!(!cfg.with_huge_pages(false).huge_pages());
        assert!(FillConfig::default().workers().get() >= 1);
    }
}
