//! Aligned 32-byte block stores for the bulk of a fill.
//!
//! The unrolled store loop is written once against [`BlockStore`] and
//! instantiated per instruction set:
//!
//! - x86_64 with AVX2: one aligned 256-bit store per block
//! - x86_64 without AVX2: two aligned SSE2 stores per block
//! - everything else: a plain aligned 32-byte write
//!
//! The block width is `VECTOR_BYTES` for every backend. On x86_64 the AVX2
//! loop is always compiled under `#[target_feature(enable = "avx2")]` and
//! chosen whenever the host CPU reports AVX2.
//!
//! # Safety
//!
//! Callers of the raw store loop must ensure:
//! - The destination is valid for writes of `blocks * VECTOR_BYTES` bytes
//! - The destination is aligned to `VECTOR_BYTES`

#![allow(unsafe_code)]

use crate::element::{Block, FillElement};

// =============================================================================
// WIDTH AND LOOKAHEAD
// =============================================================================

/// Bytes written by one vector store. Every aligned block is this wide.
pub const VECTOR_BYTES: usize = 32;

/// Vector stores issued per iteration of the main loop.
pub const UNROLL: usize = 4;

/// Distance ahead of the current block that each unrolled group prefetches.
pub const PREFETCH_DISTANCE: usize = 256;

/// Store one broadcast register into an aligned block.
pub trait BlockStore {
    type Reg: Copy;

    /// Load the fill pattern into a register.
    ///
    /// # Safety
    ///
    /// The backend's instruction set must be available.
    unsafe fn broadcast(block: &Block) -> Self::Reg;

    /// # Safety
    ///
    /// `dst` must be valid for `VECTOR_BYTES` bytes of writes and aligned to
    /// `VECTOR_BYTES`, and the backend's instruction set must be available.
    unsafe fn store(dst: *mut u8, reg: Self::Reg);

    /// Hint that the cache line at `addr` will be written soon. Never faults.
    #[inline(always)]
    fn prefetch(_addr: *const u8) {}
}

/// Instruction set used for the aligned body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Avx2,
    Sse2Pair,
    Portable,
}

impl Backend {
    /// Widest backend the running CPU supports.
    #[inline]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx2") {
                Backend::Avx2
            } else {
                Backend::Sse2Pair
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Backend::Portable
        }
    }

    /// Whether this backend can run on the current CPU.
    pub fn is_available(self) -> bool {
        match self {
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => std::is_x86_feature_detected!("avx2"),
            #[cfg(target_arch = "x86_64")]
            Backend::Sse2Pair => true,
            #[cfg(not(target_arch = "x86_64"))]
            Backend::Avx2 | Backend::Sse2Pair => false,
            Backend::Portable => true,
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::{BlockStore, stream_blocks};
    use crate::element::Block;
    use core::arch::x86_64::*;

    pub struct Avx2;

    impl BlockStore for Avx2 {
        type Reg = __m256i;

        #[inline(always)]
        unsafe fn broadcast(block: &Block) -> __m256i {
            // SAFETY: Block is 32 bytes and 32-aligned; AVX is available.
            unsafe { _mm256_load_si256(block.0.as_ptr() as *const __m256i) }
        }

        #[inline(always)]
        unsafe fn store(dst: *mut u8, reg: __m256i) {
            // SAFETY: caller guarantees a writable, 32-aligned block.
            unsafe { _mm256_store_si256(dst as *mut __m256i, reg) }
        }

        #[inline(always)]
        fn prefetch(addr: *const u8) {
            // SAFETY: prefetch is a hint and does not fault on any address.
            unsafe { _mm_prefetch::<_MM_HINT_T0>(addr as *const i8) }
        }
    }

    pub struct Sse2Pair;

    impl BlockStore for Sse2Pair {
        type Reg = __m128i;

        #[inline(always)]
        unsafe fn broadcast(block: &Block) -> __m128i {
            // Both halves of a block are identical for every element width.
            // SAFETY: Block is 32-aligned, so its first 16 bytes are 16-aligned.
            unsafe { _mm_load_si128(block.0.as_ptr() as *const __m128i) }
        }

        #[inline(always)]
        unsafe fn store(dst: *mut u8, reg: __m128i) {
            // SAFETY: caller guarantees a writable, 32-aligned block.
            unsafe {
                _mm_store_si128(dst as *mut __m128i, reg);
                _mm_store_si128(dst.add(16) as *mut __m128i, reg);
            }
        }

        #[inline(always)]
        fn prefetch(addr: *const u8) {
            // SAFETY: prefetch is a hint and does not fault on any address.
            unsafe { _mm_prefetch::<_MM_HINT_T0>(addr as *const i8) }
        }
    }

    /// # Safety
    ///
    /// AVX2 must be supported, plus the raw store loop contract.
    #[target_feature(enable = "avx2")]
    pub unsafe fn stream_blocks_avx2(dst: *mut u8, blocks: usize, block: &Block) {
        // SAFETY: forwarded contract; AVX2 is enabled for this body.
        unsafe { stream_blocks::<Avx2>(dst, blocks, block) }
    }

    /// # Safety
    ///
    /// Raw store loop contract. SSE2 is part of the x86_64 baseline.
    pub unsafe fn stream_blocks_sse2(dst: *mut u8, blocks: usize, block: &Block) {
        // SAFETY: forwarded contract.
        unsafe { stream_blocks::<Sse2Pair>(dst, blocks, block) }
    }
}

pub struct Portable;

impl BlockStore for Portable {
    type Reg = Block;

    #[inline(always)]
    unsafe fn broadcast(block: &Block) -> Block {
        *block
    }

    #[inline(always)]
    unsafe fn store(dst: *mut u8, reg: Block) {
        // SAFETY: caller guarantees a writable, 32-aligned block.
        unsafe { core::ptr::write(dst as *mut Block, reg) }
    }
}

// =============================================================================
// MAIN LOOP: 4x unrolled aligned stores with lookahead prefetch
// =============================================================================

#[inline(always)]
unsafe fn stream_blocks<S: BlockStore>(dst: *mut u8, blocks: usize, block: &Block) {
    debug_assert_eq!(dst as usize % VECTOR_BYTES, 0);

    // SAFETY: the caller's contract covers every block in [0, blocks).
    unsafe {
        let reg = S::broadcast(block);
        let mut i = 0;

        while i + UNROLL <= blocks {
            let p = dst.add(i * VECTOR_BYTES);
            S::prefetch(p.wrapping_add(PREFETCH_DISTANCE));
            S::store(p, reg);
            S::store(p.add(VECTOR_BYTES), reg);
            S::store(p.add(2 * VECTOR_BYTES), reg);
            S::store(p.add(3 * VECTOR_BYTES), reg);
            i += UNROLL;
        }

        while i < blocks {
            S::store(dst.add(i * VECTOR_BYTES), reg);
            i += 1;
        }
    }
}

/// # Safety
///
/// `backend.is_available()` must hold, plus the raw store loop contract.
unsafe fn stream_with(backend: Backend, dst: *mut u8, blocks: usize, block: &Block) {
    // SAFETY: forwarded contract.
    unsafe {
        match backend {
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => x86::stream_blocks_avx2(dst, blocks, block),
            #[cfg(target_arch = "x86_64")]
            Backend::Sse2Pair => x86::stream_blocks_sse2(dst, blocks, block),
            #[cfg(not(target_arch = "x86_64"))]
            Backend::Avx2 | Backend::Sse2Pair => stream_blocks::<Portable>(dst, blocks, block),
            Backend::Portable => stream_blocks::<Portable>(dst, blocks, block),
        }
    }
}

/// Fill an aligned, whole-block body with `value` using the widest backend
/// the CPU supports.
///
/// # Safety
///
/// - `body` must start on a `VECTOR_BYTES` boundary
/// - `body.len()` must be a multiple of `T::LANES`
pub unsafe fn fill_aligned_blocks<T: FillElement>(body: &mut [T], value: T) {
    // SAFETY: forwarded contract; detect() only returns available backends.
    unsafe { fill_aligned_blocks_with(Backend::detect(), body, value) }
}

/// [`fill_aligned_blocks`] on an explicit backend.
///
/// # Safety
///
/// Same as [`fill_aligned_blocks`], and `backend.is_available()` must hold.
pub unsafe fn fill_aligned_blocks_with<T: FillElement>(
    backend: Backend,
    body: &mut [T],
    value: T,
) {
    debug_assert_eq!(body.len() % T::LANES, 0);
    debug_assert!(backend.is_available());
    let blocks = body.len() / T::LANES;
    if blocks == 0 {
        return;
    }
    // SAFETY: `body` spans exactly `blocks` aligned blocks per the contract.
    unsafe { stream_with(backend, body.as_mut_ptr().cast(), blocks, &value.splat()) }
}
