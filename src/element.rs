//! Element granularities the fill understands.
//!
//! Every element type is broadcast into one [`Block`] (a 32-byte, 32-aligned
//! pattern) so the vector backends only ever deal with bytes.

use crate::simd::VECTOR_BYTES;

/// Byte length below which a `u8` fill skips the parallel path (2 MiB).
pub const BYTE_SCALAR_CUTOFF: usize = 2 * 1024 * 1024;

/// One vector register's worth of fill pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct Block(pub [u8; VECTOR_BYTES]);

/// A scalar type that can be broadcast into a [`Block`].
pub trait FillElement: Copy + Send + Sync + 'static {
    /// Elements written by one vector store.
    const LANES: usize = VECTOR_BYTES / core::mem::size_of::<Self>();

    /// Byte length under which the fill is done sequentially with no
    /// advisory and no workers. `None` means always take the parallel path.
    const SCALAR_CUTOFF_BYTES: Option<usize>;

    /// Repeat `self` across a whole block.
    fn splat(self) -> Block;
}

impl FillElement for u8 {
    const SCALAR_CUTOFF_BYTES: Option<usize> = Some(BYTE_SCALAR_CUTOFF);

    #[inline]
    fn splat(self) -> Block {
        Block([self; VECTOR_BYTES])
    }
}

impl FillElement for u64 {
    const SCALAR_CUTOFF_BYTES: Option<usize> = None;

    #[inline]
    fn splat(self) -> Block {
        let word = self.to_ne_bytes();
        let mut bytes = [0u8; VECTOR_BYTES];
        for lane in bytes.chunks_exact_mut(word.len()) {
            lane.copy_from_slice(&word);
        }
        Block(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lanes_per_vector() {
        assert_eq!(<u8 as FillElement>::LANES, 32);
        assert_eq!(<u64 as FillElement>::LANES, 4);
    }

    #[test]
    fn test_splat_u64_matches_native_layout() {
        let value = 0x0102_0304_0506_0708u64;
        let block = value.splat();
        let words: Vec<u64> = block
            .0
            .chunks_exact(8)
            .map(|c| u64::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(words, vec![value; 4]);
    }

    #[test]
    fn test_block_alignment() {
        assert_eq!(core::mem::align_of::<Block>(), VECTOR_BYTES);
        assert_eq!(core::mem::size_of::<Block>(), VECTOR_BYTES);
    }
}
