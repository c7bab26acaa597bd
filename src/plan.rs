//! Per-worker split into scalar prologue, aligned vector blocks and scalar tail.

use crate::element::FillElement;
use crate::simd::VECTOR_BYTES;

/// How one worker's slice is carved up, in element units.
///
/// `prologue + blocks * lanes + tail == len`, and whenever `blocks > 0` the
/// first block starts on a `VECTOR_BYTES` boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanPlan {
    pub prologue: usize,
    pub blocks: usize,
    pub tail: usize,
}

impl SpanPlan {
    /// Plan a span of `len` elements of `elem_size` bytes starting at `addr`.
    ///
    /// `elem_size` must be a power of two no larger than `VECTOR_BYTES`.
    pub fn new(addr: usize, len: usize, elem_size: usize) -> Self {
        debug_assert!(elem_size.is_power_of_two() && elem_size <= VECTOR_BYTES);

        // A pointer that is not element-aligned can never land on a vector
        // boundary with whole elements.
        if addr % elem_size != 0 {
            return SpanPlan { prologue: 0, blocks: 0, tail: len };
        }

        let gap_bytes = VECTOR_BYTES.wrapping_sub(addr) & (VECTOR_BYTES - 1);
        let prologue = (gap_bytes / elem_size).min(len);
        let rest = len - prologue;
        let lanes = VECTOR_BYTES / elem_size;

        SpanPlan {
            prologue,
            blocks: rest / lanes,
            tail: rest % lanes,
        }
    }

    /// Plan the span covered by `slice`.
    #[inline]
    pub fn for_slice<T: FillElement>(slice: &[T]) -> Self {
        Self::new(
            slice.as_ptr() as usize,
            slice.len(),
            core::mem::size_of::<T>(),
        )
    }

    /// Elements covered by the vector body.
    #[inline]
    pub fn body_len<T: FillElement>(&self) -> usize {
        self.blocks * T::LANES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plan_already_aligned() {
        let plan = SpanPlan::new(64, 100, 1);
        assert_eq!(plan, SpanPlan { prologue: 0, blocks: 3, tail: 4 });
    }

    #[test]
    fn test_plan_bytes_unaligned() {
        let plan = SpanPlan::new(33, 100, 1);
        assert_eq!(plan, SpanPlan { prologue: 31, blocks: 2, tail: 5 });
    }

    #[test]
    fn test_plan_prologue_clamped_to_short_span() {
        let plan = SpanPlan::new(1, 5, 1);
        assert_eq!(plan, SpanPlan { prologue: 5, blocks: 0, tail: 0 });
    }

    #[test]
    fn test_plan_words() {
        // 0x1008 is 8 bytes past a 32-byte boundary: three words to realign.
        let plan = SpanPlan::new(0x1008, 20, 8);
        assert_eq!(plan, SpanPlan { prologue: 3, blocks: 4, tail: 1 });
    }

    #[test]
    fn test_plan_words_short_span() {
        let plan = SpanPlan::new(0x1008, 2, 8);
        assert_eq!(plan, SpanPlan { prologue: 2, blocks: 0, tail: 0 });
    }

    #[test]
    fn test_plan_misaligned_words_fall_back_to_scalar() {
        let plan = SpanPlan::new(0x1003, 64, 8);
        assert_eq!(plan, SpanPlan { prologue: 0, blocks: 0, tail: 64 });
    }

    #[test]
    fn test_plan_empty() {
        assert_eq!(
            SpanPlan::new(7, 0, 1),
            SpanPlan { prologue: 0, blocks: 0, tail: 0 }
        );
    }

    proptest! {
        #[test]
        fn prop_plan_body_is_vector_aligned(
            addr in 0usize..1 << 20,
            len in 0usize..4096,
            shift in 0u32..4,
        ) {
            let elem = 1usize << shift;
            let addr = addr * elem;
            let plan = SpanPlan::new(addr, len, elem);
            let lanes = VECTOR_BYTES / elem;

            prop_assert_eq!(plan.prologue + plan.blocks * lanes + plan.tail, len);
            prop_assert!(plan.prologue < lanes);
            prop_assert!(plan.tail < lanes);
            if plan.blocks > 0 {
                prop_assert_eq!((addr + plan.prologue * elem) % VECTOR_BYTES, 0);
            }
        }
    }
}
