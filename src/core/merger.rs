//! Block merger: reassembles per-block quantized segments into one
//! contiguous per-channel stream.
//!
//! Quantized samples are not windowed (windowing was analysis-only) and each
//! block contributes exactly its advance segment, so no overlap-add is
//! needed; this is pure bookkeeping in time order plus a trim of any
//! zero-padding the framer added to the final block.

/// Final per-channel output of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutput {
    /// Reduced-resolution samples, same length as the input channel.
    pub reduced: Vec<i32>,
    /// Per-sample residual (`original − reduced`, wrapping) when correction
    /// is enabled; aligned 1:1 with `reduced`.
    pub correction: Option<Vec<i32>>,
}

/// Accumulates block results in time order.
pub struct BlockMerger {
    expected_len: usize,
    reduced: Vec<i32>,
    correction: Option<Vec<i32>>,
    next_index: usize,
}

impl BlockMerger {
    pub fn new(expected_len: usize, correction_enabled: bool) -> Self {
        Self {
            expected_len,
            reduced: Vec::with_capacity(expected_len),
            correction: correction_enabled.then(|| Vec::with_capacity(expected_len)),
            next_index: 0,
        }
    }

    /// Append one block's quantized advance segment. Blocks must arrive in
    /// strict time order.
    pub fn push_block(&mut self, block_index: usize, reduced: &[i32], correction: Option<&[i32]>) {
        debug_assert_eq!(block_index, self.next_index, "blocks out of order");
        self.next_index += 1;

        self.reduced.extend_from_slice(reduced);
        if let (Some(out), Some(seg)) = (self.correction.as_mut(), correction) {
            debug_assert_eq!(seg.len(), reduced.len());
            out.extend_from_slice(seg);
        }
    }

    /// Finish the channel: trim any final-block padding and hand back the
    /// merged streams.
    pub fn finish(mut self) -> ChannelOutput {
        self.reduced.truncate(self.expected_len);
        if let Some(corr) = self.correction.as_mut() {
            corr.truncate(self.expected_len);
        }
        debug_assert_eq!(self.reduced.len(), self.expected_len);

        ChannelOutput {
            reduced: self.reduced,
            correction: self.correction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenates_in_order() {
        let mut merger = BlockMerger::new(6, false);
        merger.push_block(0, &[1, 2, 3], None);
        merger.push_block(1, &[4, 5, 6], None);

        let out = merger.finish();
        assert_eq!(out.reduced, vec![1, 2, 3, 4, 5, 6]);
        assert!(out.correction.is_none());
    }

    #[test]
    fn test_trims_to_expected_length() {
        let mut merger = BlockMerger::new(4, true);
        merger.push_block(0, &[1, 2, 3], Some(&[0, 0, 1]));
        merger.push_block(1, &[4, 0, 0], Some(&[2, 0, 0]));

        let out = merger.finish();
        assert_eq!(out.reduced, vec![1, 2, 3, 4]);
        assert_eq!(out.correction.unwrap(), vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_empty_channel() {
        let merger = BlockMerger::new(0, true);
        let out = merger.finish();
        assert!(out.reduced.is_empty());
        assert_eq!(out.correction.unwrap().len(), 0);
    }
}
