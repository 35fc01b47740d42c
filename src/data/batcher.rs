// ============================================================
// Layer 4 — Token Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TokenSample>
// into tensors.
//
// How batching works here:
//   Input:  Vec of N TokenSamples, each with sequences of length S
//   Output: TokenBatch with four tensors of shape [N, S]
//
//   We flatten each per-position field into one long Vec, then
//   reshape: [s1_t1, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// All samples are padded to max_len by the processor, so no
// dynamic padding is needed here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TokenSample;

// ─── TokenBatch ───────────────────────────────────────────────────────────────
/// A batch of sentences ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct TokenBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Target class per position
    pub label_ids: Tensor<B, 2, Int>,

    /// 1 = position counts towards the loss and accuracy
    pub loss_mask: Tensor<B, 2, Int>,
}

// ─── TokenBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TokenBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TokenBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack<F>(&self, items: &[TokenSample], seq_len: usize, field: F) -> Tensor<B, 2, Int>
    where
        F: Fn(&TokenSample) -> &[u32],
    {
        let flat: Vec<i32> = items
            .iter()
            .flat_map(|s| field(s).iter().map(|&x| x as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([items.len(), seq_len])
    }
}

impl<B: Backend> Batcher<TokenSample, TokenBatch<B>> for TokenBatcher<B> {
    fn batch(&self, items: Vec<TokenSample>) -> TokenBatch<B> {
        // All sequences have the same length (pre-padded)
        let seq_len = items[0].input_ids.len();

        TokenBatch {
            input_ids:      self.stack(&items, seq_len, |s| s.input_ids.as_slice()),
            attention_mask: self.stack(&items, seq_len, |s| s.attention_mask.as_slice()),
            label_ids:      self.stack(&items, seq_len, |s| s.label_ids.as_slice()),
            loss_mask:      self.stack(&items, seq_len, |s| s.loss_mask.as_slice()),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn sample(ids: [u32; 4], mask: [u32; 4]) -> TokenSample {
        TokenSample {
            input_ids:      ids.to_vec(),
            attention_mask: mask.to_vec(),
            label_ids:      vec![0, 1, 2, 0],
            loss_mask:      vec![0, 1, 1, 0],
            word_starts:    vec![false, true, true, false],
        }
    }

    #[test]
    fn test_batch_shapes_and_row_order() {
        let batcher = TokenBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(vec![
            sample([2, 7, 8, 3], [1, 1, 1, 1]),
            sample([2, 6, 3, 0], [1, 1, 1, 0]),
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.loss_mask.dims(), [2, 4]);

        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![2, 7, 8, 3, 2, 6, 3, 0]);
        let mask: Vec<i64> = batch.attention_mask.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(&mask[4..], &[1, 1, 1, 0]);
    }
}
