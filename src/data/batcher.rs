// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Implements Burn's Batcher trait: Vec<LabeledSequence> →
// [batch, seq_len] token ids + [batch] labels.
//
// Sequences are truncated to `max_seq_len`, then right-padded
// with `pad_id` to the longest sequence in the batch. The model
// has no padding mask, so pad tokens take part in attention
// like any other token.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::domain::labeled_sequence::LabeledSequence;

pub const DEFAULT_PAD_ID: u32 = 0;

#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Token ids, shape [batch_size, seq_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Class indices, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SequenceBatcher {
    pub max_seq_len: usize,
    pub pad_id:      u32,
}

impl SequenceBatcher {
    pub fn new(max_seq_len: usize) -> Self {
        Self { max_seq_len, pad_id: DEFAULT_PAD_ID }
    }

    pub fn with_pad_id(mut self, pad_id: u32) -> Self {
        self.pad_id = pad_id;
        self
    }

    /// Row-major padded ids and the resulting sequence length.
    /// Every row is at least one token long.
    pub fn pad(&self, items: &[LabeledSequence]) -> (Vec<i32>, usize) {
        let seq_len = items
            .iter()
            .map(|s| s.len().min(self.max_seq_len))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut flat = Vec::with_capacity(items.len() * seq_len);
        for item in items {
            let kept = item.len().min(seq_len);
            flat.extend(item.tokens[..kept].iter().map(|&t| t as i32));
            flat.extend(std::iter::repeat(self.pad_id as i32).take(seq_len - kept));
        }
        (flat, seq_len)
    }
}

impl<B: Backend> Batcher<B, LabeledSequence, SequenceBatch<B>> for SequenceBatcher {
    fn batch(&self, items: Vec<LabeledSequence>, device: &B::Device) -> SequenceBatch<B> {
        let batch_size = items.len();
        let (flat, seq_len) = self.pad(&items);

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let tokens = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device)
            .reshape([batch_size, seq_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        SequenceBatch { tokens, labels }
    }
}
