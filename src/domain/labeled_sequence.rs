// ============================================================
// Layer 3 — LabeledSequence Domain Type
// ============================================================
// One classification example: already-tokenised ids plus the
// index of the target class.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSequence {
    /// Token ids, each in [0, vocab_size)
    pub tokens: Vec<u32>,

    /// Class index in [0, nb_classes)
    pub label: usize,
}

impl LabeledSequence {
    pub fn new(tokens: Vec<u32>, label: usize) -> Self {
        Self { tokens, label }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Largest token id, if any
    pub fn max_token(&self) -> Option<u32> {
        self.tokens.iter().copied().max()
    }
}
