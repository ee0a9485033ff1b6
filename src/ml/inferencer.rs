// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the classifier from a checkpoint and classifies one
// token sequence at a time, returning class probabilities and
// the attention each hop puts on every position.

use anyhow::{anyhow, ensure, Result};
use burn::{
    prelude::*,
    tensor::{activation::softmax, ElementConversion},
};

use crate::infra::checkpoint::CheckpointManager;
use crate::ml::loss::penalization_term;
use crate::ml::model::{SelfAttentionClassifier, SelfAttentionConfig};

#[derive(Debug, Clone)]
pub struct Prediction {
    /// Softmax over class scores
    pub probabilities: Vec<f32>,
    pub class:         usize,
    /// attention[hop][position], each hop sums to 1
    pub attention:     Vec<Vec<f32>>,
    /// Scaled redundancy penalty of this sequence's attention
    pub penalty:       f32,
}

impl Prediction {
    /// Most attended position for every hop
    pub fn focus(&self) -> Vec<usize> {
        self.attention.iter().map(|hop| argmax(hop)).collect()
    }
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

pub struct Inferencer<B: Backend> {
    model:  SelfAttentionClassifier<B>,
    config: SelfAttentionConfig,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: SelfAttentionClassifier<B>, config: SelfAttentionConfig, device: B::Device) -> Self {
        Self { model, config, device }
    }

    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let config = ckpt_manager.load_config()?.model_config();
        let model  = ckpt_manager.load_model(config.init(&device), &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, config, device))
    }

    pub fn config(&self) -> &SelfAttentionConfig {
        &self.config
    }

    pub fn classify(&self, tokens: &[u32], trace_shapes: bool) -> Result<Prediction> {
        ensure!(!tokens.is_empty(), "cannot classify an empty sequence");
        if let Some(&max) = tokens.iter().max() {
            ensure!(
                (max as usize) < self.config.vocab_size,
                "token id {max} out of range (vocab_size = {})",
                self.config.vocab_size
            );
        }

        let seq_len = tokens.len();
        let ids: Vec<i32> = tokens.iter().map(|&t| t as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([1, seq_len]);

        let output = self
            .model
            .forward_traced(input, self.model.init_hidden(1), trace_shapes);

        let probabilities: Vec<f32> = softmax(output.logits, 1)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read class probabilities: {e:?}"))?;

        let penalty = penalization_term(output.attention.clone(), &self.config)
            .into_scalar()
            .elem::<f32>();

        // [1, seq_len, hops] row-major → per-hop rows
        let hops = self.config.nb_hops;
        let weights: Vec<f32> = output
            .attention
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read attention weights: {e:?}"))?;
        let attention = (0..hops)
            .map(|h| (0..seq_len).map(|i| weights[i * hops + h]).collect())
            .collect();

        let class = argmax(&probabilities);
        tracing::debug!("Predicted class {} (p={:.4})", class, probabilities[class]);

        Ok(Prediction { probabilities, class, attention, penalty })
    }
}
