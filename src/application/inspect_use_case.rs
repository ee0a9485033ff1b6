// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Classifies one sequence with a trained checkpoint and hands
// back the prediction with its per-hop attention. Input is
// either raw token ids or text encoded by the tokenizer stored
// alongside the checkpoint.

use anyhow::{anyhow, bail, Context, Result};
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};

use crate::application::train_use_case::DeviceKind;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::{Inferencer, Prediction};

#[derive(Debug, Clone)]
pub enum InspectInput {
    Tokens(Vec<u32>),
    Text(String),
}

pub struct InspectUseCase {
    checkpoint_dir: String,
    device:         DeviceKind,
}

impl InspectUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, device: DeviceKind) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), device }
    }

    /// Returns the token ids actually fed to the model with the prediction.
    pub fn execute(&self, input: InspectInput, trace_shapes: bool) -> Result<(Vec<u32>, Prediction)> {
        let tokens = self.resolve_tokens(input)?;
        let ckpt   = CheckpointManager::new(&self.checkpoint_dir);

        let prediction = match self.device {
            DeviceKind::Cpu => Inferencer::<NdArray>::from_checkpoint(&ckpt, NdArrayDevice::default())?
                .classify(&tokens, trace_shapes)?,
            DeviceKind::Gpu => Inferencer::<Wgpu>::from_checkpoint(&ckpt, WgpuDevice::default())?
                .classify(&tokens, trace_shapes)?,
        };
        Ok((tokens, prediction))
    }

    fn resolve_tokens(&self, input: InspectInput) -> Result<Vec<u32>> {
        match input {
            InspectInput::Tokens(tokens) => Ok(tokens),
            InspectInput::Text(text) => {
                let store = TokenizerStore::new(&self.checkpoint_dir);
                if !store.exists() {
                    bail!(
                        "no tokenizer stored in '{}'; pass --tokens or train with --tokenizer",
                        self.checkpoint_dir
                    );
                }
                let encoding = store
                    .load()?
                    .encode(text.as_str(), false)
                    .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
                Ok(encoding.get_ids().to_vec())
            }
        }
    }
}

/// Parse "3, 17,4" into token ids.
pub fn parse_token_list(s: &str) -> Result<Vec<u32>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u32>().with_context(|| format!("invalid token id '{t}'")))
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list() {
        assert_eq!(parse_token_list("3, 17,4").unwrap(), vec![3, 17, 4]);
        assert_eq!(parse_token_list("5,").unwrap(), vec![5]);
        assert!(parse_token_list("1,x").is_err());
        assert!(parse_token_list("-2").is_err());
    }

    #[test]
    fn test_text_without_stored_tokenizer_fails() {
        let uc = InspectUseCase::new("/definitely/not/a/checkpoint", DeviceKind::Cpu);
        assert!(uc.execute(InspectInput::Text("hello".into()), false).is_err());
    }
}
