// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run:
//
//   Step 1: Install tokenizer (optional)   (Layer 6 - infra)
//   Step 2: Load labelled sequences        (Layer 4 - data)
//   Step 3: Split train/validation         (Layer 4 - data)
//   Step 4: Save config                    (Layer 6 - infra)
//   Step 5: Run training loop              (Layer 5 - ml)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::data::{dataset::SequenceDataset, loader::JsonlLoader, splitter::split_train_val};
use crate::domain::traits::SequenceSource;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::SelfAttentionConfig;
use crate::ml::trainer::{run_training, TrainingSummary};

// ─── Device Selection ────────────────────────────────────────────────────────
/// `cpu` runs on Burn's NdArray backend, `gpu` on Wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Gpu,
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" | "wgpu" => Ok(Self::Gpu),
            other => Err(format!("unknown device '{other}' (expected 'cpu' or 'gpu')")),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Gpu => write!(f, "gpu"),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to the checkpoints so inference can rebuild the
// exact architecture before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:      String,
    pub checkpoint_dir: String,
    pub tokenizer_path: Option<String>,
    pub max_seq_len:    usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub seed:           u64,
    pub train_fraction: f64,
    pub device:         DeviceKind,

    pub vocab_size:     usize,
    pub embedding_dim:  usize,
    pub hidden_dim:     usize,
    pub nb_layers:      usize,
    pub da:             usize,
    pub nb_hops:        usize,
    pub fc_ch:          usize,
    pub nb_classes:     usize,
    pub dropout:        f64,
    pub coef:           f64,
    pub penalize:       bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:      "data/train.jsonl".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            tokenizer_path: None,
            max_seq_len:    200,
            batch_size:     32,
            epochs:         10,
            lr:             1e-3,
            seed:           42,
            train_fraction: 0.8,
            device:         DeviceKind::Cpu,
            vocab_size:     20000,
            embedding_dim:  100,
            hidden_dim:     150,
            nb_layers:      1,
            da:             100,
            nb_hops:        10,
            fc_ch:          512,
            nb_classes:     2,
            dropout:        0.5,
            coef:           1.0,
            penalize:       true,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> SelfAttentionConfig {
        SelfAttentionConfig::new(
            self.vocab_size, self.embedding_dim, self.hidden_dim, self.nb_layers,
            self.da, self.nb_hops, self.fc_ch, self.nb_classes,
        )
        .with_dropout(self.dropout)
        .with_coef(self.coef)
        .with_penalize(self.penalize)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        ensure!(cfg.batch_size > 0, "batch size must be positive");
        ensure!(cfg.max_seq_len > 0, "max sequence length must be positive");

        // ── Step 1: Tokenizer ────────────────────────────────────────────────
        let mut loader = JsonlLoader::new(&cfg.data_path, cfg.vocab_size, cfg.nb_classes);
        if let Some(path) = &cfg.tokenizer_path {
            let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir).install(path)?;
            loader = loader.with_tokenizer(tokenizer);
        }

        // ── Step 2: Load sequences ───────────────────────────────────────────
        tracing::info!("Loading sequences from '{}'", cfg.data_path);
        let samples = loader.load_all()?;
        ensure!(!samples.is_empty(), "no sequences found in '{}'", cfg.data_path);
        tracing::info!("Loaded {} sequences", samples.len());

        // ── Step 3: Train / validation split ─────────────────────────────────
        let (train_samples, val_samples) =
            split_train_val(samples, cfg.train_fraction, cfg.seed);
        ensure!(
            !train_samples.is_empty(),
            "training split is empty (train_fraction = {})",
            cfg.train_fraction
        );
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        let train_dataset = SequenceDataset::new(train_samples);
        let val_dataset   = SequenceDataset::new(val_samples);
        tracing::debug!("Train class counts: {:?}", train_dataset.class_counts(cfg.nb_classes));

        // ── Step 4: Save config for inference ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 5: Train ────────────────────────────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_device_kind_parsing() {
        assert_eq!("cpu".parse::<DeviceKind>().unwrap(), DeviceKind::Cpu);
        assert_eq!("GPU".parse::<DeviceKind>().unwrap(), DeviceKind::Gpu);
        assert!("tpu".parse::<DeviceKind>().is_err());
        assert_eq!(DeviceKind::Gpu.to_string(), "gpu");
    }

    #[test]
    fn test_model_config_carries_loss_settings() {
        let cfg = TrainConfig { coef: 0.3, penalize: false, nb_hops: 7, ..TrainConfig::default() };
        let model_cfg = cfg.model_config();
        assert_eq!(model_cfg.nb_hops, 7);
        assert_eq!(model_cfg.coef, 0.3);
        assert!(!model_cfg.penalize);
    }

    #[test]
    fn test_execute_trains_tiny_corpus_on_cpu() {
        let root = std::env::temp_dir().join("ssa_train_use_case");
        fs::remove_dir_all(&root).ok();
        fs::create_dir_all(&root).unwrap();

        let data = root.join("train.jsonl");
        let lines: Vec<String> = (0..12)
            .map(|i| {
                let label = i % 2;
                let tokens: Vec<u32> = (0..(3 + i % 4)).map(|t| ((t + label * 5) % 10) as u32).collect();
                serde_json::json!({ "label": label, "tokens": tokens }).to_string()
            })
            .collect();
        fs::write(&data, lines.join("\n")).unwrap();

        let cfg = TrainConfig {
            data_path:      data.to_string_lossy().into_owned(),
            checkpoint_dir: root.join("ckpt").to_string_lossy().into_owned(),
            batch_size:     4,
            epochs:         2,
            vocab_size:     10,
            embedding_dim:  4,
            hidden_dim:     3,
            da:             5,
            nb_hops:        2,
            fc_ch:          6,
            dropout:        0.0,
            coef:           0.1,
            ..TrainConfig::default()
        };

        let summary = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(summary.epochs, 2);
        assert!(summary.final_train_loss.is_finite());

        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert_eq!(ckpt.load_config().unwrap().nb_hops, 2);
    }
}
