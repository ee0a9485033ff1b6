// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands: `train` and `inspect`.

use clap::{Args, Subcommand};

use crate::application::train_use_case::{DeviceKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on a JSONL corpus
    Train(TrainArgs),

    /// Classify one sequence with a trained checkpoint and show its attention
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSONL file, one {"label": n, "tokens": [...]} or {"label": n, "text": "..."} per line
    #[arg(long, default_value = "data/train.jsonl")]
    pub data: String,

    /// Directory for checkpoints, config, metrics and tokenizer
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// HuggingFace tokenizer.json used to encode "text" records
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Longer sequences are truncated
    #[arg(long, default_value_t = 200)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Seed for the train/validation split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Share of the corpus used for training; the rest validates
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// cpu (NdArray) or gpu (Wgpu)
    #[arg(long, default_value = "cpu")]
    pub device: DeviceKind,

    #[arg(long, default_value_t = 20000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 100)]
    pub embedding_dim: usize,

    /// Hidden size of each LSTM direction
    #[arg(long, default_value_t = 150)]
    pub hidden_dim: usize,

    #[arg(long, default_value_t = 1)]
    pub nb_layers: usize,

    /// Width of the first attention projection
    #[arg(long, default_value_t = 100)]
    pub da: usize,

    /// Number of attention hops
    #[arg(long, default_value_t = 10)]
    pub nb_hops: usize,

    #[arg(long, default_value_t = 512)]
    pub fc_ch: usize,

    #[arg(long, default_value_t = 2)]
    pub nb_classes: usize,

    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Weight of the attention redundancy penalty
    #[arg(long, default_value_t = 1.0)]
    pub coef: f64,

    /// Train on cross entropy alone
    #[arg(long)]
    pub no_penalize: bool,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:      a.data,
            checkpoint_dir: a.checkpoint_dir,
            tokenizer_path: a.tokenizer,
            max_seq_len:    a.max_seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            seed:           a.seed,
            train_fraction: a.train_fraction,
            device:         a.device,
            vocab_size:     a.vocab_size,
            embedding_dim:  a.embedding_dim,
            hidden_dim:     a.hidden_dim,
            nb_layers:      a.nb_layers,
            da:             a.da,
            nb_hops:        a.nb_hops,
            fc_ch:          a.fc_ch,
            nb_classes:     a.nb_classes,
            dropout:        a.dropout,
            coef:           a.coef,
            penalize:       !a.no_penalize,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Comma-separated token ids, e.g. 4,18,7
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pub tokens: Option<String>,

    /// Raw text, encoded with the tokenizer stored in the checkpoint
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long, default_value = "cpu")]
    pub device: DeviceKind,

    /// Log the tensor shape after every forward stage (needs --verbose)
    #[arg(long)]
    pub trace_shapes: bool,
}
