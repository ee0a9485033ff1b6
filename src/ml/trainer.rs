// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Every batch starts from a fresh zero BiLSTM state, runs the
// forward pass, and optimises cross entropy plus (optionally)
// the attention penalty with Adam.
//
//   - Training runs on Autodiff<NdArray> or Autodiff<Wgpu>
//   - model.valid() drops autodiff (and therefore dropout)
//     for validation on the inner backend
//   - argmax(1) returns [batch, 1]; reshape before .equal()

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::data::{
    batcher::{SequenceBatch, SequenceBatcher},
    dataset::SequenceDataset,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::loss::loss_with_breakdown;
use crate::ml::model::{SelfAttentionClassifier, SelfAttentionConfig};

#[derive(Debug, Clone, Copy)]
pub struct StepStats {
    /// Total loss (cross entropy + penalty)
    pub loss:    f64,
    /// Scaled attention penalty, 0 when disabled
    pub penalty: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub loss:     f64,
    pub accuracy: f64,
    pub penalty:  f64,
    pub samples:  usize,
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs:           usize,
    pub final_train_loss: f64,
    pub best_epoch:       Option<usize>,
    pub best_val_loss:    f64,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: SequenceDataset,
    val_dataset:   SequenceDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<TrainingSummary> {
    match cfg.device {
        DeviceKind::Cpu => {
            let device = NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<Autodiff<NdArray>>(cfg, train_dataset, val_dataset, ckpt_manager, device)
        }
        DeviceKind::Gpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(cfg, train_dataset, val_dataset, ckpt_manager, device)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: SequenceDataset,
    val_dataset:   SequenceDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<TrainingSummary> {
    let model_cfg = cfg.model_config();
    let mut model: SelfAttentionClassifier<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} BiLSTM layer(s), hidden={}, hops={}, penalize={}",
        model_cfg.nb_layers,
        model_cfg.hidden_dim,
        model_cfg.nb_hops,
        model_cfg.penalize,
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();
    let metrics   = MetricsLogger::new(ckpt_manager.dir())?;

    let batcher = SequenceBatcher::new(cfg.max_seq_len);
    let train_loader = DataLoaderBuilder::<B, _, _>::new(batcher.clone())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .set_device(device.clone())
        .build(train_dataset);
    let val_loader = DataLoaderBuilder::<B::InnerBackend, _, _>::new(batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .set_device(device.clone())
        .build(val_dataset);

    let mut summary = TrainingSummary {
        epochs:           0,
        final_train_loss: f64::NAN,
        best_epoch:       None,
        best_val_loss:    f64::INFINITY,
    };

    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let (next, stats) = train_step(model, &mut optim, batch, &model_cfg, cfg.lr);
            model     = next;
            loss_sum += stats.loss;
            batches  += 1;
        }

        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        let eval = evaluate(&model.valid(), val_loader.iter(), &model_cfg);

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.1}% | penalty={:.4}",
            epoch, cfg.epochs, train_loss, eval.loss, eval.accuracy * 100.0, eval.penalty,
        );

        let row = EpochMetrics {
            epoch,
            train_loss,
            val_loss: eval.loss,
            val_acc:  eval.accuracy,
            penalty:  eval.penalty,
        };
        metrics.log(&row)?;
        if row.is_improvement(summary.best_val_loss) {
            summary.best_val_loss = row.val_loss;
            summary.best_epoch    = Some(epoch);
            tracing::info!("New best validation loss {:.4} at epoch {}", row.val_loss, epoch);
        }

        ckpt_manager.save_model(&model, epoch)?;
        summary.epochs           = epoch;
        summary.final_train_loss = train_loss;
    }

    tracing::info!("Training complete!");
    Ok(summary)
}

/// One optimisation step on a single batch.
pub fn train_step<B, O>(
    model:     SelfAttentionClassifier<B>,
    optim:     &mut O,
    batch:     SequenceBatch<B>,
    model_cfg: &SelfAttentionConfig,
    lr:        f64,
) -> (SelfAttentionClassifier<B>, StepStats)
where
    B: AutodiffBackend,
    O: Optimizer<SelfAttentionClassifier<B>, B>,
{
    let [batch_size, _] = batch.tokens.dims();
    let output = model.forward(batch.tokens, model.init_hidden(batch_size));
    let losses = loss_with_breakdown(output.logits, batch.labels, output.attention, model_cfg);

    let stats = StepStats {
        loss:    losses.total.clone().into_scalar().elem::<f64>(),
        penalty: losses
            .penalty
            .map(|p| p.into_scalar().elem::<f64>())
            .unwrap_or(0.0),
    };

    let grads = losses.total.backward();
    let grads = GradientsParams::from_grads(grads, &model);
    (optim.step(lr, model, grads), stats)
}

/// Mean loss, accuracy and penalty over `batches`. NaN loss when
/// there are no batches.
pub fn evaluate<B: Backend>(
    model:     &SelfAttentionClassifier<B>,
    batches:   impl Iterator<Item = SequenceBatch<B>>,
    model_cfg: &SelfAttentionConfig,
) -> Evaluation {
    let mut loss_sum    = 0.0f64;
    let mut penalty_sum = 0.0f64;
    let mut n_batches   = 0usize;
    let mut correct     = 0usize;
    let mut total       = 0usize;

    for batch in batches {
        let [batch_size, _] = batch.tokens.dims();
        let output = model.forward(batch.tokens, model.init_hidden(batch_size));

        let predicted = output.logits.clone().argmax(1).reshape([batch_size]);
        let hits: i64 = predicted
            .equal(batch.labels.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        let losses = loss_with_breakdown(output.logits, batch.labels, output.attention, model_cfg);
        loss_sum    += losses.total.into_scalar().elem::<f64>();
        penalty_sum += losses.penalty.map(|p| p.into_scalar().elem::<f64>()).unwrap_or(0.0);
        n_batches   += 1;
        correct     += hits as usize;
        total       += batch_size;
    }

    if n_batches == 0 {
        return Evaluation { loss: f64::NAN, accuracy: 0.0, penalty: 0.0, samples: 0 };
    }
    Evaluation {
        loss:     loss_sum / n_batches as f64,
        accuracy: correct as f64 / total as f64,
        penalty:  penalty_sum / n_batches as f64,
        samples:  total,
    }
}
