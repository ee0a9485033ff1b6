// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn modelling code lives here:
//
//   model.rs      — embedding, stacked BiLSTM, multi-hop
//                   self-attention pooling, fc + pred head
//   loss.rs       — Frobenius norm, attention redundancy
//                   penalty, cross entropy composition
//   trainer.rs    — train step, validation, epoch loop
//   inferencer.rs — single-sequence classification from a
//                   checkpoint with attention readout

/// Self-attentive BiLSTM classifier
pub mod model;

/// Loss and attention penalty
pub mod loss;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference from a saved checkpoint
pub mod inferencer;
