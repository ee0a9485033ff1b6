// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the application and ml
// layers:
//
//   checkpoint.rs      — model weights (CompactRecorder) and
//                        the JSON run config needed to rebuild
//                        the architecture
//   tokenizer_store.rs — tokenizer.json kept with the checkpoint
//   metrics.rs         — per-epoch CSV log

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer persistence
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
