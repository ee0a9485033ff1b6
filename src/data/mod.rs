// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
//
//   JSONL file
//       │
//       ▼
//   JsonlLoader       → parses records, encodes text, checks ranges
//       │
//       ▼
//   split_train_val   → seeded shuffle + split
//       │
//       ▼
//   SequenceDataset   → Burn Dataset
//       │
//       ▼
//   SequenceBatcher   → truncate, pad, stack into tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the trainer

/// Reads labelled sequences from a JSONL file
pub mod loader;

/// Implements Burn's Dataset trait for labelled sequences
pub mod dataset;

/// Implements Burn's Batcher trait with padding
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
