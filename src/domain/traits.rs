// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer only talks to `SequenceSource`, so a
// different corpus format needs a new loader and nothing else.

use anyhow::Result;

use crate::domain::labeled_sequence::LabeledSequence;

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce labelled token sequences.
///
/// Implementations:
///   - JsonlLoader → one JSON record per line
pub trait SequenceSource {
    fn load_all(&self) -> Result<Vec<LabeledSequence>>;
}
