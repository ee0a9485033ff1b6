// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by the data, ml and application
// layers. No Burn types and no file I/O in here.

/// A token id sequence with its class label
pub mod labeled_sequence;

/// Abstractions implemented by other layers
pub mod traits;
