// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math, no printing,
// no direct file formats. Each use case wires the data, ml and
// infra layers together for one command.

// The training workflow
pub mod train_use_case;

// Single-sequence classification with attention readout
pub mod inspect_use_case;
