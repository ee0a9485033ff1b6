#![recursion_limit = "256"]

//! BiLSTM sequence classifier with structured multi-hop self-attention
//! and the Frobenius redundancy penalty (Lin et al., 2017), on Burn.
//!
//! Layers, outermost first: `cli` → `application` → `data` / `ml` → `infra`,
//! with `domain` holding the plain types they share.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
