//! Domain types and the adaptive difficulty calculation for puzzle
//! training. No I/O lives here; storage and orchestration build on top.

#![forbid(unsafe_code)]

pub mod adaptive;
pub mod model;

pub use adaptive::{AdaptiveConfig, adaptive_range};
