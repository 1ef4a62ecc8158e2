// src/lib.rs
//! Purchase-timing engine: turns macro, trend and release-schedule signals
//! into a bounded 30–85 score with a BUY / HOLD / WAIT decision.

pub mod config;
pub mod decision;
pub mod engine;
pub mod entity;
pub mod ingest;
pub mod metrics;
pub mod report;
pub mod scoring;
pub mod segment;
pub mod signal;
pub mod weights;

// ---- Re-exports for stable public API ----
pub use crate::config::TimingConfig;
pub use crate::decision::{Confidence, Decision, Reason, TimingResult};
pub use crate::engine::{GatedChain, TimingEngine};
pub use crate::entity::EntityKey;
pub use crate::segment::{Segment, SegmentSet};
pub use crate::signal::{RawSignal, SignalKind, SignalPayload};
pub use crate::weights::{WeightTable, WeightVector};
