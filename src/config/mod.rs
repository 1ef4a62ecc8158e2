// src/config/mod.rs
pub mod timing;

pub use timing::{ChainConfig, TimingConfig};
