// src/ingest/mod.rs
pub mod cache;
pub mod error;
pub mod providers;
pub mod quality;
pub mod resolver;
pub mod types;

pub use cache::SignalCache;
pub use error::SignalError;
pub use quality::QualityGate;
pub use resolver::{resolve, Attempt, AttemptOutcome, Resolution};
pub use types::{ProviderChain, SharedProvider, SignalProvider};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "timing_provider_attempts_total",
            "Provider calls by signal, provider and outcome."
        );
        describe_counter!(
            "timing_signal_fallback_total",
            "Signals resolved to the neutral default."
        );
        describe_counter!("timing_cache_hits_total", "Signals served from the TTL cache.");
        describe_counter!(
            "timing_evaluations_total",
            "Completed evaluations by decision."
        );
        describe_histogram!(
            "timing_provider_latency_ms",
            "Provider call latency in milliseconds."
        );
    });
}
