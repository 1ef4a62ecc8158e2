// tests/metrics.rs
// One test per process: the Prometheus recorder is global.

use std::time::Duration;

use vehicle_timing::ingest::providers::FixedProvider;
use vehicle_timing::ingest::{ProviderChain, QualityGate, SignalError};
use vehicle_timing::metrics::Metrics;
use vehicle_timing::signal::TrendSnapshot;
use vehicle_timing::{EntityKey, GatedChain, SignalKind, SignalPayload, TimingEngine};

#[tokio::test]
async fn evaluation_series_show_up_in_exposition() {
    let m = Metrics::init(Duration::from_secs(8)).expect("recorder installs once");

    let trend = ProviderChain::new(SignalKind::Trend, Duration::from_millis(100))
        .with(FixedProvider::failing("flaky", SignalError::unavailable("HTTP 502")))
        .with(FixedProvider::ok(
            "steady",
            SignalPayload::Trend(TrendSnapshot {
                change_pct: 0.0,
                ratio: None,
            }),
            20,
        ));
    let empty = |kind| {
        GatedChain::new(
            ProviderChain::new(kind, Duration::from_millis(50)),
            QualityGate::default(),
        )
    };
    let engine = TimingEngine::new(
        empty(SignalKind::Macro),
        GatedChain::new(trend, QualityGate::default()),
        empty(SignalKind::Schedule),
    )
    .with_cache(Duration::from_secs(60));

    let key = EntityKey::new("현대", "쏘나타", "가솔린");
    engine.evaluate(&key).await;
    engine.evaluate(&key).await;

    let text = m.render();
    for needle in [
        "timing_provider_attempts_total",
        "timing_provider_latency_ms",
        "timing_signal_fallback_total",
        "timing_cache_hits_total",
        "timing_evaluations_total",
        "timing_request_deadline_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
    assert!(text.contains(r#"outcome="unavailable""#), "{text}");
    assert!(text.contains(r#"provider="steady""#), "{text}");
}
