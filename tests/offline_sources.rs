// tests/offline_sources.rs
// File-backed providers against the fixtures in tests/fixtures.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use vehicle_timing::ingest::providers::{
    CalendarScheduleProvider, ReferenceMacroProvider, ReferenceTrendProvider,
};
use vehicle_timing::ingest::{ProviderChain, QualityGate, SignalProvider};
use vehicle_timing::{EntityKey, GatedChain, SignalKind, TimingConfig, TimingEngine};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn calendar() -> CalendarScheduleProvider {
    CalendarScheduleProvider::load(&fixture("release_calendar.csv"))
        .unwrap()
        .with_today(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
}

#[test]
fn calendar_fixture_skips_malformed_rows() {
    let cal = calendar();
    assert_eq!(cal.len(), 5);

    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let up = cal.upcoming_for(&EntityKey::new("현대", "그랜저", "가솔린"), today);
    let days: Vec<i64> = up.iter().map(|r| r.days_until).collect();
    assert_eq!(days, vec![79, 243]);
    assert_eq!(up[0].kind, "풀체인지");

    // nothing after the last row
    let later = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
    assert!(cal.upcoming_for(&EntityKey::new("현대", "그랜저", "가솔린"), later).is_empty());
}

async fn schedule_score(key: &EntityKey) -> (f64, Vec<String>) {
    let schedule = GatedChain::new(
        ProviderChain::new(SignalKind::Schedule, Duration::from_millis(200)).with(calendar()),
        QualityGate::min_samples(1),
    );
    let empty = |kind| GatedChain::new(ProviderChain::new(kind, Duration::from_millis(50)), QualityGate::default());
    let engine = TimingEngine::new(empty(SignalKind::Macro), empty(SignalKind::Trend), schedule);
    let r = engine.evaluate(key).await;
    let b = &r.breakdown[&SignalKind::Schedule];
    assert!(!b.provenance.is_fallback);
    (b.score.value, b.score.reasons.clone())
}

#[tokio::test]
async fn successor_bands_depend_on_segment() {
    // standard bands: 79 days → 55
    let (v, reasons) = schedule_score(&EntityKey::new("현대", "그랜저", "가솔린")).await;
    assert_eq!(v, 55.0);
    assert_eq!(reasons, vec!["현대 그랜저 (8세대) 풀체인지 in 79 days".to_string()]);

    // luxury, strict bands: 109 days → 60
    let (v, _) = schedule_score(&EntityKey::new("제네시스", "G90", "가솔린")).await;
    assert_eq!(v, 60.0);

    // electric, strict bands: 45 days → 30
    let (v, _) = schedule_score(&EntityKey::new("테슬라", "모델3", "전기")).await;
    assert_eq!(v, 30.0);

    // populated calendar, nothing for this model
    let (v, reasons) = schedule_score(&EntityKey::new("쉐보레", "트랙스", "가솔린")).await;
    assert_eq!(v, 75.0);
    assert_eq!(reasons, vec!["no upcoming releases announced".to_string()]);
}

#[tokio::test]
async fn reference_datasets_serve_as_offline_sources() {
    let key = EntityKey::new("현대", "그랜저 하이브리드", "하이브리드");

    let m = ReferenceMacroProvider::load(&fixture("macro_reference.toml")).unwrap();
    let sig = m.fetch(&key, Duration::from_secs(1)).await.unwrap();
    assert_eq!(sig.sample_count, 3);
    assert!(sig.collected_at.is_some());

    let t = ReferenceTrendProvider::load(&fixture("trend_reference.json")).unwrap();
    let sig = t.fetch(&key, Duration::from_secs(1)).await.unwrap();
    assert_eq!(sig.as_trend().map(|s| s.change_pct), Some(-8.5));
    assert_eq!(sig.sample_count, 1200);

    assert!(t
        .fetch(&EntityKey::new("기아", "모닝", "가솔린"), Duration::from_secs(1))
        .await
        .is_err());
}

#[tokio::test]
async fn offline_config_wires_reference_chains() {
    let mut cfg = TimingConfig::default();
    cfg.offline = true;
    cfg.cache_ttl_secs = 0;
    cfg.paths.calendar = fixture("release_calendar.csv");
    cfg.paths.macro_reference = fixture("macro_reference.toml");
    cfg.paths.trend_reference = fixture("trend_reference.json");

    let engine = TimingEngine::from_config(&cfg);
    let r = engine.evaluate(&EntityKey::new("현대", "그랜저", "가솔린")).await;

    let macro_b = &r.breakdown[&SignalKind::Macro];
    assert_eq!(macro_b.provenance.source_name, "reference-macro");
    // rate 2.75 → 25, fx 1410 (domestic) → 20, oil 72 stable → 15
    assert_eq!(macro_b.score.value, 60.0);

    let trend_b = &r.breakdown[&SignalKind::Trend];
    assert_eq!(trend_b.provenance.source_name, "reference-trend");
    assert_eq!(trend_b.score.value, 80.0);

    assert_eq!(r.breakdown[&SignalKind::Schedule].provenance.source_name, "calendar");
    assert_eq!(r.fallback_count(), 0);
}

#[tokio::test]
async fn missing_calendar_file_falls_through_to_embedded() {
    let mut cfg = TimingConfig::default();
    cfg.offline = true;
    cfg.paths.calendar = fixture("does_not_exist.csv");
    cfg.paths.macro_reference = fixture("macro_reference.toml");
    cfg.paths.trend_reference = fixture("trend_reference.json");

    let r = TimingEngine::from_config(&cfg)
        .evaluate(&EntityKey::new("현대", "그랜저", "가솔린"))
        .await;
    assert_eq!(r.breakdown[&SignalKind::Schedule].provenance.source_name, "seed-calendar");
    assert!(r
        .reason_messages()
        .any(|m| m.starts_with("schedule: calendar skipped, insufficient sample")));
}
