//! # Scoring Engine
//! Pure, testable logic that maps `(entity, segments, weights, signals)` to a
//! bounded score and decision. No I/O and no suspension points.
//!
//! Policy: weighted sum of three factor scores, shifted by a popularity
//! adjustment and a deterministic per-entity offset, clamped to
//! `[SCORE_MIN, SCORE_MAX]` and bucketed into BUY / HOLD / WAIT.

pub mod adjust;
pub mod factors;

use crate::decision::{
    Confidence, Decision, FactorScore, Provenance, TimingResult, SCORE_MAX, SCORE_MIN,
};
use crate::entity::EntityKey;
use crate::report;
use crate::segment::SegmentSet;
use crate::signal::{SignalKind, SignalSet};
use crate::weights::WeightVector;
use std::collections::BTreeMap;

pub use adjust::{entity_adjustment, popularity_adjustment, popularity_estimate};
pub use factors::{macro_factor, schedule_factor, trend_factor};

/// Everything the formatter needs, before reason ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub entity: EntityKey,
    pub segments: SegmentSet,
    pub weights: WeightVector,
    pub factors: BTreeMap<SignalKind, (FactorScore, Provenance)>,
    pub base_score: f64,
    pub popularity: f64,
    pub popularity_label: &'static str,
    pub popularity_adjustment: f64,
    pub entity_adjustment: i32,
    pub final_score: f64,
    pub decision: Decision,
    pub confidence: Confidence,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Compute the full score card.
pub fn compute(
    key: &EntityKey,
    segments: &SegmentSet,
    weights: &WeightVector,
    signals: &SignalSet,
) -> ScoreCard {
    // 1) Factor scores
    let mut factors = BTreeMap::new();
    factors.insert(
        SignalKind::Macro,
        (
            macro_factor(&signals.macro_signal, segments),
            Provenance::from(&signals.macro_signal),
        ),
    );
    factors.insert(
        SignalKind::Trend,
        (
            trend_factor(&signals.trend, segments),
            Provenance::from(&signals.trend),
        ),
    );
    factors.insert(
        SignalKind::Schedule,
        (
            schedule_factor(&signals.schedule, key, segments),
            Provenance::from(&signals.schedule),
        ),
    );

    // 2) Weighted base
    let base: f64 = factors
        .iter()
        .map(|(kind, (fs, _))| fs.value * weights.get(*kind))
        .sum();

    // 3) Adjustments
    let (popularity, popularity_label) = popularity_estimate(key, segments);
    let pop_adj = popularity_adjustment(popularity);
    let ent_adj = entity_adjustment(key);

    // 4) Clamp + bucket
    let raw = base + pop_adj + f64::from(ent_adj);
    let final_score = round1(if raw.is_nan() {
        SCORE_MIN
    } else {
        raw.clamp(SCORE_MIN, SCORE_MAX)
    });
    let decision = Decision::from_score(final_score);
    let confidence = Confidence::from_fallback_count(signals.fallback_count());

    ScoreCard {
        entity: key.clone(),
        segments: segments.clone(),
        weights: *weights,
        factors,
        base_score: round1(base),
        popularity,
        popularity_label,
        popularity_adjustment: pop_adj,
        entity_adjustment: ent_adj,
        final_score,
        decision,
        confidence,
    }
}

/// Score and format without provider notes.
pub fn score(
    key: &EntityKey,
    segments: &SegmentSet,
    weights: &WeightVector,
    signals: &SignalSet,
) -> TimingResult {
    report::format(&compute(key, segments, weights, signals), &[])
}
