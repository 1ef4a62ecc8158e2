//! Result shapes for one timing evaluation: decision bucket, confidence,
//! per-factor breakdown with provenance, and the reason list.
//!
//! Everything here is an immutable value; maps are `BTreeMap` so the JSON
//! form is stable for identical inputs.

use crate::entity::EntityKey;
use crate::segment::SegmentSet;
use crate::signal::{RawSignal, SignalKind};
use crate::weights::WeightVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final-score floor and ceiling.
pub const SCORE_MIN: f64 = 30.0;
pub const SCORE_MAX: f64 = 85.0;
/// Bucket thresholds (inclusive lower bounds).
pub const BUY_THRESHOLD: f64 = 70.0;
pub const HOLD_THRESHOLD: f64 = 55.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Hold,
    Wait,
}

impl Decision {
    pub fn from_score(score: f64) -> Self {
        if score >= BUY_THRESHOLD {
            Decision::Buy
        } else if score >= HOLD_THRESHOLD {
            Decision::Hold
        } else {
            Decision::Wait
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Hold => "HOLD",
            Decision::Wait => "WAIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// 0 defaulted signals → high, 1 → medium, 2+ → low.
    pub fn from_fallback_count(n: usize) -> Self {
        match n {
            0 => Confidence::High,
            1 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

/// Where a reason line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Macro,
    Trend,
    Schedule,
    Adjustment,
    Provenance,
}

impl From<SignalKind> for ReasonKind {
    fn from(k: SignalKind) -> Self {
        match k {
            SignalKind::Macro => ReasonKind::Macro,
            SignalKind::Trend => ReasonKind::Trend,
            SignalKind::Schedule => ReasonKind::Schedule,
        }
    }
}

/// Human-readable explanation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub message: String,
    /// Weight of the factor the reason belongs to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub kind: ReasonKind,
}

impl Reason {
    pub fn new(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            weight: None,
            kind,
        }
    }

    pub fn weighted(mut self, w: f64) -> Self {
        self.weight = Some(w);
        self
    }
}

/// One factor's score in `[0, 100]` with its explanation lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub value: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl FactorScore {
    pub fn new(value: f64) -> Self {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        Self {
            value,
            reasons: Vec::new(),
        }
    }

    pub fn with_reason(mut self, r: impl Into<String>) -> Self {
        self.reasons.push(r.into());
        self
    }
}

/// Which signal fed a factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_name: String,
    pub is_fallback: bool,
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl From<&RawSignal> for Provenance {
    fn from(s: &RawSignal) -> Self {
        Self {
            source_name: s.source_name.clone(),
            is_fallback: s.is_fallback,
            sample_count: s.sample_count,
            collected_at: s.collected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub score: FactorScore,
    pub weight: f64,
    /// `score.value * weight`
    pub weighted: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustments {
    pub popularity: f64,
    pub entity: i32,
}

/// Complete, explainable outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingResult {
    pub entity: EntityKey,
    pub final_score: f64,
    pub decision: Decision,
    pub confidence: Confidence,
    pub base_score: f64,
    pub adjustments: Adjustments,
    pub breakdown: BTreeMap<SignalKind, FactorBreakdown>,
    pub weights: WeightVector,
    pub segments: SegmentSet,
    #[serde(default)]
    pub reasons: Vec<Reason>,
}

impl TimingResult {
    /// Number of factors fed by a defaulted signal.
    pub fn fallback_count(&self) -> usize {
        self.breakdown
            .values()
            .filter(|b| b.provenance.is_fallback)
            .count()
    }

    pub fn reason_messages(&self) -> impl Iterator<Item = &str> {
        self.reasons.iter().map(|r| r.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_use_inclusive_lower_bounds() {
        assert_eq!(Decision::from_score(70.0), Decision::Buy);
        assert_eq!(Decision::from_score(69.9), Decision::Hold);
        assert_eq!(Decision::from_score(55.0), Decision::Hold);
        assert_eq!(Decision::from_score(54.9), Decision::Wait);
        assert_eq!(Decision::from_score(SCORE_MIN), Decision::Wait);
        assert_eq!(Decision::from_score(SCORE_MAX), Decision::Buy);
    }

    #[test]
    fn confidence_from_fallbacks() {
        assert_eq!(Confidence::from_fallback_count(0), Confidence::High);
        assert_eq!(Confidence::from_fallback_count(1), Confidence::Medium);
        assert_eq!(Confidence::from_fallback_count(2), Confidence::Low);
        assert_eq!(Confidence::from_fallback_count(3), Confidence::Low);
    }

    #[test]
    fn factor_score_is_clamped() {
        assert_eq!(FactorScore::new(140.0).value, 100.0);
        assert_eq!(FactorScore::new(-3.0).value, 0.0);
    }

    #[test]
    fn serde_shapes() {
        assert_eq!(serde_json::to_string(&Decision::Wait).unwrap(), "\"WAIT\"");
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"medium\"");
        let r = Reason::new(ReasonKind::Adjustment, "x");
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("weight").is_none());
        assert_eq!(v["kind"], "adjustment");
    }
}
