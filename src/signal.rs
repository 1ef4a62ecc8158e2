//! # Signals
//!
//! Raw market signals as returned by providers, before scoring. Three kinds
//! exist (macro indicators, search-interest trend, release schedule); each
//! `RawSignal` carries its payload plus the provenance the formatter reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal kind. Doubles as the factor name in score breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Macro,
    Trend,
    Schedule,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Macro, SignalKind::Trend, SignalKind::Schedule];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Macro => "macro",
            SignalKind::Trend => "trend",
            SignalKind::Schedule => "schedule",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-term direction of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Stable,
}

impl Direction {
    /// Classify a relative move (in percent) against a symmetric threshold.
    pub fn from_change_pct(change_pct: f64, threshold_pct: f64) -> Self {
        if change_pct > threshold_pct {
            Direction::Up
        } else if change_pct < -threshold_pct {
            Direction::Down
        } else {
            Direction::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub value: f64,
    #[serde(default)]
    pub trend: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl Indicator {
    pub fn new(value: f64, trend: Direction) -> Self {
        Self {
            value,
            trend,
            as_of: None,
        }
    }
}

/// Interest rate (%), KRW/USD exchange rate and WTI crude (USD/bbl).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
    #[serde(default)]
    pub interest_rate: Option<Indicator>,
    #[serde(default)]
    pub exchange_rate: Option<Indicator>,
    #[serde(default)]
    pub oil_price: Option<Indicator>,
}

impl MacroSnapshot {
    /// Number of indicators present; used as the sample count.
    pub fn indicator_count(&self) -> u32 {
        [&self.interest_rate, &self.exchange_rate, &self.oil_price]
            .iter()
            .filter(|i| i.is_some())
            .count() as u32
    }
}

/// Search-interest movement for a model, in percent over the comparison window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub change_pct: f64,
    /// Recent/previous interest ratio, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub brand: String,
    pub model: String,
    /// Calendar type column ("신차", "페이스리프트", "풀체인지", ...).
    #[serde(default)]
    pub kind: String,
    pub release_date: NaiveDate,
    pub days_until: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub upcoming: Vec<Release>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalPayload {
    Macro(MacroSnapshot),
    Trend(TrendSnapshot),
    Schedule(ScheduleSnapshot),
}

impl SignalPayload {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalPayload::Macro(_) => SignalKind::Macro,
            SignalPayload::Trend(_) => SignalKind::Trend,
            SignalPayload::Schedule(_) => SignalKind::Schedule,
        }
    }

    /// Empty payload of the given kind.
    pub fn neutral(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Macro => SignalPayload::Macro(MacroSnapshot::default()),
            SignalKind::Trend => SignalPayload::Trend(TrendSnapshot::default()),
            SignalKind::Schedule => SignalPayload::Schedule(ScheduleSnapshot::default()),
        }
    }
}

pub const DEFAULT_SOURCE: &str = "default";

/// One resolved signal plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub payload: SignalPayload,
    pub source_name: String,
    pub sample_count: u32,
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<DateTime<Utc>>,
}

impl RawSignal {
    /// Signal as produced by a provider. The resolver sets `source_name`.
    pub fn observed(payload: SignalPayload, sample_count: u32) -> Self {
        Self {
            payload,
            source_name: String::new(),
            sample_count,
            is_fallback: false,
            collected_at: None,
        }
    }

    pub fn collected_at(mut self, at: DateTime<Utc>) -> Self {
        self.collected_at = Some(at);
        self
    }

    /// Neutral default used when a chain is exhausted.
    /// Carries no timestamp so identical failures render identically.
    pub fn neutral(kind: SignalKind) -> Self {
        Self {
            payload: SignalPayload::neutral(kind),
            source_name: DEFAULT_SOURCE.to_string(),
            sample_count: 0,
            is_fallback: true,
            collected_at: None,
        }
    }

    pub fn kind(&self) -> SignalKind {
        self.payload.kind()
    }

    pub fn as_macro(&self) -> Option<&MacroSnapshot> {
        match &self.payload {
            SignalPayload::Macro(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_trend(&self) -> Option<&TrendSnapshot> {
        match &self.payload {
            SignalPayload::Trend(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_schedule(&self) -> Option<&ScheduleSnapshot> {
        match &self.payload {
            SignalPayload::Schedule(s) => Some(s),
            _ => None,
        }
    }
}

/// The three resolved signals of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub macro_signal: RawSignal,
    pub trend: RawSignal,
    pub schedule: RawSignal,
}

impl SignalSet {
    pub fn get(&self, kind: SignalKind) -> &RawSignal {
        match kind {
            SignalKind::Macro => &self.macro_signal,
            SignalKind::Trend => &self.trend,
            SignalKind::Schedule => &self.schedule,
        }
    }

    pub fn fallback_count(&self) -> usize {
        SignalKind::ALL
            .iter()
            .filter(|k| self.get(**k).is_fallback)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_signal_is_fallback_with_zero_samples() {
        for kind in SignalKind::ALL {
            let s = RawSignal::neutral(kind);
            assert!(s.is_fallback);
            assert_eq!(s.sample_count, 0);
            assert_eq!(s.source_name, "default");
            assert_eq!(s.kind(), kind);
            assert!(s.collected_at.is_none());
        }
    }

    #[test]
    fn direction_thresholds_are_symmetric() {
        assert_eq!(Direction::from_change_pct(2.5, 2.0), Direction::Up);
        assert_eq!(Direction::from_change_pct(-2.5, 2.0), Direction::Down);
        assert_eq!(Direction::from_change_pct(2.0, 2.0), Direction::Stable);
    }

    #[test]
    fn macro_indicator_count() {
        let m = MacroSnapshot {
            interest_rate: Some(Indicator::new(3.5, Direction::Stable)),
            exchange_rate: None,
            oil_price: Some(Indicator::new(70.0, Direction::Up)),
        };
        assert_eq!(m.indicator_count(), 2);
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let p = SignalPayload::Trend(TrendSnapshot {
            change_pct: 5.2,
            ratio: None,
        });
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["kind"], "trend");
        assert_eq!(v["change_pct"], 5.2);
    }
}
