// src/ingest/quality.rs
//! Quality gate applied to every successful provider response.

use crate::ingest::error::SignalError;
use crate::signal::RawSignal;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Minimum sample count, optionally a maximum data age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityGate {
    pub min_samples: u32,
    /// Signals older than this are rejected; `None` accepts any age.
    pub max_age_days: Option<i64>,
}

impl QualityGate {
    pub const fn min_samples(n: u32) -> Self {
        Self {
            min_samples: n,
            max_age_days: None,
        }
    }

    pub const fn accept_all() -> Self {
        Self::min_samples(0)
    }

    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = Some(days);
        self
    }

    pub fn check(&self, signal: &RawSignal) -> Result<(), SignalError> {
        self.check_at(signal, Utc::now())
    }

    pub fn check_at(&self, signal: &RawSignal, now: DateTime<Utc>) -> Result<(), SignalError> {
        if signal.sample_count < self.min_samples {
            return Err(SignalError::InsufficientSample {
                got: signal.sample_count,
                need: self.min_samples,
            });
        }
        if let (Some(max_days), Some(at)) = (self.max_age_days, signal.collected_at) {
            let age = now.signed_duration_since(at);
            if age > ChronoDuration::days(max_days) {
                return Err(SignalError::unavailable(format!(
                    "stale data ({} days old, max {max_days})",
                    age.num_days()
                )));
            }
        }
        Ok(())
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::min_samples(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{SignalPayload, TrendSnapshot};
    use chrono::TimeZone;

    fn mk(samples: u32) -> RawSignal {
        RawSignal::observed(SignalPayload::Trend(TrendSnapshot::default()), samples)
    }

    #[test]
    fn rejects_thin_samples() {
        let g = QualityGate::min_samples(5);
        assert_eq!(
            g.check(&mk(4)),
            Err(SignalError::InsufficientSample { got: 4, need: 5 })
        );
        assert!(g.check(&mk(5)).is_ok());
    }

    #[test]
    fn rejects_stale_when_configured() {
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let old = mk(10).collected_at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert!(QualityGate::min_samples(1).check_at(&old, now).is_ok());
        let g = QualityGate::min_samples(1).with_max_age_days(90);
        assert!(matches!(
            g.check_at(&old, now),
            Err(SignalError::ProviderUnavailable(_))
        ));
        // undated signals are not age-checked
        assert!(g.check_at(&mk(10), now).is_ok());
    }
}
