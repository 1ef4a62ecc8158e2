// src/ingest/providers/reference_macro.rs
//! Last known macro indicators from a static TOML snapshot.
//!
//! ```toml
//! as_of = "2025-01-15"
//!
//! [interest_rate]
//! value = 3.0
//! trend = "down"
//! ```

use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{MacroSnapshot, RawSignal, SignalPayload};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    as_of: Option<NaiveDate>,
    #[serde(flatten)]
    snapshot: MacroSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceMacroProvider {
    snapshot: MacroSnapshot,
    as_of: Option<NaiveDate>,
}

impl ReferenceMacroProvider {
    pub fn new(snapshot: MacroSnapshot, as_of: Option<NaiveDate>) -> Self {
        Self { snapshot, as_of }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let f: SnapshotFile = toml::from_str(s).context("parsing macro reference snapshot")?;
        Ok(Self::new(f.snapshot, f.as_of))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading macro reference from {}", path.display()))?;
        Self::from_toml_str(&s)
    }

    /// Missing or malformed files yield an empty snapshot, which the
    /// provider reports as unavailable.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "macro reference snapshot not loaded");
            Self::default()
        })
    }
}

#[async_trait::async_trait]
impl SignalProvider for ReferenceMacroProvider {
    async fn fetch(&self, _key: &EntityKey, _timeout: Duration) -> Result<RawSignal, SignalError> {
        let n = self.snapshot.indicator_count();
        if n == 0 {
            return Err(SignalError::unavailable("no reference snapshot"));
        }
        let mut signal = RawSignal::observed(SignalPayload::Macro(self.snapshot.clone()), n);
        if let Some(d) = self.as_of.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            signal = signal.collected_at(d.and_utc());
        }
        Ok(signal)
    }

    fn name(&self) -> &'static str {
        "reference-macro"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Direction;

    const SNAPSHOT: &str = r#"
as_of = "2025-01-15"

[interest_rate]
value = 3.0
trend = "down"

[exchange_rate]
value = 1450.0
trend = "up"

[oil_price]
value = 72.5
"#;

    #[tokio::test]
    async fn parses_snapshot_and_serves_it() {
        let p = ReferenceMacroProvider::from_toml_str(SNAPSHOT).unwrap();
        let k = EntityKey::new("현대", "그랜저", "가솔린");
        let s = p.fetch(&k, Duration::from_millis(10)).await.unwrap();
        let m = s.as_macro().unwrap();
        assert_eq!(s.sample_count, 3);
        assert_eq!(m.interest_rate.as_ref().unwrap().trend, Direction::Down);
        assert_eq!(m.oil_price.as_ref().unwrap().trend, Direction::Stable);
        assert_eq!(s.collected_at.unwrap().date_naive(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[tokio::test]
    async fn empty_snapshot_is_unavailable() {
        let p = ReferenceMacroProvider::load_or_empty(Path::new("nope/macro.toml"));
        let k = EntityKey::new("현대", "그랜저", "가솔린");
        assert!(p.fetch(&k, Duration::from_millis(10)).await.is_err());
    }
}
