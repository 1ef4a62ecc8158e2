// src/ingest/providers/reference_trend.rs
//! Static community/search reference dataset, the last trend source
//! before the neutral default.
//!
//! Lookup order: exact model → base model → substring either way.

use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{RawSignal, SignalPayload, TrendSnapshot};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceEntry {
    pub change_pct: f64,
    /// Posts the figure was derived from; reported as the sample count.
    #[serde(default)]
    pub total_posts: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    as_of: Option<NaiveDate>,
    #[serde(default)]
    models: BTreeMap<String, ReferenceEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTrendProvider {
    as_of: Option<NaiveDate>,
    /// Lowercased model name → entry.
    models: BTreeMap<String, ReferenceEntry>,
}

impl ReferenceTrendProvider {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let f: DatasetFile = serde_json::from_str(s).context("parsing trend reference dataset")?;
        Ok(Self {
            as_of: f.as_of,
            models: f
                .models
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading trend reference from {}", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "trend reference dataset not loaded");
            Self::default()
        })
    }

    pub fn lookup(&self, key: &EntityKey) -> Option<&ReferenceEntry> {
        let model = key.model.to_lowercase();
        let base = key.base_model().to_lowercase();
        if base.is_empty() {
            return None;
        }
        self.models
            .get(&model)
            .or_else(|| self.models.get(&base))
            .or_else(|| {
                self.models
                    .iter()
                    .find(|(k, _)| model.contains(k.as_str()) || k.contains(base.as_str()))
                    .map(|(_, v)| v)
            })
    }
}

#[async_trait::async_trait]
impl SignalProvider for ReferenceTrendProvider {
    async fn fetch(&self, key: &EntityKey, _timeout: Duration) -> Result<RawSignal, SignalError> {
        let entry = self
            .lookup(key)
            .ok_or_else(|| SignalError::unavailable(format!("no reference entry for {}", key.model)))?;

        let mut signal = RawSignal::observed(
            SignalPayload::Trend(TrendSnapshot {
                change_pct: entry.change_pct,
                ratio: None,
            }),
            entry.total_posts,
        );
        if let Some(d) = self.as_of.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            signal = signal.collected_at(d.and_utc());
        }
        Ok(signal)
    }

    fn name(&self) -> &'static str {
        "reference-trend"
    }
}
