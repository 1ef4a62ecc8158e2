// src/ingest/providers/datalab.rs
//! Naver DataLab search-trend provider.
//!
//! Requests weekly search ratios for the model over the last 60 days and
//! compares the mean of the last four weeks with the four weeks before.

use super::{http_client, read_body, NaverCredentials};
use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{RawSignal, SignalPayload, TrendSnapshot};
use chrono::{Days, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://openapi.naver.com/v1/datalab/search";
/// Two comparison windows of four weeks each.
pub const MIN_POINTS: usize = 8;
const WINDOW: usize = 4;
const LOOKBACK_DAYS: u64 = 60;

#[derive(Debug, Deserialize)]
struct DataLabResponse {
    #[serde(default)]
    results: Vec<DataLabGroup>,
}

#[derive(Debug, Deserialize)]
struct DataLabGroup {
    #[serde(default)]
    data: Vec<DataLabPoint>,
}

#[derive(Debug, Deserialize)]
struct DataLabPoint {
    ratio: f64,
}

/// Parse a DataLab body into `(trend, point_count)`.
pub fn parse_trend(body: &str) -> Result<(TrendSnapshot, u32), SignalError> {
    let parsed: DataLabResponse = serde_json::from_str(body)
        .map_err(|e| SignalError::unavailable(format!("datalab: malformed body ({e})")))?;

    let points: Vec<f64> = parsed
        .results
        .into_iter()
        .next()
        .map(|g| g.data.into_iter().map(|p| p.ratio).collect())
        .unwrap_or_default();

    if points.len() < MIN_POINTS {
        return Err(SignalError::InsufficientSample {
            got: points.len() as u32,
            need: MIN_POINTS as u32,
        });
    }

    let n = points.len();
    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let recent = mean(&points[n - WINDOW..]);
    let previous = mean(&points[n - 2 * WINDOW..n - WINDOW]);
    let ratio = if previous > 0.0 { recent / previous } else { 1.0 };

    Ok((
        TrendSnapshot {
            change_pct: (ratio - 1.0) * 100.0,
            ratio: Some(ratio),
        },
        n as u32,
    ))
}

#[derive(Debug, Clone)]
pub struct DataLabTrendProvider {
    http: reqwest::Client,
    creds: NaverCredentials,
    url: String,
}

impl DataLabTrendProvider {
    pub fn new(creds: NaverCredentials, url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            creds,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl SignalProvider for DataLabTrendProvider {
    async fn fetch(&self, key: &EntityKey, timeout: Duration) -> Result<RawSignal, SignalError> {
        let (id, secret) = self.creds.pair()?;
        if key.model.is_empty() {
            return Err(SignalError::unavailable("empty model name"));
        }

        let end = Utc::now().date_naive();
        let start = end.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(end);
        let body = json!({
            "startDate": start.format("%Y-%m-%d").to_string(),
            "endDate": end.format("%Y-%m-%d").to_string(),
            "timeUnit": "week",
            "keywordGroups": [{ "groupName": key.model, "keywords": [key.model] }],
        });

        let resp = self
            .http
            .post(&self.url)
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .json(&body)
            .timeout(timeout)
            .send()
            .await?;
        let text = read_body(resp).await?;
        let (trend, n) = parse_trend(&text)?;

        Ok(RawSignal::observed(SignalPayload::Trend(trend), n).collected_at(Utc::now()))
    }

    fn name(&self) -> &'static str {
        "naver-datalab"
    }
}
