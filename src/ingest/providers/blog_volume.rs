// src/ingest/providers/blog_volume.rs
//! Alternate trend estimate from the blog search hit count.
//!
//! Coarser than DataLab: the total number of blog posts about the model as
//! a used car is bucketed into a presumed interest ratio.

use super::{http_client, read_body, NaverCredentials};
use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{RawSignal, SignalPayload, TrendSnapshot};
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://openapi.naver.com/v1/search/blog.json";

#[derive(Debug, Deserialize)]
struct BlogSearchResponse {
    total: u64,
}

/// Hit count → presumed interest ratio.
pub fn estimate_from_total(total: u64) -> TrendSnapshot {
    let ratio = if total > 10_000 {
        1.3
    } else if total > 5_000 {
        1.0
    } else {
        0.8
    };
    TrendSnapshot {
        change_pct: (ratio - 1.0) * 100.0,
        ratio: Some(ratio),
    }
}

pub fn parse_total(body: &str) -> Result<u64, SignalError> {
    serde_json::from_str::<BlogSearchResponse>(body)
        .map(|r| r.total)
        .map_err(|e| SignalError::unavailable(format!("blog search: malformed body ({e})")))
}

#[derive(Debug, Clone)]
pub struct BlogVolumeTrendProvider {
    http: reqwest::Client,
    creds: NaverCredentials,
    url: String,
}

impl BlogVolumeTrendProvider {
    pub fn new(creds: NaverCredentials, url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            creds,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl SignalProvider for BlogVolumeTrendProvider {
    async fn fetch(&self, key: &EntityKey, timeout: Duration) -> Result<RawSignal, SignalError> {
        let (id, secret) = self.creds.pair()?;
        if key.model.is_empty() {
            return Err(SignalError::unavailable("empty model name"));
        }
        let query = format!("{} 중고차", key.model);

        let resp = self
            .http
            .get(&self.url)
            .header("X-Naver-Client-Id", id)
            .header("X-Naver-Client-Secret", secret)
            .query(&[("query", query.as_str()), ("display", "10"), ("sort", "date")])
            .timeout(timeout)
            .send()
            .await?;
        let total = parse_total(&read_body(resp).await?)?;

        let samples = u32::try_from(total).unwrap_or(u32::MAX);
        Ok(
            RawSignal::observed(SignalPayload::Trend(estimate_from_total(total)), samples)
                .collected_at(Utc::now()),
        )
    }

    fn name(&self) -> &'static str {
        "naver-blog-volume"
    }
}
