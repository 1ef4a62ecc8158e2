// src/ingest/providers/ecos.rs
//! Bank of Korea ECOS client for the base rate (statistic 722Y001).

use super::{http_client, read_body};
use crate::ingest::error::SignalError;
use crate::signal::{Direction, Indicator};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ecos.bok.or.kr/api/StatisticSearch";
const STAT_CODE: &str = "722Y001";
const ITEM_CODE: &str = "0101000";

#[derive(Debug, Deserialize)]
struct EcosResponse {
    #[serde(rename = "StatisticSearch")]
    statistic_search: Option<EcosTable>,
    #[serde(rename = "RESULT")]
    result: Option<EcosResult>,
}

#[derive(Debug, Deserialize)]
struct EcosTable {
    #[serde(default)]
    row: Vec<EcosRow>,
}

#[derive(Debug, Deserialize)]
struct EcosRow {
    #[serde(rename = "TIME")]
    time: String,
    #[serde(rename = "DATA_VALUE")]
    data_value: String,
}

#[derive(Debug, Deserialize)]
struct EcosResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE")]
    message: String,
}

#[derive(Debug, Clone)]
pub struct BokRateClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl BokRateClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Latest monthly base rate with direction versus the previous month.
    pub async fn fetch_rate(&self, timeout: Duration) -> Result<Indicator, SignalError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SignalError::unavailable("BOK_API_KEY not set"))?;

        let today = Utc::now().date_naive();
        let start = today.checked_sub_months(Months::new(12)).unwrap_or(today);
        let url = format!(
            "{}/{key}/json/kr/1/24/{STAT_CODE}/M/{:04}{:02}/{:04}{:02}/{ITEM_CODE}",
            self.base_url,
            start.year(),
            start.month(),
            today.year(),
            today.month()
        );

        let resp = self.http.get(&url).timeout(timeout).send().await?;
        let body = read_body(resp).await?;
        parse_rate(&body)
    }
}

fn parse_period(time: &str) -> Option<NaiveDate> {
    match time.len() {
        6 => NaiveDate::parse_from_str(&format!("{time}01"), "%Y%m%d").ok(),
        8 => NaiveDate::parse_from_str(time, "%Y%m%d").ok(),
        _ => None,
    }
}

/// Parse an ECOS StatisticSearch body into the latest rate.
pub fn parse_rate(body: &str) -> Result<Indicator, SignalError> {
    let parsed: EcosResponse = serde_json::from_str(body)
        .map_err(|e| SignalError::unavailable(format!("ecos: malformed body ({e})")))?;

    if let Some(r) = parsed.result {
        return Err(SignalError::unavailable(format!(
            "ecos {}: {}",
            r.code, r.message
        )));
    }

    let mut rows: Vec<(String, f64)> = parsed
        .statistic_search
        .map(|t| t.row)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| r.data_value.trim().parse::<f64>().ok().map(|v| (r.time, v)))
        .collect();
    if rows.is_empty() {
        return Err(SignalError::InsufficientSample { got: 0, need: 1 });
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let (latest_time, latest) = rows[rows.len() - 1].clone();
    let trend = match rows.len() {
        1 => Direction::Stable,
        n => {
            let prev = rows[n - 2].1;
            if latest > prev {
                Direction::Up
            } else if latest < prev {
                Direction::Down
            } else {
                Direction::Stable
            }
        }
    };

    Ok(Indicator {
        value: latest,
        trend,
        as_of: parse_period(&latest_time),
    })
}
