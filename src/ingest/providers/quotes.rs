// src/ingest/providers/quotes.rs
//! Daily close series from the public chart endpoint (WTI crude, KRW/USD).

use super::{http_client, read_body};
use crate::ingest::error::SignalError;
use crate::signal::{Direction, Indicator};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub const OIL_SYMBOL: &str = "CL=F";
pub const FX_SYMBOL: &str = "KRW=X";
/// Move over the window that counts as a trend, in percent.
pub const OIL_TREND_PCT: f64 = 2.0;
pub const FX_TREND_PCT: f64 = 1.0;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Close series with the timestamp of the last close.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseSeries {
    pub closes: Vec<f64>,
    pub last_ts: Option<i64>,
}

impl CloseSeries {
    /// Last close, with direction from first → last over the window.
    pub fn to_indicator(&self, threshold_pct: f64) -> Option<Indicator> {
        let first = *self.closes.first()?;
        let last = *self.closes.last()?;
        let change_pct = if first.abs() > f64::EPSILON {
            (last - first) / first * 100.0
        } else {
            0.0
        };
        Some(Indicator {
            value: last,
            trend: Direction::from_change_pct(change_pct, threshold_pct),
            as_of: self
                .last_ts
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive()),
        })
    }
}

pub fn parse_chart(body: &str) -> Result<CloseSeries, SignalError> {
    let parsed: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SignalError::unavailable(format!("quotes: malformed body ({e})")))?;

    if let Some(e) = parsed.chart.error {
        return Err(SignalError::unavailable(format!(
            "quotes {}: {}",
            e.code, e.description
        )));
    }

    let result = parsed
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SignalError::unavailable("quotes: empty result"))?;

    let closes: Vec<f64> = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close.into_iter().flatten().filter(|v| v.is_finite()).collect())
        .unwrap_or_default();

    if closes.is_empty() {
        return Err(SignalError::InsufficientSample { got: 0, need: 1 });
    }

    Ok(CloseSeries {
        closes,
        last_ts: result.timestamp.last().copied(),
    })
}

#[derive(Debug, Clone)]
pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Five daily closes for `symbol`.
    pub async fn fetch_series(
        &self,
        symbol: &str,
        timeout: Duration,
    ) -> Result<CloseSeries, SignalError> {
        let url = format!("{}/{symbol}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .timeout(timeout)
            .send()
            .await?;
        let body = read_body(resp).await?;
        parse_chart(&body)
    }

    pub async fn fetch_indicator(
        &self,
        symbol: &str,
        threshold_pct: f64,
        timeout: Duration,
    ) -> Result<Indicator, SignalError> {
        self.fetch_series(symbol, timeout)
            .await?
            .to_indicator(threshold_pct)
            .ok_or(SignalError::InsufficientSample { got: 0, need: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OIL_BODY: &str = r#"{"chart":{"result":[{"meta":{"symbol":"CL=F"},
        "timestamp":[1730678400,1730764800,1730851200,1730937600,1731024000],
        "indicators":{"quote":[{"close":[60.0,59.1,null,58.4,58.0]}]}}],"error":null}}"#;

    #[test]
    fn parses_closes_skipping_nulls() {
        let s = parse_chart(OIL_BODY).unwrap();
        assert_eq!(s.closes, vec![60.0, 59.1, 58.4, 58.0]);
        assert_eq!(s.last_ts, Some(1731024000));
    }

    #[test]
    fn indicator_trend_uses_threshold() {
        let s = parse_chart(OIL_BODY).unwrap();
        // -3.3% over the window
        let oil = s.to_indicator(OIL_TREND_PCT).unwrap();
        assert_eq!(oil.value, 58.0);
        assert_eq!(oil.trend, Direction::Down);
        assert!(oil.as_of.is_some());
        assert_eq!(s.to_indicator(5.0).unwrap().trend, Direction::Stable);
    }

    #[test]
    fn chart_error_is_unavailable() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(
            parse_chart(body),
            Err(SignalError::ProviderUnavailable(_))
        ));
    }
}
