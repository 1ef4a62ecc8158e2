// src/ingest/providers/macro_live.rs
use super::ecos::BokRateClient;
use super::quotes::{QuoteClient, FX_SYMBOL, FX_TREND_PCT, OIL_SYMBOL, OIL_TREND_PCT};
use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{MacroSnapshot, RawSignal, SignalPayload};
use chrono::Utc;
use std::time::Duration;

/// Base rate from ECOS plus oil and FX quotes, fetched concurrently.
///
/// Partial snapshots are returned as-is; the sample count is the number of
/// indicators obtained, so the quality gate decides whether two out of
/// three is good enough.
#[derive(Debug, Clone)]
pub struct LiveMacroProvider {
    rates: BokRateClient,
    quotes: QuoteClient,
}

impl LiveMacroProvider {
    pub fn new(rates: BokRateClient, quotes: QuoteClient) -> Self {
        Self { rates, quotes }
    }
}

#[async_trait::async_trait]
impl SignalProvider for LiveMacroProvider {
    async fn fetch(&self, _key: &EntityKey, timeout: Duration) -> Result<RawSignal, SignalError> {
        let (rate, fx, oil) = tokio::join!(
            self.rates.fetch_rate(timeout),
            self.quotes.fetch_indicator(FX_SYMBOL, FX_TREND_PCT, timeout),
            self.quotes.fetch_indicator(OIL_SYMBOL, OIL_TREND_PCT, timeout),
        );

        let mut first_err = None;
        let mut keep = |r: Result<_, SignalError>, what: &str| match r {
            Ok(ind) => Some(ind),
            Err(e) => {
                tracing::debug!(target: "ingest", error = %e, indicator = what, "macro indicator missing");
                first_err.get_or_insert(e);
                None
            }
        };

        let snapshot = MacroSnapshot {
            interest_rate: keep(rate, "interest_rate"),
            exchange_rate: keep(fx, "exchange_rate"),
            oil_price: keep(oil, "oil_price"),
        };

        let n = snapshot.indicator_count();
        if n == 0 {
            return Err(first_err.unwrap_or_else(|| SignalError::unavailable("no indicators")));
        }
        Ok(RawSignal::observed(SignalPayload::Macro(snapshot), n).collected_at(Utc::now()))
    }

    fn name(&self) -> &'static str {
        "ecos+quotes"
    }
}
