//! # Timing Engine
//! Request-scoped orchestration of one evaluation:
//! classify → blend weights → resolve three signals concurrently under one
//! deadline → score → format.
//!
//! All collaborators are injected; `from_config` wires the default chains.
//! `evaluate` never fails: every unavailable signal degrades to its neutral
//! default and lowers the reported confidence.

use crate::config::TimingConfig;
use crate::decision::TimingResult;
use crate::entity::EntityKey;
use crate::ingest::ensure_metrics_described;
use crate::ingest::providers::ecos::BokRateClient;
use crate::ingest::providers::quotes::QuoteClient;
use crate::ingest::providers::{
    env_credential, BlogVolumeTrendProvider, CalendarScheduleProvider, DataLabTrendProvider,
    LiveMacroProvider, NaverCredentials, ReferenceMacroProvider, ReferenceTrendProvider,
};
use crate::ingest::{resolve, ProviderChain, QualityGate, Resolution, SignalCache};
use crate::report;
use crate::scoring;
use crate::segment::SegmentRules;
use crate::signal::{SignalKind, SignalSet};
use crate::weights::WeightTable;
use metrics::counter;
use std::time::Duration;
use tokio::time::Instant;

/// A provider chain with the gate its responses must pass.
#[derive(Debug, Clone)]
pub struct GatedChain {
    pub chain: ProviderChain,
    pub gate: QualityGate,
}

impl GatedChain {
    pub fn new(chain: ProviderChain, gate: QualityGate) -> Self {
        Self { chain, gate }
    }
}

pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_secs(8);

pub struct TimingEngine {
    rules: SegmentRules,
    weights: WeightTable,
    macro_chain: GatedChain,
    trend_chain: GatedChain,
    schedule_chain: GatedChain,
    cache: Option<SignalCache>,
    request_deadline: Duration,
}

impl TimingEngine {
    /// Engine with built-in segment rules and weights, no cache.
    pub fn new(macro_chain: GatedChain, trend_chain: GatedChain, schedule_chain: GatedChain) -> Self {
        Self {
            rules: SegmentRules::builtin(),
            weights: WeightTable::default_seed(),
            macro_chain,
            trend_chain,
            schedule_chain,
            cache: None,
            request_deadline: DEFAULT_REQUEST_DEADLINE,
        }
    }

    pub fn with_rules(mut self, rules: SegmentRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(SignalCache::new(ttl));
        self
    }

    pub fn with_request_deadline(mut self, d: Duration) -> Self {
        self.request_deadline = d;
        self
    }

    /// Default chains:
    /// - macro: ECOS + quotes → reference snapshot
    /// - trend: DataLab → blog volume → reference dataset
    /// - schedule: calendar file → embedded calendar
    ///
    /// Offline mode drops the HTTP providers.
    pub fn from_config(cfg: &TimingConfig) -> Self {
        let ep = &cfg.endpoints;
        let paths = &cfg.paths;

        let mut macro_chain = ProviderChain::new(SignalKind::Macro, cfg.signals.macro_chain.timeout());
        let mut trend_chain = ProviderChain::new(SignalKind::Trend, cfg.signals.trend.timeout());
        if !cfg.offline {
            let creds = NaverCredentials::from_env();
            macro_chain = macro_chain.with(LiveMacroProvider::new(
                BokRateClient::new(env_credential("BOK_API_KEY"), ep.ecos.as_str()),
                QuoteClient::new(ep.quotes.as_str()),
            ));
            trend_chain = trend_chain
                .with(DataLabTrendProvider::new(creds.clone(), ep.datalab.as_str()))
                .with(BlogVolumeTrendProvider::new(creds, ep.blog_search.as_str()));
        }
        macro_chain = macro_chain.with(ReferenceMacroProvider::load_or_empty(&paths.macro_reference));
        trend_chain = trend_chain.with(ReferenceTrendProvider::load_or_empty(&paths.trend_reference));

        let schedule_chain = ProviderChain::new(SignalKind::Schedule, cfg.signals.schedule.timeout())
            .with(CalendarScheduleProvider::load_or_empty(&paths.calendar))
            .with(CalendarScheduleProvider::embedded());

        let weights = paths
            .segment_weights
            .as_ref()
            .map(WeightTable::load_from_file)
            .unwrap_or_default();

        let mut engine = Self::new(
            GatedChain::new(macro_chain, cfg.signals.macro_chain.gate()),
            GatedChain::new(trend_chain, cfg.signals.trend.gate()),
            GatedChain::new(schedule_chain, cfg.signals.schedule.gate()),
        )
        .with_weights(weights)
        .with_request_deadline(cfg.request_deadline());
        if let Some(ttl) = cfg.cache_ttl() {
            engine = engine.with_cache(ttl);
        }

        tracing::info!(
            target: "timing",
            macro_chain = ?engine.macro_chain.chain.names(),
            trend_chain = ?engine.trend_chain.chain.names(),
            schedule_chain = ?engine.schedule_chain.chain.names(),
            offline = cfg.offline,
            "timing engine configured"
        );
        engine
    }

    /// Evaluate one vehicle. Never fails and never outlives the request
    /// deadline by more than scoring time.
    pub async fn evaluate(&self, key: &EntityKey) -> TimingResult {
        ensure_metrics_described();

        // 1) Segments + weights (pure)
        let segments = self.rules.classify(key);
        let weights = self.weights.blend(&segments);

        // 2) Fan out under one deadline
        let deadline = Instant::now() + self.request_deadline;
        let (m, t, s) = tokio::join!(
            self.resolve_within(&self.macro_chain, key, deadline),
            self.resolve_within(&self.trend_chain, key, deadline),
            self.resolve_within(&self.schedule_chain, key, deadline),
        );

        // 3) Score + format
        let mut notes = m.notes();
        notes.extend(t.notes());
        notes.extend(s.notes());
        let signals = SignalSet {
            macro_signal: m.signal,
            trend: t.signal,
            schedule: s.signal,
        };
        let card = scoring::compute(key, &segments, &weights, &signals);
        let result = report::format(&card, &notes);

        counter!("timing_evaluations_total", "decision" => result.decision.as_str()).increment(1);
        tracing::info!(
            target: "timing",
            entity = %key,
            segments = %result.segments,
            score = result.final_score,
            decision = result.decision.as_str(),
            confidence = ?result.confidence,
            fallbacks = result.fallback_count(),
            "evaluation complete"
        );
        result
    }

    async fn resolve_within(&self, gc: &GatedChain, key: &EntityKey, deadline: Instant) -> Resolution {
        let kind = gc.chain.kind;

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(kind, key)) {
            counter!("timing_cache_hits_total").increment(1);
            tracing::debug!(target: "timing", signal = %kind, entity = %key, source = %hit.signal.source_name, "cache hit");
            return hit;
        }

        match tokio::time::timeout_at(deadline, resolve(kind, key, &gc.chain, &gc.gate)).await {
            Ok(res) => {
                if let Some(c) = &self.cache {
                    c.put(key, &res);
                }
                res
            }
            Err(_) => {
                // dropping the resolve future cancels the in-flight provider call
                tracing::warn!(target: "timing", signal = %kind, entity = %key, "request deadline exceeded");
                counter!("timing_signal_fallback_total", "signal" => kind.as_str()).increment(1);
                Resolution::deadline_exceeded(kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Confidence;
    use crate::ingest::providers::FixedProvider;
    use crate::signal::{SignalPayload, TrendSnapshot};
    use std::sync::atomic::Ordering;

    fn empty(kind: SignalKind) -> GatedChain {
        GatedChain::new(
            ProviderChain::new(kind, Duration::from_millis(50)),
            QualityGate::default(),
        )
    }

    #[tokio::test]
    async fn empty_chains_still_produce_a_result() {
        let e = TimingEngine::new(
            empty(SignalKind::Macro),
            empty(SignalKind::Trend),
            empty(SignalKind::Schedule),
        );
        let r = e.evaluate(&EntityKey::new("현대", "그랜저", "가솔린")).await;
        assert_eq!(r.confidence, Confidence::Low);
        assert_eq!(r.fallback_count(), 3);
    }

    #[test]
    fn online_config_wires_live_providers_ahead_of_references() {
        let cfg = TimingConfig::default();
        let e = TimingEngine::from_config(&cfg);
        assert_eq!(e.macro_chain.chain.names(), vec!["ecos+quotes", "reference-macro"]);
        assert_eq!(
            e.trend_chain.chain.names(),
            vec!["naver-datalab", "naver-blog-volume", "reference-trend"]
        );
        assert_eq!(e.schedule_chain.chain.names().len(), 2);
        assert!(e.cache.is_some());
    }

    #[tokio::test]
    async fn cache_serves_second_evaluation() {
        let p = FixedProvider::ok(
            "fixed-trend",
            SignalPayload::Trend(TrendSnapshot {
                change_pct: 1.0,
                ratio: None,
            }),
            10,
        );
        let calls = p.calls();
        let trend = GatedChain::new(
            ProviderChain::new(SignalKind::Trend, Duration::from_millis(50)).with(p),
            QualityGate::default(),
        );
        let e = TimingEngine::new(empty(SignalKind::Macro), trend, empty(SignalKind::Schedule))
            .with_cache(Duration::from_secs(60));
        let key = EntityKey::new("기아", "K5", "가솔린");

        let first = e.evaluate(&key).await;
        let second = e.evaluate(&key).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(second
            .reason_messages()
            .any(|m| m == "trend: using fixed-trend (10 samples)"));
    }
}
