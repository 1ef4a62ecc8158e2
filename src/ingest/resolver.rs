// src/ingest/resolver.rs
//! Fallback-chain resolution.
//!
//! Walks a `ProviderChain` in order. Each provider gets a bounded time
//! slice; a response must match the chain's signal kind and pass the
//! `QualityGate` to be accepted. Everything else is recorded and skipped.
//! When the chain runs dry the neutral default is returned, so `resolve`
//! always produces a signal and never takes longer than the sum of the
//! per-provider timeouts.

use crate::decision::{Reason, ReasonKind};
use crate::entity::EntityKey;
use crate::ingest::ensure_metrics_described;
use crate::ingest::error::SignalError;
use crate::ingest::quality::QualityGate;
use crate::ingest::types::ProviderChain;
use crate::signal::{RawSignal, SignalKind};
use futures::FutureExt;
use metrics::{counter, histogram};
use std::panic::AssertUnwindSafe;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Accepted { sample_count: u32 },
    Rejected(SignalError),
}

/// One provider call as seen by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub provider: &'static str,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub kind: SignalKind,
    pub signal: RawSignal,
    pub attempts: Vec<Attempt>,
    /// The request deadline cut the chain short.
    pub deadline_exceeded: bool,
}

impl Resolution {
    fn new(kind: SignalKind, signal: RawSignal, attempts: Vec<Attempt>) -> Self {
        Self {
            kind,
            signal,
            attempts,
            deadline_exceeded: false,
        }
    }

    /// Neutral default for a chain the request deadline interrupted.
    pub fn deadline_exceeded(kind: SignalKind) -> Self {
        let mut r = Self::new(kind, RawSignal::neutral(kind), Vec::new());
        r.deadline_exceeded = true;
        r
    }

    /// Attempt log as reason lines, in attempt order.
    pub fn notes(&self) -> Vec<Reason> {
        let kind = self.kind;
        let mut out: Vec<Reason> = self
            .attempts
            .iter()
            .map(|a| {
                let msg = match &a.outcome {
                    AttemptOutcome::Accepted { sample_count } => {
                        format!("{kind}: using {} ({sample_count} samples)", a.provider)
                    }
                    AttemptOutcome::Rejected(e) => format!("{kind}: {} skipped, {e}", a.provider),
                };
                Reason::new(ReasonKind::Provenance, msg)
            })
            .collect();
        if self.deadline_exceeded {
            out.push(Reason::new(
                ReasonKind::Provenance,
                format!("{kind}: request deadline exceeded, neutral default applied"),
            ));
        } else if self.signal.is_fallback {
            let exhausted = SignalError::ChainExhausted {
                attempted: self.attempts.len(),
            };
            out.push(Reason::new(
                ReasonKind::Provenance,
                format!("{kind}: {exhausted}, neutral default applied"),
            ));
        }
        out
    }
}

/// Resolve one signal through its chain. Total: provider errors, timeouts
/// and panics all advance the chain.
pub async fn resolve(
    kind: SignalKind,
    key: &EntityKey,
    chain: &ProviderChain,
    gate: &QualityGate,
) -> Resolution {
    ensure_metrics_described();

    if chain.kind != kind {
        tracing::warn!(target: "ingest", signal = %kind, chain = %chain.kind, "chain kind mismatch; payloads will be checked against the requested kind");
    }

    let timeout_ms = chain.timeout.as_millis() as u64;
    let mut attempts = Vec::with_capacity(chain.providers.len());

    for p in &chain.providers {
        let name = p.name();
        let started = Instant::now();

        let call = AssertUnwindSafe(p.fetch(key, chain.timeout)).catch_unwind();
        let result = match tokio::time::timeout(chain.timeout, call).await {
            Ok(Ok(r)) => r,
            Ok(Err(_)) => Err(SignalError::unavailable("provider panicked")),
            Err(_) => Err(SignalError::ProviderTimeout {
                after_ms: timeout_ms,
            }),
        };
        histogram!("timing_provider_latency_ms", "provider" => name)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let accepted = result.and_then(|mut signal| {
            if signal.kind() != kind {
                return Err(SignalError::unavailable(format!(
                    "returned {} payload",
                    signal.kind()
                )));
            }
            gate.check(&signal)?;
            signal.source_name = name.to_string();
            signal.is_fallback = false;
            Ok(signal)
        });

        match accepted {
            Ok(signal) => {
                tracing::info!(target: "ingest", signal = %kind, provider = name, samples = signal.sample_count, entity = %key, "signal accepted");
                counter!("timing_provider_attempts_total", "signal" => kind.as_str(), "provider" => name, "outcome" => "accepted").increment(1);
                attempts.push(Attempt {
                    provider: name,
                    outcome: AttemptOutcome::Accepted {
                        sample_count: signal.sample_count,
                    },
                });
                return Resolution::new(kind, signal, attempts);
            }
            Err(e) => {
                // reqwest does not know the budget it ran out of
                let e = match e {
                    SignalError::ProviderTimeout { after_ms: 0 } => SignalError::ProviderTimeout {
                        after_ms: timeout_ms,
                    },
                    other => other,
                };
                tracing::warn!(target: "ingest", error = %e, signal = %kind, provider = name, entity = %key, "provider rejected");
                counter!("timing_provider_attempts_total", "signal" => kind.as_str(), "provider" => name, "outcome" => e.label()).increment(1);
                attempts.push(Attempt {
                    provider: name,
                    outcome: AttemptOutcome::Rejected(e),
                });
            }
        }
    }

    tracing::warn!(target: "ingest", signal = %kind, attempted = attempts.len(), entity = %key, "chain exhausted; using neutral default");
    counter!("timing_signal_fallback_total", "signal" => kind.as_str()).increment(1);

    Resolution::new(kind, RawSignal::neutral(kind), attempts)
}
