// src/ingest/providers/fixed.rs
//! Provider with a canned response, optionally delayed. Used for offline
//! runs and tests.

use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{RawSignal, SignalPayload};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FixedProvider {
    name: &'static str,
    response: Result<RawSignal, SignalError>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FixedProvider {
    pub fn ok(name: &'static str, payload: SignalPayload, sample_count: u32) -> Self {
        Self::with_response(name, Ok(RawSignal::observed(payload, sample_count)))
    }

    pub fn failing(name: &'static str, err: SignalError) -> Self {
        Self::with_response(name, Err(err))
    }

    pub fn with_response(name: &'static str, response: Result<RawSignal, SignalError>) -> Self {
        Self {
            name,
            response,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before answering (to exercise timeouts and deadlines).
    pub fn delayed(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Shared call counter; clones observe the same count.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl SignalProvider for FixedProvider {
    async fn fetch(&self, _key: &EntityKey, _timeout: Duration) -> Result<RawSignal, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.response.clone()
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
