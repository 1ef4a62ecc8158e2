// src/ingest/types.rs
use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::signal::{RawSignal, SignalKind};
use std::sync::Arc;
use std::time::Duration;

/// One upstream source for one signal kind.
///
/// `timeout` is the budget the resolver will enforce; HTTP providers pass it
/// on to their client so sockets are not left hanging.
#[async_trait::async_trait]
pub trait SignalProvider: Send + Sync {
    async fn fetch(&self, key: &EntityKey, timeout: Duration) -> Result<RawSignal, SignalError>;
    fn name(&self) -> &'static str;
}

pub type SharedProvider = Arc<dyn SignalProvider>;

/// Ordered providers for one signal kind, plus the per-provider timeout.
#[derive(Clone)]
pub struct ProviderChain {
    pub kind: SignalKind,
    pub providers: Vec<SharedProvider>,
    pub timeout: Duration,
}

impl ProviderChain {
    pub fn new(kind: SignalKind, timeout: Duration) -> Self {
        Self {
            kind,
            providers: Vec::new(),
            timeout,
        }
    }

    /// Builder-style append.
    pub fn with(mut self, p: impl SignalProvider + 'static) -> Self {
        self.providers.push(Arc::new(p));
        self
    }

    pub fn with_shared(mut self, p: SharedProvider) -> Self {
        self.providers.push(p);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("kind", &self.kind)
            .field("providers", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
