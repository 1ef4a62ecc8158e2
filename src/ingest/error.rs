// src/ingest/error.rs
use thiserror::Error;

/// Failure of a single provider attempt. Never escapes the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("timed out after {after_ms}ms")]
    ProviderTimeout { after_ms: u64 },

    #[error("unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("insufficient sample ({got} < {need})")]
    InsufficientSample { got: u32, need: u32 },

    /// Every provider in the chain failed; the resolver substitutes a default.
    #[error("chain exhausted after {attempted} attempt(s)")]
    ChainExhausted { attempted: usize },
}

impl SignalError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SignalError::ProviderUnavailable(reason.into())
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SignalError::ProviderTimeout { .. } => "timeout",
            SignalError::ProviderUnavailable(_) => "unavailable",
            SignalError::InsufficientSample { .. } => "insufficient_sample",
            SignalError::ChainExhausted { .. } => "exhausted",
        }
    }
}

impl From<reqwest::Error> for SignalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not report the configured duration
            SignalError::ProviderTimeout { after_ms: 0 }
        } else if let Some(status) = e.status() {
            SignalError::ProviderUnavailable(format!("http status {status}"))
        } else {
            SignalError::ProviderUnavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            SignalError::ProviderTimeout { after_ms: 1500 }.to_string(),
            "timed out after 1500ms"
        );
        assert_eq!(
            SignalError::InsufficientSample { got: 2, need: 5 }.to_string(),
            "insufficient sample (2 < 5)"
        );
        assert_eq!(
            SignalError::unavailable("missing NAVER_CLIENT_ID").to_string(),
            "unavailable: missing NAVER_CLIENT_ID"
        );
    }
}
