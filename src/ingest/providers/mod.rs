// src/ingest/providers/mod.rs
//! Concrete signal providers.
//!
//! Live sources (credentialed HTTP APIs) come first in the default chains;
//! static reference data and the embedded calendar back them up.

pub mod blog_volume;
pub mod calendar;
pub mod datalab;
pub mod ecos;
pub mod fixed;
pub mod macro_live;
pub mod quotes;
pub mod reference_macro;
pub mod reference_trend;

pub use blog_volume::BlogVolumeTrendProvider;
pub use calendar::CalendarScheduleProvider;
pub use datalab::DataLabTrendProvider;
pub use fixed::FixedProvider;
pub use macro_live::LiveMacroProvider;
pub use reference_macro::ReferenceMacroProvider;
pub use reference_trend::ReferenceTrendProvider;

use crate::ingest::error::SignalError;

/// Shared HTTP client; per-request timeouts are set by each provider.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("vehicle-timing/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Body of a 2xx response; anything else is `ProviderUnavailable`.
pub(crate) async fn read_body(resp: reqwest::Response) -> Result<String, SignalError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(SignalError::unavailable(format!("http status {status}")));
    }
    Ok(resp.text().await?)
}

/// Reads a credential from the environment; blank counts as missing.
pub(crate) fn env_credential(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Naver Open API key pair shared by the DataLab and blog search providers.
#[derive(Debug, Clone, Default)]
pub struct NaverCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl NaverCredentials {
    pub fn from_env() -> Self {
        Self {
            client_id: env_credential("NAVER_CLIENT_ID"),
            client_secret: env_credential("NAVER_CLIENT_SECRET"),
        }
    }

    pub(crate) fn pair(&self) -> Result<(&str, &str), SignalError> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(SignalError::unavailable(
                "NAVER_CLIENT_ID / NAVER_CLIENT_SECRET not set",
            )),
        }
    }
}
