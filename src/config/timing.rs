// src/config/timing.rs
use crate::ingest::quality::QualityGate;
use crate::signal::SignalKind;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

const ENV_PATH: &str = "TIMING_CONFIG_PATH";
const ENV_DEADLINE: &str = "TIMING_REQUEST_DEADLINE_MS";
const ENV_OFFLINE: &str = "TIMING_OFFLINE";
const DEFAULT_PATH: &str = "config/timing.toml";

/// Per-signal chain settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Budget for each provider in the chain.
    pub timeout_ms: u64,
    /// Quality threshold: minimum sample count to accept a response.
    pub min_samples: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age_days: Option<i64>,
}

impl ChainConfig {
    const fn new(timeout_ms: u64, min_samples: u32) -> Self {
        Self {
            timeout_ms,
            min_samples,
            max_age_days: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn gate(&self) -> QualityGate {
        let g = QualityGate::min_samples(self.min_samples);
        match self.max_age_days {
            Some(d) => g.with_max_age_days(d),
            None => g,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    #[serde(rename = "macro")]
    pub macro_chain: ChainConfig,
    pub trend: ChainConfig,
    pub schedule: ChainConfig,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            macro_chain: ChainConfig::new(3_000, 3),
            trend: ChainConfig::new(3_000, 5),
            schedule: ChainConfig::new(1_000, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub calendar: PathBuf,
    pub macro_reference: PathBuf,
    pub trend_reference: PathBuf,
    /// Optional JSON override of the segment weight table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_weights: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            calendar: PathBuf::from("config/release_calendar.csv"),
            macro_reference: PathBuf::from("config/macro_reference.toml"),
            trend_reference: PathBuf::from("config/trend_reference.json"),
            segment_weights: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub ecos: String,
    pub quotes: String,
    pub datalab: String,
    pub blog_search: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        use crate::ingest::providers::{blog_volume, datalab, ecos, quotes};
        Self {
            ecos: ecos::DEFAULT_BASE_URL.to_string(),
            quotes: quotes::DEFAULT_BASE_URL.to_string(),
            datalab: datalab::DEFAULT_URL.to_string(),
            blog_search: blog_volume::DEFAULT_URL.to_string(),
        }
    }
}

/// Engine configuration. Credentials never live here; they come from the
/// environment (`BOK_API_KEY`, `NAVER_CLIENT_ID`, `NAVER_CLIENT_SECRET`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Overall budget for one evaluation.
    pub request_deadline_ms: u64,
    /// Signal cache TTL; 0 disables the cache.
    pub cache_ttl_secs: u64,
    /// Skip live HTTP providers (reference data only).
    pub offline: bool,
    pub signals: SignalsConfig,
    pub paths: PathsConfig,
    pub endpoints: EndpointsConfig,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_deadline_ms: 8_000,
            cache_ttl_secs: 600,
            offline: false,
            signals: SignalsConfig::default(),
            paths: PathsConfig::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl TimingConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: TimingConfig = toml::from_str(s).context("parsing timing config")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading timing config from {}", path.display()))?;
        Self::from_toml_str(&s)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $TIMING_CONFIG_PATH
    /// 2) config/timing.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let cfg = if let Ok(p) = env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new(DEFAULT_PATH).exists() {
            Self::load_from(Path::new(DEFAULT_PATH))?
        } else {
            Self::default()
        };
        Ok(cfg.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env::var(ENV_DEADLINE).ok().and_then(|v| v.trim().parse::<u64>().ok()) {
            self.request_deadline_ms = ms;
        }
        if let Ok(v) = env::var(ENV_OFFLINE) {
            self.offline = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.sanitized()
    }

    /// Zero budgets fall back to defaults.
    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.request_deadline_ms == 0 {
            self.request_deadline_ms = d.request_deadline_ms;
        }
        for (c, dc) in [
            (&mut self.signals.macro_chain, d.signals.macro_chain),
            (&mut self.signals.trend, d.signals.trend),
            (&mut self.signals.schedule, d.signals.schedule),
        ] {
            if c.timeout_ms == 0 {
                c.timeout_ms = dc.timeout_ms;
            }
        }
        self
    }

    pub fn chain(&self, kind: SignalKind) -> &ChainConfig {
        match kind {
            SignalKind::Macro => &self.signals.macro_chain,
            SignalKind::Trend => &self.signals.trend,
            SignalKind::Schedule => &self.signals.schedule,
        }
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}
