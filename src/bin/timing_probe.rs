//! Evaluate one vehicle from the command line and print the result as JSON.
//!
//! Usage: `timing_probe <brand> <model> <fuel>`
//! Set `TIMING_OFFLINE=1` to use reference data only and
//! `TIMING_PRINT_METRICS=1` to dump the Prometheus exposition afterwards.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vehicle_timing::metrics::Metrics;
use vehicle_timing::{EntityKey, TimingConfig, TimingEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vehicle_timing=info,timing=info,ingest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [brand, model, fuel] = args.as_slice() else {
        bail!("usage: timing_probe <brand> <model> <fuel>");
    };

    let cfg = TimingConfig::load_default()?;
    let metrics = std::env::var("TIMING_PRINT_METRICS")
        .ok()
        .filter(|v| v == "1")
        .map(|_| Metrics::init(cfg.request_deadline()))
        .transpose()?;

    let engine = TimingEngine::from_config(&cfg);
    let result = engine.evaluate(&EntityKey::new(brand, model, fuel)).await;

    let json = serde_json::to_string_pretty(&result).context("serializing result")?;
    println!("{json}");

    if let Some(m) = metrics {
        println!("{}", m.render());
    }
    Ok(())
}
