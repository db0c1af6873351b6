//! metrica sampler daemon.
//!
//! - Loads `$METRICA_CONFIG` (default `metrica.yaml`)
//! - Samples process uptime on the configured refresh interval
//! - Logs each coalesced (uptime, series count) pair
//! - Ctrl-C stops the periodic tasks and logs the registry counters

use tracing_subscriber::{fmt, EnvFilter};

use metrica_core::clock;
use metrica_registry::sampler::{UptimeSampler, SERIES_COUNT_KEY, UPTIME_KEY};
use metrica_registry::{config, MetricsRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("METRICA_CONFIG").unwrap_or_else(|_| "metrica.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let registry = MetricsRegistry::with_parts(clock::system(), cfg.window_table()?);

    registry.on(&[UPTIME_KEY, SERIES_COUNT_KEY], |series| {
        let [uptime, count] = series else { return; };
        tracing::info!(
            uptime_ms = %uptime.latest().unwrap_or_default(),
            series = %count.latest().unwrap_or_default(),
            "sample"
        );
    })?;
    registry.use_middleware(UptimeSampler::new(cfg.refresh.interval_ms()?));

    tracing::info!(config = %path, "metrica starting");
    tokio::signal::ctrl_c().await?;

    registry.stop();
    tracing::info!("metrica stopped\n{}", registry.render_stats());
    Ok(())
}
