//! Background worker: configuration, tracing setup and the periodic
//! incident sweep.

pub mod config;
pub mod sweep_loop;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::LogFormat;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "outagewatch_worker=debug,outagewatch_lifecycle=info,outagewatch_events=info";

/// Install the global tracing subscriber.
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}
