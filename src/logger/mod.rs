//! Tracing setup for the CLI.
//!
//! Logs are written to stderr so command output on stdout can be piped.
//! `RUST_LOG` overrides the configured level.

mod config;

use std::{io::IsTerminal, net::SocketAddr};

pub(crate) use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logger_config.level));

    let (pretty, json) = match logger_config.format {
        LogFormat::Pretty => (
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_target(false)
                    .compact(),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();

    if telemetry_config.metrics.enabled {
        install_metrics_exporter(&telemetry_config.metrics.bind_address);
    }
}

/// Serve Prometheus metrics for the lifetime of the process. Failures only warn.
fn install_metrics_exporter(bind_address: &str) {
    let address: SocketAddr = match bind_address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::warn!(bind_address, error = %error, "Invalid metrics bind address");
            return;
        }
    };

    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => tracing::info!(%address, "Prometheus metrics exporter listening"),
        Err(error) => tracing::warn!(%address, error = %error, "Metrics exporter not installed"),
    }
}
