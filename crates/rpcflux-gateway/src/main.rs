// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! rpcflux gateway - JSON-RPC telemetry ingestion over HTTP.
//!
//! Accepts JSON-RPC payloads from upstream proxies/CDNs and records them as
//! InfluxDB points: one per request, one per call. Delivery is buffered and
//! asynchronous; the response path never waits on the store.
//!
//! # Usage
//!
//! ```bash
//! export INFLUX_ENDPOINT=http://localhost:8086
//! export INFLUX_TOKEN=s3cret-token
//! export INFLUX_ORG=telemetry
//! export INFLUX_BUCKET=rpc-traffic
//!
//! # Start on default port 8080
//! rpcflux-gateway
//!
//! # Custom port and flush cadence
//! rpcflux-gateway --port 9000 --flush-interval-ms 2000
//! ```
//!
//! # Endpoints
//!
//! - `POST /` - Ingest one JSON-RPC request body
//! - `GET /health` - Health check
//! - `GET /info` - Gateway info

mod handlers;
mod routes;

use clap::Parser;
use rpcflux::writer::drain_failures;
use rpcflux::{InfluxClient, InfluxConfig, PointWriter, RequestRecorder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// rpcflux JSON-RPC telemetry gateway
#[derive(Parser, Debug)]
#[command(name = "rpcflux-gateway")]
#[command(about = "JSON-RPC telemetry gateway - observes RPC traffic as InfluxDB time series")]
#[command(version)]
struct Args {
    /// HTTP server port
    #[arg(short, long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Interval between automatic buffer flushes (milliseconds)
    #[arg(long, default_value = "5000")]
    flush_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // The store connection is mandatory; refuse to serve without it.
    let config = InfluxConfig::from_env()?;
    let client = InfluxClient::new(&config);

    let (writer, writer_handle, failures) = PointWriter::spawn(client);
    let state = Arc::new(handlers::AppState {
        recorder: RequestRecorder::new(writer.clone()),
    });

    // Failure drain: the only channel where write errors surface. Ends on
    // its own once the writer closes the stream.
    let drain_task = tokio::spawn(drain_failures(failures));

    // Periodic flush, independent of request volume.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let flush_interval = Duration::from_millis(args.flush_interval_ms);
    let flush_writer = writer.clone();
    let flush_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(flush_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => flush_writer.flush(),
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    let app = routes::build_router(state);
    let addr = format!("{}:{}", args.bind, args.port);
    info!("rpcflux gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", addr);
    info!(
        "Influx endpoint: {} (org {}, bucket {})",
        config.url, config.org, config.bucket
    );
    info!("Flush interval: {}ms", args.flush_interval_ms);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Ordered teardown: stop the ticker, final-flush the writer, then let
    // the drain task finish reporting whatever the final flush produced.
    info!("shutting down, flushing buffered points");
    let _ = shutdown_tx.send(true);
    let _ = flush_task.await;
    writer_handle.shutdown().await;
    let _ = drain_task.await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
