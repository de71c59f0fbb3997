use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use event_bridge::args::Args;
use event_bridge::runtime::{RuntimeConfig, shutdown_signal};
use event_bridge::{
    Bridge, BridgeMetrics, QueueSink, ShutdownController, load_config_with_fallback,
    spawn_metrics_server,
};

fn main() -> Result<()> {
    event_bridge::logging::init_dual_logging();

    let args = Args::parse();
    let runtime = RuntimeConfig::from_args(args.threads).build_runtime()?;
    runtime.block_on(run_bridge(args))
}

async fn run_bridge(args: Args) -> Result<()> {
    let mut config = match load_config_with_fallback(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file '{}': {:#}", args.config, e);
            return Err(e);
        }
    };
    config.outputs = args.effective_outputs(&config);
    config.validate()?;

    info!("Forwarding to {} output destination(s):", config.outputs.len());
    for output in &config.outputs {
        info!("  - {}", output);
    }

    let sink = Arc::new(
        QueueSink::connect(&config.outputs)
            .await
            .context("failed to initialise sink")?,
    );
    let metrics = Arc::new(BridgeMetrics::new()?);

    let bridge = Bridge::builder(sink, Arc::clone(&metrics))
        .with_poll_interval(config.bridge.poll_interval())
        .with_sample_period(config.bridge.sample_period)
        .build()?;

    let listen_addr = args.listen_addr(&config);
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to listen on {}", listen_addr))?;
    info!("Listening on: {}", listener.local_addr()?);

    // Send the acceptor into the background; main blocks on the signal.
    let controller = ShutdownController::new();
    tokio::spawn(bridge.serve(listener, controller.register()));

    spawn_metrics_server(args.effective_metrics_port(&config).get(), metrics).await?;

    shutdown_signal().await;
    info!("Received shutdown signal, stopping bridge");

    controller.shutdown().await;
    info!("All connections closed, exiting");
    Ok(())
}
