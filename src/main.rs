mod command;
mod config;
mod session;
mod strip;
mod transport;

use anyhow::Context;
use clap::Parser;
use command::{CommandExecutor, ExecutorTicker, IngressDispatcher};
use config::Args;
use pixel_commander_shared::CommandQueue;
use session::ConnectionRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use strip::{LedState, SimulatedStrip};
use transport::AppState;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = config::load(&args).context("Failed to load configuration")?;

    info!("Pixel commander starting");
    info!("  Network: {} (connect timeout {:?})", config.network.ssid, config.connect_timeout());
    info!(
        "  Strip: {} pixels on data pin {}",
        config.strip.pixel_count, config.strip.data_pin
    );
    info!(
        "  Queue: {} slots, {} commands every {:?}",
        config.queue.capacity,
        config.queue.drain_per_tick,
        config.tick_interval()
    );

    let queue = Arc::new(CommandQueue::new(config.queue.capacity)?);

    let driver = SimulatedStrip::new(config.strip.data_pin);
    let probe = driver.probe();
    let strip = LedState::shared(config.strip.pixel_count, driver);

    // Start from a dark strip
    strip.lock().show().context("Initial blank frame failed")?;

    let registry = Arc::new(ConnectionRegistry::with_reply_backlog(
        config.network.reply_backlog,
    ));
    let dispatcher = Arc::new(IngressDispatcher::new(
        queue.clone(),
        config.strip.pixel_count,
    ));

    let executor = CommandExecutor::new(
        queue.clone(),
        strip.clone(),
        registry.clone(),
        config.queue.drain_per_tick,
    );
    let ticker = ExecutorTicker::new(executor, registry.clone(), config.tick_interval());
    tokio::spawn(ticker.run());
    info!("Command executor started");

    let app = transport::router(AppState {
        dispatcher,
        registry: registry.clone(),
        strip,
    });

    let listener = tokio::net::TcpListener::bind(config.network.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.network.listen))?;

    info!("WebSocket endpoint: ws://{}/ws", config.network.listen);
    info!("HTTP ping: http://{}/ping", config.network.listen);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    let frame = probe.last_frame();
    let lit = frame.iter().filter(|p| p.r > 0 || p.g > 0 || p.b > 0).count();
    info!(
        "Shutting down: {} frames pushed, {} of {} pixels lit, {} commands left in queue, {} clients connected",
        probe.pushes(),
        lit,
        frame.len(),
        queue.len(),
        registry.count()
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
