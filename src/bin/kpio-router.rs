//! CLI entry point. Pure plumbing: parse args, load the topology file,
//! construct a [`Router`], open the pnet transport, spawn the sweeper, serve.

use std::sync::Arc;

use clap::Parser;
use kpio_router::{config, router::Router, transport::PnetTransport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kpio-router", about = "IPv4 software router data plane")]
struct Args {
    /// Path to a YAML topology file (interfaces + routes).
    #[arg(long)]
    config: std::path::PathBuf,

    /// `tracing-subscriber` env filter, e.g. "info" or "kpio_router=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let topology = config::load(&args.config)?;
    let iface_names: Vec<String> = topology.interfaces.iter().map(|i| i.name.clone()).collect();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        // `Router` is constructed with a placeholder transport slot filled in
        // below, since `PnetTransport::open` needs the frame-handling
        // callback and the callback needs the router — resolved via an
        // `OnceLock` the callback closes over.
        let router_slot: Arc<once_cell::sync::OnceCell<Router>> = Arc::new(once_cell::sync::OnceCell::new());
        let callback_slot = router_slot.clone();

        let transport = PnetTransport::open(&iface_names, move |iface: &str, frame: &[u8]| {
            if let Some(router) = callback_slot.get() {
                router.handle_frame(iface, frame);
            }
        })?;

        let router = Router::new(topology.interfaces, topology.routes, Arc::new(transport));
        router_slot
            .set(router.clone())
            .unwrap_or_else(|_| panic!("router slot set twice"));

        let sweeper = tokio::spawn(kpio_router::sweeper::run(router.clone(), shutdown_rx));

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
        let _ = sweeper.await;

        Ok::<(), anyhow::Error>(())
    })
}
