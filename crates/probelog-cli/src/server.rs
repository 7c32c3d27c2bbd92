//! The server role: accept payload streams, print them, log telemetry.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use probelog_net::{Listener, PayloadObserver};
use probelog_store::SharedLogStore;
use probelog_types::SensorPayload;

use crate::config::Config;
use crate::telemetry::StoreTelemetry;

/// Prints every received payload, one line per sensor.
struct ConsoleObserver;

impl PayloadObserver for ConsoleObserver {
    fn on_payload(&self, peer: SocketAddr, payload: &SensorPayload) {
        println!("\n[+] Data from {peer}:");
        for (sensor_id, entry) in payload.iter() {
            println!(
                "  {sensor_id}: {} = {:.2} {} at {}",
                entry.name, entry.value, entry.unit, entry.timestamp
            );
        }
    }
}

/// Run the collector until Ctrl+C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = SharedLogStore::open(config.store).context("failed to open the log store")?;
    let port = config.network.port;

    let listener = Arc::new(
        Listener::bind(port, Arc::new(ConsoleObserver))
            .await
            .with_context(|| format!("failed to bind port {port}"))?
            .with_telemetry(Arc::new(StoreTelemetry::new(store.clone()))),
    );

    println!("[+] Collector listening on port {port} (Ctrl+C to stop)");
    let runner = Arc::clone(&listener);
    let accept_loop = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for Ctrl+C")?;
    info!("Shutting down");

    listener.stop().await;
    accept_loop.await.context("accept loop panicked")?;
    store.stop().context("failed to close the log store")?;
    println!("[*] Collector stopped");
    Ok(())
}
