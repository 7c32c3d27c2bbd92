//! The client role: sample the sensor bank, persist readings, ship payloads.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use probelog_net::Connector;
use probelog_sim::standard_bank;
use probelog_store::SharedLogStore;
use probelog_types::{Reading, SensorPayload};

use crate::config::Config;
use crate::telemetry::StoreTelemetry;

/// Run the sampling/sending loop until Ctrl+C or too many consecutive
/// send failures.
pub async fn run(config: Config, interval: Duration) -> anyhow::Result<()> {
    let store = SharedLogStore::open(config.store).context("failed to open the log store")?;

    // Readings reach the store through a channel so the sampling loop
    // never waits on disk I/O.
    let (tx, mut rx) = mpsc::unbounded_channel::<Reading>();
    let recorder = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            while let Some(reading) = rx.blocking_recv() {
                if let Err(e) = store.record(reading) {
                    warn!("Failed to record reading: {e}");
                }
            }
        })
    };

    let mut sensors = standard_bank();
    let max_failures = config.network.retries.max(1);
    let addr = config.network.addr();

    let mut connector = Connector::new(config.network)
        .with_telemetry(Arc::new(StoreTelemetry::new(store.clone())));
    connector
        .connect()
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;

    println!(
        "[+] Connected to {addr}; sampling every {:.1}s (Ctrl+C to stop)",
        interval.as_secs_f64()
    );

    let mut consecutive_failures = 0u32;
    loop {
        let mut payload = SensorPayload::new();
        for sensor in &mut sensors {
            let reading = sensor.read()?;
            println!(
                "{} ({}): {:.2}",
                sensor.name(),
                sensor.unit(),
                reading.value
            );
            payload.push_reading(sensor.name(), &reading);
            if tx.send(reading).is_err() {
                warn!("Reading recorder is gone; readings are no longer persisted");
            }
        }

        match connector.send(&payload).await {
            Ok(()) => {
                info!("Payload acknowledged");
                consecutive_failures = 0;
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!("Send failed ({consecutive_failures}/{max_failures}): {e}");
                if consecutive_failures >= max_failures {
                    error!("Too many consecutive send failures, shutting down");
                    break;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\n[*] Stopping");
                break;
            }
        }
    }

    connector.close().await;
    drop(tx);
    // Let queued readings land before closing the store.
    recorder.await.context("reading recorder panicked")?;
    store.stop().context("failed to close the log store")?;
    Ok(())
}
