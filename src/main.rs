//! # Packmon
//!
//! Battery-pack telemetry peripheral core: live notify, durable record log,
//! backlog replay.
//!
//! The binary wires the mock sampler and a loopback transport in place of
//! real cell-monitoring hardware and a radio stack, then simulates a peer
//! that connects, subscribes to both channels, and requests a replay of the
//! backlog left over from previous runs.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use packmon::config::Config;
use packmon::producer::ProducerLoop;
use packmon::record::Record;
use packmon::sampler::MockSampler;
use packmon::session::TelemetrySession;
use packmon::store::{MetaStore, RecordLog, SchemaGuard};
use packmon::transport::{Channel, LinkEvents, LoopbackTransport, OPCODE_BACKLOG_REQUEST};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Packmon v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    std::fs::create_dir_all(&config.storage.data_dir)?;

    let log = RecordLog::new(config.log_path());
    let meta = MetaStore::new(config.meta_path());

    // Reconcile the record layout before any other log access
    SchemaGuard::new(&log, &meta).reconcile()?;
    info!("Record log ready: {} retained records", log.count());

    let session = Arc::new(TelemetrySession::new());
    let (transport, mut rx) = LoopbackTransport::new();
    let events = LinkEvents::new(Arc::clone(&session));

    // Simulated peer: connect, subscribe to both channels, request backlog
    events.on_link_established();
    events.on_subscribe_changed(Channel::Live, true);
    events.on_subscribe_changed(Channel::Backlog, true);
    events.on_command_received(OPCODE_BACKLOG_REQUEST);

    // Drain the loopback frames the way a connected client would
    tokio::spawn(async move {
        while let Some((channel, frame)) = rx.recv().await {
            match Record::decode(&frame) {
                Ok(record) => info!(
                    "{:?} frame: seq={} soc={}% pack={}mV",
                    channel, record.seq, record.soc, record.pack_total_mv
                ),
                Err(e) => warn!("Undecodable {:?} frame: {}", channel, e),
            }
        }
    });

    let mut producer = ProducerLoop::new(
        session,
        log,
        Arc::new(transport),
        Box::new(MockSampler::new()),
        config.producer_timing(),
    );

    info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = producer.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
