//! # Producer Loop Module
//!
//! The single periodic task driving the whole pipeline. Each tick it either
//! drains a pending backlog-replay request, or produces one record and
//! decides between live notify and durable persist.
//!
//! Delivery policy: every produced record lands exactly once across the
//! union of {live notification, persisted log}. A successful live notify is
//! not also persisted; a failed live notify falls back to the log so the
//! sample is not lost. Nothing here is fatal — a storage or transport
//! failure degrades one sample or one replay, never the loop itself.

use std::sync::Arc;

use tokio::time::{interval, sleep, Duration};
use tracing::{debug, info, warn};

use crate::record::Record;
use crate::sampler::SampleSource;
use crate::session::TelemetrySession;
use crate::store::RecordLog;
use crate::transport::{Channel, Transport};

/// Number of produced samples between status log messages
const LOG_INTERVAL_SAMPLES: u64 = 60;

/// Timing knobs for the producer loop
#[derive(Debug, Clone, Copy)]
pub struct ProducerTiming {
    /// Period between ticks
    pub sample_interval: Duration,
    /// Delay between backlog notifies, respecting transport throughput
    pub replay_pacing: Duration,
    /// Delay after a replay before normal processing resumes
    pub replay_cooldown: Duration,
}

impl Default for ProducerTiming {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(5),
            replay_pacing: Duration::from_millis(20),
            replay_cooldown: Duration::from_millis(200),
        }
    }
}

/// The periodic producer task
///
/// Owns no session state of its own — it orchestrates the sampler, the
/// record log, and the transport according to the [`TelemetrySession`].
pub struct ProducerLoop {
    session: Arc<TelemetrySession>,
    log: RecordLog,
    transport: Arc<dyn Transport>,
    sampler: Box<dyn SampleSource>,
    timing: ProducerTiming,
    produced: u64,
    live_sent: u64,
    persisted: u64,
}

impl ProducerLoop {
    pub fn new(
        session: Arc<TelemetrySession>,
        log: RecordLog,
        transport: Arc<dyn Transport>,
        sampler: Box<dyn SampleSource>,
        timing: ProducerTiming,
    ) -> Self {
        Self {
            session,
            log,
            transport,
            sampler,
            timing,
            produced: 0,
            live_sent: 0,
            persisted: 0,
        }
    }

    /// Run the loop forever at the configured interval
    ///
    /// Ticks never overlap: the next tick starts only after the previous
    /// one (including a full backlog replay) finished. Callers race this
    /// future against their shutdown signal.
    pub async fn run(&mut self) {
        let mut ticker = interval(self.timing.sample_interval);
        info!(
            "Producer loop started (interval {:?})",
            self.timing.sample_interval
        );

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One producer tick
    ///
    /// Drains a pending backlog request first; a replay tick produces no
    /// live/persisted sample of its own.
    pub async fn tick(&mut self) {
        if self.session.take_backlog_request() {
            self.replay_backlog().await;
            return;
        }

        let record = self.sampler.produce();
        self.produced += 1;
        self.deliver(&record).await;

        if self.produced % LOG_INTERVAL_SAMPLES == 0 {
            info!(
                "Produced {} samples ({} live, {} persisted)",
                self.produced, self.live_sent, self.persisted
            );
        }
    }

    /// Apply the live/persist decision to one record
    ///
    /// Live-subscribed: attempt a live notify, falling back to the log if
    /// the transport errors. Not subscribed: persist unconditionally. An
    /// append failure loses that sample for this tick — there is no retry
    /// queue — but is logged and does not stop the loop.
    async fn deliver(&mut self, record: &Record) {
        if self.session.live_subscribed() {
            match self.transport.notify(Channel::Live, &record.encode()).await {
                Ok(()) => {
                    self.live_sent += 1;
                    debug!("Live notify seq={}", record.seq);
                    return;
                }
                Err(e) => {
                    warn!("Live notify failed ({}), persisting seq={}", e, record.seq);
                }
            }
        }

        match self.log.append(record) {
            Ok(()) => self.persisted += 1,
            Err(e) => warn!("Failed to persist record seq={}: {}", record.seq, e),
        }
    }

    /// Replay the persisted backlog to the subscribed peer
    ///
    /// Sends a snapshot of the log taken at session start, oldest first.
    /// A failed read skips that one record; a failed notify aborts the
    /// remaining loop on the assumption the link is down. The in-progress
    /// flag is cleared on every exit path, followed by a short cool-down so
    /// an in-flight burst can drain.
    async fn replay_backlog(&mut self) {
        self.session.enter_backlog();

        let total = self.log.count();
        info!("Backlog replay started: {} records", total);

        let mut sent = 0u64;
        for index in 0..total {
            if !self.session.backlog_subscribed() {
                warn!("Backlog channel not subscribed, aborting replay at {}", index);
                break;
            }

            let record = match self.log.read(index) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    warn!("Record {} missing during replay, skipping", index);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to read record {}: {}, skipping", index, e);
                    continue;
                }
            };

            if let Err(e) = self
                .transport
                .notify(Channel::Backlog, &record.encode())
                .await
            {
                warn!("Backlog notify failed at {} ({}), aborting replay", index, e);
                break;
            }
            sent += 1;

            sleep(self.timing.replay_pacing).await;
        }

        self.session.exit_backlog();
        info!("Backlog replay finished: {}/{} records sent", sent, total);

        sleep(self.timing.replay_cooldown).await;
    }
}
