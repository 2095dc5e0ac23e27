use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use scbi_frame::{decode_frame, PayloadError, RawFrame};
use scbi_transport::{CanFrame, FrameSource, Received, TransportError};
use tracing::{debug, error, info, trace, warn};

use crate::publisher::Publisher;
use crate::queue::{ParameterQueue, DEFAULT_QUEUE_CAPACITY};

/// Configuration for the dispatch loop.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Upper bound on one wait for bus traffic.
    pub receive_timeout: Duration,
    /// Maximum records held between decode and publish.
    pub queue_capacity: usize,
    /// Publish records still queued when the loop stops.
    pub drain_on_shutdown: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_secs(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            drain_on_shutdown: true,
        }
    }
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// No frame within the receive timeout.
    Idle,
    /// A frame was decoded and this many records were published.
    Published(usize),
    /// A frame arrived but was dropped before decoding produced records.
    Discarded,
    /// The read failed; the loop keeps going.
    ReadFailed,
    /// The source reported shutdown. No further cycles should run.
    Shutdown,
}

/// Counters accumulated over the lifetime of a [`Bridge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub frames: u64,
    pub published: u64,
    pub publish_errors: u64,
    pub discarded: u64,
    pub read_errors: u64,
    pub idle_cycles: u64,
    pub dropped: u64,
}

impl fmt::Display for BridgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} published={} publish_errors={} ",
            self.frames, self.published, self.publish_errors
        )?;
        write!(
            f,
            "discarded={} read_errors={} idle={} dropped={}",
            self.discarded, self.read_errors, self.idle_cycles, self.dropped
        )
    }
}

/// Single-threaded receive → decode → publish loop.
///
/// Each [`step`](Bridge::step) waits up to the receive timeout for one
/// frame, decodes it, publishes every resulting record in arrival order
/// and then gives the publisher one maintenance call.
pub struct Bridge<S, P> {
    source: S,
    publisher: P,
    queue: ParameterQueue,
    config: BridgeConfig,
    start: SystemTime,
    stats: BridgeStats,
}

impl<S: FrameSource, P: Publisher> Bridge<S, P> {
    /// Create a bridge with default configuration.
    pub fn new(source: S, publisher: P) -> Self {
        Self::with_config(source, publisher, BridgeConfig::default())
    }

    /// Create a bridge. Frame timestamps are reported relative to now.
    pub fn with_config(source: S, publisher: P, config: BridgeConfig) -> Self {
        Self {
            source,
            publisher,
            queue: ParameterQueue::new(config.queue_capacity),
            config,
            start: SystemTime::now(),
            stats: BridgeStats::default(),
        }
    }

    /// Run one iteration of the loop.
    pub fn step(&mut self) -> Cycle {
        let cycle = match self.source.try_receive(self.config.receive_timeout) {
            Ok(Received::Frame(frame)) => self.process(&frame),
            Ok(Received::Timeout) => {
                self.stats.idle_cycles += 1;
                Cycle::Idle
            }
            Err(TransportError::Shutdown) => return Cycle::Shutdown,
            Err(TransportError::Malformed(err)) => {
                error!(error = %err, "discarding malformed CAN frame");
                self.stats.discarded += 1;
                Cycle::Discarded
            }
            Err(err) => {
                error!(error = %err, "CAN read failed");
                self.stats.read_errors += 1;
                Cycle::ReadFailed
            }
        };

        if let Err(err) = self.publisher.maintain() {
            warn!(error = %err, "publisher maintenance failed");
        }
        cycle
    }

    /// Step until `running` is cleared or the source shuts down, then
    /// finish with [`shutdown`](Bridge::shutdown).
    pub fn run(&mut self, running: &AtomicBool) -> BridgeStats {
        info!(
            timeout_ms = self.config.receive_timeout.as_millis() as u64,
            queue_capacity = self.queue.capacity(),
            "bridge loop started"
        );
        while running.load(Ordering::SeqCst) {
            if self.step() == Cycle::Shutdown {
                debug!("frame source shut down");
                break;
            }
        }
        self.shutdown()
    }

    /// Publish anything still queued (if configured) and report totals.
    pub fn shutdown(&mut self) -> BridgeStats {
        if self.config.drain_on_shutdown && !self.queue.is_empty() {
            let flushed = self.flush();
            debug!(flushed, "drained parameter queue on shutdown");
        }
        self.stats.dropped = self.queue.dropped();
        info!(stats = %self.stats, "bridge loop stopped");
        self.stats
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            dropped: self.queue.dropped(),
            ..self.stats
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    fn process(&mut self, frame: &CanFrame) -> Cycle {
        self.stats.frames += 1;
        let raw = RawFrame::new(
            frame.id,
            frame.payload(),
            relative_ms(self.start, frame.timestamp),
        );
        trace!(frame = %raw, "frame received");

        let (_, decoded) = decode_frame(&raw);
        let records = match decoded {
            Ok(records) => records,
            Err(err @ PayloadError::ShortPayload { .. }) => {
                warn!(frame = %raw, error = %err, "short payload");
                self.stats.discarded += 1;
                return Cycle::Discarded;
            }
            Err(err @ PayloadError::UnsupportedVariant(_)) => {
                debug!(frame = %raw, error = %err, "skipping frame");
                self.stats.discarded += 1;
                return Cycle::Discarded;
            }
        };

        for record in records {
            if let Err(err) = self.queue.push(record) {
                debug!(frame = %raw, error = %err, "record not queued");
            }
        }
        Cycle::Published(self.flush())
    }

    fn flush(&mut self) -> usize {
        let mut published = 0;
        for record in self.queue.drain() {
            match self
                .publisher
                .publish(record.kind.as_str(), &record.name, record.value)
            {
                Ok(()) => {
                    trace!(%record, "published");
                    published += 1;
                    self.stats.published += 1;
                }
                Err(err) => {
                    warn!(%record, error = %err, "publish failed");
                    self.stats.publish_errors += 1;
                }
            }
        }
        published
    }
}

impl<S, P> fmt::Debug for Bridge<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("queued", &self.queue.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Milliseconds from `start` to `at`, clamped to zero for clock steps
/// backwards.
fn relative_ms(start: SystemTime, at: SystemTime) -> u64 {
    at.duration_since(start)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
