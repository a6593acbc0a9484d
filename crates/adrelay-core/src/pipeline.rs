//! Ordered event hand-off.
//!
//! Producers (provider callback threads) push into an unbounded channel and
//! never block. The receiving side is the delivery context: either the
//! consumer's own `recv().await` loop or a task spawned by
//! [`EventStream::spawn_delivery`]. The channel is FIFO, and every event for
//! one ad is sent while that ad's handle lock is held, so per-ad order is
//! preserved end to end.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::event::AdEvent;

#[derive(Debug, Default)]
struct Counters {
    emitted: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Pipeline health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Events accepted into the channel
    pub emitted: u64,
    /// Events handed to a sink by a delivery task
    pub delivered: u64,
    /// Stale or duplicate provider signals discarded before emission
    pub dropped: u64,
}

/// Producer side. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventPipeline {
    tx: mpsc::UnboundedSender<AdEvent>,
    counters: Arc<Counters>,
}

impl EventPipeline {
    /// Create a pipeline and its single consumer stream.
    pub fn channel() -> (EventPipeline, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        (
            EventPipeline {
                tx,
                counters: counters.clone(),
            },
            EventStream { rx, counters },
        )
    }

    /// Hand an event to the delivery context. Never blocks.
    ///
    /// Returns false if the consumer stream is gone.
    pub fn emit(&self, event: AdEvent) -> bool {
        let ad_id = event.ad_id.clone();
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(()) => {
                self.counters.emitted.fetch_add(1, Ordering::Relaxed);
                debug!(ad_id = %ad_id, event = %event_type, "event emitted");
                true
            }
            Err(_) => {
                warn!(ad_id = %ad_id, event = %event_type, "event stream closed, event lost");
                false
            }
        }
    }

    /// Count a provider signal that was discarded.
    pub(crate) fn record_dropped(&self) {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether the consumer stream has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            emitted: self.counters.emitted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Consumer side of the pipeline.
///
/// Ends once every producer is gone, i.e. after the manager and all
/// outstanding callback objects are dropped.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<AdEvent>,
    counters: Arc<Counters>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<AdEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<AdEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive for a dedicated delivery thread.
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<AdEvent> {
        self.rx.blocking_recv()
    }

    /// Everything currently queued, without waiting.
    pub fn drain(&mut self) -> Vec<AdEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Spawn a task that delivers events to `sink`, one at a time, in order.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_delivery<S: AdEventSink>(self, sink: S) -> DeliveryHandle {
        let mut stream = self;
        let handle = tokio::spawn(async move {
            let mut count = 0u64;
            while let Some(event) = stream.rx.recv().await {
                sink.deliver(event);
                stream.counters.delivered.fetch_add(1, Ordering::Relaxed);
                count += 1;
            }
            debug!(delivered = count, "event delivery finished");
            count
        });
        DeliveryHandle { handle }
    }
}

impl Stream for EventStream {
    type Item = AdEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<AdEvent>> {
        self.rx.poll_recv(cx)
    }
}

/// Event consumer.
pub trait AdEventSink: Send + Sync + 'static {
    fn deliver(&self, event: AdEvent);
}

impl<F> AdEventSink for F
where
    F: Fn(AdEvent) + Send + Sync + 'static,
{
    fn deliver(&self, event: AdEvent) {
        self(event)
    }
}

/// Running delivery task.
#[derive(Debug)]
pub struct DeliveryHandle {
    handle: JoinHandle<u64>,
}

impl DeliveryHandle {
    /// Wait for the stream to end. Returns the number of delivered events.
    pub async fn join(self) -> u64 {
        self.handle.await.unwrap_or(0)
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
