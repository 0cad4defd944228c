//! Calibrated sample emission with backpressure handling

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{CalibratedSample, DropPolicy};
use tracing::{trace, warn};

use crate::config::{AcquisitionMetrics, BackpressureConfig};

/// Result of handing one sample to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// A sample was discarded; with `DropOldest` the new one was still queued
    Dropped,
    Closed,
}

/// Producer half of the calibrated sample channel
///
/// With `DropOldest` the sink keeps its own receiver handle so it can evict
/// the head of a full queue before retrying.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: Sender<CalibratedSample>,
    evict: Option<Receiver<CalibratedSample>>,
    drop_policy: DropPolicy,
}

impl SampleSink {
    /// Create a bounded channel, returning the sink and the consumer end
    pub fn bounded(config: &BackpressureConfig) -> (Self, Receiver<CalibratedSample>) {
        let (tx, rx) = async_channel::bounded(config.channel_capacity.max(1));
        let evict = match config.drop_policy {
            DropPolicy::DropNewest => None,
            DropPolicy::DropOldest => Some(rx.clone()),
        };

        let sink = Self {
            tx,
            evict,
            drop_policy: config.drop_policy,
        };
        (sink, rx)
    }

    /// Consumer handles alive, excluding the sink's own eviction handle
    fn consumers(&self) -> usize {
        self.tx
            .receiver_count()
            .saturating_sub(usize::from(self.evict.is_some()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed() || self.consumers() == 0
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Send one sample, applying the drop policy when the queue is full
    #[inline]
    pub fn send(
        &self,
        sample: CalibratedSample,
        metrics: &Arc<AcquisitionMetrics>,
        device: &str,
    ) -> SendOutcome {
        if self.is_closed() {
            return SendOutcome::Closed;
        }

        let outcome = match self.tx.try_send(sample) {
            Ok(()) => {
                trace!(device = %device, seq = sample.seq, "sample sent");
                SendOutcome::Sent
            }
            Err(TrySendError::Full(sample)) => {
                metrics.record_dropped();
                match (&self.evict, self.drop_policy) {
                    (Some(evict), DropPolicy::DropOldest) => {
                        let evicted = evict.try_recv().ok().map(|s| s.seq);
                        trace!(device = %device, seq = sample.seq, evicted = ?evicted, "sample dropped (oldest)");
                        if self.tx.try_send(sample).is_err() {
                            metrics.record_dropped();
                        }
                    }
                    _ => {
                        trace!(device = %device, seq = sample.seq, "sample dropped (newest)");
                    }
                }
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                warn!(device = %device, "sample channel closed");
                SendOutcome::Closed
            }
        };

        metrics.update_queue_len(self.tx.len());
        outcome
    }
}
