//! Stateful sequence tracking for one acquisition session.

use contracts::{RawSample, IMU_SLOTS};
use tracing::trace;

use crate::resolver::{resolve, Resolution};
use crate::SequenceCursor;

/// Running totals kept by a [`SequenceTracker`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceStats {
    pub reports: u64,
    pub accepted: u64,
    pub stale: u64,
    pub lost: u64,
}

/// Owns the session cursor and feeds each report through [`resolve`]
#[derive(Debug, Default)]
pub struct SequenceTracker {
    cursor: SequenceCursor,
    stats: SequenceStats,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one report and advance the cursor
    pub fn push(&mut self, samples: &[RawSample; IMU_SLOTS]) -> Resolution {
        let resolution = resolve(samples, self.cursor);

        self.stats.reports += 1;
        self.stats.accepted += resolution.len() as u64;
        self.stats.stale += resolution.stale as u64;
        self.stats.lost += u64::from(resolution.lost);

        metrics::counter!("imu_samples_accepted_total").increment(resolution.len() as u64);
        metrics::counter!("imu_samples_stale_total").increment(resolution.stale as u64);
        if resolution.lost > 0 {
            metrics::counter!("imu_samples_lost_total").increment(u64::from(resolution.lost));
        }

        if let Some(last) = resolution.cursor.last() {
            metrics::gauge!("imu_last_sequence").set(f64::from(last));
        }

        trace!(
            cursor = %self.cursor,
            next = %resolution.cursor,
            accepted = resolution.len(),
            stale = resolution.stale,
            lost = resolution.lost,
            "report resolved"
        );

        self.cursor = resolution.cursor;
        resolution
    }

    pub fn cursor(&self) -> SequenceCursor {
        self.cursor
    }

    pub fn stats(&self) -> SequenceStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn report(seqs: [u8; 3]) -> [RawSample; 3] {
        seqs.map(|seq| RawSample {
            seq,
            ..RawSample::default()
        })
    }

    #[test]
    fn test_push_advances_cursor() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.cursor(), SequenceCursor::Unset);

        let first = tracker.push(&report([2, 0, 1]));
        assert_eq!(first.len(), 3);
        assert_eq!(tracker.cursor(), SequenceCursor::new(2));

        let second = tracker.push(&report([2, 3, 1]));
        assert_eq!(second.len(), 1);
        assert_eq!(tracker.cursor(), SequenceCursor::new(3));

        let stats = tracker.stats();
        assert_eq!(stats.reports, 2);
        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.stale, 2);
        assert_eq!(stats.lost, 0);
    }

    #[test]
    fn test_random_stream_delivers_in_order() {
        let mut rng = rand::rng();
        let start: u8 = rng.random();
        let mut tracker = SequenceTracker::new();
        let mut newest = start.wrapping_add(2);
        let mut delivered: Vec<u8> = Vec::new();
        let mut expected_lost = 0u64;

        for _ in 0..500 {
            // device advances up to five samples between reports
            let step: u8 = rng.random_range(1..=5);
            newest = newest.wrapping_add(step);
            let slot = usize::from(newest) % 3;
            let mut seqs = [0u8; 3];
            for back in 0..3u8 {
                seqs[(slot + 3 - usize::from(back)) % 3] = newest.wrapping_sub(back);
            }
            let resolution = tracker.push(&report(seqs));
            delivered.extend(resolution.samples().iter().map(|s| s.seq));
        }

        for pair in delivered.windows(2) {
            let delta = pair[1].wrapping_sub(pair[0]);
            assert!(delta >= 1, "duplicate delivery {pair:?}");
            expected_lost += u64::from(delta - 1);
        }
        assert_eq!(tracker.stats().lost, expected_lost);
        assert_eq!(tracker.cursor(), SequenceCursor::new(newest));
    }
}
