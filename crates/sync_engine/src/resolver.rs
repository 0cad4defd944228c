//! Triple-buffer sequence resolution.
//!
//! The device updates its three sample slots round-robin, one slot per new
//! sample. A report therefore repeats up to two samples already delivered by
//! the previous report, and the slot holding the oldest sample moves around.
//! Only the sequence numbers order the slots.

use contracts::{RawSample, IMU_SLOTS};

use crate::SequenceCursor;

/// Index of the slot holding the oldest sample
///
/// `a == b + 2 (mod 256)` means `b` sits two steps behind `a`.
#[inline]
pub fn oldest_slot(seqs: [u8; IMU_SLOTS]) -> usize {
    if seqs[0] == seqs[1].wrapping_add(2) {
        1
    } else if seqs[1] == seqs[2].wrapping_add(2) {
        2
    } else {
        0
    }
}

/// Slot visitation order, oldest first
#[inline]
pub fn visit_order(seqs: [u8; IMU_SLOTS]) -> [usize; IMU_SLOTS] {
    let oldest = oldest_slot(seqs);
    [
        oldest,
        (oldest + 1) % IMU_SLOTS,
        (oldest + 2) % IMU_SLOTS,
    ]
}

/// New samples found in one report, oldest to newest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    samples: [RawSample; IMU_SLOTS],
    len: usize,

    /// Cursor after accepting every new sample
    pub cursor: SequenceCursor,

    /// Slots skipped as duplicates
    pub stale: usize,

    /// Sequence numbers skipped between accepted samples
    pub lost: u32,
}

impl Resolution {
    /// Accepted samples in visitation order
    pub fn samples(&self) -> &[RawSample] {
        &self.samples[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a RawSample;
    type IntoIter = std::slice::Iter<'a, RawSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples().iter()
    }
}

/// Select the samples of one report that are new relative to `cursor`
///
/// Walks all three slots round-robin starting at the oldest. Stale slots are
/// skipped; every new slot is accepted and advances the cursor, so the
/// returned cursor is the newest accepted sequence number. When every slot is
/// stale the result is empty and the cursor is unchanged.
pub fn resolve(samples: &[RawSample; IMU_SLOTS], cursor: SequenceCursor) -> Resolution {
    let seqs = [samples[0].seq, samples[1].seq, samples[2].seq];

    let mut resolution = Resolution {
        samples: [RawSample::default(); IMU_SLOTS],
        len: 0,
        cursor,
        stale: 0,
        lost: 0,
    };

    for slot in visit_order(seqs) {
        let sample = samples[slot];

        if resolution.cursor.is_stale(sample.seq) {
            resolution.stale += 1;
            continue;
        }

        resolution.lost += resolution.cursor.gap_to(sample.seq);
        resolution.samples[resolution.len] = sample;
        resolution.len += 1;
        resolution.cursor = SequenceCursor::At(sample.seq);
    }

    resolution
}
