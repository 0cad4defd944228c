//! Session sequence cursor.

use std::fmt;

/// Number of most recently accepted sequence numbers treated as duplicates
///
/// A report repeats at most the two samples preceding its newest one, so the
/// newest accepted number and the two before it are stale.
pub const STALE_WINDOW: u8 = 3;

/// Last accepted sequence number
///
/// `Unset` before the first sample is accepted; in that state no sequence
/// number is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SequenceCursor {
    #[default]
    Unset,
    At(u8),
}

impl SequenceCursor {
    /// Cursor positioned at `last`
    pub const fn new(last: u8) -> Self {
        Self::At(last)
    }

    /// Last accepted sequence number, if any
    pub fn last(self) -> Option<u8> {
        match self {
            Self::Unset => None,
            Self::At(last) => Some(last),
        }
    }

    /// Whether `seq` duplicates one of the recently accepted samples
    #[inline]
    pub fn is_stale(self, seq: u8) -> bool {
        match self {
            Self::Unset => false,
            Self::At(last) => last.wrapping_sub(seq) < STALE_WINDOW,
        }
    }

    /// Sequence numbers skipped between the cursor and `seq`
    #[inline]
    pub fn gap_to(self, seq: u8) -> u32 {
        match self {
            Self::Unset => 0,
            Self::At(last) => u32::from(seq.wrapping_sub(last).wrapping_sub(1)),
        }
    }
}

impl fmt::Display for SequenceCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::At(last) => write!(f, "{last}"),
        }
    }
}
