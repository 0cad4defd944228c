//! # Sync Engine
//!
//! Sequence resolution for the headset IMU triple buffer.
//!
//! Responsibilities:
//! - Locate the oldest of the three sample slots in a report
//! - Drop samples already delivered by an earlier report
//! - Track the session cursor and count lost samples
//!
//! ## Example
//!
//! ```
//! use contracts::RawSample;
//! use sync_engine::{SequenceCursor, SequenceTracker};
//!
//! let report = [11u8, 9, 10].map(|seq| RawSample { seq, ..RawSample::default() });
//!
//! let mut tracker = SequenceTracker::new();
//! let resolution = tracker.push(&report);
//! assert_eq!(resolution.len(), 3);
//! assert_eq!(tracker.cursor(), SequenceCursor::new(11));
//!
//! // the same report again yields nothing new
//! assert!(tracker.push(&report).is_empty());
//! ```

mod cursor;
mod resolver;
mod tracker;

pub use cursor::{SequenceCursor, STALE_WINDOW};
pub use resolver::{oldest_slot, resolve, visit_order, Resolution};
pub use tracker::{SequenceStats, SequenceTracker};
