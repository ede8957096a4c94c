//! Schedule entry entity module
//!
//! This module defines the ScheduleEntry entity: one committed, immutable
//! time interval on a machine, normally staffed by exactly one operator.
//! A multi-chunk operation produces several entries sharing one machine and
//! one operator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Shift;

/// Lifecycle status of a schedule entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Scheduled,
    InProgress,
    Complete,
    Cancelled,
}

/// One committed interval of work on a machine
///
/// Entries are immutable once written: the scheduler only ever appends new
/// entries or deletes a job's entries wholesale. `resource_id` is None only
/// for OUTSOURCE entries, which also ignore the single-shift containment
/// rule and carry shift 1 by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Unique entry identifier, assigned by the store on append
    pub id: u64,
    /// The job this entry belongs to
    pub job_id: u64,
    /// Routing sequence of the operation this entry is a chunk of
    pub sequence: u32,
    /// Stable id of the machine the work runs on
    pub machine_id: String,
    /// Assigned operator; None for OUTSOURCE work
    pub resource_id: Option<u64>,
    /// Interval start (absolute instant)
    pub start: DateTime<Utc>,
    /// Interval end (absolute instant, strictly after start)
    pub end: DateTime<Utc>,
    /// Shift whose window contains the interval
    pub shift: Shift,
    /// Lifecycle status
    pub status: EntryStatus,
}

impl ScheduleEntry {
    /// Duration of the interval in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Checks whether two half-open intervals [start, end) overlap
    ///
    /// # Arguments
    ///
    /// * `other` - The entry to compare against
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks whether this entry overlaps an arbitrary half-open interval
    ///
    /// # Arguments
    ///
    /// * `from` - Interval start (inclusive)
    /// * `to` - Interval end (exclusive)
    pub fn overlaps_interval(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && from < self.end
    }
}
