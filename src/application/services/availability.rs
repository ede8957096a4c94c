//! Operator availability service module
//!
//! This module resolves, for any (operator, date, shift), whether the
//! operator is working and during which wall-clock window, given the base
//! shift schedule and recorded unavailability. Overlapping unavailability
//! records are merged at read time; partial-day records subtract their clock
//! range from each affected shift independently.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::application::services::calendar;
use crate::domain::entities::{Resource, ResourceRole, ResourceUnavailability};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::Shift;

/// How far `next_available_day` scans before giving up
const SCAN_LIMIT_DAYS: i64 = 366;

/// Read-only snapshot answering operator availability queries
///
/// A snapshot is taken at pass start and refreshed between operations; the
/// placement loop never sees unavailability writes happening mid-operation.
pub struct AvailabilityService {
    roster: Vec<Resource>,
    records: Vec<ResourceUnavailability>,
}

impl AvailabilityService {
    /// Creates a service over an explicit roster and record set
    ///
    /// # Arguments
    ///
    /// * `roster` - Active resources in roster insertion order
    /// * `records` - Unavailability records covering the queried horizon
    pub fn new(roster: Vec<Resource>, records: Vec<ResourceUnavailability>) -> Self {
        Self { roster, records }
    }

    /// Snapshots the roster and unavailability records from a store
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `from` - First date of the queried horizon (inclusive)
    /// * `to` - Last date of the queried horizon (inclusive)
    pub fn snapshot<S: SchedulingStore + ?Sized>(
        store: &S,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self> {
        let roster = store.active_resources()?;
        let records = store.unavailability_overlapping(from, to)?;
        debug!(
            roster = roster.len(),
            records = records.len(),
            "availability snapshot taken"
        );
        Ok(Self { roster, records })
    }

    /// The active roster, in insertion order
    pub fn roster(&self) -> &[Resource] {
        &self.roster
    }

    /// Looks up a resource by id
    pub fn resource(&self, resource_id: u64) -> Option<&Resource> {
        self.roster.iter().find(|r| r.id == resource_id)
    }

    /// Resolves the working window of an operator on a date and shift
    ///
    /// Resolution order: inactive or unknown operator -> empty; non-working
    /// day -> empty; shift outside the operator's schedule -> empty; a
    /// full-day record affecting the shift -> empty; partial-day records
    /// subtract their clock ranges from the shift window; otherwise the full
    /// shift window.
    ///
    /// When the subtraction splits the window, the largest contiguous
    /// remainder wins; on a tie, the piece anchored at the shift start.
    ///
    /// # Returns
    ///
    /// The absolute [start, end) window, or None when the operator is off
    pub fn working_window(
        &self,
        resource_id: u64,
        date: NaiveDate,
        shift: Shift,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let resource = self.resource(resource_id)?;
        if !resource.active {
            return None;
        }
        if !calendar::is_working_day(date) {
            return None;
        }
        if !resource.works_shift(shift) {
            return None;
        }

        let (window_start, window_end) = calendar::shift_window(date, shift);
        let mut blocked: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();

        for record in &self.records {
            if !record.covers_resource(resource_id)
                || !record.covers_date(date)
                || !record.affects_shift(shift)
            {
                continue;
            }
            if !record.partial {
                return None;
            }
            if let Some(range) = partial_range(record, date, shift, window_start, window_end) {
                blocked.push(range);
            }
        }

        if blocked.is_empty() {
            return Some((window_start, window_end));
        }

        largest_remainder(window_start, window_end, &mut blocked)
    }

    /// Whether an operator is working at an instant on the given shift
    pub fn is_available(&self, resource_id: u64, instant: DateTime<Utc>, shift: Shift) -> bool {
        let (date, window_shift, _, _) = match calendar::window_containing(instant) {
            Some(window) => window,
            None => return false,
        };
        if window_shift != shift {
            return false;
        }
        match self.working_window(resource_id, date, shift) {
            Some((start, end)) => instant >= start && instant < end,
            None => false,
        }
    }

    /// Working windows of an operator across both shifts of a date
    pub fn day_windows(&self, resource_id: u64, date: NaiveDate) -> Vec<(Shift, DateTime<Utc>, DateTime<Utc>)> {
        Shift::both()
            .into_iter()
            .filter_map(|shift| {
                self.working_window(resource_id, date, shift)
                    .map(|(start, end)| (shift, start, end))
            })
            .collect()
    }

    /// Filters the roster to operators available on (date, shift)
    ///
    /// # Arguments
    ///
    /// * `date` - Calendar date of the shift
    /// * `shift` - Which shift
    /// * `role` - When set, only operators with this role
    /// * `work_centers` - When set, only operators qualified on at least one
    ///   of these machines
    ///
    /// # Returns
    ///
    /// Matching operators in roster insertion order
    pub fn available_operators(
        &self,
        date: NaiveDate,
        shift: Shift,
        role: Option<ResourceRole>,
        work_centers: Option<&[String]>,
    ) -> Vec<&Resource> {
        self.roster
            .iter()
            .filter(|resource| match role {
                Some(wanted) => resource.role == wanted,
                None => true,
            })
            .filter(|resource| match work_centers {
                Some(centers) => centers.iter().any(|c| resource.qualified_on(c)),
                None => true,
            })
            .filter(|resource| self.working_window(resource.id, date, shift).is_some())
            .collect()
    }

    /// First working day at or after `from` with a non-empty window
    ///
    /// # Returns
    ///
    /// The date, or None for unknown/inactive operators and operators with
    /// no window inside the scan limit
    pub fn next_available_day(&self, resource_id: u64, from: NaiveDate) -> Option<NaiveDate> {
        let mut date = from;
        for _ in 0..SCAN_LIMIT_DAYS {
            if Shift::both()
                .into_iter()
                .any(|shift| self.working_window(resource_id, date, shift).is_some())
            {
                return Some(date);
            }
            date += Duration::days(1);
        }
        None
    }

    /// Sums an operator's working hours clipped to an instant range
    ///
    /// # Arguments
    ///
    /// * `resource_id` - The operator
    /// * `from` - Range start (inclusive)
    /// * `to` - Range end (exclusive)
    pub fn available_hours_in_range(
        &self,
        resource_id: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> f64 {
        let mut minutes = 0i64;
        let mut date = calendar::local_date(from) - Duration::days(1);
        let last = calendar::local_date(to);
        while date <= last {
            for shift in Shift::both() {
                if let Some((start, end)) = self.working_window(resource_id, date, shift) {
                    let clipped_start = start.max(from);
                    let clipped_end = end.min(to);
                    if clipped_start < clipped_end {
                        minutes += (clipped_end - clipped_start).num_minutes();
                    }
                }
            }
            date += Duration::days(1);
        }
        minutes as f64 / 60.0
    }
}

/// Maps a partial record's clock range onto a shift window
///
/// Clock times are interpreted on the covered date; for Shift 2, times
/// before 03:00 fall in the after-midnight tail and are interpreted on the
/// following calendar day. The result is clipped to the shift window.
fn partial_range(
    record: &ResourceUnavailability,
    date: NaiveDate,
    shift: Shift,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start_time, end_time) = match (record.start_time, record.end_time) {
        (Some(start), Some(end)) => (start, end),
        // a partial record without clock times blocks the whole shift
        _ => return Some((window_start, window_end)),
    };

    let tail_cutoff = calendar::shift_start_time(Shift::First);
    let day_of = |time: chrono::NaiveTime| -> NaiveDate {
        if shift == Shift::Second && time < tail_cutoff {
            date + Duration::days(1)
        } else {
            date
        }
    };

    let range_start = calendar::localize_on(day_of(start_time), start_time);
    let range_end = calendar::localize_on(day_of(end_time), end_time);

    let clipped_start = range_start.max(window_start);
    let clipped_end = range_end.min(window_end);
    if clipped_start < clipped_end {
        Some((clipped_start, clipped_end))
    } else {
        None
    }
}

/// Subtracts merged blocked ranges from a window and picks the remainder
///
/// Returns the largest contiguous remaining piece; a tie goes to the piece
/// anchored at the window (shift) start. None when nothing remains.
fn largest_remainder(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    blocked: &mut Vec<(DateTime<Utc>, DateTime<Utc>)>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    blocked.sort_by_key(|&(start, _)| start);

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for &(start, end) in blocked.iter() {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut pieces: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    let mut cursor = window_start;
    for (start, end) in merged {
        if start > cursor {
            pieces.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < window_end {
        pieces.push((cursor, window_end));
    }

    pieces
        .into_iter()
        .max_by_key(|&(start, end)| ((end - start).num_minutes(), std::cmp::Reverse(start)))
}
