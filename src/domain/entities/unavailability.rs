//! Resource unavailability entity module
//!
//! This module defines recorded unavailability periods for operators:
//! vacations, appointments, and other absences. A record may cover several
//! operators, span an inclusive date range, affect one or both shifts, and
//! optionally carve out only a clock-time range of each affected shift.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Shift;

/// A recorded period during which one or more operators are unavailable
///
/// Full-day records remove the affected shifts entirely on every covered
/// date. Partial-day records subtract the [start_time, end_time) clock range
/// from each affected shift's window independently. Overlapping records for
/// the same operator are merged at read time by the availability service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUnavailability {
    /// Unique record identifier
    pub id: u64,
    /// Operators this record applies to
    pub resource_ids: Vec<u64>,
    /// First affected date (inclusive)
    pub start_date: NaiveDate,
    /// Last affected date (inclusive)
    pub end_date: NaiveDate,
    /// When true, only the clock range below is unavailable
    pub partial: bool,
    /// Start of the unavailable clock range (partial records only)
    pub start_time: Option<NaiveTime>,
    /// End of the unavailable clock range (partial records only)
    pub end_time: Option<NaiveTime>,
    /// Shifts affected on each covered date
    pub shifts: Vec<Shift>,
    /// Why the operators are out (e.g. "vacation", "medical")
    pub reason: String,
    /// Free-form notes
    pub notes: Option<String>,
}

impl ResourceUnavailability {
    /// Creates a full-day record covering both shifts
    ///
    /// # Arguments
    ///
    /// * `id` - Unique record identifier
    /// * `resource_ids` - Affected operators
    /// * `start_date` - First affected date (inclusive)
    /// * `end_date` - Last affected date (inclusive)
    /// * `reason` - Why the operators are out
    pub fn full_day(
        id: u64,
        resource_ids: Vec<u64>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> Self {
        Self {
            id,
            resource_ids,
            start_date,
            end_date,
            partial: false,
            start_time: None,
            end_time: None,
            shifts: vec![Shift::First, Shift::Second],
            reason: reason.to_string(),
            notes: None,
        }
    }

    /// Checks whether this record applies to an operator
    pub fn covers_resource(&self, resource_id: u64) -> bool {
        self.resource_ids.contains(&resource_id)
    }

    /// Checks whether this record covers a date
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Checks whether this record affects a shift
    pub fn affects_shift(&self, shift: Shift) -> bool {
        self.shifts.contains(&shift)
    }

    /// Checks whether this record overlaps an inclusive date range
    ///
    /// # Arguments
    ///
    /// * `from` - Range start (inclusive)
    /// * `to` - Range end (inclusive)
    pub fn overlaps_range(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_date <= to && self.end_date >= from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_covers_date_inclusive() {
        let rec = ResourceUnavailability::full_day(
            1,
            vec![10],
            date(2025, 6, 2),
            date(2025, 6, 4),
            "vacation",
        );
        assert!(rec.covers_date(date(2025, 6, 2)));
        assert!(rec.covers_date(date(2025, 6, 4)));
        assert!(!rec.covers_date(date(2025, 6, 5)));
    }

    #[test]
    fn test_overlaps_range() {
        let rec = ResourceUnavailability::full_day(
            1,
            vec![10],
            date(2025, 6, 2),
            date(2025, 6, 4),
            "vacation",
        );
        assert!(rec.overlaps_range(date(2025, 6, 4), date(2025, 6, 10)));
        assert!(rec.overlaps_range(date(2025, 5, 30), date(2025, 6, 2)));
        assert!(!rec.overlaps_range(date(2025, 6, 5), date(2025, 6, 10)));
    }

    #[test]
    fn test_full_day_affects_both_shifts() {
        let rec = ResourceUnavailability::full_day(
            1,
            vec![10],
            date(2025, 6, 2),
            date(2025, 6, 2),
            "medical",
        );
        assert!(rec.affects_shift(Shift::First));
        assert!(rec.affects_shift(Shift::Second));
        assert!(rec.covers_resource(10));
        assert!(!rec.covers_resource(11));
    }
}
