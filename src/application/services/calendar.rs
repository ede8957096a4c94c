//! Business calendar service module
//!
//! This module is the only home of calendar arithmetic in the crate: working
//! days, shift windows, and gap-skipping time advancement. The business week
//! runs Monday through Thursday; Friday, Saturday and Sunday are non-working.
//! Shift 1 spans [03:00, 15:00) local and Shift 2 spans [15:00, 03:00) of the
//! next calendar day, both interpreted in the fixed business timezone
//! (America/Chicago). A Shift 2 window belongs to the date it starts on.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::America::Chicago;
use chrono_tz::Tz;

use crate::domain::value_objects::Shift;

/// The fixed business timezone all wall-clock rules are defined in
pub const BUSINESS_TZ: Tz = Chicago;

/// Minutes in one shift window
pub const SHIFT_MINUTES: i64 = 12 * 60;

/// Local clock time at which a shift opens
pub fn shift_start_time(shift: Shift) -> NaiveTime {
    match shift {
        Shift::First => NaiveTime::from_hms_opt(3, 0, 0).expect("valid clock time"),
        Shift::Second => NaiveTime::from_hms_opt(15, 0, 0).expect("valid clock time"),
    }
}

/// Checks whether a calendar date is a working day (Monday through Thursday)
pub fn is_working_day(date: NaiveDate) -> bool {
    matches!(
        date.weekday(),
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu
    )
}

/// Resolves a local wall-clock time to an absolute instant
///
/// Ambiguous local times (fall-back transition) resolve to the earlier
/// instant; nonexistent local times (spring-forward gap, which never touches
/// the 03:00/15:00 shift boundaries) are pushed forward an hour.
fn localize(naive: NaiveDateTime) -> DateTime<Utc> {
    match BUSINESS_TZ.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        chrono::LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match BUSINESS_TZ.from_local_datetime(&shifted) {
                chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
                chrono::LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
                // two consecutive nonexistent hours cannot occur in this zone
                chrono::LocalResult::None => Utc.from_utc_datetime(&shifted),
            }
        }
    }
}

/// Converts an absolute instant to business-local time
pub fn to_local(instant: DateTime<Utc>) -> DateTime<Tz> {
    instant.with_timezone(&BUSINESS_TZ)
}

/// Resolves a local (date, clock time) pair to an absolute instant
pub fn localize_on(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    localize(date.and_time(time))
}

/// Business-local calendar date of an instant
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    to_local(instant).date_naive()
}

/// Absolute [start, end) window of a shift on a date
///
/// Shift 2's end lies on the next calendar day (15:00 through 03:00); the
/// window still belongs to `date` for every calendar rule.
///
/// # Arguments
///
/// * `date` - The calendar date the shift belongs to
/// * `shift` - Which shift
pub fn shift_window(date: NaiveDate, shift: Shift) -> (DateTime<Utc>, DateTime<Utc>) {
    match shift {
        Shift::First => {
            let start = localize(date.and_time(shift_start_time(Shift::First)));
            let end = localize(date.and_time(shift_start_time(Shift::Second)));
            (start, end)
        }
        Shift::Second => {
            let start = localize(date.and_time(shift_start_time(Shift::Second)));
            let end = localize((date + Duration::days(1)).and_time(shift_start_time(Shift::First)));
            (start, end)
        }
    }
}

/// Finds the working shift window containing an instant, if any
///
/// Checks the instant's local date and, for the after-midnight tail of
/// Shift 2, the preceding date. Only windows on working days count.
///
/// # Returns
///
/// (date, shift, window start, window end) of the containing window
pub fn window_containing(
    instant: DateTime<Utc>,
) -> Option<(NaiveDate, Shift, DateTime<Utc>, DateTime<Utc>)> {
    let today = local_date(instant);
    for date in [today - Duration::days(1), today] {
        if !is_working_day(date) {
            continue;
        }
        for shift in Shift::both() {
            let (start, end) = shift_window(date, shift);
            if instant >= start && instant < end {
                return Some((date, shift, start, end));
            }
        }
    }
    None
}

/// Returns `instant` if it is inside a working shift window, otherwise the
/// start of the next shift window on a working day
pub fn next_working_instant(instant: DateTime<Utc>) -> DateTime<Utc> {
    if window_containing(instant).is_some() {
        return instant;
    }
    next_shift_start(instant)
}

/// Start of the first working shift window opening after an instant
///
/// Strictly after: an instant sitting exactly on a window start resolves to
/// the following window.
pub fn next_shift_boundary(instant: DateTime<Utc>) -> DateTime<Utc> {
    let mut boundary = next_shift_start(instant);
    if boundary == instant {
        boundary = next_shift_start(instant + Duration::minutes(1));
    }
    boundary
}

/// Start of the first working shift window at or after an instant
fn next_shift_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let mut date = local_date(instant);
    // Walking forward day by day always terminates: at most three
    // consecutive non-working days exist (Fri, Sat, Sun).
    loop {
        if is_working_day(date) {
            for shift in Shift::both() {
                let (start, _) = shift_window(date, shift);
                if start >= instant {
                    return start;
                }
            }
        }
        date += Duration::days(1);
    }
}

/// Advances an instant by a number of working minutes, skipping non-working
/// gaps (Friday through Sunday, and any instant outside shift windows)
///
/// Consecutive shift windows on the same working day are contiguous
/// (Shift 1 ends where Shift 2 starts), so a working day contributes 24
/// uninterrupted hours from 03:00 to 03:00.
///
/// # Arguments
///
/// * `instant` - Starting instant
/// * `minutes` - Working minutes to advance by (non-negative)
pub fn advance_by_working_minutes(instant: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    let mut cursor = next_working_instant(instant);
    let mut remaining = minutes;
    while remaining > 0 {
        let (_, _, _, window_end) = match window_containing(cursor) {
            Some(window) => window,
            None => {
                cursor = next_working_instant(cursor);
                continue;
            }
        };
        let available = (window_end - cursor).num_minutes();
        if available >= remaining {
            return cursor + Duration::minutes(remaining);
        }
        remaining -= available;
        cursor = next_working_instant(window_end);
    }
    cursor
}

/// Shift 1 opening of the first working day strictly after the given
/// instant's local date
///
/// This is the scheduling time floor: work is never placed in the past and
/// never on the request day itself.
pub fn next_business_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let mut date = local_date(now) + Duration::days(1);
    while !is_working_day(date) {
        date += Duration::days(1);
    }
    shift_window(date, Shift::First).0
}

/// Monday local-midnight start of the business week containing an instant
pub fn week_start(instant: DateTime<Utc>) -> NaiveDate {
    let date = local_date(instant);
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_working_days_mon_through_thu() {
        assert!(is_working_day(date(2025, 6, 2))); // Mon
        assert!(is_working_day(date(2025, 6, 5))); // Thu
        assert!(!is_working_day(date(2025, 6, 6))); // Fri
        assert!(!is_working_day(date(2025, 6, 7))); // Sat
        assert!(!is_working_day(date(2025, 6, 8))); // Sun
    }

    #[test]
    fn test_shift_windows() {
        let (s1_start, s1_end) = shift_window(date(2025, 6, 3), Shift::First);
        assert_eq!(s1_start, local(2025, 6, 3, 3, 0));
        assert_eq!(s1_end, local(2025, 6, 3, 15, 0));

        let (s2_start, s2_end) = shift_window(date(2025, 6, 3), Shift::Second);
        assert_eq!(s2_start, local(2025, 6, 3, 15, 0));
        assert_eq!(s2_end, local(2025, 6, 4, 3, 0));
    }

    #[test]
    fn test_window_containing_after_midnight_belongs_to_prior_date() {
        // Wed 01:30 local sits in Tuesday's Shift 2
        let instant = local(2025, 6, 4, 1, 30);
        let (d, shift, _, _) = window_containing(instant).unwrap();
        assert_eq!(d, date(2025, 6, 3));
        assert_eq!(shift, Shift::Second);
    }

    #[test]
    fn test_friday_early_morning_is_thursday_shift_2() {
        let instant = local(2025, 6, 6, 1, 0);
        let (d, shift, _, _) = window_containing(instant).unwrap();
        assert_eq!(d, date(2025, 6, 5));
        assert_eq!(shift, Shift::Second);
    }

    #[test]
    fn test_next_working_instant_inside_window_is_identity() {
        let instant = local(2025, 6, 3, 10, 0);
        assert_eq!(next_working_instant(instant), instant);
    }

    #[test]
    fn test_next_working_instant_skips_weekend() {
        // Friday 10:00 jumps to Monday Shift 1
        let friday = local(2025, 6, 6, 10, 0);
        assert_eq!(next_working_instant(friday), local(2025, 6, 9, 3, 0));
    }

    #[test]
    fn test_next_working_instant_before_shift_1() {
        // Monday 01:00: Sunday is non-working so nothing contains it
        let early = local(2025, 6, 2, 1, 0);
        assert_eq!(next_working_instant(early), local(2025, 6, 2, 3, 0));
    }

    #[test]
    fn test_advance_within_one_shift() {
        let start = local(2025, 6, 3, 3, 0);
        assert_eq!(advance_by_working_minutes(start, 240), local(2025, 6, 3, 7, 0));
    }

    #[test]
    fn test_advance_across_weekend() {
        // Thursday 14:00 + 2h working: 1h to shift end boundary continues
        // into Shift 2 contiguously, so lands Thursday 16:00
        let start = local(2025, 6, 5, 14, 0);
        assert_eq!(advance_by_working_minutes(start, 120), local(2025, 6, 5, 16, 0));

        // Thursday 02:00 sits in Wednesday's Shift 2; 26 working hours
        // exhaust the rest of Thursday (through Fri 03:00) then resume Monday
        let start = local(2025, 6, 5, 2, 0);
        let advanced = advance_by_working_minutes(start, 26 * 60);
        assert_eq!(advanced, local(2025, 6, 9, 4, 0));
    }

    #[test]
    fn test_next_business_day_start() {
        // Monday request floors to Tuesday 03:00
        assert_eq!(next_business_day_start(local(2025, 6, 2, 10, 0)), local(2025, 6, 3, 3, 0));
        // Thursday request floors past the weekend to Monday 03:00
        assert_eq!(next_business_day_start(local(2025, 6, 5, 11, 0)), local(2025, 6, 9, 3, 0));
        // Saturday request also floors to Monday 03:00
        assert_eq!(next_business_day_start(local(2025, 6, 7, 8, 0)), local(2025, 6, 9, 3, 0));
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(local(2025, 6, 4, 12, 0)), date(2025, 6, 2));
        assert_eq!(week_start(local(2025, 6, 2, 3, 0)), date(2025, 6, 2));
    }

    #[test]
    fn test_next_shift_boundary_strictly_after() {
        let s1_start = local(2025, 6, 3, 3, 0);
        assert_eq!(next_shift_boundary(s1_start), local(2025, 6, 3, 15, 0));
        assert_eq!(next_shift_boundary(local(2025, 6, 3, 10, 0)), local(2025, 6, 3, 15, 0));
        assert_eq!(next_shift_boundary(local(2025, 6, 5, 16, 0)), local(2025, 6, 9, 3, 0));
    }

    proptest! {
        #[test]
        fn prop_advance_lands_inside_or_on_window_edge(
            day in 0i64..28, minute_of_day in 0i64..1440, minutes in 1i64..4000
        ) {
            let base = local(2025, 6, 2, 0, 0) + Duration::days(day) + Duration::minutes(minute_of_day);
            let advanced = advance_by_working_minutes(base, minutes);
            // The landing instant is the exclusive end of a chunk: either
            // inside a window or exactly on a window end.
            let ok = window_containing(advanced).is_some()
                || window_containing(advanced - Duration::minutes(1)).is_some();
            prop_assert!(ok);
        }

        #[test]
        fn prop_advance_is_monotonic(
            day in 0i64..28, minute_of_day in 0i64..1440, a in 1i64..2000, b in 1i64..2000
        ) {
            let base = local(2025, 6, 2, 0, 0) + Duration::days(day) + Duration::minutes(minute_of_day);
            let first = advance_by_working_minutes(base, a);
            let both = advance_by_working_minutes(base, a + b);
            prop_assert!(both > first);
        }

        #[test]
        fn prop_advance_conserves_working_minutes(
            day in 0i64..28, minute_of_day in 0i64..1440, a in 1i64..2000, b in 1i64..2000
        ) {
            // Advancing in two steps equals advancing in one
            let base = local(2025, 6, 2, 0, 0) + Duration::days(day) + Duration::minutes(minute_of_day);
            let stepped = advance_by_working_minutes(advance_by_working_minutes(base, a), b);
            let direct = advance_by_working_minutes(base, a + b);
            prop_assert_eq!(stepped, direct);
        }
    }
}
