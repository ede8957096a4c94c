//! Shift capacity service module
//!
//! This module tracks weekly load and capacity per shift for the current
//! business week and exposes the less-loaded shift as a placement bias.
//! Effective capacity discounts raw headcount-hours by a per-shift
//! efficiency factor; load is the sum of committed entry durations whose
//! start falls inside the week.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::debug;

use crate::application::services::calendar;
use crate::domain::entities::ScheduleEntry;
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::Shift;

/// Weekly hours one operator contributes before the efficiency discount
const WEEKLY_HOURS_PER_OPERATOR: f64 = 40.0;

/// Load and capacity figures for one shift of the current week
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ShiftMetrics {
    /// Which shift
    pub shift: Shift,
    /// Active operators whose schedule contains the shift
    pub headcount: usize,
    /// Effective capacity in hours (headcount x 40 x efficiency)
    pub capacity_hours: f64,
    /// Committed load in hours
    pub load_hours: f64,
}

impl ShiftMetrics {
    /// Load as a percentage of capacity
    ///
    /// # Returns
    ///
    /// load / capacity x 100, or 100.0 when capacity is zero
    pub fn load_percentage(&self) -> f64 {
        if self.capacity_hours <= 0.0 {
            100.0
        } else {
            self.load_hours / self.capacity_hours * 100.0
        }
    }
}

/// Per-week load balancer biasing placement toward the emptier shift
///
/// The service is computed once per pass and updated with every batch the
/// pass commits, so later placement decisions in the same pass see the
/// shifted balance. The bias is soft: placement still tries both shifts.
pub struct ShiftCapacityService {
    week_start: NaiveDate,
    week_from: DateTime<Utc>,
    week_to: DateTime<Utc>,
    headcount: [usize; 2],
    load_minutes: [i64; 2],
}

impl ShiftCapacityService {
    /// Computes metrics for the business week containing `now`
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `now` - Any instant inside the week of interest
    pub fn for_week<S: SchedulingStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<Self> {
        let week_start = calendar::week_start(now);
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("valid clock time");
        let week_from = calendar::localize_on(week_start, midnight);
        let week_to = calendar::localize_on(week_start + Duration::days(7), midnight);

        let mut headcount = [0usize; 2];
        for resource in store.active_resources()? {
            for shift in Shift::both() {
                if resource.works_shift(shift) {
                    headcount[index(shift)] += 1;
                }
            }
        }

        let mut service = Self {
            week_start,
            week_from,
            week_to,
            headcount,
            load_minutes: [0; 2],
        };
        service.add_entries(&store.entries_overlapping(week_from, week_to)?);
        debug!(
            week = %week_start,
            shift_1_pct = service.metrics(Shift::First).load_percentage(),
            shift_2_pct = service.metrics(Shift::Second).load_percentage(),
            "shift capacity computed"
        );
        Ok(service)
    }

    /// The Monday this week's metrics are anchored on
    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    /// Folds newly committed entries into the load totals
    ///
    /// Entries starting outside the current week are ignored.
    pub fn add_entries(&mut self, entries: &[ScheduleEntry]) {
        for entry in entries {
            if entry.start >= self.week_from && entry.start < self.week_to {
                self.load_minutes[index(entry.shift)] += entry.duration_minutes();
            }
        }
    }

    /// Metrics for one shift
    pub fn metrics(&self, shift: Shift) -> ShiftMetrics {
        let capacity_hours =
            self.headcount[index(shift)] as f64 * WEEKLY_HOURS_PER_OPERATOR * shift.efficiency();
        ShiftMetrics {
            shift,
            headcount: self.headcount[index(shift)],
            capacity_hours,
            load_hours: self.load_minutes[index(shift)] as f64 / 60.0,
        }
    }

    /// The currently less-loaded shift, ties going to Shift 1
    ///
    /// Used only to order the shifts a placement tries first; never as a
    /// hard constraint.
    pub fn optimal_shift(&self) -> Shift {
        let first = self.metrics(Shift::First).load_percentage();
        let second = self.metrics(Shift::Second).load_percentage();
        if first <= second {
            Shift::First
        } else {
            Shift::Second
        }
    }
}

fn index(shift: Shift) -> usize {
    match shift {
        Shift::First => 0,
        Shift::Second => 1,
    }
}
