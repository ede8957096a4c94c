//! Mark Unavailable use case module
//!
//! Records a new unavailability period for one or more operators and
//! invalidates every schedule entry the period collides with: the affected
//! jobs are reverted to Unscheduled in one step and reported back so the
//! caller can queue them for re-placement. Unaffected jobs are untouched.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::application::services::availability::AvailabilityService;
use crate::application::services::calendar;
use crate::domain::entities::ResourceUnavailability;
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::Shift;

/// A new unavailability period to record
#[derive(Debug, Clone)]
pub struct UnavailabilityRequest {
    pub resource_ids: Vec<u64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// When true, only [start_time, end_time) of each affected shift
    pub partial: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub shifts: Vec<Shift>,
    pub reason: String,
    pub notes: Option<String>,
}

/// Outcome of recording an unavailability period
#[derive(Debug)]
pub struct UnavailabilityOutcome {
    /// Id of the inserted record
    pub record_id: u64,
    /// Jobs reverted to Unscheduled because their entries collided
    pub invalidated_jobs: Vec<u64>,
}

/// Use case inserting unavailability and invalidating collided schedules
pub struct MarkUnavailable;

impl MarkUnavailable {
    /// Creates a new MarkUnavailable use case
    pub fn new() -> Self {
        Self
    }

    /// Inserts the record and reverts every job it collides with
    ///
    /// An entry collides when, under the updated availability, it no longer
    /// fits inside its operator's working window for the entry's date and
    /// shift.
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `request` - The period to record
    pub fn execute<S: SchedulingStore + ?Sized>(
        &self,
        store: &mut S,
        request: &UnavailabilityRequest,
    ) -> Result<UnavailabilityOutcome> {
        let record = ResourceUnavailability {
            id: 0,
            resource_ids: request.resource_ids.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            partial: request.partial,
            start_time: request.start_time,
            end_time: request.end_time,
            shifts: request.shifts.clone(),
            reason: request.reason.clone(),
            notes: request.notes.clone(),
        };
        let record_id = store.insert_unavailability(record)?;

        // Re-resolve availability with the new record applied and find the
        // entries that no longer fit their operator's window.
        let availability =
            AvailabilityService::snapshot(store, request.start_date, request.end_date)?;

        let mut invalidated: Vec<u64> = Vec::new();
        for &resource_id in &request.resource_ids {
            for entry in store.entries_for_resource(resource_id)? {
                let (date, shift, _, _) = match calendar::window_containing(entry.start) {
                    Some(window) => window,
                    None => continue,
                };
                if date < request.start_date || date > request.end_date {
                    continue;
                }
                let fits = availability
                    .working_window(resource_id, date, shift)
                    .map(|(start, end)| entry.start >= start && entry.end <= end)
                    .unwrap_or(false);
                if !fits && !invalidated.contains(&entry.job_id) {
                    invalidated.push(entry.job_id);
                }
            }
        }

        if !invalidated.is_empty() {
            warn!(
                record_id,
                jobs = ?invalidated,
                "unavailability collides with committed schedules"
            );
            store.invalidate_jobs(&invalidated)?;
        }
        info!(record_id, invalidated = invalidated.len(), "unavailability recorded");
        Ok(UnavailabilityOutcome { record_id, invalidated_jobs: invalidated })
    }
}

impl Default for MarkUnavailable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::application::services::calendar::BUSINESS_TZ;
    use crate::application::use_cases::schedule_job::{ScheduleJob, ScheduleOptions};
    use crate::domain::entities::{
        Job, JobStatus, Machine, Resource, ResourceRole, RoutingOperation,
    };
    use crate::domain::value_objects::{JobPriority, MachineType};
    use crate::infrastructure::repositories::InMemoryStore;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two jobs on VMC-01 with operator Mike on Tuesday shift 1; marking
    /// Mike out all Tuesday invalidates both
    #[test]
    fn test_invalidates_both_collided_jobs() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "VMC-01", MachineType::Mill)).unwrap();
        let mut mike = Resource::new(1, "Mike", ResourceRole::Operator, vec![Shift::First]);
        mike.work_centers = vec!["VMC-01".to_string()];
        store.insert_resource(mike).unwrap();
        for (id, number) in [(1, "J-1"), (2, "J-2")] {
            store
                .insert_job(
                    Job::new(id, number.to_string(), local(2025, 6, 20, 0, 0), JobPriority::Normal),
                    vec![RoutingOperation::new(id, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
                )
                .unwrap();
        }

        let schedule = ScheduleJob::new();
        let options = ScheduleOptions::at(local(2025, 6, 2, 10, 0));
        assert!(schedule.execute(&mut store, 1, &options).unwrap().success());
        assert!(schedule.execute(&mut store, 2, &options).unwrap().success());
        // both land Tuesday June 3 on shift 1 (03:00 and 05:00)
        assert_eq!(store.entries_overlapping(
            local(2025, 6, 3, 3, 0),
            local(2025, 6, 3, 15, 0),
        ).unwrap().len(), 2);

        let outcome = MarkUnavailable::new()
            .execute(
                &mut store,
                &UnavailabilityRequest {
                    resource_ids: vec![1],
                    start_date: date(2025, 6, 3),
                    end_date: date(2025, 6, 3),
                    partial: false,
                    start_time: None,
                    end_time: None,
                    shifts: vec![Shift::First],
                    reason: "medical".to_string(),
                    notes: None,
                },
            )
            .unwrap();

        let mut invalidated = outcome.invalidated_jobs.clone();
        invalidated.sort_unstable();
        assert_eq!(invalidated, vec![1, 2]);
        for job_id in [1, 2] {
            assert_eq!(store.job(job_id).unwrap().unwrap().status, JobStatus::Unscheduled);
            assert!(store.entries_for_job(job_id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_unrelated_jobs_untouched() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "VMC-01", MachineType::Mill)).unwrap();
        let mut mike = Resource::new(1, "Mike", ResourceRole::Operator, vec![Shift::First]);
        mike.work_centers = vec!["VMC-01".to_string()];
        store.insert_resource(mike).unwrap();
        store
            .insert_job(
                Job::new(1, "J-1".to_string(), local(2025, 6, 20, 0, 0), JobPriority::Normal),
                vec![RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
            )
            .unwrap();

        let schedule = ScheduleJob::new();
        let options = ScheduleOptions::at(local(2025, 6, 2, 10, 0));
        assert!(schedule.execute(&mut store, 1, &options).unwrap().success());

        // Mike is out the following week; Tuesday's entry stands
        let outcome = MarkUnavailable::new()
            .execute(
                &mut store,
                &UnavailabilityRequest {
                    resource_ids: vec![1],
                    start_date: date(2025, 6, 9),
                    end_date: date(2025, 6, 12),
                    partial: false,
                    start_time: None,
                    end_time: None,
                    shifts: vec![Shift::First, Shift::Second],
                    reason: "vacation".to_string(),
                    notes: None,
                },
            )
            .unwrap();

        assert!(outcome.invalidated_jobs.is_empty());
        assert_eq!(store.job(1).unwrap().unwrap().status, JobStatus::Scheduled);
    }

    /// Recording then deleting a period restores schedulability with
    /// identical inputs
    #[test]
    fn test_delete_record_restores_replacement() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "VMC-01", MachineType::Mill)).unwrap();
        let mut mike = Resource::new(1, "Mike", ResourceRole::Operator, vec![Shift::First]);
        mike.work_centers = vec!["VMC-01".to_string()];
        store.insert_resource(mike).unwrap();
        store
            .insert_job(
                Job::new(1, "J-1".to_string(), local(2025, 6, 20, 0, 0), JobPriority::Normal),
                vec![RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
            )
            .unwrap();

        let schedule = ScheduleJob::new();
        let options = ScheduleOptions::at(local(2025, 6, 2, 10, 0));
        let original = schedule.execute(&mut store, 1, &options).unwrap();
        let original_start = original.entries[0].start;

        let outcome = MarkUnavailable::new()
            .execute(
                &mut store,
                &UnavailabilityRequest {
                    resource_ids: vec![1],
                    start_date: date(2025, 6, 3),
                    end_date: date(2025, 6, 3),
                    partial: false,
                    start_time: None,
                    end_time: None,
                    shifts: vec![Shift::First],
                    reason: "medical".to_string(),
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(outcome.invalidated_jobs, vec![1]);

        assert!(store.delete_unavailability(outcome.record_id).unwrap());
        let replaced = schedule.execute(&mut store, 1, &options).unwrap();
        assert!(replaced.success());
        assert_eq!(replaced.entries[0].start, original_start);
    }
}
