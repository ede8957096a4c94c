//! Unschedule Job use case module
//!
//! Deletes every schedule entry of a job and reverts it to Unscheduled,
//! restoring the store to its pre-scheduling state for that job.

use anyhow::Result;
use tracing::info;

use crate::domain::entities::JobStatus;
use crate::domain::repositories::SchedulingStore;

/// Outcome of an unschedule request
#[derive(Debug)]
pub struct UnscheduleOutcome {
    pub job_id: u64,
    /// Entries removed
    pub deleted: usize,
    /// False when the job id is unknown
    pub found: bool,
}

/// Use case removing a job's schedule
pub struct UnscheduleJob;

impl UnscheduleJob {
    /// Creates a new UnscheduleJob use case
    pub fn new() -> Self {
        Self
    }

    /// Deletes the job's entries and reverts its status
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `job_id` - The job to unschedule
    pub fn execute<S: SchedulingStore + ?Sized>(
        &self,
        store: &mut S,
        job_id: u64,
    ) -> Result<UnscheduleOutcome> {
        if store.job(job_id)?.is_none() {
            return Ok(UnscheduleOutcome { job_id, deleted: 0, found: false });
        }
        let deleted = store.delete_entries_for_job(job_id)?;
        store.update_job_status(job_id, JobStatus::Unscheduled)?;
        info!(job_id, deleted, "job unscheduled");
        Ok(UnscheduleOutcome { job_id, deleted, found: true })
    }
}

impl Default for UnscheduleJob {
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
    use crate::domain::entities::{Job, Machine, Resource, ResourceRole, RoutingOperation};
    use crate::domain::value_objects::{JobPriority, MachineType, Shift};
    use crate::infrastructure::repositories::InMemoryStore;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_schedule_then_unschedule_restores_state() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "MILL-01", MachineType::Mill)).unwrap();
        let mut alice = Resource::new(1, "Alice", ResourceRole::Operator, vec![Shift::First]);
        alice.work_centers = vec!["MILL-01".to_string()];
        store.insert_resource(alice).unwrap();
        store
            .insert_job(
                Job::new(10, "J-10".to_string(), local(2025, 6, 20, 0, 0), JobPriority::Normal),
                vec![RoutingOperation::new(10, 1, "Mill", MachineType::Mill, 4.0, 0.0)],
            )
            .unwrap();

        let outcome = ScheduleJob::new()
            .execute(&mut store, 10, &ScheduleOptions::at(local(2025, 6, 2, 10, 0)))
            .unwrap();
        assert!(outcome.success());

        let undone = UnscheduleJob::new().execute(&mut store, 10).unwrap();
        assert!(undone.found);
        assert_eq!(undone.deleted, 1);
        assert!(store.entries_for_job(10).unwrap().is_empty());
        assert_eq!(
            store.job(10).unwrap().unwrap().status,
            crate::domain::entities::JobStatus::Unscheduled
        );
    }

    #[test]
    fn test_unknown_job_reports_not_found() {
        let mut store = InMemoryStore::new();
        let outcome = UnscheduleJob::new().execute(&mut store, 99).unwrap();
        assert!(!outcome.found);
        assert_eq!(outcome.deleted, 0);
    }
}
