//! Schedule All use case module
//!
//! This module runs a batch placement pass over every unscheduled job,
//! ordered by priority (Critical first), then due date, then job number.
//! Jobs are scheduled independently: one failure never rolls back jobs
//! committed earlier in the batch, and already-scheduled jobs are skipped,
//! making the batch idempotent.

use anyhow::Result;
use tracing::info;

use crate::application::use_cases::schedule_job::{ScheduleJob, ScheduleJobError, ScheduleOptions};
use crate::domain::entities::Job;
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::JobPriority;

/// Per-job line of a batch outcome
#[derive(Debug)]
pub struct BatchJobResult {
    pub job_id: u64,
    pub job_number: String,
    pub priority: JobPriority,
    pub success: bool,
    pub failure: Option<ScheduleJobError>,
}

/// Outcome of a batch pass
#[derive(Debug)]
pub struct BatchOutcome {
    /// Jobs committed by this batch
    pub scheduled: usize,
    /// Jobs that failed placement
    pub failed: usize,
    /// Unscheduled jobs considered
    pub total: usize,
    pub per_job: Vec<BatchJobResult>,
}

/// Use case scheduling every unscheduled job in priority order
pub struct ScheduleAll {
    schedule_job: ScheduleJob,
}

impl ScheduleAll {
    /// Creates a new ScheduleAll use case
    pub fn new() -> Self {
        Self { schedule_job: ScheduleJob::new() }
    }

    /// Returns the unscheduled jobs in batch order
    ///
    /// Order: priority descending, due date ascending, job number ascending.
    pub fn batch_order(jobs: &[Job]) -> Vec<&Job> {
        let mut batch: Vec<&Job> = jobs.iter().filter(|job| job.is_schedulable()).collect();
        batch.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.due_date.cmp(&b.due_date))
                .then(a.job_number.cmp(&b.job_number))
        });
        batch
    }

    /// Runs the batch, invoking `progress` after each job
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store
    /// * `options` - Pass options applied to every job
    /// * `progress` - Called with each finished job's result line
    pub fn execute<S, F>(
        &self,
        store: &mut S,
        options: &ScheduleOptions,
        mut progress: F,
    ) -> Result<BatchOutcome>
    where
        S: SchedulingStore + ?Sized,
        F: FnMut(&BatchJobResult),
    {
        let jobs = store.jobs()?;
        let batch: Vec<(u64, String, JobPriority)> = Self::batch_order(&jobs)
            .into_iter()
            .map(|job| (job.id, job.job_number.clone(), job.priority))
            .collect();

        let total = batch.len();
        let mut per_job = Vec::with_capacity(total);
        let mut scheduled = 0usize;

        for (job_id, job_number, priority) in batch {
            let outcome = self.schedule_job.execute(store, job_id, options)?;
            let result = BatchJobResult {
                job_id,
                job_number,
                priority,
                success: outcome.success(),
                failure: outcome.failure,
            };
            if result.success {
                scheduled += 1;
            }
            progress(&result);
            per_job.push(result);
        }

        let failed = total - scheduled;
        info!(scheduled, failed, total, "batch pass finished");
        Ok(BatchOutcome { scheduled, failed, total, per_job })
    }
}

impl Default for ScheduleAll {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::application::services::calendar::BUSINESS_TZ;
    use crate::domain::entities::{JobStatus, Machine, Resource, ResourceRole, RoutingOperation};
    use crate::domain::value_objects::{JobPriority, MachineType, Shift};
    use crate::infrastructure::repositories::InMemoryStore;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn world() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "MILL-01", MachineType::Mill)).unwrap();
        let mut alice = Resource::new(1, "Alice", ResourceRole::Operator, vec![Shift::First]);
        alice.work_centers = vec!["MILL-01".to_string()];
        store.insert_resource(alice).unwrap();
        store
    }

    fn add_job(store: &mut InMemoryStore, id: u64, number: &str, priority: JobPriority, due: DateTime<Utc>) {
        store
            .insert_job(
                Job::new(id, number.to_string(), due, priority),
                vec![RoutingOperation::new(id, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
            )
            .unwrap();
    }

    #[test]
    fn test_batch_order_priority_then_due_then_number() {
        let due_early = local(2025, 6, 10, 0, 0);
        let due_late = local(2025, 6, 20, 0, 0);
        let jobs = vec![
            Job::new(1, "J-B".to_string(), due_late, JobPriority::Normal),
            Job::new(2, "J-A".to_string(), due_late, JobPriority::Normal),
            Job::new(3, "J-C".to_string(), due_early, JobPriority::Normal),
            Job::new(4, "J-D".to_string(), due_late, JobPriority::Critical),
        ];
        let order: Vec<u64> = ScheduleAll::batch_order(&jobs).iter().map(|j| j.id).collect();
        assert_eq!(order, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_batch_schedules_independently() {
        let mut store = world();
        add_job(&mut store, 1, "J-1", JobPriority::Normal, local(2025, 6, 10, 0, 0));
        // job 2 needs a lathe nobody has: it fails, job 1 still commits
        store
            .insert_job(
                Job::new(2, "J-2".to_string(), local(2025, 6, 10, 0, 0), JobPriority::Critical),
                vec![RoutingOperation::new(2, 1, "Turn", MachineType::Lathe, 2.0, 0.0)],
            )
            .unwrap();

        let outcome = ScheduleAll::new()
            .execute(&mut store, &ScheduleOptions::at(local(2025, 6, 2, 10, 0)), |_| {})
            .unwrap();

        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.scheduled, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(store.job(1).unwrap().unwrap().status, JobStatus::Scheduled);
        assert_eq!(store.job(2).unwrap().unwrap().status, JobStatus::Unscheduled);

        // per-job lines carry the job's priority (batch order: Critical first)
        assert_eq!(outcome.per_job[0].priority, JobPriority::Critical);
        assert_eq!(outcome.per_job[1].priority, JobPriority::Normal);
    }

    #[test]
    fn test_batch_is_idempotent_on_scheduled_jobs() {
        let mut store = world();
        add_job(&mut store, 1, "J-1", JobPriority::Normal, local(2025, 6, 10, 0, 0));

        let batch = ScheduleAll::new();
        let options = ScheduleOptions::at(local(2025, 6, 2, 10, 0));
        let first = batch.execute(&mut store, &options, |_| {}).unwrap();
        assert_eq!(first.scheduled, 1);
        let entries_after_first = store.entries_for_job(1).unwrap();

        // second run skips the scheduled job entirely
        let second = batch.execute(&mut store, &options, |_| {}).unwrap();
        assert_eq!(second.total, 0);
        assert_eq!(second.scheduled, 0);
        let entries_after_second = store.entries_for_job(1).unwrap();
        assert_eq!(entries_after_first.len(), entries_after_second.len());
        assert_eq!(entries_after_first[0].id, entries_after_second[0].id);
    }
}
