//! Storage contract module
//!
//! This module defines the SchedulingStore trait: the complete read/write
//! surface the scheduling engine needs. Any backing store that upholds the
//! contract is acceptable; the crate ships an in-memory implementation for
//! tests and demos and a SQLite implementation for persistence.
//!
//! Writes take `&mut self`, so exclusive ownership of the store serializes
//! placement passes; within a pass the contract guarantees read-your-writes.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entities::{
    Job, JobStatus, Machine, Resource, ResourceUnavailability, RoutingOperation, ScheduleEntry,
};

/// Read/write surface for jobs, routings, machines, resources,
/// unavailability records and schedule entries
#[cfg_attr(test, mockall::automock)]
pub trait SchedulingStore {
    /// Fetches a job by id
    fn job(&self, job_id: u64) -> Result<Option<Job>>;

    /// Lists every job
    fn jobs(&self) -> Result<Vec<Job>>;

    /// Lists a job's routing operations sorted by sequence
    fn routing(&self, job_id: u64) -> Result<Vec<RoutingOperation>>;

    /// Lists every machine
    fn machines(&self) -> Result<Vec<Machine>>;

    /// Lists machines belonging to a substitution group
    fn machines_in_group(&self, group: &str) -> Result<Vec<Machine>>;

    /// Lists every active resource, in roster insertion order
    fn active_resources(&self) -> Result<Vec<Resource>>;

    /// Lists unavailability records overlapping an inclusive date range
    fn unavailability_overlapping(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ResourceUnavailability>>;

    /// Lists schedule entries on a machine, sorted by start
    fn entries_for_machine(&self, machine_id: &str) -> Result<Vec<ScheduleEntry>>;

    /// Lists schedule entries assigned to a resource, sorted by start
    fn entries_for_resource(&self, resource_id: u64) -> Result<Vec<ScheduleEntry>>;

    /// Lists schedule entries belonging to a job, sorted by start
    fn entries_for_job(&self, job_id: u64) -> Result<Vec<ScheduleEntry>>;

    /// Lists schedule entries overlapping a half-open instant range
    fn entries_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>>;

    /// Monotonic version of the resource/unavailability tables
    ///
    /// Bumped by every write to resources or unavailability records. The
    /// scheduler captures it at pass start and aborts the commit when it
    /// moved, surfacing a stale snapshot after three lost retries.
    fn resource_version(&self) -> u64;

    /// Appends a batch of entries atomically, assigning ids
    ///
    /// # Returns
    ///
    /// The appended entries with their assigned ids
    fn append_entries(&mut self, entries: Vec<ScheduleEntry>) -> Result<Vec<ScheduleEntry>>;

    /// Deletes every entry belonging to a job
    ///
    /// # Returns
    ///
    /// The number of entries deleted
    fn delete_entries_for_job(&mut self, job_id: u64) -> Result<usize>;

    /// Updates a job's lifecycle status
    fn update_job_status(&mut self, job_id: u64, status: JobStatus) -> Result<()>;

    /// Commits a completed placement pass in one atomic step
    ///
    /// Appends the buffered entries, marks the job Scheduled, and reverts
    /// any displaced jobs (their entries deleted, their status back to
    /// Unscheduled). Implementations backed by a transactional store must
    /// run all of it in a single transaction.
    ///
    /// # Arguments
    ///
    /// * `job_id` - The job whose pass is being committed
    /// * `entries` - The buffered entries for the whole routing
    /// * `displaced_jobs` - Jobs evicted by priority displacement
    ///
    /// # Returns
    ///
    /// The appended entries with their assigned ids
    fn commit_schedule(
        &mut self,
        job_id: u64,
        entries: Vec<ScheduleEntry>,
        displaced_jobs: &[u64],
    ) -> Result<Vec<ScheduleEntry>> {
        for &displaced in displaced_jobs {
            self.delete_entries_for_job(displaced)?;
            self.update_job_status(displaced, JobStatus::Unscheduled)?;
        }
        let appended = self.append_entries(entries)?;
        self.update_job_status(job_id, JobStatus::Scheduled)?;
        Ok(appended)
    }

    /// Reverts a set of jobs to Unscheduled, deleting their entries
    fn invalidate_jobs(&mut self, job_ids: &[u64]) -> Result<()> {
        for &job_id in job_ids {
            self.delete_entries_for_job(job_id)?;
            self.update_job_status(job_id, JobStatus::Unscheduled)?;
        }
        Ok(())
    }

    /// Inserts an unavailability record, bumping the resource version
    ///
    /// # Returns
    ///
    /// The assigned record id
    fn insert_unavailability(&mut self, record: ResourceUnavailability) -> Result<u64>;

    /// Deletes an unavailability record, bumping the resource version
    ///
    /// # Returns
    ///
    /// `true` when a record was deleted
    fn delete_unavailability(&mut self, record_id: u64) -> Result<bool>;

    /// Inserts a job together with its routing
    fn insert_job(&mut self, job: Job, routing: Vec<RoutingOperation>) -> Result<()>;

    /// Inserts a machine
    fn insert_machine(&mut self, machine: Machine) -> Result<()>;

    /// Inserts a resource, bumping the resource version
    fn insert_resource(&mut self, resource: Resource) -> Result<()>;
}
