//! Schedule Job use case module
//!
//! This module orchestrates a full placement pass for one job: validate the
//! routing, place every operation in sequence order with the boundary
//! chained to the previous operation's last chunk, and commit the whole
//! buffer atomically. A failed operation discards the buffer and leaves the
//! job Unscheduled. Critical and High jobs may displace one contiguous run
//! of lower-priority entries per operation when capacity is exhausted.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::services::availability::AvailabilityService;
use crate::application::services::calendar;
use crate::application::services::placement::{
    PlacementEngine, PlacementFailure, PlacementRequest,
};
use crate::application::services::shift_capacity::ShiftCapacityService;
use crate::application::services::substitution::SubstitutionResolver;
use crate::domain::entities::{validate_routing, RoutingError, RoutingOperation, ScheduleEntry};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::JobPriority;

/// How many times a pass lost to concurrent mutation is retried
const STALE_RETRY_LIMIT: u32 = 3;

/// Default wall-clock ceiling per job
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How far past the search start availability records are snapshotted
const SNAPSHOT_HORIZON_DAYS: i64 = 45;

/// Why a job could not be scheduled
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleJobError {
    #[error("job {job_id} not found")]
    JobNotFound { job_id: u64 },

    #[error("job {job_id} is not in Unscheduled status")]
    NotSchedulable { job_id: u64 },

    #[error("routing rejected: {0}")]
    InvalidRouting(#[from] RoutingError),

    #[error("operation {sequence} unplaceable: {cause}")]
    Unplaceable { sequence: u32, cause: PlacementFailure },

    #[error("snapshot went stale {retries} times; giving up")]
    StaleSnapshot { retries: u32 },

    #[error("pass cancelled before commit")]
    Cancelled,
}

/// Options controlling a single placement pass
#[derive(Clone)]
pub struct ScheduleOptions {
    /// Do not place anything before this instant (the time floor still
    /// applies on top)
    pub schedule_after: Option<DateTime<Utc>>,
    /// The wall clock anchoring the never-today floor
    pub now: DateTime<Utc>,
    /// Wall-clock budget for the whole pass
    pub timeout: StdDuration,
    /// Cooperative cancellation flag, checked between operations
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ScheduleOptions {
    /// Creates default options anchored at `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            schedule_after: None,
            now,
            timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
            cancel: None,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Result of a placement pass for one job
#[derive(Debug)]
pub struct ScheduleOutcome {
    pub job_id: u64,
    /// Committed entries (empty on failure)
    pub entries: Vec<ScheduleEntry>,
    /// Jobs reverted to Unscheduled by displacement
    pub displaced_jobs: Vec<u64>,
    /// The tagged failure, when the pass did not commit
    pub failure: Option<ScheduleJobError>,
}

impl ScheduleOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    fn failed(job_id: u64, failure: ScheduleJobError) -> Self {
        Self {
            job_id,
            entries: Vec::new(),
            displaced_jobs: Vec::new(),
            failure: Some(failure),
        }
    }
}

/// Use case scheduling a single job end to end
pub struct ScheduleJob;

impl ScheduleJob {
    /// Creates a new ScheduleJob use case
    pub fn new() -> Self {
        Self
    }

    /// Runs the placement pass, retrying on stale snapshots
    ///
    /// # Arguments
    ///
    /// * `store` - The backing store (exclusive access serializes passes)
    /// * `job_id` - The job to schedule
    /// * `options` - Pass options
    ///
    /// # Returns
    ///
    /// The pass outcome; storage failures surface as errors
    pub fn execute<S: SchedulingStore + ?Sized>(
        &self,
        store: &mut S,
        job_id: u64,
        options: &ScheduleOptions,
    ) -> Result<ScheduleOutcome> {
        for _ in 0..STALE_RETRY_LIMIT {
            match self.attempt(store, job_id, options)? {
                AttemptResult::Done(outcome) => return Ok(outcome),
                AttemptResult::Stale => continue,
            }
        }
        warn!(job_id, "placement pass lost to concurrent mutation");
        Ok(ScheduleOutcome::failed(
            job_id,
            ScheduleJobError::StaleSnapshot { retries: STALE_RETRY_LIMIT },
        ))
    }

    /// One snapshot-consistent attempt
    fn attempt<S: SchedulingStore + ?Sized>(
        &self,
        store: &mut S,
        job_id: u64,
        options: &ScheduleOptions,
    ) -> Result<AttemptResult> {
        let version = store.resource_version();
        let deadline = Instant::now() + options.timeout;

        let job = match store.job(job_id)? {
            Some(job) => job,
            None => {
                return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                    job_id,
                    ScheduleJobError::JobNotFound { job_id },
                )))
            }
        };
        if !job.is_schedulable() {
            return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                job_id,
                ScheduleJobError::NotSchedulable { job_id },
            )));
        }

        let routing = store.routing(job_id)?;
        if let Err(cause) = validate_routing(job_id, &routing) {
            return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                job_id,
                ScheduleJobError::InvalidRouting(cause),
            )));
        }

        let resolver = SubstitutionResolver::new(store.machines()?);
        let snapshot_from = calendar::local_date(options.now);
        let snapshot_to = snapshot_from + Duration::days(SNAPSHOT_HORIZON_DAYS);
        let availability = AvailabilityService::snapshot(store, snapshot_from, snapshot_to)?;
        let mut capacity = ShiftCapacityService::for_week(store, options.now)?;

        let mut boundary = options.schedule_after.unwrap_or(options.now);
        let mut buffer: Vec<ScheduleEntry> = Vec::new();
        let mut ignore: HashSet<u64> = HashSet::new();
        let mut displaced: Vec<u64> = Vec::new();

        for operation in &routing {
            if options.cancelled() {
                info!(job_id, "pass cancelled; dropping buffered chunks");
                return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                    job_id,
                    ScheduleJobError::Cancelled,
                )));
            }
            if store.resource_version() != version {
                return Ok(AttemptResult::Stale);
            }

            let request = PlacementRequest {
                operation,
                search_from: boundary,
                now: options.now,
                deadline: Some(deadline),
                ignore_entries: &ignore,
            };
            // The engine is rebuilt per operation so the capacity balance
            // can fold in the chunks already buffered this pass.
            let engine = PlacementEngine::new(&resolver, &availability, &capacity);
            let chunks = match engine.place(store, &request)? {
                Ok(chunks) => chunks,
                Err(PlacementFailure::CapacityExhausted) if job.priority.may_displace() => {
                    match self.displace(store, &engine, operation, &request, job.priority)? {
                        Some((chunks, victim_entries, victim_jobs)) => {
                            ignore.extend(victim_entries);
                            for victim in victim_jobs {
                                if !displaced.contains(&victim) {
                                    displaced.push(victim);
                                }
                            }
                            chunks
                        }
                        None => {
                            return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                                job_id,
                                ScheduleJobError::Unplaceable {
                                    sequence: operation.sequence,
                                    cause: PlacementFailure::CapacityExhausted,
                                },
                            )));
                        }
                    }
                }
                Err(cause) => {
                    warn!(job_id, sequence = operation.sequence, %cause, "operation unplaceable");
                    return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                        job_id,
                        ScheduleJobError::Unplaceable { sequence: operation.sequence, cause },
                    )));
                }
            };

            if let Some(last) = chunks.last() {
                boundary = last.end;
            }
            capacity.add_entries(&chunks);
            buffer.extend(chunks);
        }

        if options.cancelled() {
            info!(job_id, "pass cancelled; dropping buffered chunks");
            return Ok(AttemptResult::Done(ScheduleOutcome::failed(
                job_id,
                ScheduleJobError::Cancelled,
            )));
        }
        if store.resource_version() != version {
            return Ok(AttemptResult::Stale);
        }

        let entries = store.commit_schedule(job_id, buffer, &displaced)?;
        info!(
            job_id,
            entries = entries.len(),
            displaced = displaced.len(),
            "job scheduled"
        );
        Ok(AttemptResult::Done(ScheduleOutcome {
            job_id,
            entries,
            displaced_jobs: displaced,
            failure: None,
        }))
    }

    /// Bounded priority displacement for one operation
    ///
    /// Scans each candidate machine for the first contiguous run of entries
    /// whose owning jobs are all strictly lower priority than the incoming
    /// job, then retries the placement pretending those entries are gone.
    /// One run per operation, no cascading. Returns the chunks, the ignored
    /// entry ids, and the victims' job ids on success.
    fn displace<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        engine: &PlacementEngine<'_>,
        operation: &RoutingOperation,
        request: &PlacementRequest<'_>,
        incoming: JobPriority,
    ) -> Result<Option<(Vec<ScheduleEntry>, Vec<u64>, Vec<u64>)>> {
        let resolver = SubstitutionResolver::new(store.machines()?);
        for machine in resolver.candidates(operation) {
            let entries = store.entries_for_machine(&machine.machine_id)?;
            let run = match self.victim_run(store, &entries, request, incoming)? {
                Some(run) => run,
                None => continue,
            };

            let mut ignore: HashSet<u64> = request.ignore_entries.clone();
            ignore.extend(run.iter().map(|entry| entry.id));
            let retry = PlacementRequest {
                operation,
                search_from: request.search_from,
                now: request.now,
                deadline: request.deadline,
                ignore_entries: &ignore,
            };
            if let Ok(chunks) = engine.place(store, &retry)? {
                let mut victim_jobs: Vec<u64> = Vec::new();
                for entry in &run {
                    if !victim_jobs.contains(&entry.job_id) {
                        victim_jobs.push(entry.job_id);
                    }
                }
                info!(
                    machine = %machine.machine_id,
                    victims = victim_jobs.len(),
                    "displacement succeeded"
                );
                let entry_ids = run.iter().map(|entry| entry.id).collect();
                return Ok(Some((chunks, entry_ids, victim_jobs)));
            }
        }
        Ok(None)
    }

    /// Finds the first contiguous strictly-lower-priority run on a machine
    fn victim_run<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        entries: &[ScheduleEntry],
        request: &PlacementRequest<'_>,
        incoming: JobPriority,
    ) -> Result<Option<Vec<ScheduleEntry>>> {
        let floor = calendar::next_business_day_start(request.now).max(request.search_from);
        let mut run: Vec<ScheduleEntry> = Vec::new();
        for entry in entries {
            if entry.end <= floor || request.ignore_entries.contains(&entry.id) {
                continue;
            }
            let owner_priority = match store.job(entry.job_id)? {
                Some(job) => job.priority,
                None => continue,
            };
            if owner_priority < incoming {
                run.push(entry.clone());
            } else if !run.is_empty() {
                break;
            }
        }
        if run.is_empty() {
            Ok(None)
        } else {
            Ok(Some(run))
        }
    }
}

impl Default for ScheduleJob {
    fn default() -> Self {
        Self::new()
    }
}

enum AttemptResult {
    Done(ScheduleOutcome),
    Stale,
}
