//! Job entity module
//!
//! This module defines the Job entity, the unit of work flowing through the
//! scheduler. A job owns its routing operations; the scheduler only ever
//! mutates its status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::JobPriority;

/// Lifecycle status of a job
///
/// A placement pass transitions a job Unscheduled -> Scheduled atomically
/// when all of its routing operations have been committed. Every other
/// transition is driven by the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// No schedule entries exist for this job
    Unscheduled,
    /// A pass is currently buffering entries for this job
    Planning,
    /// All routing operations have committed schedule entries
    Scheduled,
    /// Work on the job has started on the floor
    InProgress,
    /// All operations are complete
    Complete,
    /// Excluded from scheduling until released
    OnHold,
}

/// Represents a manufacturing job to be scheduled
///
/// A job carries identity, the human-facing job number, the dates the
/// scheduler orders batches by, and its priority. The routing operations
/// belonging to the job are stored separately and looked up by job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier
    pub id: u64,
    /// Human-readable job number (e.g. "J-10412")
    pub job_number: String,
    /// Date the job is due to the customer
    pub due_date: DateTime<Utc>,
    /// Date promised to the customer, if one was given
    pub promised_date: Option<DateTime<Utc>>,
    /// Scheduling priority
    pub priority: JobPriority,
    /// Current lifecycle status
    pub status: JobStatus,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new unscheduled job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job identifier
    /// * `job_number` - Human-readable job number
    /// * `due_date` - Customer due date
    /// * `priority` - Scheduling priority
    ///
    /// # Returns
    ///
    /// A new Job in Unscheduled status
    pub fn new(id: u64, job_number: String, due_date: DateTime<Utc>, priority: JobPriority) -> Self {
        Self {
            id,
            job_number,
            due_date,
            promised_date: None,
            priority,
            status: JobStatus::Unscheduled,
            created_at: Utc::now(),
        }
    }

    /// Checks whether this job is eligible for a placement pass
    ///
    /// # Returns
    ///
    /// `true` only for Unscheduled jobs
    pub fn is_schedulable(&self) -> bool {
        self.status == JobStatus::Unscheduled
    }
}
