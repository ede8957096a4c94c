//! Routing operation entity module
//!
//! This module defines the RoutingOperation entity and the validation of a
//! job's routing. A routing is the ordered list of operations for one job;
//! sequences must be unique and dense from 1, and operation k may only start
//! after operation k-1's last schedule entry ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::value_objects::MachineType;

/// Reasons a routing is rejected before placement starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("job {job_id}: routing is empty")]
    Empty { job_id: u64 },

    #[error("job {job_id}: sequences are not dense from 1 (found {found} at position {position})")]
    NonDenseSequence { job_id: u64, found: u32, position: usize },

    #[error("job {job_id} op {sequence}: machine type is missing")]
    MissingMachineType { job_id: u64, sequence: u32 },

    #[error("job {job_id} op {sequence}: negative hours (estimated {estimated}, setup {setup})")]
    NegativeHours { job_id: u64, sequence: u32, estimated: f64, setup: f64 },
}

/// One operation within a job's routing
///
/// An operation names the kind of machine it needs, the skills an operator
/// must bring, and its duration split into run and setup hours. Durations
/// are converted to whole minutes on the way into the placement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingOperation {
    /// The job this operation belongs to
    pub job_id: u64,
    /// Position within the routing, 1-based and dense
    pub sequence: u32,
    /// Operation name (e.g. "Rough mill", "Final inspect")
    pub name: String,
    /// Kind of work center required
    pub machine_type: MachineType,
    /// Estimated run hours
    pub estimated_hours: f64,
    /// Setup hours, added to the run time for placement
    pub setup_hours: f64,
    /// Skills an operator must cover to run this operation
    pub required_skills: Vec<String>,
    /// Stable machine ids explicitly allowed for this operation
    pub compatible_machines: Vec<String>,
    /// Stable id of the machine the job was quoted on, if any
    pub original_quoted_machine: Option<String>,
    /// Operation may not start before this instant
    pub earliest_start: Option<DateTime<Utc>>,
    /// Set when the operation was edited after import
    pub modified: bool,
}

impl RoutingOperation {
    /// Creates a routing operation with no skill or machine restrictions
    ///
    /// # Arguments
    ///
    /// * `job_id` - Owning job
    /// * `sequence` - 1-based position within the routing
    /// * `name` - Operation name
    /// * `machine_type` - Required work-center kind
    /// * `estimated_hours` - Run hours
    /// * `setup_hours` - Setup hours
    pub fn new(
        job_id: u64,
        sequence: u32,
        name: &str,
        machine_type: MachineType,
        estimated_hours: f64,
        setup_hours: f64,
    ) -> Self {
        Self {
            job_id,
            sequence,
            name: name.to_string(),
            machine_type,
            estimated_hours,
            setup_hours,
            required_skills: Vec::new(),
            compatible_machines: Vec::new(),
            original_quoted_machine: None,
            earliest_start: None,
            modified: false,
        }
    }

    /// Total placement duration in whole minutes
    ///
    /// Run and setup hours are summed and rounded to the nearest minute;
    /// all placement arithmetic downstream works in minutes.
    ///
    /// # Returns
    ///
    /// (estimated_hours + setup_hours) * 60, rounded
    pub fn total_minutes(&self) -> i64 {
        ((self.estimated_hours + self.setup_hours) * 60.0).round() as i64
    }
}

/// Validates a job's routing before placement
///
/// Checks that the routing is non-empty, that sequences sorted by number are
/// exactly 1..=N, that every operation carries a machine type, and that no
/// operation has negative hours. The slice is expected sorted by sequence.
///
/// # Arguments
///
/// * `job_id` - The job whose routing is being validated
/// * `operations` - The routing sorted by sequence
///
/// # Returns
///
/// Ok(()) if the routing is placeable, the first violation otherwise
pub fn validate_routing(job_id: u64, operations: &[RoutingOperation]) -> Result<(), RoutingError> {
    if operations.is_empty() {
        return Err(RoutingError::Empty { job_id });
    }

    for (position, op) in operations.iter().enumerate() {
        let expected = (position + 1) as u32;
        if op.sequence != expected {
            return Err(RoutingError::NonDenseSequence {
                job_id,
                found: op.sequence,
                position,
            });
        }
        if op.machine_type.tag().is_empty() {
            return Err(RoutingError::MissingMachineType { job_id, sequence: op.sequence });
        }
        if op.estimated_hours < 0.0 || op.setup_hours < 0.0 {
            return Err(RoutingError::NegativeHours {
                job_id,
                sequence: op.sequence,
                estimated: op.estimated_hours,
                setup: op.setup_hours,
            });
        }
    }

    Ok(())
}
