//! Schedule output DTO module
//!
//! Serializable shapes of schedule data handed to report generators and
//! printed by the CLI. Instants are rendered in the business timezone so
//! the rows read the way the floor thinks about time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::calendar;
use crate::application::services::shift_capacity::ShiftMetrics;
use crate::domain::entities::ScheduleEntry;
use crate::domain::repositories::SchedulingStore;

use anyhow::Result;

/// One schedule entry as reported
#[derive(Debug, Clone, Serialize)]
pub struct EntryRecord {
    pub job_number: String,
    pub sequence: u32,
    pub operation: String,
    pub machine_id: String,
    pub operator: String,
    /// Business-local wall clock, RFC 3339 with offset
    pub start_local: String,
    pub end_local: String,
    pub shift: u8,
    pub duration_hours: f64,
}

/// Full schedule report
#[derive(Debug, Serialize)]
pub struct ScheduleOutput {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<EntryRecord>,
    pub shift_metrics: Vec<ShiftMetrics>,
}

/// One line of a batch report
#[derive(Debug, Serialize)]
pub struct BatchJobLine {
    pub job_number: String,
    pub success: bool,
    pub reason: Option<String>,
}

/// Batch pass report
#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub scheduled: usize,
    pub failed: usize,
    pub total: usize,
    pub jobs: Vec<BatchJobLine>,
}

impl EntryRecord {
    /// Builds a record, resolving job and operator display names
    pub fn build<S: SchedulingStore + ?Sized>(store: &S, entry: &ScheduleEntry) -> Result<Self> {
        let job_number = store
            .job(entry.job_id)?
            .map(|job| job.job_number)
            .unwrap_or_else(|| format!("#{}", entry.job_id));
        let operation = store
            .routing(entry.job_id)?
            .into_iter()
            .find(|op| op.sequence == entry.sequence)
            .map(|op| op.name)
            .unwrap_or_default();
        let operator = match entry.resource_id {
            Some(resource_id) => store
                .active_resources()?
                .into_iter()
                .find(|r| r.id == resource_id)
                .map(|r| r.name)
                .unwrap_or_else(|| format!("#{}", resource_id)),
            None => String::new(),
        };
        Ok(Self {
            job_number,
            sequence: entry.sequence,
            operation,
            machine_id: entry.machine_id.clone(),
            operator,
            start_local: calendar::to_local(entry.start).to_rfc3339(),
            end_local: calendar::to_local(entry.end).to_rfc3339(),
            shift: entry.shift.number(),
            duration_hours: entry.duration_minutes() as f64 / 60.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::application::services::calendar::BUSINESS_TZ;
    use crate::domain::entities::{EntryStatus, Job, Machine, Resource, ResourceRole, RoutingOperation};
    use crate::domain::value_objects::{JobPriority, MachineType, Shift};
    use crate::infrastructure::repositories::InMemoryStore;

    #[test]
    fn test_entry_record_resolves_names() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "MILL-01", MachineType::Mill)).unwrap();
        store
            .insert_resource(Resource::new(1, "Alice", ResourceRole::Operator, vec![Shift::First]))
            .unwrap();
        store
            .insert_job(
                Job::new(
                    10,
                    "J-10".to_string(),
                    Utc.with_ymd_and_hms(2025, 6, 20, 0, 0, 0).unwrap(),
                    JobPriority::Normal,
                ),
                vec![RoutingOperation::new(10, 1, "Rough mill", MachineType::Mill, 4.0, 0.0)],
            )
            .unwrap();

        let start = BUSINESS_TZ
            .with_ymd_and_hms(2025, 6, 3, 3, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let entry = ScheduleEntry {
            id: 1,
            job_id: 10,
            sequence: 1,
            machine_id: "MILL-01".to_string(),
            resource_id: Some(1),
            start,
            end: start + chrono::Duration::hours(4),
            shift: Shift::First,
            status: EntryStatus::Scheduled,
        };

        let record = EntryRecord::build(&store, &entry).unwrap();
        assert_eq!(record.job_number, "J-10");
        assert_eq!(record.operation, "Rough mill");
        assert_eq!(record.operator, "Alice");
        assert!(record.start_local.starts_with("2025-06-03T03:00:00"));
        assert!((record.duration_hours - 4.0).abs() < f64::EPSILON);
    }
}
