//! Dashboard queries use case module
//!
//! Read-only surface backing dashboards: schedule lookups by machine,
//! operator and job, operator working windows, roster availability, weekly
//! shift metrics, and the inspection queue (jobs whose next unscheduled
//! operation is an inspection and whose predecessor has completed).

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::application::services::availability::AvailabilityService;
use crate::application::services::shift_capacity::{ShiftCapacityService, ShiftMetrics};
use crate::domain::entities::{EntryStatus, Job, ResourceRole, ScheduleEntry};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::Shift;

/// One job waiting on an inspection
#[derive(Debug)]
pub struct InspectionQueueItem {
    pub job: Job,
    /// Sequence of the pending INSPECT operation
    pub sequence: u32,
    pub operation_name: String,
}

/// Read-only dashboard queries over a store
pub struct DashboardQueries;

impl DashboardQueries {
    /// Creates a new DashboardQueries use case
    pub fn new() -> Self {
        Self
    }

    /// Schedule entries on a machine, sorted by start
    pub fn entries_for_machine<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        machine_id: &str,
    ) -> Result<Vec<ScheduleEntry>> {
        store.entries_for_machine(machine_id)
    }

    /// Schedule entries of an operator, sorted by start
    pub fn entries_for_resource<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        resource_id: u64,
    ) -> Result<Vec<ScheduleEntry>> {
        store.entries_for_resource(resource_id)
    }

    /// Schedule entries of a job, sorted by start
    pub fn entries_for_job<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        job_id: u64,
    ) -> Result<Vec<ScheduleEntry>> {
        store.entries_for_job(job_id)
    }

    /// An operator's working windows on a date, per shift
    pub fn working_windows<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        resource_id: u64,
        date: NaiveDate,
    ) -> Result<Vec<(Shift, DateTime<Utc>, DateTime<Utc>)>> {
        let availability = AvailabilityService::snapshot(store, date, date + Duration::days(1))?;
        Ok(availability.day_windows(resource_id, date))
    }

    /// Operators available on (date, shift), optionally filtered
    pub fn available_operators<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        date: NaiveDate,
        shift: Shift,
        role: Option<ResourceRole>,
        work_centers: Option<&[String]>,
    ) -> Result<Vec<u64>> {
        let availability = AvailabilityService::snapshot(store, date, date + Duration::days(1))?;
        Ok(availability
            .available_operators(date, shift, role, work_centers)
            .into_iter()
            .map(|resource| resource.id)
            .collect())
    }

    /// Load and capacity metrics of the current business week
    pub fn shift_metrics<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<[ShiftMetrics; 2]> {
        let capacity = ShiftCapacityService::for_week(store, now)?;
        Ok([capacity.metrics(Shift::First), capacity.metrics(Shift::Second)])
    }

    /// Jobs whose next unscheduled operation is an inspection with its
    /// predecessor complete
    pub fn inspection_queue<S: SchedulingStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Vec<InspectionQueueItem>> {
        let mut queue = Vec::new();
        for job in store.jobs()? {
            let routing = store.routing(job.id)?;
            let entries = store.entries_for_job(job.id)?;

            let next_unscheduled = routing
                .iter()
                .find(|op| !entries.iter().any(|entry| entry.sequence == op.sequence));
            let operation = match next_unscheduled {
                Some(op) if op.machine_type.is_inspect() => op,
                _ => continue,
            };

            let predecessor_done = if operation.sequence <= 1 {
                true
            } else {
                let previous: Vec<&ScheduleEntry> = entries
                    .iter()
                    .filter(|entry| entry.sequence == operation.sequence - 1)
                    .collect();
                !previous.is_empty()
                    && previous.iter().all(|entry| entry.status == EntryStatus::Complete)
            };
            if predecessor_done {
                queue.push(InspectionQueueItem {
                    sequence: operation.sequence,
                    operation_name: operation.name.clone(),
                    job,
                });
            }
        }
        Ok(queue)
    }
}

impl Default for DashboardQueries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::application::services::calendar::BUSINESS_TZ;
    use crate::domain::entities::{Machine, Resource, RoutingOperation};
    use crate::domain::value_objects::{JobPriority, MachineType};
    use crate::infrastructure::repositories::InMemoryStore;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        BUSINESS_TZ
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_inspection_queue_requires_completed_predecessor() {
        let mut store = InMemoryStore::new();
        store.insert_machine(Machine::new(1, "MILL-01", MachineType::Mill)).unwrap();
        store
            .insert_job(
                Job::new(1, "J-1".to_string(), local(2025, 6, 20, 0, 0), JobPriority::Normal),
                vec![
                    RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0),
                    RoutingOperation::new(1, 2, "Final inspect", MachineType::Inspect, 0.5, 0.0),
                ],
            )
            .unwrap();

        let queries = DashboardQueries::new();
        // mill not even scheduled: not in the queue
        assert!(queries.inspection_queue(&store).unwrap().is_empty());

        // mill scheduled but not complete: still not in the queue
        let mill_entry = ScheduleEntry {
            id: 0,
            job_id: 1,
            sequence: 1,
            machine_id: "MILL-01".to_string(),
            resource_id: Some(1),
            start: local(2025, 6, 3, 3, 0),
            end: local(2025, 6, 3, 5, 0),
            shift: Shift::First,
            status: EntryStatus::Scheduled,
        };
        let appended = store.append_entries(vec![mill_entry]).unwrap();
        assert!(queries.inspection_queue(&store).unwrap().is_empty());

        // mark the mill chunk complete: the job enters the queue
        let mut done = appended[0].clone();
        done.status = EntryStatus::Complete;
        store.delete_entries_for_job(1).unwrap();
        store.append_entries(vec![done]).unwrap();

        let queue = queries.inspection_queue(&store).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].job.id, 1);
        assert_eq!(queue[0].sequence, 2);
    }

    #[test]
    fn test_working_windows_query() {
        let mut store = InMemoryStore::new();
        let mut alice =
            Resource::new(1, "Alice", crate::domain::entities::ResourceRole::Operator, vec![
                Shift::First,
            ]);
        alice.work_centers = vec!["MILL-01".to_string()];
        store.insert_resource(alice).unwrap();

        let queries = DashboardQueries::new();
        let windows = queries
            .working_windows(&store, 1, NaiveDate::from_ymd_opt(2025, 6, 3).unwrap())
            .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].0, Shift::First);
    }
}
