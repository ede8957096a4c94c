//! In-Memory Store implementation
//!
//! This module provides an in-memory implementation of the SchedulingStore
//! trait using plain vectors and maps. Suitable for tests, demos and
//! single-run scheduling from an imported dataset; nothing is persisted
//! between runs.

use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::entities::{
    EntryStatus, Job, JobStatus, Machine, Resource, ResourceUnavailability, RoutingOperation,
    ScheduleEntry,
};
use crate::domain::repositories::SchedulingStore;

/// In-memory implementation of the SchedulingStore trait
///
/// Jobs, machines and resources keep their insertion order, which the
/// engine relies on for roster-order operator selection and fleet-order
/// machine candidates. Entry invariants (positive duration, machine and
/// operator non-overlap) are enforced at write time; a violating batch is
/// rejected wholesale.
pub struct InMemoryStore {
    jobs: Vec<Job>,
    routings: HashMap<u64, Vec<RoutingOperation>>,
    machines: Vec<Machine>,
    resources: Vec<Resource>,
    unavailability: Vec<ResourceUnavailability>,
    entries: Vec<ScheduleEntry>,
    next_entry_id: u64,
    next_unavailability_id: u64,
    resource_version: u64,
}

impl InMemoryStore {
    /// Creates a new empty InMemoryStore
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            routings: HashMap::new(),
            machines: Vec::new(),
            resources: Vec::new(),
            unavailability: Vec::new(),
            entries: Vec::new(),
            next_entry_id: 1,
            next_unavailability_id: 1,
            resource_version: 0,
        }
    }

    /// Rejects a batch that would break the entry invariants
    ///
    /// Checks positive duration, machine non-overlap and operator
    /// non-overlap against both the existing entries and the rest of the
    /// batch. Operator-less (OUTSOURCE) entries are exempt from the machine
    /// overlap rule, matching their no-capacity-ceiling semantics.
    fn check_batch(&self, batch: &[ScheduleEntry]) -> Result<()> {
        for (position, entry) in batch.iter().enumerate() {
            if entry.end <= entry.start {
                bail!(
                    "schedule entry for job {} op {} ends at or before its start ({} >= {})",
                    entry.job_id,
                    entry.sequence,
                    entry.start,
                    entry.end
                );
            }
            let others = self
                .entries
                .iter()
                .chain(batch[..position].iter())
                .filter(|other| other.status != EntryStatus::Cancelled);
            for other in others {
                let machine_clash = entry.resource_id.is_some()
                    && other.resource_id.is_some()
                    && entry.machine_id == other.machine_id
                    && entry.overlaps(other);
                if machine_clash {
                    bail!(
                        "machine {} double-booked: job {} op {} overlaps job {} op {}",
                        entry.machine_id,
                        entry.job_id,
                        entry.sequence,
                        other.job_id,
                        other.sequence
                    );
                }
                let operator_clash = entry.resource_id.is_some()
                    && entry.resource_id == other.resource_id
                    && entry.overlaps(other);
                if operator_clash {
                    bail!(
                        "operator {:?} double-booked: job {} op {} overlaps job {} op {}",
                        entry.resource_id,
                        entry.job_id,
                        entry.sequence,
                        other.job_id,
                        other.sequence
                    );
                }
            }
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingStore for InMemoryStore {
    fn job(&self, job_id: u64) -> Result<Option<Job>> {
        Ok(self.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    fn jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.clone())
    }

    fn routing(&self, job_id: u64) -> Result<Vec<RoutingOperation>> {
        let mut routing = self.routings.get(&job_id).cloned().unwrap_or_default();
        routing.sort_by_key(|op| op.sequence);
        Ok(routing)
    }

    fn machines(&self) -> Result<Vec<Machine>> {
        Ok(self.machines.clone())
    }

    fn machines_in_group(&self, group: &str) -> Result<Vec<Machine>> {
        Ok(self
            .machines
            .iter()
            .filter(|m| m.substitution_groups.iter().any(|g| g == group))
            .cloned()
            .collect())
    }

    fn active_resources(&self) -> Result<Vec<Resource>> {
        Ok(self.resources.iter().filter(|r| r.active).cloned().collect())
    }

    fn unavailability_overlapping(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ResourceUnavailability>> {
        Ok(self
            .unavailability
            .iter()
            .filter(|record| record.overlaps_range(from, to))
            .cloned()
            .collect())
    }

    fn entries_for_machine(&self, machine_id: &str) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self
            .entries
            .iter()
            .filter(|e| e.machine_id == machine_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    fn entries_for_resource(&self, resource_id: u64) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self
            .entries
            .iter()
            .filter(|e| e.resource_id == Some(resource_id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    fn entries_for_job(&self, job_id: u64) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self
            .entries
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    fn entries_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self
            .entries
            .iter()
            .filter(|e| e.overlaps_interval(from, to))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    fn resource_version(&self) -> u64 {
        self.resource_version
    }

    fn append_entries(&mut self, entries: Vec<ScheduleEntry>) -> Result<Vec<ScheduleEntry>> {
        self.check_batch(&entries)?;
        let mut appended = Vec::with_capacity(entries.len());
        for mut entry in entries {
            entry.id = self.next_entry_id;
            self.next_entry_id += 1;
            self.entries.push(entry.clone());
            appended.push(entry);
        }
        Ok(appended)
    }

    fn delete_entries_for_job(&mut self, job_id: u64) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|e| e.job_id != job_id);
        Ok(before - self.entries.len())
    }

    fn update_job_status(&mut self, job_id: u64, status: JobStatus) -> Result<()> {
        match self.jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.status = status;
                Ok(())
            }
            None => bail!("unknown job id {}", job_id),
        }
    }

    fn insert_unavailability(&mut self, mut record: ResourceUnavailability) -> Result<u64> {
        record.id = self.next_unavailability_id;
        self.next_unavailability_id += 1;
        let id = record.id;
        self.unavailability.push(record);
        self.resource_version += 1;
        Ok(id)
    }

    fn delete_unavailability(&mut self, record_id: u64) -> Result<bool> {
        let before = self.unavailability.len();
        self.unavailability.retain(|r| r.id != record_id);
        let deleted = self.unavailability.len() < before;
        if deleted {
            self.resource_version += 1;
        }
        Ok(deleted)
    }

    fn insert_job(&mut self, job: Job, routing: Vec<RoutingOperation>) -> Result<()> {
        if self.jobs.iter().any(|j| j.id == job.id) {
            bail!("job id {} already exists", job.id);
        }
        self.routings.insert(job.id, routing);
        self.jobs.push(job);
        Ok(())
    }

    fn insert_machine(&mut self, machine: Machine) -> Result<()> {
        if self.machines.iter().any(|m| m.machine_id == machine.machine_id) {
            bail!("machine {} already exists", machine.machine_id);
        }
        self.machines.push(machine);
        Ok(())
    }

    fn insert_resource(&mut self, resource: Resource) -> Result<()> {
        if self.resources.iter().any(|r| r.id == resource.id) {
            bail!("resource id {} already exists", resource.id);
        }
        self.resources.push(resource);
        self.resource_version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::value_objects::{JobPriority, MachineType, Shift};

    fn utc(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 3, h, 0, 0).unwrap()
    }

    fn entry(job_id: u64, machine: &str, resource: Option<u64>, start_h: u32, end_h: u32) -> ScheduleEntry {
        ScheduleEntry {
            id: 0,
            job_id,
            sequence: 1,
            machine_id: machine.to_string(),
            resource_id: resource,
            start: utc(start_h),
            end: utc(end_h),
            shift: Shift::First,
            status: EntryStatus::Scheduled,
        }
    }

    #[test]
    fn test_append_assigns_ids() {
        let mut store = InMemoryStore::new();
        let appended = store
            .append_entries(vec![entry(1, "MILL-01", Some(1), 8, 10)])
            .unwrap();
        assert_eq!(appended[0].id, 1);
        assert_eq!(store.entries_for_job(1).unwrap().len(), 1);
    }

    #[test]
    fn test_machine_overlap_rejected() {
        let mut store = InMemoryStore::new();
        store
            .append_entries(vec![entry(1, "MILL-01", Some(1), 8, 10)])
            .unwrap();
        let clash = store.append_entries(vec![entry(2, "MILL-01", Some(2), 9, 11)]);
        assert!(clash.is_err());
        // rejected batch leaves nothing behind
        assert_eq!(store.entries_for_machine("MILL-01").unwrap().len(), 1);
    }

    #[test]
    fn test_operator_overlap_rejected_across_machines() {
        let mut store = InMemoryStore::new();
        store
            .append_entries(vec![entry(1, "MILL-01", Some(1), 8, 10)])
            .unwrap();
        let clash = store.append_entries(vec![entry(2, "LATHE-02", Some(1), 9, 11)]);
        assert!(clash.is_err());
    }

    #[test]
    fn test_outsource_entries_may_overlap() {
        let mut store = InMemoryStore::new();
        store
            .append_entries(vec![entry(1, "OUTSOURCE-01", None, 8, 12)])
            .unwrap();
        assert!(store
            .append_entries(vec![entry(2, "OUTSOURCE-01", None, 9, 11)])
            .is_ok());
    }

    #[test]
    fn test_delete_entries_for_job() {
        let mut store = InMemoryStore::new();
        store
            .append_entries(vec![
                entry(1, "MILL-01", Some(1), 8, 10),
                entry(2, "MILL-01", Some(1), 10, 12),
            ])
            .unwrap();
        assert_eq!(store.delete_entries_for_job(1).unwrap(), 1);
        assert_eq!(store.entries_for_machine("MILL-01").unwrap().len(), 1);
    }

    #[test]
    fn test_resource_version_bumps() {
        let mut store = InMemoryStore::new();
        let v0 = store.resource_version();
        let record = ResourceUnavailability::full_day(
            0,
            vec![1],
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            "medical",
        );
        let id = store.insert_unavailability(record).unwrap();
        assert!(store.resource_version() > v0);
        assert!(store.delete_unavailability(id).unwrap());
        assert!(!store.delete_unavailability(id).unwrap());
    }

    #[test]
    fn test_commit_schedule_reverts_displaced() {
        let mut store = InMemoryStore::new();
        store
            .insert_job(
                Job::new(1, "J-1001".to_string(), utc(0), JobPriority::Low),
                vec![RoutingOperation::new(1, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
            )
            .unwrap();
        store
            .insert_job(
                Job::new(2, "J-1002".to_string(), utc(0), JobPriority::Critical),
                vec![RoutingOperation::new(2, 1, "Mill", MachineType::Mill, 2.0, 0.0)],
            )
            .unwrap();
        store.update_job_status(1, JobStatus::Scheduled).unwrap();
        store
            .append_entries(vec![entry(1, "MILL-01", Some(1), 8, 10)])
            .unwrap();

        store
            .commit_schedule(2, vec![entry(2, "MILL-01", Some(1), 8, 10)], &[1])
            .unwrap();

        assert_eq!(store.job(1).unwrap().unwrap().status, JobStatus::Unscheduled);
        assert_eq!(store.job(2).unwrap().unwrap().status, JobStatus::Scheduled);
        assert!(store.entries_for_job(1).unwrap().is_empty());
        assert_eq!(store.entries_for_job(2).unwrap().len(), 1);
    }
}
