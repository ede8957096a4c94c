//! Dataset loader module
//!
//! This module loads a JSON world file (machines, operators, jobs with
//! routings) into any store. The file format is deliberately forgiving:
//! priorities, machine types, roles and shifts arrive as plain strings and
//! numbers and are converted onto the domain types on the way in.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::domain::entities::{Job, Machine, MachineStatus, Resource, ResourceRole, RoutingOperation};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::{JobPriority, MachineType, Shift};

/// Machine row of a dataset file
#[derive(Debug, Deserialize)]
pub struct MachineSpec {
    pub machine_id: String,
    pub machine_type: String,
    #[serde(default)]
    pub substitution_groups: Vec<String>,
    #[serde(default)]
    pub offline: bool,
    /// Shift numbers (1 and/or 2); both when omitted
    #[serde(default)]
    pub shifts: Vec<u8>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Operator row of a dataset file
#[derive(Debug, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub shifts: Vec<u8>,
    #[serde(default)]
    pub work_centers: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_role() -> String {
    "Operator".to_string()
}

/// Routing row of a dataset file
#[derive(Debug, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    pub machine_type: String,
    pub estimated_hours: f64,
    #[serde(default)]
    pub setup_hours: f64,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub compatible_machines: Vec<String>,
    #[serde(default)]
    pub quoted_machine: Option<String>,
    #[serde(default)]
    pub earliest_start: Option<DateTime<Utc>>,
}

/// Job row of a dataset file
#[derive(Debug, Deserialize)]
pub struct JobSpec {
    pub job_number: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub promised_date: Option<DateTime<Utc>>,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub routing: Vec<OperationSpec>,
}

fn default_priority() -> String {
    "Normal".to_string()
}

/// A full world description
#[derive(Debug, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub machines: Vec<MachineSpec>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

/// Loads dataset files into a store
pub struct DatasetLoader;

impl DatasetLoader {
    /// Creates a new DatasetLoader
    pub fn new() -> Self {
        Self
    }

    /// Parses a dataset file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON world file
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read dataset {}", path.as_ref().display()))?;
        serde_json::from_str(&text).context("Failed to parse dataset JSON")
    }

    /// Loads a parsed dataset into a store, assigning ids
    ///
    /// # Returns
    ///
    /// (machines, resources, jobs) counts loaded
    pub fn load<S: SchedulingStore + ?Sized>(
        &self,
        store: &mut S,
        dataset: Dataset,
    ) -> Result<(usize, usize, usize)> {
        for (index, spec) in dataset.machines.iter().enumerate() {
            let mut machine =
                Machine::new(index as u64 + 1, &spec.machine_id, MachineType::parse(&spec.machine_type));
            machine.substitution_groups = spec.substitution_groups.clone();
            machine.capabilities = spec.capabilities.clone();
            if spec.offline {
                machine.status = MachineStatus::Offline;
            }
            if !spec.shifts.is_empty() {
                machine.available_shifts = parse_shifts(&spec.shifts);
            }
            store.insert_machine(machine)?;
        }

        for (index, spec) in dataset.resources.iter().enumerate() {
            let shifts = if spec.shifts.is_empty() {
                vec![Shift::First]
            } else {
                parse_shifts(&spec.shifts)
            };
            let mut resource =
                Resource::new(index as u64 + 1, &spec.name, parse_role(&spec.role), shifts);
            resource.work_centers = spec.work_centers.clone();
            resource.skills = spec.skills.clone();
            store.insert_resource(resource)?;
        }

        for (index, spec) in dataset.jobs.iter().enumerate() {
            let job_id = index as u64 + 1;
            let mut job = Job::new(
                job_id,
                spec.job_number.clone(),
                spec.due_date,
                JobPriority::parse(&spec.priority),
            );
            job.promised_date = spec.promised_date;
            let routing: Vec<RoutingOperation> = spec
                .routing
                .iter()
                .enumerate()
                .map(|(position, op)| {
                    let mut operation = RoutingOperation::new(
                        job_id,
                        position as u32 + 1,
                        &op.name,
                        MachineType::parse(&op.machine_type),
                        op.estimated_hours,
                        op.setup_hours,
                    );
                    operation.required_skills = op.required_skills.clone();
                    operation.compatible_machines = op.compatible_machines.clone();
                    operation.original_quoted_machine = op.quoted_machine.clone();
                    operation.earliest_start = op.earliest_start;
                    operation
                })
                .collect();
            store.insert_job(job, routing)?;
        }

        info!(
            machines = dataset.machines.len(),
            resources = dataset.resources.len(),
            jobs = dataset.jobs.len(),
            "dataset loaded"
        );
        Ok((dataset.machines.len(), dataset.resources.len(), dataset.jobs.len()))
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_shifts(numbers: &[u8]) -> Vec<Shift> {
    numbers.iter().filter_map(|&n| Shift::try_from(n).ok()).collect()
}

fn parse_role(text: &str) -> ResourceRole {
    match text.to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
        "shiftlead" => ResourceRole::ShiftLead,
        "qualityinspector" | "inspector" => ResourceRole::QualityInspector,
        "maintenance" => ResourceRole::Maintenance,
        "supervisor" => ResourceRole::Supervisor,
        "setup" => ResourceRole::Setup,
        _ => ResourceRole::Operator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryStore;

    const WORLD: &str = r#"{
        "machines": [
            {"machine_id": "MILL-01", "machine_type": "MILL"},
            {"machine_id": "HMC-05", "machine_type": "MILL",
             "substitution_groups": ["mill-4ax", "mill-3ax"], "shifts": [1]}
        ],
        "resources": [
            {"name": "Alice", "shifts": [1], "work_centers": ["MILL-01"],
             "skills": ["cnc_operation"]},
            {"name": "Lindsay", "role": "quality_inspector", "shifts": [1],
             "work_centers": ["INSPECT-01"]}
        ],
        "jobs": [
            {"job_number": "J-1001", "due_date": "2025-06-20T00:00:00Z",
             "priority": "High",
             "routing": [
                {"name": "Rough mill", "machine_type": "MILL",
                 "estimated_hours": 4.0, "setup_hours": 0.5}
             ]}
        ]
    }"#;

    #[test]
    fn test_load_world() {
        let loader = DatasetLoader::new();
        let dataset: Dataset = serde_json::from_str(WORLD).unwrap();
        let mut store = InMemoryStore::new();
        let (machines, resources, jobs) = loader.load(&mut store, dataset).unwrap();

        assert_eq!((machines, resources, jobs), (2, 2, 1));
        let fleet = store.machines().unwrap();
        assert_eq!(fleet[1].available_shifts, vec![Shift::First]);
        let roster = store.active_resources().unwrap();
        assert_eq!(roster[1].role, ResourceRole::QualityInspector);
        let routing = store.routing(1).unwrap();
        assert_eq!(routing[0].sequence, 1);
        assert_eq!(routing[0].total_minutes(), 270);
        assert_eq!(store.job(1).unwrap().unwrap().priority, JobPriority::High);
    }
}
