//! SQLite Store implementation
//!
//! This module provides a SQLite-backed implementation of the
//! SchedulingStore trait with a normalized schema and indexes tuned for the
//! engine's access patterns (entries by machine, by operator, by job, by
//! time range). Pass commits and displacement reverts run inside a single
//! transaction; entry invariants are enforced before anything is written.

use std::cell::Cell;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};

use crate::domain::entities::{
    EntryStatus, Job, JobStatus, Machine, MachineStatus, Resource, ResourceRole,
    ResourceUnavailability, RoutingOperation, ScheduleEntry,
};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::{JobPriority, MachineType, Shift};

/// SQLite-backed implementation of the SchedulingStore trait
pub struct SqliteStore {
    conn: Connection,
    /// Cached copy of the persisted resource version
    version: Cell<u64>,
}

impl SqliteStore {
    /// Opens (or creates) the database at the given path
    ///
    /// Configures WAL mode and creates the schema when missing.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open SQLite database")?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;

        let store = Self { conn, version: Cell::new(0) };
        store.create_schema()?;
        store.version.set(store.read_version()?);
        Ok(store)
    }

    /// Opens an in-memory database (tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn, version: Cell::new(0) };
        store.create_schema()?;
        Ok(store)
    }

    /// Creates the schema with all tables and indexes
    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Jobs table
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY,
                job_number TEXT NOT NULL UNIQUE,
                due_date TEXT NOT NULL,
                promised_date TEXT,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Routing operations table
            CREATE TABLE IF NOT EXISTS routing_operations (
                job_id INTEGER NOT NULL,
                sequence INTEGER NOT NULL,
                name TEXT NOT NULL,
                machine_type TEXT NOT NULL,
                estimated_hours REAL NOT NULL,
                setup_hours REAL NOT NULL,
                required_skills TEXT NOT NULL,
                compatible_machines TEXT NOT NULL,
                original_quoted_machine TEXT,
                earliest_start TEXT,
                modified INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (job_id, sequence),
                FOREIGN KEY (job_id) REFERENCES jobs(id) ON DELETE CASCADE
            );

            -- Machines table
            CREATE TABLE IF NOT EXISTS machines (
                id INTEGER PRIMARY KEY,
                machine_id TEXT NOT NULL UNIQUE,
                machine_type TEXT NOT NULL,
                substitution_groups TEXT NOT NULL,
                status TEXT NOT NULL,
                available_shifts TEXT NOT NULL,
                efficiency_factor REAL NOT NULL,
                capabilities TEXT NOT NULL,
                position INTEGER NOT NULL
            );

            -- Resources table
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL,
                active INTEGER NOT NULL,
                shift_schedule TEXT NOT NULL,
                work_centers TEXT NOT NULL,
                skills TEXT NOT NULL,
                position INTEGER NOT NULL
            );

            -- Resource unavailability table
            CREATE TABLE IF NOT EXISTS resource_unavailability (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                resource_ids TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                partial INTEGER NOT NULL,
                start_time TEXT,
                end_time TEXT,
                shifts TEXT NOT NULL,
                reason TEXT NOT NULL,
                notes TEXT
            );

            -- Schedule entries table
            CREATE TABLE IF NOT EXISTS schedule_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL,
                sequence INTEGER NOT NULL,
                machine_id TEXT NOT NULL,
                resource_id INTEGER,
                start TEXT NOT NULL,
                end TEXT NOT NULL,
                shift INTEGER NOT NULL,
                status TEXT NOT NULL,
                FOREIGN KEY (job_id) REFERENCES jobs(id) ON DELETE CASCADE
            );

            -- Version counter for resources/unavailability
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            INSERT OR IGNORE INTO meta (key, value) VALUES ('resource_version', 0);

            CREATE INDEX IF NOT EXISTS idx_entries_machine ON schedule_entries(machine_id, start);
            CREATE INDEX IF NOT EXISTS idx_entries_resource ON schedule_entries(resource_id, start);
            CREATE INDEX IF NOT EXISTS idx_entries_job ON schedule_entries(job_id);
            CREATE INDEX IF NOT EXISTS idx_entries_start ON schedule_entries(start);
            CREATE INDEX IF NOT EXISTS idx_unavailability_range
                ON resource_unavailability(start_date, end_date);
            "#,
        )?;
        Ok(())
    }

    fn read_version(&self) -> Result<u64> {
        let version: i64 = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'resource_version'",
            [],
            |row| row.get(0),
        )?;
        Ok(version as u64)
    }

    fn bump_version(&self) -> Result<()> {
        self.conn.execute(
            "UPDATE meta SET value = value + 1 WHERE key = 'resource_version'",
            [],
        )?;
        self.version.set(self.version.get() + 1);
        Ok(())
    }

    fn query_entries(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ScheduleEntry>> {
        let mut statement = self.conn.prepare(sql)?;
        let rows = statement.query_map(params, entry_from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Rejects an entry that would break the write-time invariants
    ///
    /// Operator-less (OUTSOURCE) entries are exempt from machine overlap,
    /// matching their no-capacity-ceiling semantics.
    fn check_entry(&self, entry: &ScheduleEntry) -> Result<()> {
        if entry.end <= entry.start {
            bail!(
                "schedule entry for job {} op {} ends at or before its start",
                entry.job_id,
                entry.sequence
            );
        }
        if let Some(resource_id) = entry.resource_id {
            let machine_clash: bool = self.conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM schedule_entries
                    WHERE machine_id = ?1 AND status != 'Cancelled'
                      AND resource_id IS NOT NULL
                      AND start < ?3 AND ?2 < end
                )",
                params![entry.machine_id, rfc3339(entry.start), rfc3339(entry.end)],
                |row| row.get(0),
            )?;
            if machine_clash {
                bail!("machine {} double-booked by job {}", entry.machine_id, entry.job_id);
            }
            let operator_clash: bool = self.conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM schedule_entries
                    WHERE resource_id = ?1 AND status != 'Cancelled'
                      AND start < ?3 AND ?2 < end
                )",
                params![resource_id as i64, rfc3339(entry.start), rfc3339(entry.end)],
                |row| row.get(0),
            )?;
            if operator_clash {
                bail!("operator {} double-booked by job {}", resource_id, entry.job_id);
            }
        }
        Ok(())
    }

    fn insert_entry(&self, entry: &ScheduleEntry) -> Result<u64> {
        self.conn.execute(
            "INSERT INTO schedule_entries
                (job_id, sequence, machine_id, resource_id, start, end, shift, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.job_id as i64,
                entry.sequence,
                entry.machine_id,
                entry.resource_id.map(|id| id as i64),
                rfc3339(entry.start),
                rfc3339(entry.end),
                entry.shift.number(),
                status_str(entry.status),
            ],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }
}

impl SchedulingStore for SqliteStore {
    fn job(&self, job_id: u64) -> Result<Option<Job>> {
        let mut statement = self.conn.prepare(
            "SELECT id, job_number, due_date, promised_date, priority, status, created_at
             FROM jobs WHERE id = ?1",
        )?;
        let mut rows = statement.query_map(params![job_id as i64], job_from_row)?;
        match rows.next() {
            Some(job) => Ok(Some(job?)),
            None => Ok(None),
        }
    }

    fn jobs(&self) -> Result<Vec<Job>> {
        let mut statement = self.conn.prepare(
            "SELECT id, job_number, due_date, promised_date, priority, status, created_at
             FROM jobs ORDER BY id",
        )?;
        let rows = statement.query_map([], job_from_row)?;
        let mut jobs = Vec::new();
        for row in rows {
            jobs.push(row?);
        }
        Ok(jobs)
    }

    fn routing(&self, job_id: u64) -> Result<Vec<RoutingOperation>> {
        let mut statement = self.conn.prepare(
            "SELECT job_id, sequence, name, machine_type, estimated_hours, setup_hours,
                    required_skills, compatible_machines, original_quoted_machine,
                    earliest_start, modified
             FROM routing_operations WHERE job_id = ?1 ORDER BY sequence",
        )?;
        let rows = statement.query_map(params![job_id as i64], operation_from_row)?;
        let mut routing = Vec::new();
        for row in rows {
            routing.push(row?);
        }
        Ok(routing)
    }

    fn machines(&self) -> Result<Vec<Machine>> {
        let mut statement = self.conn.prepare(
            "SELECT id, machine_id, machine_type, substitution_groups, status,
                    available_shifts, efficiency_factor, capabilities
             FROM machines ORDER BY position",
        )?;
        let rows = statement.query_map([], machine_from_row)?;
        let mut machines = Vec::new();
        for row in rows {
            machines.push(row?);
        }
        Ok(machines)
    }

    fn machines_in_group(&self, group: &str) -> Result<Vec<Machine>> {
        Ok(self
            .machines()?
            .into_iter()
            .filter(|m| m.substitution_groups.iter().any(|g| g == group))
            .collect())
    }

    fn active_resources(&self) -> Result<Vec<Resource>> {
        let mut statement = self.conn.prepare(
            "SELECT id, name, role, active, shift_schedule, work_centers, skills
             FROM resources WHERE active = 1 ORDER BY position",
        )?;
        let rows = statement.query_map([], resource_from_row)?;
        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?);
        }
        Ok(resources)
    }

    fn unavailability_overlapping(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ResourceUnavailability>> {
        let mut statement = self.conn.prepare(
            "SELECT id, resource_ids, start_date, end_date, partial, start_time, end_time,
                    shifts, reason, notes
             FROM resource_unavailability
             WHERE start_date <= ?2 AND end_date >= ?1",
        )?;
        let rows = statement.query_map(
            params![from.to_string(), to.to_string()],
            unavailability_from_row,
        )?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn entries_for_machine(&self, machine_id: &str) -> Result<Vec<ScheduleEntry>> {
        self.query_entries(
            "SELECT id, job_id, sequence, machine_id, resource_id, start, end, shift, status
             FROM schedule_entries WHERE machine_id = ?1 ORDER BY start",
            params![machine_id],
        )
    }

    fn entries_for_resource(&self, resource_id: u64) -> Result<Vec<ScheduleEntry>> {
        self.query_entries(
            "SELECT id, job_id, sequence, machine_id, resource_id, start, end, shift, status
             FROM schedule_entries WHERE resource_id = ?1 ORDER BY start",
            params![resource_id as i64],
        )
    }

    fn entries_for_job(&self, job_id: u64) -> Result<Vec<ScheduleEntry>> {
        self.query_entries(
            "SELECT id, job_id, sequence, machine_id, resource_id, start, end, shift, status
             FROM schedule_entries WHERE job_id = ?1 ORDER BY start",
            params![job_id as i64],
        )
    }

    fn entries_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>> {
        self.query_entries(
            "SELECT id, job_id, sequence, machine_id, resource_id, start, end, shift, status
             FROM schedule_entries WHERE start < ?2 AND ?1 < end ORDER BY start",
            params![rfc3339(from), rfc3339(to)],
        )
    }

    fn resource_version(&self) -> u64 {
        self.version.get()
    }

    fn append_entries(&mut self, entries: Vec<ScheduleEntry>) -> Result<Vec<ScheduleEntry>> {
        let transaction = self.conn.unchecked_transaction()?;
        let mut appended = Vec::with_capacity(entries.len());
        for mut entry in entries {
            self.check_entry(&entry)?;
            entry.id = self.insert_entry(&entry)?;
            appended.push(entry);
        }
        transaction.commit()?;
        Ok(appended)
    }

    fn delete_entries_for_job(&mut self, job_id: u64) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM schedule_entries WHERE job_id = ?1",
            params![job_id as i64],
        )?;
        Ok(deleted)
    }

    fn update_job_status(&mut self, job_id: u64, status: JobStatus) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE jobs SET status = ?2 WHERE id = ?1",
            params![job_id as i64, job_status_str(status)],
        )?;
        if updated == 0 {
            bail!("unknown job id {}", job_id);
        }
        Ok(())
    }

    fn commit_schedule(
        &mut self,
        job_id: u64,
        entries: Vec<ScheduleEntry>,
        displaced_jobs: &[u64],
    ) -> Result<Vec<ScheduleEntry>> {
        let transaction = self.conn.unchecked_transaction()?;
        for &displaced in displaced_jobs {
            self.conn.execute(
                "DELETE FROM schedule_entries WHERE job_id = ?1",
                params![displaced as i64],
            )?;
            self.conn.execute(
                "UPDATE jobs SET status = ?2 WHERE id = ?1",
                params![displaced as i64, job_status_str(JobStatus::Unscheduled)],
            )?;
        }
        let mut appended = Vec::with_capacity(entries.len());
        for mut entry in entries {
            self.check_entry(&entry)?;
            entry.id = self.insert_entry(&entry)?;
            appended.push(entry);
        }
        self.conn.execute(
            "UPDATE jobs SET status = ?2 WHERE id = ?1",
            params![job_id as i64, job_status_str(JobStatus::Scheduled)],
        )?;
        transaction.commit()?;
        Ok(appended)
    }

    fn insert_unavailability(&mut self, record: ResourceUnavailability) -> Result<u64> {
        self.conn.execute(
            "INSERT INTO resource_unavailability
                (resource_ids, start_date, end_date, partial, start_time, end_time,
                 shifts, reason, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                serde_json::to_string(&record.resource_ids)?,
                record.start_date.to_string(),
                record.end_date.to_string(),
                record.partial,
                record.start_time.map(|t| t.to_string()),
                record.end_time.map(|t| t.to_string()),
                serde_json::to_string(&record.shifts)?,
                record.reason,
                record.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid() as u64;
        self.bump_version()?;
        Ok(id)
    }

    fn delete_unavailability(&mut self, record_id: u64) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM resource_unavailability WHERE id = ?1",
            params![record_id as i64],
        )?;
        if deleted > 0 {
            self.bump_version()?;
        }
        Ok(deleted > 0)
    }

    fn insert_job(&mut self, job: Job, routing: Vec<RoutingOperation>) -> Result<()> {
        let transaction = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO jobs (id, job_number, due_date, promised_date, priority, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job.id as i64,
                job.job_number,
                rfc3339(job.due_date),
                job.promised_date.map(rfc3339),
                job.priority.to_string(),
                job_status_str(job.status),
                rfc3339(job.created_at),
            ],
        )?;
        for op in &routing {
            self.conn.execute(
                "INSERT INTO routing_operations
                    (job_id, sequence, name, machine_type, estimated_hours, setup_hours,
                     required_skills, compatible_machines, original_quoted_machine,
                     earliest_start, modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    op.job_id as i64,
                    op.sequence,
                    op.name,
                    op.machine_type.tag(),
                    op.estimated_hours,
                    op.setup_hours,
                    serde_json::to_string(&op.required_skills)?,
                    serde_json::to_string(&op.compatible_machines)?,
                    op.original_quoted_machine,
                    op.earliest_start.map(rfc3339),
                    op.modified,
                ],
            )?;
        }
        transaction.commit()?;
        Ok(())
    }

    fn insert_machine(&mut self, machine: Machine) -> Result<()> {
        let position: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM machines", [], |row| row.get(0))?;
        self.conn.execute(
            "INSERT INTO machines
                (id, machine_id, machine_type, substitution_groups, status,
                 available_shifts, efficiency_factor, capabilities, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                machine.id as i64,
                machine.machine_id,
                machine.machine_type.tag(),
                serde_json::to_string(&machine.substitution_groups)?,
                machine_status_str(machine.status),
                serde_json::to_string(&machine.available_shifts)?,
                machine.efficiency_factor,
                serde_json::to_string(&machine.capabilities)?,
                position,
            ],
        )?;
        Ok(())
    }

    fn insert_resource(&mut self, resource: Resource) -> Result<()> {
        let position: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        self.conn.execute(
            "INSERT INTO resources
                (id, name, role, active, shift_schedule, work_centers, skills, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                resource.id as i64,
                resource.name,
                role_str(resource.role),
                resource.active,
                serde_json::to_string(&resource.shift_schedule)?,
                serde_json::to_string(&resource.work_centers)?,
                serde_json::to_string(&resource.skills)?,
                position,
            ],
        )?;
        self.bump_version()?;
        Ok(())
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339()
}

fn parse_instant(text: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn parse_json<T: serde::de::DeserializeOwned>(text: String) -> rusqlite::Result<T> {
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn job_status_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Unscheduled => "Unscheduled",
        JobStatus::Planning => "Planning",
        JobStatus::Scheduled => "Scheduled",
        JobStatus::InProgress => "InProgress",
        JobStatus::Complete => "Complete",
        JobStatus::OnHold => "OnHold",
    }
}

fn job_status_from(text: &str) -> JobStatus {
    match text {
        "Planning" => JobStatus::Planning,
        "Scheduled" => JobStatus::Scheduled,
        "InProgress" => JobStatus::InProgress,
        "Complete" => JobStatus::Complete,
        "OnHold" => JobStatus::OnHold,
        _ => JobStatus::Unscheduled,
    }
}

fn machine_status_str(status: MachineStatus) -> &'static str {
    match status {
        MachineStatus::Available => "Available",
        MachineStatus::Busy => "Busy",
        MachineStatus::Maintenance => "Maintenance",
        MachineStatus::Offline => "Offline",
    }
}

fn machine_status_from(text: &str) -> MachineStatus {
    match text {
        "Busy" => MachineStatus::Busy,
        "Maintenance" => MachineStatus::Maintenance,
        "Offline" => MachineStatus::Offline,
        _ => MachineStatus::Available,
    }
}

fn role_str(role: ResourceRole) -> &'static str {
    match role {
        ResourceRole::Operator => "Operator",
        ResourceRole::ShiftLead => "ShiftLead",
        ResourceRole::QualityInspector => "QualityInspector",
        ResourceRole::Maintenance => "Maintenance",
        ResourceRole::Supervisor => "Supervisor",
        ResourceRole::Setup => "Setup",
    }
}

fn role_from(text: &str) -> ResourceRole {
    match text {
        "ShiftLead" => ResourceRole::ShiftLead,
        "QualityInspector" => ResourceRole::QualityInspector,
        "Maintenance" => ResourceRole::Maintenance,
        "Supervisor" => ResourceRole::Supervisor,
        "Setup" => ResourceRole::Setup,
        _ => ResourceRole::Operator,
    }
}

fn status_str(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Scheduled => "Scheduled",
        EntryStatus::InProgress => "InProgress",
        EntryStatus::Complete => "Complete",
        EntryStatus::Cancelled => "Cancelled",
    }
}

fn entry_status_from(text: &str) -> EntryStatus {
    match text {
        "InProgress" => EntryStatus::InProgress,
        "Complete" => EntryStatus::Complete,
        "Cancelled" => EntryStatus::Cancelled,
        _ => EntryStatus::Scheduled,
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(Job {
        id: row.get::<_, i64>(0)? as u64,
        job_number: row.get(1)?,
        due_date: parse_instant(row.get(2)?)?,
        promised_date: row.get::<_, Option<String>>(3)?.map(parse_instant).transpose()?,
        priority: JobPriority::parse(&priority),
        status: job_status_from(&status),
        created_at: parse_instant(row.get(6)?)?,
    })
}

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<RoutingOperation> {
    let machine_type: String = row.get(3)?;
    Ok(RoutingOperation {
        job_id: row.get::<_, i64>(0)? as u64,
        sequence: row.get(1)?,
        name: row.get(2)?,
        machine_type: MachineType::parse(&machine_type),
        estimated_hours: row.get(4)?,
        setup_hours: row.get(5)?,
        required_skills: parse_json(row.get(6)?)?,
        compatible_machines: parse_json(row.get(7)?)?,
        original_quoted_machine: row.get(8)?,
        earliest_start: row.get::<_, Option<String>>(9)?.map(parse_instant).transpose()?,
        modified: row.get(10)?,
    })
}

fn machine_from_row(row: &Row<'_>) -> rusqlite::Result<Machine> {
    let machine_type: String = row.get(2)?;
    let status: String = row.get(4)?;
    Ok(Machine {
        id: row.get::<_, i64>(0)? as u64,
        machine_id: row.get(1)?,
        machine_type: MachineType::parse(&machine_type),
        substitution_groups: parse_json(row.get(3)?)?,
        status: machine_status_from(&status),
        available_shifts: parse_json(row.get(5)?)?,
        efficiency_factor: row.get(6)?,
        capabilities: parse_json(row.get(7)?)?,
    })
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    let role: String = row.get(2)?;
    Ok(Resource {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        role: role_from(&role),
        active: row.get(3)?,
        shift_schedule: parse_json(row.get(4)?)?,
        work_centers: parse_json(row.get(5)?)?,
        skills: parse_json(row.get(6)?)?,
    })
}

fn unavailability_from_row(row: &Row<'_>) -> rusqlite::Result<ResourceUnavailability> {
    Ok(ResourceUnavailability {
        id: row.get::<_, i64>(0)? as u64,
        resource_ids: parse_json(row.get(1)?)?,
        start_date: parse_date(row.get(2)?)?,
        end_date: parse_date(row.get(3)?)?,
        partial: row.get(4)?,
        start_time: row.get::<_, Option<String>>(5)?.map(parse_time).transpose()?,
        end_time: row.get::<_, Option<String>>(6)?.map(parse_time).transpose()?,
        shifts: parse_json(row.get(7)?)?,
        reason: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleEntry> {
    let shift: u8 = row.get(7)?;
    let status: String = row.get(8)?;
    Ok(ScheduleEntry {
        id: row.get::<_, i64>(0)? as u64,
        job_id: row.get::<_, i64>(1)? as u64,
        sequence: row.get(2)?,
        machine_id: row.get(3)?,
        resource_id: row.get::<_, Option<i64>>(4)?.map(|id| id as u64),
        start: parse_instant(row.get(5)?)?,
        end: parse_instant(row.get(6)?)?,
        shift: Shift::try_from(shift).unwrap_or(Shift::First),
        status: entry_status_from(&status),
    })
}

fn parse_date(text: String) -> rusqlite::Result<NaiveDate> {
    text.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(text: String) -> rusqlite::Result<chrono::NaiveTime> {
    text.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
