//! CLI Commands module
//!
//! This module implements the CLI subcommands: dataset import, per-job and
//! batch scheduling, unscheduling, unavailability recording, and report
//! generation, including the console summaries printed after each action.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::application::use_cases::{
    BatchJobResult, BatchOutcome, DashboardQueries, MarkUnavailable, ScheduleAll, ScheduleJob,
    ScheduleOptions, UnavailabilityRequest, UnscheduleJob,
};
use crate::domain::repositories::SchedulingStore;
use crate::domain::value_objects::{JobPriority, Shift};
use crate::infrastructure::output::{CsvGenerator, JsonGenerator};
use crate::infrastructure::parsers::DatasetLoader;
use crate::infrastructure::repositories::SqliteStore;
use crate::presentation::cli::OutputFormat;
use crate::presentation::dto::{EntryRecord, ScheduleOutput};

/// Command implementations for the scheduler CLI
pub struct SchedulerCommand;

impl SchedulerCommand {
    /// Imports a JSON world file into the database
    pub fn import(database: &Path, input: &Path) -> Result<()> {
        let mut store = SqliteStore::open(database)?;
        let loader = DatasetLoader::new();
        let dataset = loader.parse(input)?;
        let (machines, resources, jobs) = loader.load(&mut store, dataset)?;

        println!("✅ Imported {} machines, {} operators, {} jobs", machines, resources, jobs);
        Ok(())
    }

    /// Schedules one job by its job number
    pub fn schedule(database: &Path, job_number: &str, after: Option<&str>) -> Result<()> {
        let mut store = SqliteStore::open(database)?;
        let job_id = Self::resolve_job(&store, job_number)?;

        let mut options = ScheduleOptions::at(Utc::now());
        if let Some(after) = after {
            let instant: DateTime<Utc> = after
                .parse()
                .with_context(|| format!("Invalid --after instant: {}", after))?;
            options.schedule_after = Some(instant);
        }

        let outcome = ScheduleJob::new().execute(&mut store, job_id, &options)?;
        match outcome.failure {
            None => {
                println!("✅ Scheduled {} ({} entries)", job_number, outcome.entries.len());
                if !outcome.displaced_jobs.is_empty() {
                    println!("  ⚠️  Displaced jobs reverted to Unscheduled: {:?}", outcome.displaced_jobs);
                }
                for entry in &outcome.entries {
                    let record = EntryRecord::build(&store, entry)?;
                    println!(
                        "  • op {} on {} with {}  {} → {}  (shift {})",
                        record.sequence,
                        record.machine_id,
                        if record.operator.is_empty() { "-" } else { &record.operator },
                        record.start_local,
                        record.end_local,
                        record.shift
                    );
                }
            }
            Some(failure) => {
                println!("❌ Could not schedule {}: {}", job_number, failure);
            }
        }
        Ok(())
    }

    /// Schedules every unscheduled job, with a progress bar
    pub fn schedule_all(database: &Path) -> Result<()> {
        let mut store = SqliteStore::open(database)?;
        let pending = ScheduleAll::batch_order(&store.jobs()?).len();

        let bar = ProgressBar::new(pending as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let options = ScheduleOptions::at(Utc::now());
        let outcome = ScheduleAll::new().execute(&mut store, &options, |result| {
            bar.set_message(result.job_number.clone());
            bar.inc(1);
        })?;
        bar.finish_and_clear();

        Self::print_batch_summary(&store, &outcome)?;
        Ok(())
    }

    /// Removes a job's schedule entries
    pub fn unschedule(database: &Path, job_number: &str) -> Result<()> {
        let mut store = SqliteStore::open(database)?;
        let job_id = Self::resolve_job(&store, job_number)?;
        let outcome = UnscheduleJob::new().execute(&mut store, job_id)?;
        println!("✅ Unscheduled {} ({} entries removed)", job_number, outcome.deleted);
        Ok(())
    }

    /// Records unavailability and reports invalidated jobs
    #[allow(clippy::too_many_arguments)]
    pub fn mark_unavailable(
        database: &Path,
        operators: &[String],
        from: &str,
        to: &str,
        shifts: &[u8],
        start_time: Option<&str>,
        end_time: Option<&str>,
        reason: &str,
    ) -> Result<()> {
        let mut store = SqliteStore::open(database)?;

        let roster = store.active_resources()?;
        let mut resource_ids = Vec::new();
        for name in operators {
            match roster.iter().find(|r| r.name.eq_ignore_ascii_case(name)) {
                Some(resource) => resource_ids.push(resource.id),
                None => bail!("Unknown operator: {}", name),
            }
        }

        let start_date: NaiveDate = from.parse().context("Invalid --from date")?;
        let end_date: NaiveDate = to.parse().context("Invalid --to date")?;
        let parse_clock = |text: &str| -> Result<NaiveTime> {
            NaiveTime::parse_from_str(text, "%H:%M")
                .with_context(|| format!("Invalid clock time: {}", text))
        };
        let start_time = start_time.map(parse_clock).transpose()?;
        let end_time = end_time.map(parse_clock).transpose()?;

        let request = UnavailabilityRequest {
            resource_ids,
            start_date,
            end_date,
            partial: start_time.is_some() && end_time.is_some(),
            start_time,
            end_time,
            shifts: shifts
                .iter()
                .filter_map(|&n| Shift::try_from(n).ok())
                .collect(),
            reason: reason.to_string(),
            notes: None,
        };
        let outcome = MarkUnavailable::new().execute(&mut store, &request)?;

        println!("✅ Unavailability recorded (record {})", outcome.record_id);
        if outcome.invalidated_jobs.is_empty() {
            println!("  • No schedules collided");
        } else {
            println!(
                "  ⚠️  {} job(s) reverted to Unscheduled: {:?}",
                outcome.invalidated_jobs.len(),
                outcome.invalidated_jobs
            );
        }
        Ok(())
    }

    /// Exports the committed schedule as JSON and/or CSV reports
    pub fn report(database: &Path, output_dir: &Path, format: &OutputFormat) -> Result<()> {
        let store = SqliteStore::open(database)?;
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let now = Utc::now();
        let queries = DashboardQueries::new();
        let mut raw = Vec::new();
        for job in store.jobs()? {
            raw.extend(store.entries_for_job(job.id)?);
        }
        raw.sort_by_key(|entry| entry.start);
        let mut entries = Vec::with_capacity(raw.len());
        for entry in &raw {
            entries.push(EntryRecord::build(&store, entry)?);
        }

        let output = ScheduleOutput {
            generated_at: now,
            entries,
            shift_metrics: queries.shift_metrics(&store, now)?.to_vec(),
        };

        if format.should_generate_json() {
            let path = output_dir.join("schedule.json");
            JsonGenerator::new().generate(&output, &path)?;
            info!("JSON report written to {}", path.display());
        }
        if format.should_generate_csv() {
            let path = output_dir.join("schedule.csv");
            CsvGenerator::new().generate(&output, &path)?;
            info!("CSV report written to {}", path.display());
        }

        println!("✅ Report generated ({} entries)", output.entries.len());
        Ok(())
    }

    /// Looks a job up by its human job number
    fn resolve_job(store: &SqliteStore, job_number: &str) -> Result<u64> {
        store
            .jobs()?
            .into_iter()
            .find(|job| job.job_number == job_number)
            .map(|job| job.id)
            .with_context(|| format!("Unknown job number: {}", job_number))
    }

    /// Prints the batch summary: totals, per-priority breakdown, failures
    /// with reasons, and the current shift balance
    fn print_batch_summary(store: &SqliteStore, outcome: &BatchOutcome) -> Result<()> {
        println!("\n{}", "=".repeat(60));
        println!("📊 BATCH SCHEDULING SUMMARY");
        println!("{}", "=".repeat(60));
        println!("  • Jobs considered:  {}", outcome.total);
        println!("  • Scheduled:        {}", outcome.scheduled);
        println!("  • Failed:           {}", outcome.failed);

        Self::print_priority_breakdown(&outcome.per_job, outcome.total);
        Self::print_failures(&outcome.per_job);

        let metrics = DashboardQueries::new().shift_metrics(store, Utc::now())?;
        println!("\n⚖️  Weekly shift balance:");
        for m in metrics {
            println!(
                "  • Shift {}: {:.1}h / {:.1}h ({:.0}% of capacity, {} operators)",
                m.shift.number(),
                m.load_hours,
                m.capacity_hours,
                m.load_percentage(),
                m.headcount
            );
        }
        println!("{}", "=".repeat(60));
        Ok(())
    }

    /// Calculates percentage for display purposes
    ///
    /// # Arguments
    ///
    /// * `count` - Numerator value
    /// * `total` - Denominator value
    ///
    /// # Returns
    ///
    /// Percentage as f64 (0.0 if total is 0)
    fn calculate_percentage(count: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (count as f64 / total as f64) * 100.0
        }
    }

    /// Prints the per-priority breakdown of the batch
    ///
    /// Shows, for each priority tier, how many jobs the batch considered
    /// and how many of them were scheduled.
    ///
    /// # Arguments
    ///
    /// * `per_job` - Per-job result lines of the batch
    /// * `total` - Jobs considered by the batch
    fn print_priority_breakdown(per_job: &[BatchJobResult], total: usize) {
        println!("\n🎯 Priority Breakdown:");
        for priority in [
            JobPriority::Critical,
            JobPriority::High,
            JobPriority::Normal,
            JobPriority::Low,
        ] {
            let considered = per_job.iter().filter(|line| line.priority == priority).count();
            let scheduled = per_job
                .iter()
                .filter(|line| line.priority == priority && line.success)
                .count();
            println!(
                "  • {:<9} {} jobs ({:.1}%), {} scheduled",
                format!("{}:", priority),
                considered,
                Self::calculate_percentage(considered, total),
                scheduled
            );
        }
    }

    /// Prints the failed jobs with their failure reasons
    fn print_failures(per_job: &[BatchJobResult]) {
        let failures: Vec<&BatchJobResult> = per_job.iter().filter(|line| !line.success).collect();
        if failures.is_empty() {
            return;
        }
        println!("\n❌ Failures:");
        for line in failures {
            if let Some(failure) = &line.failure {
                println!("  • {} ({}): {}", line.job_number, line.priority, failure);
            }
        }
    }
}
