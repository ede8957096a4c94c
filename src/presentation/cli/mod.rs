pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shopsched")]
#[command(author = "ShopSched Team")]
#[command(version = "0.1.0")]
#[command(about = "Shop-floor production scheduler for machines, operators and shifts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "SQLite database file (defaults to $SHOPSCHED_DB or shopsched.db)"
    )]
    pub database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Import a JSON world file (machines, operators, jobs)")]
    Import {
        #[arg(short, long, value_name = "FILE", help = "Input dataset JSON file")]
        input: PathBuf,
    },

    #[command(about = "Schedule one job by its job number")]
    Schedule {
        #[arg(value_name = "JOB_NUMBER", help = "Job number (e.g. J-1001)")]
        job: String,

        #[arg(long, value_name = "RFC3339", help = "Do not place work before this instant")]
        after: Option<String>,
    },

    #[command(about = "Schedule every unscheduled job in priority order")]
    ScheduleAll,

    #[command(about = "Remove a job's schedule entries")]
    Unschedule {
        #[arg(value_name = "JOB_NUMBER", help = "Job number (e.g. J-1001)")]
        job: String,
    },

    #[command(about = "Record operator unavailability and invalidate collided schedules")]
    MarkUnavailable {
        #[arg(long, value_delimiter = ',', value_name = "NAMES", help = "Operator names")]
        operators: Vec<String>,

        #[arg(long, value_name = "DATE", help = "First affected date (YYYY-MM-DD)")]
        from: String,

        #[arg(long, value_name = "DATE", help = "Last affected date (YYYY-MM-DD)")]
        to: String,

        #[arg(long, value_delimiter = ',', default_values_t = vec![1u8, 2u8], help = "Affected shifts")]
        shifts: Vec<u8>,

        #[arg(long, value_name = "HH:MM", help = "Partial-day range start")]
        start_time: Option<String>,

        #[arg(long, value_name = "HH:MM", help = "Partial-day range end")]
        end_time: Option<String>,

        #[arg(long, default_value = "unavailable", help = "Reason for the absence")]
        reason: String,
    },

    #[command(about = "Export the committed schedule as a report")]
    Report {
        #[arg(short, long, value_name = "DIR", default_value = "output", help = "Output directory")]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "all", help = "Report format")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
    All,
}

impl OutputFormat {
    pub fn should_generate_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::All)
    }

    pub fn should_generate_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::All)
    }
}
