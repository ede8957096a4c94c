use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use anyhow::Result;
use std::path::PathBuf;

use shopsched::presentation::cli::{Cli, Commands};
use shopsched::presentation::cli::commands::SchedulerCommand;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("shopsched=debug,info")
    } else {
        EnvFilter::new("shopsched=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let database = cli
        .database
        .or_else(|| std::env::var("SHOPSCHED_DB").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("shopsched.db"));

    match cli.command {
        Commands::Import { input } => SchedulerCommand::import(&database, &input),
        Commands::Schedule { job, after } => {
            SchedulerCommand::schedule(&database, &job, after.as_deref())
        }
        Commands::ScheduleAll => SchedulerCommand::schedule_all(&database),
        Commands::Unschedule { job } => SchedulerCommand::unschedule(&database, &job),
        Commands::MarkUnavailable {
            operators,
            from,
            to,
            shifts,
            start_time,
            end_time,
            reason,
        } => SchedulerCommand::mark_unavailable(
            &database,
            &operators,
            &from,
            &to,
            &shifts,
            start_time.as_deref(),
            end_time.as_deref(),
            &reason,
        ),
        Commands::Report { output, format } => SchedulerCommand::report(&database, &output, &format),
    }
}
