pub mod mark_unavailable;
pub mod queries;
pub mod schedule_all;
pub mod schedule_job;
pub mod unschedule_job;

pub use mark_unavailable::{MarkUnavailable, UnavailabilityOutcome, UnavailabilityRequest};
pub use queries::DashboardQueries;
pub use schedule_all::{BatchJobResult, BatchOutcome, ScheduleAll};
pub use schedule_job::{ScheduleJob, ScheduleJobError, ScheduleOptions, ScheduleOutcome};
pub use unschedule_job::UnscheduleJob;
