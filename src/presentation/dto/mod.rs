pub mod schedule_output;

pub use schedule_output::{BatchJobLine, BatchOutput, EntryRecord, ScheduleOutput};
