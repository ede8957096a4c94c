use anyhow::Result;
use std::fs::File;
use std::path::Path;
use csv::Writer;
use crate::presentation::dto::ScheduleOutput;

pub struct CsvGenerator;

impl CsvGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<P: AsRef<Path>>(&self, output: &ScheduleOutput, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = Writer::from_writer(file);

        wtr.write_record([
            "Job",
            "Seq",
            "Operation",
            "Machine",
            "Operator",
            "Start (local)",
            "End (local)",
            "Shift",
            "Hours",
        ])?;

        for entry in &output.entries {
            wtr.write_record([
                &entry.job_number,
                &entry.sequence.to_string(),
                &entry.operation,
                &entry.machine_id,
                &entry.operator,
                &entry.start_local,
                &entry.end_local,
                &entry.shift.to_string(),
                &format!("{:.2}", entry.duration_hours),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvGenerator {
    fn default() -> Self {
        Self::new()
    }
}
