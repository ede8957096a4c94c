use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use crate::presentation::dto::ScheduleOutput;

pub struct JsonGenerator;

impl JsonGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<P: AsRef<Path>>(&self, output: &ScheduleOutput, path: P) -> Result<()> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), output)
            .context("Failed to serialize schedule report")?;
        Ok(())
    }
}

impl Default for JsonGenerator {
    fn default() -> Self {
        Self::new()
    }
}
