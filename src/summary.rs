use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const GENERATOR_LOSS: &str = "generator loss";
pub const DISCRIMINATOR_LOSS: &str = "discriminator loss";

/// Write-only sink for named scalars, tagged by step.
pub trait SummarySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: i64) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    pub step: i64,
    pub tag: String,
    pub value: f64,
    /// Seconds since the unix epoch.
    pub wall_time: f64,
}

/// Appends one JSON object per scalar to `<dir>/summary.jsonl`.
#[derive(Debug)]
pub struct JsonlSummaryWriter {
    out: BufWriter<File>,
}

impl JsonlSummaryWriter {
    pub fn new(dir: &Path) -> Result<JsonlSummaryWriter> {
        fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("summary.jsonl"))?;
        Ok(JsonlSummaryWriter { out: BufWriter::new(file) })
    }
}

impl SummarySink for JsonlSummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: i64) -> Result<()> {
        let wall_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.);
        let event = ScalarEvent { step, tag: tag.to_string(), value, wall_time };
        serde_json::to_writer(&mut self.out, &event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_scalar() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("debug");
        {
            let mut writer = JsonlSummaryWriter::new(&dir).unwrap();
            writer.add_scalar(GENERATOR_LOSS, 0.75, 1).unwrap();
            writer.add_scalar(DISCRIMINATOR_LOSS, 1.25, 1).unwrap();
        }
        {
            let mut writer = JsonlSummaryWriter::new(&dir).unwrap();
            writer.add_scalar(GENERATOR_LOSS, 0.5, 10).unwrap();
        }

        let text = fs::read_to_string(dir.join("summary.jsonl")).unwrap();
        let events: Vec<ScalarEvent> =
            text.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].tag, DISCRIMINATOR_LOSS);
        assert_eq!(events[1].value, 1.25);
        assert_eq!(events[2].step, 10);
        assert!(events.iter().all(|e| e.wall_time > 0.));
    }
}
