use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::gan::ParamStore;

pub const FINAL_GENERATOR: &str = "g_weights.pth";
pub const FINAL_DISCRIMINATOR: &str = "d_weights.pth";
const MANIFEST: &str = "checkpoints.jsonl";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointTag {
    Epoch(i64),
    Final,
}

/// Write-only sink for weight snapshots.
pub trait CheckpointStore {
    fn save(&mut self, params: &ParamStore, tag: CheckpointTag) -> Result<()>;
}

/// One line of `checkpoints.jsonl`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub tag: CheckpointTag,
    pub generator: String,
    pub discriminator: String,
    pub timestamp: u64,
}

/// Saves both var stores into a directory with libtorch serialization.
#[derive(Debug)]
pub struct DirCheckpointStore {
    dir: PathBuf,
}

impl DirCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<DirCheckpointStore> {
        let dir = dir.into();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating checkpoint dir {}", dir.display()))?;
        }
        Ok(DirCheckpointStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_names(tag: CheckpointTag) -> (String, String) {
        match tag {
            CheckpointTag::Epoch(epoch) => (format!("g_{epoch}.pth"), format!("d_{epoch}.pth")),
            CheckpointTag::Final => (FINAL_GENERATOR.to_string(), FINAL_DISCRIMINATOR.to_string()),
        }
    }
}

impl CheckpointStore for DirCheckpointStore {
    fn save(&mut self, params: &ParamStore, tag: CheckpointTag) -> Result<()> {
        let (generator, discriminator) = Self::file_names(tag);
        params.generator.save(self.dir.join(&generator))?;
        params.discriminator.save(self.dir.join(&discriminator))?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let record = CheckpointRecord { tag, generator, discriminator, timestamp };
        let mut manifest = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(MANIFEST))?;
        writeln!(manifest, "{}", serde_json::to_string(&record)?)?;

        info!("Saved: {} + {}", record.generator, record.discriminator);
        Ok(())
    }
}
