// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves model weights with Burn's named MessagePack recorders
// and keeps the model config next to them as JSON.
//
// What gets saved per checkpoint:
//   1. Model weights (.mpk.gz file) — all learned parameters,
//      at full or half precision
//   2. latest_step.json             — global step of the last save
//   3. model_config.json            — hyperparameters used
//
// File naming convention:
//   save_path/
//     model_step_1300.mpk.gz
//     latest_step.json
//     model_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::domain::config::ModelConfig;
use crate::ml::model::LstmLm;

/// Float width used when writing weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Full,
    /// 16-bit floats; selected by --use-fp16.
    Half,
}

impl Precision {
    pub fn from_fp16_flag(use_fp16: bool) -> Self {
        if use_fp16 { Precision::Half } else { Precision::Full }
    }
}

/// Manages saving of model checkpoints in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory (like `mkdir -p`).
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `{dir}/model_step_{step}.mpk.gz` and update the step pointer.
    pub fn save_model<B: Backend>(
        &self,
        model:     &LstmLm<B>,
        step:      usize,
        precision: Precision,
    ) -> Result<()> {
        // Recorder adds the extension
        let path   = self.dir.join(format!("model_step_{step}"));
        let record = model.clone().into_record();

        match precision {
            Precision::Half => CompactRecorder::new().record(record, path.clone()),
            Precision::Full => {
                NamedMpkGzFileRecorder::<FullPrecisionSettings>::new().record(record, path.clone())
            }
        }
        .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_step.json");
        fs::write(&latest_path, serde_json::to_string(&step)?)
            .with_context(|| "Failed to write latest_step.json")?;

        tracing::info!("Saved model to '{}' ({:?} precision)", path.display(), precision);
        Ok(())
    }

    pub fn save_config(&self, cfg: &ModelConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }
}

// Read-back of what a save wrote.
#[cfg(test)]
impl CheckpointManager {
    pub fn load_config(&self) -> Result<ModelConfig> {
        let path = self.dir.join("model_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Global step of the most recent save.
    pub fn latest_step(&self) -> Result<usize> {
        let path = self.dir.join("latest_step.json");
        let s    = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'", path.display()))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
