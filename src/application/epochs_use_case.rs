// ============================================================
// Layer 2 — EpochsUseCase
// ============================================================
// Dry run of the data side of a training run: split the
// manifest and estimate how many batches each role's epoch
// would draw, without loading embeddings or building a model.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::train_use_case::load_split;
use crate::data::epoch::{clamp_epoch_size, estimate_epoch_size};
use crate::domain::config::{ModelConfig, Preset};

/// Estimate for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleEstimate {
    pub role:       &'static str,
    pub files:      usize,
    pub batch_size: usize,
    pub num_steps:  usize,
    /// Raw estimate; zero or negative for tiny corpora.
    pub estimate:   i64,
    /// Value the driver would loop over.
    pub epoch_size: usize,
}

pub struct EpochsUseCase {
    model:     Preset,
    data_path: PathBuf,
}

impl EpochsUseCase {
    pub fn new(model: Preset, data_path: PathBuf) -> Self {
        Self { model, data_path }
    }

    pub fn execute(&self) -> Result<Vec<RoleEstimate>> {
        let split = load_split(&self.data_path)?;
        let base  = ModelConfig::preset(self.model);
        let eval  = base.for_evaluation();

        [("train", &split.train, &base), ("valid", &split.valid, &base), ("test", &split.test, &eval)]
            .into_iter()
            .map(|(role, files, cfg)| -> Result<RoleEstimate> {
                let estimate = estimate_epoch_size(files, cfg.batch_size, cfg.num_steps)?;
                Ok(RoleEstimate {
                    role,
                    files: files.len(),
                    batch_size: cfg.batch_size,
                    num_steps: cfg.num_steps,
                    estimate,
                    epoch_size: clamp_epoch_size(estimate),
                })
            })
            .collect()
    }
}
