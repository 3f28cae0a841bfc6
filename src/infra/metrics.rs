// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records per-epoch perplexities to a CSV file.
//
// Columns:
//   - epoch:            1-based epoch number, or "test" for the final row
//   - learning_rate:    rate pushed into the engine for the epoch
//   - train_perplexity: exp(total cost / total steps) on the train role
//   - valid_perplexity: same on the validation role
//   - test_perplexity:  only on the final row
//
// A role that did not run leaves its cell empty.
//
// Example:
//   epoch,learning_rate,train_perplexity,valid_perplexity,test_perplexity
//   1,1.000000,812.340000,640.120000,
//   2,1.000000,402.110000,390.800000,
//   test,,,,371.550000

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:            usize,
    pub learning_rate:    f64,
    pub train_perplexity: Option<f64>,
    pub valid_perplexity: Option<f64>,
}

impl EpochMetrics {
    /// True if validation perplexity beat `best`.
    pub fn is_improvement(&self, best: f64) -> bool {
        self.valid_perplexity.is_some_and(|p| p < best)
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet, so runs append.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,learning_rate,train_perplexity,valid_perplexity,test_perplexity")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log_epoch(&self, m: &EpochMetrics) -> Result<()> {
        self.append(&format!(
            "{},{:.6},{},{},",
            m.epoch,
            m.learning_rate,
            cell(m.train_perplexity),
            cell(m.valid_perplexity),
        ))
    }

    pub fn log_test(&self, test_perplexity: f64) -> Result<()> {
        self.append(&format!("test,,,,{test_perplexity:.6}"))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    fn append(&self, row: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{row}")?;
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}
