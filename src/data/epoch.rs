// ============================================================
// Layer 4 — Epoch-Size Estimator
// ============================================================
// How many batches one epoch draws from a role's pipeline:
//
//   epoch_size = ((total_words / batch_size) - 1) / num_steps
//
// with floor division throughout, so very small corpora give 0
// or -1. Used for progress reporting and loop bounds only; the
// windowing pipeline itself does not depend on it.

use std::path::PathBuf;

use crate::data::corpus::count_words;
use crate::domain::error::DataError;

/// Sum of whitespace-separated words over all files.
pub fn total_words(files: &[PathBuf]) -> Result<usize, DataError> {
    files.iter().map(|f| count_words(f)).sum()
}

/// Raw estimate; may be zero or negative for tiny corpora.
pub fn epoch_size_for(total_words: usize, batch_size: usize, num_steps: usize) -> i64 {
    let per_row = (total_words / batch_size.max(1)) as i64;
    (per_row - 1).div_euclid(num_steps.max(1) as i64)
}

/// Estimate for a file list, logging the word total.
pub fn estimate_epoch_size(
    files:      &[PathBuf],
    batch_size: usize,
    num_steps:  usize,
) -> Result<i64, DataError> {
    let total = total_words(files)?;
    tracing::info!("Total words {}", total);
    Ok(epoch_size_for(total, batch_size, num_steps))
}

/// Loop-control value: never below one draw per epoch.
pub fn clamp_epoch_size(estimate: i64) -> usize {
    estimate.max(1) as usize
}
