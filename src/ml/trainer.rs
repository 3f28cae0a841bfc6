// ============================================================
// Layer 5 — Training Driver
// ============================================================
// Runs the epoch schedule against any ComputeEngine.
//
// Per epoch i (1-based):
//   lr = learning_rate * lr_decay ^ max(i - max_epoch, 0)
//   train pass  (StepMode::Train)    → train perplexity
//   valid pass  (StepMode::Evaluate) → valid perplexity
// After the schedule:
//   test pass   (StepMode::Evaluate) → test perplexity
//   save the model if a save path was given
//
// Every pass starts from a zero state and threads the state
// returned by step k into step k+1.
//
// Perplexity = exp(total cost / total unrolled steps), where
// each step's cost is summed cross-entropy / batch_size.
//
// Reference: Zaremba et al. (2014) Recurrent Neural Network Regularization

use std::{path::PathBuf, time::Instant};

use anyhow::{anyhow, bail, Result};

use crate::domain::{
    batch::Batch,
    config::{ModelConfig, Tasks},
    error::DataError,
    traits::{ComputeEngine, StepMode},
};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};

/// A batch source and the config (shape and epoch size) it was built with.
pub struct RolePass<I> {
    pub config:  ModelConfig,
    pub batches: I,
}

/// Everything the driver needs for one run.
pub struct TrainingPlan<I> {
    /// Source of the learning-rate schedule and epoch count.
    pub schedule:  ModelConfig,
    pub train:     Option<RolePass<I>>,
    pub valid:     Option<RolePass<I>>,
    pub test:      Option<RolePass<I>>,
    pub tasks:     Tasks,
    pub save_path: Option<PathBuf>,
    pub verbose:   bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epochs:                Vec<EpochMetrics>,
    pub best_valid_perplexity: Option<f64>,
    pub test_perplexity:       Option<f64>,
}

/// Run `config.epoch_size` steps and return the perplexity of the pass.
pub fn run_epoch<E, I>(
    engine:  &mut E,
    batches: &mut I,
    config:  &ModelConfig,
    mode:    StepMode,
    verbose: bool,
) -> Result<f64>
where
    E: ComputeEngine,
    I: Iterator<Item = Result<Batch, DataError>>,
{
    let epoch_size = config.epoch_size;
    if epoch_size == 0 {
        bail!("epoch_size must be at least 1");
    }

    let report_every = (epoch_size / 10).max(1);
    let start        = Instant::now();
    let mut costs    = 0.0f64;
    let mut iters    = 0usize;
    let mut state    = engine.initialize_state(config.batch_size);

    for step in 0..epoch_size {
        let batch = batches
            .next()
            .ok_or_else(|| anyhow!("batch stream ended after {step} of {epoch_size} steps"))??;

        let (cost, next_state) = engine.step(&batch, state, mode)?;
        state  = next_state;
        costs += cost;
        iters += config.num_steps;

        if verbose && step % report_every == 0 {
            let elapsed = start.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "{:.3} perplexity: {:.3} speed: {:.0} wps",
                step as f64 / epoch_size as f64,
                (costs / iters as f64).exp(),
                (iters * config.batch_size) as f64 / elapsed,
            );
        }
    }

    Ok((costs / iters as f64).exp())
}

/// Drive the full schedule: epochs of train/valid passes, then test and save.
pub fn run_training<E, I>(
    engine:  &mut E,
    mut plan: TrainingPlan<I>,
    metrics: Option<&MetricsLogger>,
) -> Result<TrainingReport>
where
    E: ComputeEngine,
    I: Iterator<Item = Result<Batch, DataError>>,
{
    let tasks      = plan.tasks;
    let mut report = TrainingReport::default();

    warn_if_missing("train", tasks.runs_train(), plan.train.is_some());
    warn_if_missing("valid", tasks.runs_valid(), plan.valid.is_some());
    warn_if_missing("test",  tasks.runs_test(),  plan.test.is_some());

    if tasks.runs_train() || tasks.runs_valid() {
        for epoch in 1..=plan.schedule.max_max_epoch {
            let learning_rate = plan.schedule.learning_rate_at(epoch);
            engine.set_learning_rate(learning_rate);
            tracing::info!("Epoch: {} Learning rate: {:.3}", epoch, learning_rate);

            let train_perplexity = match plan.train.as_mut().filter(|_| tasks.runs_train()) {
                Some(pass) => {
                    let p = run_epoch(engine, &mut pass.batches, &pass.config, StepMode::Train, plan.verbose)?;
                    println!("Epoch: {} Train Perplexity: {:.3}", epoch, p);
                    Some(p)
                }
                None => None,
            };

            let valid_perplexity = match plan.valid.as_mut().filter(|_| tasks.runs_valid()) {
                Some(pass) => {
                    let p = run_epoch(engine, &mut pass.batches, &pass.config, StepMode::Evaluate, false)?;
                    println!("Epoch: {} Valid Perplexity: {:.3}", epoch, p);
                    Some(p)
                }
                None => None,
            };

            let row = EpochMetrics { epoch, learning_rate, train_perplexity, valid_perplexity };
            if row.is_improvement(report.best_valid_perplexity.unwrap_or(f64::INFINITY)) {
                report.best_valid_perplexity = valid_perplexity;
                tracing::info!("New best validation perplexity: {:.3}", valid_perplexity.unwrap_or_default());
            }
            if let Some(logger) = metrics {
                logger.log_epoch(&row)?;
            }
            report.epochs.push(row);
        }
    }

    if let Some(pass) = plan.test.as_mut().filter(|_| tasks.runs_test()) {
        let p = run_epoch(engine, &mut pass.batches, &pass.config, StepMode::Evaluate, false)?;
        println!("Test Perplexity: {:.3}", p);
        if let Some(logger) = metrics {
            logger.log_test(p)?;
        }
        report.test_perplexity = Some(p);
    }

    if let Some(path) = &plan.save_path {
        tracing::info!("Saving model to '{}'", path.display());
        engine.save(path)?;
    }

    tracing::info!("Training complete!");
    Ok(report)
}

fn warn_if_missing(role: &str, requested: bool, present: bool) {
    if requested && !present {
        tracing::warn!("No {role} files; skipping {role} passes");
    }
}
