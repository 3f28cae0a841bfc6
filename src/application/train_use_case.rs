// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Read + split the manifest   (Layer 4 - data)
//   Step 2: Build the model config      (Layer 3 - domain)
//   Step 3: Load the embedding store    (Layer 4 - data)
//   Step 4: Estimate epoch sizes        (Layer 4 - data)
//   Step 5: Build one pipeline per role (Layer 4 - data)
//   Step 6: Open the metrics CSV        (Layer 6 - infra)
//   Step 7: Pick a backend, run driver  (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::tensor::{backend::AutodiffBackend, f16};
use serde::{Deserialize, Serialize};

use crate::data::{
    corpus::read_manifest,
    embeddings::EmbeddingTable,
    epoch::{clamp_epoch_size, estimate_epoch_size},
    splitter::{split_train_valid_test, Split},
    vocab::Vocabulary,
    windowing::WindowStream,
};
use crate::domain::{
    config::{ModelConfig, Preset, Tasks},
    error::{ConfigError, DataError},
};
use crate::infra::{
    checkpoint::Precision,
    metrics::MetricsLogger,
};
use crate::ml::{
    engine::build_engine,
    trainer::{run_training, RolePass, TrainingPlan, TrainingReport},
};

type GpuBackend     = burn::backend::Autodiff<burn::backend::Wgpu>;
type GpuHalfBackend = burn::backend::Autodiff<burn::backend::Wgpu<f16, i32>>;
type CpuBackend     = burn::backend::Autodiff<burn::backend::NdArray>;

/// Backend a run trains on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendChoice {
    /// NdArray, f32
    Cpu,
    /// WGPU, f32
    Gpu,
    /// WGPU, f16 inputs, weights and recurrent state
    GpuHalf,
}

impl BackendChoice {
    /// NdArray has no f16 element type, so `--cpu --use-fp16` is refused.
    pub fn select(cpu: bool, use_fp16: bool) -> Result<Self, ConfigError> {
        match (cpu, use_fp16) {
            (true,  true)  => Err(ConfigError::HalfPrecisionOnCpu),
            (true,  false) => Ok(BackendChoice::Cpu),
            (false, true)  => Ok(BackendChoice::GpuHalf),
            (false, false) => Ok(BackendChoice::Gpu),
        }
    }

    /// Checkpoints follow the compute precision.
    pub fn precision(self) -> Precision {
        Precision::from_fp16_flag(self == BackendChoice::GpuHalf)
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs, independent of how it was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub model:             Preset,
    pub data_path:         PathBuf,
    pub save_path:         Option<PathBuf>,
    pub use_fp16:          bool,
    pub word_to_id_path:   Option<PathBuf>,
    pub embeddings_prefix: String,
    pub tasks:             Tasks,
    pub cpu:               bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model:             Preset::Small,
            data_path:         PathBuf::from("files.txt"),
            save_path:         None,
            use_fp16:          false,
            word_to_id_path:   None,
            embeddings_prefix: "models/eos/idWordVec_".to_string(),
            tasks:             Tasks::All,
            cpu:               false,
        }
    }
}

/// Read the manifest at `data_path` and split it 80/10/10 by position.
pub fn load_split(data_path: &Path) -> Result<Split<PathBuf>> {
    if !data_path.exists() {
        return Err(ConfigError::MissingManifest(data_path.to_path_buf()).into());
    }
    let files = read_manifest(data_path)
        .with_context(|| format!("Cannot read manifest '{}'", data_path.display()))?;
    tracing::info!("Manifest lists {} corpus file(s)", files.len());
    Ok(split_train_valid_test(files))
}

/// One config per role, each with its own epoch size.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleConfigs {
    pub train: ModelConfig,
    pub valid: ModelConfig,
    pub test:  ModelConfig,
}

/// Train and valid share the run shape, test uses the evaluation shape.
pub fn role_configs(base: &ModelConfig, split: &Split<PathBuf>) -> Result<RoleConfigs> {
    Ok(RoleConfigs {
        train: with_estimated_epoch_size(base, &split.train)?,
        valid: with_estimated_epoch_size(base, &split.valid)?,
        test:  with_estimated_epoch_size(&base.for_evaluation(), &split.test)?,
    })
}

fn with_estimated_epoch_size(cfg: &ModelConfig, files: &[PathBuf]) -> Result<ModelConfig, DataError> {
    let estimate = estimate_epoch_size(files, cfg.batch_size, cfg.num_steps)?;
    Ok(cfg.clone().with_epoch_size(clamp_epoch_size(estimate)))
}

fn role_pass<'a>(
    role:       &str,
    files:      &[PathBuf],
    embeddings: &'a EmbeddingTable,
    config:     &ModelConfig,
) -> Result<Option<RolePass<WindowStream<'a>>>> {
    if files.is_empty() {
        return Ok(None);
    }
    let batches = WindowStream::new(role, files.to_vec(), embeddings, config.batch_size, config.num_steps)?;
    tracing::info!(
        "{} pipeline: {} file(s), batch_size={}, num_steps={}, epoch_size={}",
        batches.name(),
        batches.files().len(),
        config.batch_size,
        config.num_steps,
        config.epoch_size,
    );
    Ok(Some(RolePass { config: config.clone(), batches }))
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training run end to end.
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg     = &self.config;
        let backend = BackendChoice::select(cfg.cpu, cfg.use_fp16)?;

        // ── Step 1: Manifest → train / valid / test file lists ───────────────
        let split = load_split(&cfg.data_path)?;

        // ── Step 2: Preset, with vocab_size from the store if given ──────────
        let mut base = ModelConfig::preset(cfg.model);
        if let Some(path) = &cfg.word_to_id_path {
            let vocab = Vocabulary::load(path)
                .with_context(|| format!("Cannot load vocabulary '{}'", path.display()))?;
            if vocab.is_empty() {
                return Err(ConfigError::EmptyStore("vocabulary").into());
            }
            base = base.with_vocab_size(vocab.len());
        }
        tracing::info!("Using '{}' preset, tasks={}", cfg.model, cfg.tasks);

        // ── Step 3: Embedding store ──────────────────────────────────────────
        let embeddings = EmbeddingTable::load(&cfg.embeddings_prefix, base.embedding_size)
            .context("Cannot load embedding store")?;
        if embeddings.is_empty() {
            return Err(ConfigError::EmptyStore("embedding").into());
        }

        // ── Step 4: Epoch sizes per role ─────────────────────────────────────
        let roles = role_configs(&base, &split)?;

        // ── Step 5: One windowing pipeline per role ──────────────────────────
        let plan = TrainingPlan {
            schedule:  roles.train.clone(),
            train:     role_pass("train", &split.train, &embeddings, &roles.train)?,
            valid:     role_pass("valid", &split.valid, &embeddings, &roles.valid)?,
            test:      role_pass("test",  &split.test,  &embeddings, &roles.test)?,
            tasks:     cfg.tasks,
            save_path: cfg.save_path.clone(),
            verbose:   true,
        };

        // ── Step 6: Metrics CSV next to the checkpoint ───────────────────────
        let metrics = cfg.save_path.as_deref().map(MetricsLogger::new).transpose()?;
        if let Some(logger) = &metrics {
            tracing::info!("Writing metrics to '{}'", logger.csv_path().display());
        }

        // ── Step 7: Backend + driver ─────────────────────────────────────────
        let precision = backend.precision();
        match backend {
            BackendChoice::Cpu => {
                let device = burn::backend::ndarray::NdArrayDevice::default();
                tracing::info!("Using NdArray device: {:?}", device);
                train_on::<CpuBackend>(device, &roles.train, precision, plan, metrics.as_ref())
            }
            BackendChoice::Gpu => {
                let device = burn::backend::wgpu::WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                train_on::<GpuBackend>(device, &roles.train, precision, plan, metrics.as_ref())
            }
            BackendChoice::GpuHalf => {
                let device = burn::backend::wgpu::WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?} (f16)", device);
                train_on::<GpuHalfBackend>(device, &roles.train, precision, plan, metrics.as_ref())
            }
        }
    }
}

fn train_on<B: AutodiffBackend>(
    device:    B::Device,
    config:    &ModelConfig,
    precision: Precision,
    plan:      TrainingPlan<WindowStream<'_>>,
    metrics:   Option<&MetricsLogger>,
) -> Result<TrainingReport> {
    let mut engine = build_engine::<B>(config, device, precision);
    let report     = run_training(&mut engine, plan, metrics)?;
    tracing::info!("Applied {} parameter updates", engine.global_step());
    Ok(report)
}
