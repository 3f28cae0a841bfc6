// ============================================================
// Layer 5 — Burn Compute Engine
// ============================================================
// The ComputeEngine the training driver runs against in
// production. Owns the LSTM language model, the optimiser and
// the learning rate.
//
// Train step:
//   state (inner backend) ─► from_inner ─► forward + cost
//        ─► backward ─► clip ─► SGD update ─► state.into_inner
//
// Evaluate step:
//   model.valid() (inner backend, no dropout) ─► forward + cost
//
// Carried state always lives on the inner backend, so nothing
// returned from one step holds on to that step's graph.
//
// Reference: Burn Book §5 (Custom Training Loop)
//            Zaremba et al. (2014) Recurrent Neural Network Regularization

use std::path::Path;

use anyhow::{bail, Result};
use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::{LmBatch, LmBatcher};
use crate::domain::{
    batch::Batch,
    config::ModelConfig,
    traits::{ComputeEngine, StepMode},
};
use crate::infra::checkpoint::{CheckpointManager, Precision};
use crate::ml::model::{LayerState, LstmLm, LstmLmConfig};

pub struct BurnEngine<B: AutodiffBackend, O> {
    config:        ModelConfig,
    model:         LstmLm<B>,
    optim:         O,
    device:        B::Device,
    learning_rate: f64,
    global_step:   usize,
    precision:     Precision,
}

/// Build the model and a gradient-clipped SGD optimiser for `config`.
pub fn build_engine<B: AutodiffBackend>(
    config:    &ModelConfig,
    device:    B::Device,
    precision: Precision,
) -> BurnEngine<B, impl Optimizer<LstmLm<B>, B>> {
    let model = LstmLmConfig::from_model_config(config).init::<B>(&device);
    let optim = SgdConfig::new()
        .with_gradient_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm as f32)))
        .init::<B, LstmLm<B>>();

    tracing::info!(
        "Model ready: {} LSTM layer(s), hidden_size={}, embedding_size={}, vocab_size={}",
        config.num_layers,
        config.hidden_size,
        config.embedding_size,
        config.vocab_size,
    );

    BurnEngine {
        config: config.clone(),
        model,
        optim,
        device,
        learning_rate: config.learning_rate,
        global_step: 0,
        precision,
    }
}

impl<B, O> BurnEngine<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<LstmLm<B>, B>,
{
    /// Number of parameter updates applied so far.
    pub fn global_step(&self) -> usize {
        self.global_step
    }

    fn check_batch(&self, batch: &Batch) -> Result<()> {
        if batch.embedding_size != self.config.embedding_size {
            bail!(
                "batch embedding size {} does not match model embedding size {}",
                batch.embedding_size,
                self.config.embedding_size
            );
        }
        if let Some(&id) = batch.y.iter().find(|&&id| id as usize >= self.config.vocab_size) {
            bail!(
                "target id {} is outside the vocabulary (vocab_size = {})",
                id,
                self.config.vocab_size
            );
        }
        Ok(())
    }

    fn train_step(
        &mut self,
        batch: &Batch,
        state: Vec<LayerState<B::InnerBackend>>,
    ) -> Result<(f64, Vec<LayerState<B::InnerBackend>>)> {
        let LmBatch { inputs, targets } = LmBatcher::<B>::new(self.device.clone()).tensors(batch);
        let state = state.into_iter().map(LayerState::from_inner).collect();

        let (cost, next_state) = self.model.forward_cost(inputs, targets, state);
        let cost_value: f64 = cost.clone().into_scalar().elem::<f64>();

        // Backward pass + clipped SGD update
        let grads = cost.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.learning_rate, self.model.clone(), grads);
        self.global_step += 1;

        let next_state = next_state.into_iter().map(LayerState::into_inner).collect();
        Ok((cost_value, next_state))
    }

    fn evaluate_step(
        &self,
        batch: &Batch,
        state: Vec<LayerState<B::InnerBackend>>,
    ) -> Result<(f64, Vec<LayerState<B::InnerBackend>>)> {
        let model = self.model.valid();
        let LmBatch { inputs, targets } =
            LmBatcher::<B::InnerBackend>::new(self.device.clone()).tensors(batch);

        let (cost, next_state) = model.forward_cost(inputs, targets, state);
        Ok((cost.into_scalar().elem::<f64>(), next_state))
    }
}

impl<B, O> ComputeEngine for BurnEngine<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<LstmLm<B>, B>,
{
    type State = Vec<LayerState<B::InnerBackend>>;

    fn initialize_state(&self, batch_size: usize) -> Self::State {
        (0..self.config.num_layers)
            .map(|_| LayerState::zeros(batch_size, self.config.hidden_size, &self.device))
            .collect()
    }

    fn step(
        &mut self,
        batch: &Batch,
        state: Self::State,
        mode:  StepMode,
    ) -> Result<(f64, Self::State)> {
        self.check_batch(batch)?;
        match mode {
            StepMode::Train    => self.train_step(batch, state),
            StepMode::Evaluate => self.evaluate_step(batch, state),
        }
    }

    fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    fn save(&self, path: &Path) -> Result<()> {
        let ckpt = CheckpointManager::new(path)?;
        ckpt.save_config(&self.config)?;
        ckpt.save_model(&self.model, self.global_step, self.precision)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::Preset;
    use burn::backend::{Autodiff, NdArray};
    use tempfile::tempdir;

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config() -> ModelConfig {
        ModelConfig {
            num_layers:     2,
            num_steps:      2,
            hidden_size:    4,
            batch_size:     2,
            vocab_size:     12,
            embedding_size: 3,
            ..ModelConfig::preset(Preset::Test)
        }
    }

    fn tiny_batch() -> Batch {
        Batch {
            batch_size:     2,
            num_steps:      2,
            embedding_size: 3,
            input_ids:      vec![1, 2, 6, 7],
            x:              vec![
                0.1, 0.2, 0.3,   0.4, 0.5, 0.6,
                -0.1, 0.0, 0.1,  0.3, -0.3, 0.2,
            ],
            y:              vec![2, 3, 7, 8],
        }
    }

    fn engine() -> BurnEngine<TestBackend, impl Optimizer<LstmLm<TestBackend>, TestBackend>> {
        build_engine::<TestBackend>(&tiny_config(), Default::default(), Precision::Full)
    }

    #[test]
    fn test_train_step_returns_cost_and_state() {
        let mut engine = engine();
        let state      = engine.initialize_state(2);
        assert_eq!(state.len(), 2);

        let (cost, next) = engine.step(&tiny_batch(), state, StepMode::Train).unwrap();
        assert!(cost.is_finite());
        assert!(cost > 0.0);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].hidden.dims(), [2, 4]);
        assert_eq!(next[1].cell.dims(), [2, 4]);
        assert_eq!(engine.global_step(), 1);
    }

    #[test]
    fn test_evaluate_is_repeatable_and_does_not_update() {
        let mut engine = engine();
        let batch      = tiny_batch();

        let (a, _) = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        let (b, _) = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        assert!((a - b).abs() < 1e-9);
        assert_eq!(engine.global_step(), 0);
    }

    #[test]
    fn test_training_lowers_cost_on_repeated_batch() {
        let mut engine = engine();
        engine.set_learning_rate(0.5);
        let batch = tiny_batch();

        let (before, _) = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        for _ in 0..60 {
            engine.step(&batch, engine.initialize_state(2), StepMode::Train).unwrap();
        }
        let (after, _) = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        assert!(after < before, "cost did not drop: {before} -> {after}");
    }

    #[test]
    fn test_state_carries_between_steps() {
        let mut engine = engine();
        let batch      = tiny_batch();

        let (_, carried) = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        let (fresh, _)   = engine.step(&batch, engine.initialize_state(2), StepMode::Evaluate).unwrap();
        let (warm, _)    = engine.step(&batch, carried, StepMode::Evaluate).unwrap();
        assert!((fresh - warm).abs() > 0.0);
    }

    #[test]
    fn test_evaluation_shape_with_single_sequence() {
        let mut engine = engine();
        let batch = Batch {
            batch_size:     1,
            num_steps:      1,
            embedding_size: 3,
            input_ids:      vec![4],
            x:              vec![0.5, -0.5, 0.25],
            y:              vec![5],
        };
        let (cost, next) = engine.step(&batch, engine.initialize_state(1), StepMode::Evaluate).unwrap();
        assert!(cost.is_finite());
        assert_eq!(next[0].hidden.dims(), [1, 4]);
    }

    #[test]
    fn test_rejects_target_outside_vocabulary() {
        let mut engine = engine();
        let mut batch  = tiny_batch();
        batch.y[3]     = 12;

        let err = engine.step(&batch, engine.initialize_state(2), StepMode::Train).unwrap_err();
        assert!(err.to_string().contains("outside the vocabulary"));
        assert_eq!(engine.global_step(), 0);
    }

    #[test]
    fn test_rejects_mismatched_embedding_size() {
        let mut engine = engine();
        let batch = Batch {
            batch_size:     1,
            num_steps:      1,
            embedding_size: 2,
            input_ids:      vec![1],
            x:              vec![0.0, 0.0],
            y:              vec![2],
        };
        assert!(engine.step(&batch, engine.initialize_state(1), StepMode::Evaluate).is_err());
    }

    #[test]
    fn test_save_writes_checkpoint_and_config() {
        let dir        = tempdir().unwrap();
        let mut engine = engine();
        engine.step(&tiny_batch(), engine.initialize_state(2), StepMode::Train).unwrap();
        engine.save(dir.path()).unwrap();

        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert_eq!(ckpt.latest_step().unwrap(), 1);
        assert_eq!(ckpt.load_config().unwrap(), tiny_config());
    }
}
