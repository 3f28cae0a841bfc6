// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training driver never touches a deep-learning framework
// directly. It talks to a ComputeEngine, which owns the model
// parameters, the optimiser and the checkpoint format:
//
//   - BurnEngine (Layer 5) → LSTM language model on Burn
//   - test doubles         → scripted engines in unit tests
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;

use crate::domain::batch::Batch;

/// Whether a step updates parameters or only measures the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Forward, backward and optimiser update; dropout active.
    Train,
    /// Forward only; dropout disabled.
    Evaluate,
}

// ─── ComputeEngine ────────────────────────────────────────────────────────────
/// Executes one truncated-BPTT step at a time.
///
/// The recurrent state is opaque to the caller: it is created by
/// `initialize_state`, handed to `step`, and the state returned
/// by one step must be passed into the next.
pub trait ComputeEngine {
    /// Carried recurrent state (per-layer cell and hidden values).
    type State;

    /// Zero state for `batch_size` parallel sequences.
    fn initialize_state(&self, batch_size: usize) -> Self::State;

    /// Run one batch. Returns the batch cost (summed token
    /// cross-entropy divided by batch size) and the final state.
    fn step(
        &mut self,
        batch: &Batch,
        state: Self::State,
        mode:  StepMode,
    ) -> Result<(f64, Self::State)>;

    /// Learning rate used by subsequent training steps.
    fn set_learning_rate(&mut self, learning_rate: f64);

    /// Persist the current parameters under `path`.
    fn save(&self, path: &Path) -> Result<()>;
}
