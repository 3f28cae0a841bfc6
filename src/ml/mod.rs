// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds or runs the network lives here.
//
//   model.rs   — stacked LSTM over pre-embedded inputs with a
//                linear softmax head; per-layer (cell, hidden)
//                state that can be detached between steps
//
//   engine.rs  — BurnEngine, the ComputeEngine implementation:
//                forward, cross-entropy cost, backward,
//                clipped SGD, checkpoint saving
//
//   trainer.rs — the driver: learning-rate schedule, train /
//                valid / test passes, perplexity reporting.
//                Generic over ComputeEngine, so it never
//                touches Burn itself
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Zaremba et al. (2014) Recurrent Neural Network Regularization

/// LSTM language model architecture
pub mod model;

/// Burn-backed compute engine
pub mod engine;

/// Epoch schedule and perplexity reporting
pub mod trainer;
