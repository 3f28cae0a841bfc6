// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from token files on disk to model-ready tensors.
//
//   manifest file
//       │
//       ▼
//   corpus / splitter  → ordered file list, 80/10/10 by position
//       │
//       ▼
//   WindowStream       → reshape each file, slide num_steps windows,
//       │                embed inputs, shift targets by one column
//       ▼
//   LmBatcher          → Burn tensors on the training device
//
// The embedding and vocabulary stores are loaded once per run
// and only read afterwards. epoch.rs estimates how many batches
// one epoch draws.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads corpus files and the data manifest
pub mod corpus;

/// Positional train/validation/test split of the file list
pub mod splitter;

/// id → vector table loaded from the embedding store
pub mod embeddings;

/// word → id store, used for the vocabulary size
pub mod vocab;

/// The endless (x, y) batch producer
pub mod windowing;

/// Batches-per-epoch estimate
pub mod epoch;

/// Batch → Burn tensors
pub mod batcher;
