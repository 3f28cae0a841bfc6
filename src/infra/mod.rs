// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the other layers:
//
//   checkpoint.rs — model weights (Burn recorders, full or half
//                   precision) plus the model config as JSON
//
//   metrics.rs    — per-epoch perplexities appended to a CSV
//                   file for later plotting
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving
pub mod checkpoint;

/// Per-epoch metrics CSV logger
pub mod metrics;
