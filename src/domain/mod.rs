// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe the training run:
// what a hyperparameter preset is, what a batch looks like,
// what can go wrong while feeding data, and what the compute
// engine must be able to do.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Hyperparameter presets (small / medium / large / test)
pub mod config;

// One (x, y) training batch in row-major flat buffers
pub mod batch;

// Typed errors for the data pipeline and configuration
pub mod error;

// The capability interface the training driver talks to
pub mod traits;
