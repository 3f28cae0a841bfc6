// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `epochs`, and all
// their flags.
//
// Preset and task names are parsed through their FromStr
// impls, so an unknown name fails at the command line with
// the same message the domain layer produces.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::config::{Preset, Tasks};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the language model on a corpus manifest
    Train(TrainArgs),

    /// Print the file split and epoch-size estimates, then exit
    Epochs(EpochsArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Model size: small, medium, large or test
    #[arg(long, default_value = "small")]
    pub model: Preset,

    /// Manifest file listing the corpus files (whitespace separated)
    #[arg(long)]
    pub data_path: PathBuf,

    /// Directory for the trained model, its config and metrics.csv
    #[arg(long)]
    pub save_path: Option<PathBuf>,

    /// Store checkpoint weights as 16-bit floats
    #[arg(long)]
    pub use_fp16: bool,

    /// JSON word → id mapping; its size sets the output vocabulary
    #[arg(long)]
    pub word_to_id_path: Option<PathBuf>,

    /// Embedding store prefix; `{prefix}{embedding_size}.json` is loaded
    #[arg(long = "embeddings", default_value = "models/eos/idWordVec_")]
    pub embeddings_prefix: String,

    /// Passes to run: all, train, valid or test
    #[arg(long, default_value = "all")]
    pub tasks: Tasks,

    /// Run on the CPU (NdArray) backend instead of WGPU
    #[arg(long)]
    pub cpu: bool,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model:             a.model,
            data_path:         a.data_path,
            save_path:         a.save_path,
            use_fp16:          a.use_fp16,
            word_to_id_path:   a.word_to_id_path,
            embeddings_prefix: a.embeddings_prefix,
            tasks:             a.tasks,
            cpu:               a.cpu,
        }
    }
}

/// All arguments for the `epochs` command
#[derive(Args, Debug)]
pub struct EpochsArgs {
    /// Model size whose batch shape is used for the estimate
    #[arg(long, default_value = "small")]
    pub model: Preset,

    /// Manifest file listing the corpus files
    #[arg(long)]
    pub data_path: PathBuf,
}
