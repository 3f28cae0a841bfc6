// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`  — runs the epoch schedule and reports perplexities
//   2. `epochs` — prints split sizes and epoch-size estimates
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EpochsArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "word-predict-lstm",
    version = "0.1.0",
    about = "Train an LSTM next-word model over pre-computed word embeddings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Epochs(args) => run_epochs(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training from manifest: {}", args.data_path.display());

    let save_path = args.save_path.clone();
    let report    = TrainUseCase::new(args.into()).execute()?;

    if let Some(best) = report.best_valid_perplexity {
        println!("Best validation perplexity: {:.3}", best);
    }
    match save_path {
        Some(path) => println!("Training complete. Model saved to '{}'.", path.display()),
        None       => println!("Training complete."),
    }
    Ok(())
}

fn run_epochs(args: EpochsArgs) -> Result<()> {
    use crate::application::epochs_use_case::EpochsUseCase;

    let report = EpochsUseCase::new(args.model, args.data_path).execute()?;

    println!(
        "{:<6} {:>6} {:>6} {:>6} {:>9} {:>11}",
        "role", "files", "batch", "steps", "estimate", "epoch_size"
    );
    for r in &report {
        println!(
            "{:<6} {:>6} {:>6} {:>6} {:>9} {:>11}",
            r.role, r.files, r.batch_size, r.num_steps, r.estimate, r.epoch_size
        );
    }
    Ok(())
}
