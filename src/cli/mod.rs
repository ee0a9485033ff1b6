// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and delegates to Layer 2. The only
// layer that prints results.

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{Commands, InspectArgs, TrainArgs};

use crate::application::inspect_use_case::{parse_token_list, InspectInput, InspectUseCase};
use crate::application::train_use_case::TrainUseCase;

#[derive(Parser, Debug)]
#[command(
    name = "ssa",
    version,
    about = "Train and inspect a BiLSTM classifier with structured self-attention."
)]
pub struct Cli {
    /// Enable debug logging for this crate
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on '{}'", args.data);

    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best_epoch {
        Some(epoch) => println!(
            "Training complete after {} epoch(s). Best val_loss={:.4} at epoch {}.",
            summary.epochs, summary.best_val_loss, epoch
        ),
        None => println!(
            "Training complete after {} epoch(s). Final train_loss={:.4} (no validation data).",
            summary.epochs, summary.final_train_loss
        ),
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let input = match (args.tokens, args.text) {
        (Some(tokens), _)  => InspectInput::Tokens(parse_token_list(&tokens)?),
        (None, Some(text)) => InspectInput::Text(text),
        (None, None)       => bail!("pass either --tokens or --text"),
    };

    let use_case = InspectUseCase::new(args.checkpoint_dir, args.device);
    let (tokens, prediction) = use_case.execute(input, args.trace_shapes)?;

    println!("\nTokens: {:?}", tokens);
    println!("Predicted class: {}", prediction.class);
    for (class, p) in prediction.probabilities.iter().enumerate() {
        println!("  class {:>2}: {:.4}", class, p);
    }

    println!("Attention focus (hop → position, token, weight):");
    for (hop, pos) in prediction.focus().into_iter().enumerate() {
        println!(
            "  hop {:>2} → {:>3}  token {:>6}  {:.4}",
            hop, pos, tokens[pos], prediction.attention[hop][pos]
        );
    }
    println!("Attention penalty: {:.4}", prediction.penalty);
    Ok(())
}
