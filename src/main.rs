#![recursion_limit = "256"]

use anyhow::Result;
use clap::Parser;
use structured_self_attention::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("structured_self_attention={level}").parse()?),
        )
        .init();

    cli.run()
}
