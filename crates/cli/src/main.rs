use clap::Parser;
use graft_cli::commands::{Cmd, Command};

/// Graft CLI
///
/// Graft locates call sites in textual method listings and splices static hook calls next to
/// them, reporting what it did or why it left the method alone.
#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Graft: call-site hook instrumentation for method listings")]
struct Cli {
    /// Log scans and per-record splicing detail.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Graft CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .init();

    cli.command.execute().await
}
