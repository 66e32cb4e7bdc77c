mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, init, invert, replay, DiffArgs, InitArgs, InvertArgs, ReplayArgs};
use tracing_subscriber::EnvFilter;

/// Scribe CLI - offline tooling for document operation logs
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default scribe.config.json
    Init(InitArgs),

    /// Diff two serialized documents into an operation batch
    Diff(DiffArgs),

    /// Print the inverse of an operation batch
    Invert(InvertArgs),

    /// Apply an operation batch to a document
    Replay(ReplayArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{} cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Diff(args) => diff(args, &cwd),
        Command::Invert(args) => invert(args, &cwd),
        Command::Replay(args) => replay(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
