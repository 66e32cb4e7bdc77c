use super::read_json;
use anyhow::Result;
use clap::Args;
use scribe_engine::{inverse_batch, Operation};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InvertArgs {
    /// Operation batch to invert
    pub ops: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn invert(args: InvertArgs, cwd: &Path) -> Result<()> {
    let ops: Vec<Operation> = read_json(cwd, &args.ops)?;
    let inverse = inverse_batch(&ops);

    let out = if args.compact {
        serde_json::to_string(&inverse)?
    } else {
        serde_json::to_string_pretty(&inverse)?
    };
    println!("{}", out);
    Ok(())
}
