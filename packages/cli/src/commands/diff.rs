use super::read_json;
use anyhow::Result;
use clap::Args;
use scribe_engine::{diff_nodes, Node, Operation};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Serialized document before the edit
    pub old: PathBuf,

    /// Serialized document after the edit
    pub new: PathBuf,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub fn diff(args: DiffArgs, cwd: &Path) -> Result<()> {
    let old: Node = read_json(cwd, &args.old)?;
    let new: Node = read_json(cwd, &args.new)?;

    let ops = diff_documents(&old, &new);
    tracing::debug!(count = ops.len(), "Diffed documents");

    let out = if args.compact {
        serde_json::to_string(&ops)?
    } else {
        serde_json::to_string_pretty(&ops)?
    };
    println!("{}", out);
    Ok(())
}

/// Operations that turn `old`'s content into `new`'s; the roots themselves are
/// not compared
pub fn diff_documents(old: &Node, new: &Node) -> Vec<Operation> {
    diff_nodes(old, new)
}
