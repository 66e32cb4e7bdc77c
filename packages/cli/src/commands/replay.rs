use super::read_json;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use scribe_engine::{
    materialize, ApplyReport, EngineConfig, Model, Node, Operation, Source, Surface,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Serialized document to start from
    pub doc: PathBuf,

    /// Operation batch to apply
    pub ops: PathBuf,

    /// Print the resulting surface as HTML instead of JSON
    #[arg(long)]
    pub html: bool,
}

pub fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let config = EngineConfig::load(cwd)?;
    let doc: Node = read_json(cwd, &args.doc)?;
    let ops: Vec<Operation> = read_json(cwd, &args.ops)?;

    let (surface, model, report) = replay_batch(config, &doc, &ops)?;

    for (index, err) in &report.skipped {
        eprintln!("{} operation {} skipped: {}", "⚠️".yellow(), index, err);
    }

    if args.html {
        println!("{}", surface.to_html());
    } else {
        let root = model
            .root()
            .ok_or_else(|| anyhow!("replayed document has no root"))?;
        println!("{}", serde_json::to_string_pretty(&root)?);
    }
    Ok(())
}

/// Materialize `doc`, attach a model to it and apply `ops` as a remote batch
pub fn replay_batch(
    config: EngineConfig,
    doc: &Node,
    ops: &[Operation],
) -> Result<(Surface, Model, ApplyReport)> {
    let mut surface = materialize(doc)?;
    let mut model = Model::new(config);
    model.attach(&mut surface);

    let report = model.apply(&mut surface, ops, Source::Remote)?;
    tracing::debug!(
        applied = report.applied,
        skipped = report.skipped.len(),
        "Replayed batch"
    );
    Ok((surface, model, report))
}
