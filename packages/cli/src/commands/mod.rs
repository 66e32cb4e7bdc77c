pub mod diff;
pub mod init;
pub mod invert;
pub mod replay;

pub use diff::{diff, DiffArgs};
pub use init::{init, InitArgs};
pub use invert::{invert, InvertArgs};
pub use replay::{replay, ReplayArgs};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and deserialize a JSON file, resolving relative paths against `cwd`
pub(crate) fn read_json<T: DeserializeOwned>(cwd: &Path, file: &Path) -> Result<T> {
    let path = cwd.join(file);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}
