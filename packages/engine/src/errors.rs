//! Error types for the engine

use crate::path::Path;
use crate::widgets::WidgetError;
use scribe_surface::SurfaceError;
use thiserror::Error;

/// Why one operation could not be applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Path not found: {0:?}")]
    PathNotFound(Path),

    #[error("Node at {0:?} is not an element")]
    NotAnElement(Path),

    #[error("Node at {0:?} is not text")]
    NotText(Path),

    #[error("Offset {offset} out of range at {path:?}")]
    OffsetOutOfRange { path: Path, offset: usize },

    #[error("The root node cannot be {0}")]
    Root(&'static str),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),
}

impl ApplyError {
    /// Resolution failures leave everything consistent and are skipped by
    /// batch application; the rest abort the batch.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, ApplyError::Widget(_))
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
