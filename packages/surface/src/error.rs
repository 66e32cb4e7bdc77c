use crate::SurfaceId;
use thiserror::Error;

pub type SurfaceResult<T> = Result<T, SurfaceError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Unknown surface node: {0}")]
    UnknownNode(SurfaceId),

    #[error("Surface node {0} is not an element")]
    NotAnElement(SurfaceId),

    #[error("Surface node {0} is not a text node")]
    NotText(SurfaceId),

    #[error("Hierarchy violation: cannot place {child} under {parent}")]
    Hierarchy { parent: SurfaceId, child: SurfaceId },

    #[error("Reference node {reference} is not a child of {parent}")]
    NotAChild { parent: SurfaceId, reference: SurfaceId },

    #[error("Offset {offset} out of range for text of length {len} on {node}")]
    OffsetOutOfRange {
        node: SurfaceId,
        offset: usize,
        len: usize,
    },
}
