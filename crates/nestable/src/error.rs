use thiserror::Error;

use crate::item::ItemId;
use crate::path::Path;

/// A path that does not address an item in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path does not address an item")]
    Empty,
    #[error("path index {index} out of bounds at depth {depth} (len {len})")]
    OutOfBounds {
        depth: usize,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum NestableError {
    #[error("item at {0:?} is not an object")]
    InvalidItem(Path),
    #[error("item at {0:?} has no usable id")]
    MissingId(Path),
    #[error("duplicate item id {0}")]
    DuplicateId(ItemId),
    #[error("unknown item id {0}")]
    UnknownItem(ItemId),
    #[error("no drag in progress")]
    NoActiveDrag,
    #[error(transparent)]
    Path(#[from] PathError),
}
