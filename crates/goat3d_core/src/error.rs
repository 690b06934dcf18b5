use thiserror::Error;

use crate::format::ParseError;

/// Errors that can occur while building, saving or loading a scene.
///
/// Every operation reports failure to its immediate caller; a failed
/// mutation leaves the receiver unchanged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{attrib} array has {len} entries, expected {expected}")]
    DimensionMismatch {
        attrib: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("unresolved {kind} reference: {name}")]
    UnresolvedReference { kind: &'static str, name: String },

    #[error("attaching node \"{node}\" under its own descendant")]
    HierarchyCycle { node: String },
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, Error>;
