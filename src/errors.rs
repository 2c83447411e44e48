use thiserror::Error;

use crate::domain::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("offset {index} is beyond node length {length}")]
    OffsetOutOfRange { index: usize, length: usize },

    #[error("range {index}+{length} exceeds node length {total}")]
    RangeOutOfBounds {
        index: usize,
        length: usize,
        total: usize,
    },

    #[error("node is already attached to a parent: {0:?}")]
    AlreadyAttached(NodeId),

    #[error("node would become its own ancestor: {0:?}")]
    CycleDetected(NodeId),

    #[error("the root belongs to the document and cannot be inserted: {0:?}")]
    RootNotMovable(NodeId),

    #[error("node no longer exists: {0:?}")]
    StaleNode(NodeId),

    #[error("node is not a container: {0:?}")]
    NotAContainer(NodeId),

    #[error("operation requires a parent but node has none: {0:?}")]
    NoParent(NodeId),

    #[error("formats() is not supported by kind: {0}")]
    FormatsUnsupported(String),

    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    #[error("kind cannot hold children: {0}")]
    NotAContainerKind(String),

    #[error("kind registered twice: {0}")]
    DuplicateKind(String),

    #[error("tree invariant violated: {0}")]
    Inconsistent(String),

    #[error("config error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
