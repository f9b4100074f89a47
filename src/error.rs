use crate::block::BlockId;

#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("block {0:?} is marked for deletion")]
    Deleted(BlockId),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid move target: {0}")]
    InvalidTarget(String),

    #[error("invalid block structure: route refers to missing key {0:?}")]
    InvalidBlockStructure(String),

    #[error("no search area found: {0}")]
    NoSearchArea(String),

    #[error("cache entry {0:?} held the wrong payload kind")]
    WrongKind(BlockId),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, FilesystemError>;
