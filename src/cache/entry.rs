use crate::block::BlockId;
use crate::node::{DirectoryNode, FileNode, SearchIndex, SearchTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    Update,
    Delete,
}

/// A typed cache payload. Replaces a cast-on-retrieval scheme with one arm
/// per node kind so a getter that asks for the wrong kind fails loudly
/// (`FilesystemError::WrongKind`) instead of silently transmuting bytes.
#[derive(Debug, Clone)]
pub enum CachePayload {
    Directory(DirectoryNode),
    File(FileNode),
    SearchIndex(SearchIndex),
    SearchTree(SearchTree),
}

impl CachePayload {
    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            CachePayload::Directory(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            CachePayload::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_search_index(&self) -> Option<&SearchIndex> {
        match self {
            CachePayload::SearchIndex(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_search_tree(&self) -> Option<&SearchTree> {
        match self {
            CachePayload::SearchTree(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: BlockId,
    pub dirty: bool,
    pub action: CacheAction,
    pub payload: CachePayload,
}
