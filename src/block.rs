//! Typed block identifiers.

use serde::{Deserialize, Serialize};

/// Kind discriminant for a block, mirrored on disk alongside its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Superblock,
    Directory,
    File,
    Route,
    Data,
    SearchIndex,
    SearchTree,
    Nil,
}

/// A store-wide unique block identifier.
///
/// `relative_to` links a `Data` block back to the `File` block that owns it
/// (`-1` for every other kind); the store uses it to co-locate a file's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId {
    pub kind: BlockKind,
    pub id: i64,
    pub relative_to: i64,
}

impl BlockId {
    pub const NIL: BlockId = BlockId {
        kind: BlockKind::Nil,
        id: -1,
        relative_to: -1,
    };

    pub const SUPERBLOCK: BlockId = BlockId {
        kind: BlockKind::Superblock,
        id: 0,
        relative_to: -1,
    };

    pub fn new(kind: BlockKind, id: i64) -> Self {
        Self {
            kind,
            id,
            relative_to: -1,
        }
    }

    pub fn data(id: i64, relative_to: i64) -> Self {
        Self {
            kind: BlockKind::Data,
            id,
            relative_to,
        }
    }

    pub fn is_nil(&self) -> bool {
        self.kind == BlockKind::Nil
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::NIL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_default() {
        assert_eq!(BlockId::default(), BlockId::NIL);
        assert!(BlockId::NIL.is_nil());
    }

    #[test]
    fn superblock_is_fixed() {
        assert_eq!(BlockId::SUPERBLOCK.id, 0);
        assert_eq!(BlockId::SUPERBLOCK.kind, BlockKind::Superblock);
    }

    #[test]
    fn data_block_tracks_owner() {
        let id = BlockId::data(5, 1);
        assert_eq!(id.relative_to, 1);
        assert_eq!(id.kind, BlockKind::Data);
    }
}
