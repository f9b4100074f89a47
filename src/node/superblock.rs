use serde::{Deserialize, Serialize};

use crate::block::BlockId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub own_id: BlockId,
    pub block_count: u64,
    pub block_size: u32,
    pub root_directory: BlockId,
    pub search_index: BlockId,
}

impl Superblock {
    pub fn new(block_count: u64, block_size: u32, root_directory: BlockId, search_index: BlockId) -> Self {
        Self {
            own_id: BlockId::SUPERBLOCK,
            block_count,
            block_size,
            root_directory,
            search_index,
        }
    }
}
