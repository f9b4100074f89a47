use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::node::stats::FileStats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub own_id: BlockId,
    pub stats: FileStats,
    pub folders: FnvHashMap<String, BlockId>,
    pub files: FnvHashMap<String, BlockId>,
    /// Reserved for overflow; no read path follows it.
    pub continuation: BlockId,
    pub attributes: FnvHashMap<String, String>,
}

impl DirectoryNode {
    pub fn new(own_id: BlockId, now: i64) -> Self {
        Self {
            own_id,
            stats: FileStats::new_at(now),
            folders: FnvHashMap::default(),
            files: FnvHashMap::default(),
            continuation: BlockId::NIL,
            attributes: FnvHashMap::default(),
        }
    }
}
