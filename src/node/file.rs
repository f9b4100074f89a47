use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::node::route::DataRoute;
use crate::node::stats::FileStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Normal,
    Mount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    pub own_id: BlockId,
    pub stats: FileStats,
    pub file_type: FileType,
    pub data_blocks: FnvHashMap<String, BlockId>,
    pub default_route: DataRoute,
    pub alternate_routes: FnvHashMap<String, BlockId>,
    pub version: u64,
    pub latest_tag: String,
    pub attributes: FnvHashMap<String, String>,
}

impl FileNode {
    pub fn new(own_id: BlockId, now: i64) -> Self {
        Self {
            own_id,
            stats: FileStats::new_at(now),
            file_type: FileType::Normal,
            data_blocks: FnvHashMap::default(),
            default_route: DataRoute::new("default"),
            alternate_routes: FnvHashMap::default(),
            version: 0,
            latest_tag: String::new(),
            attributes: FnvHashMap::default(),
        }
    }

    pub fn next_version_tag(version: u64) -> String {
        format!("v{version:09}")
    }

    pub fn next_key_name(sequence: usize) -> String {
        format!("{:05}", sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tags_are_zero_padded() {
        assert_eq!(FileNode::next_version_tag(1), "v000000001");
        assert_eq!(FileNode::next_version_tag(1_000_000_000), "v1000000000");
    }

    #[test]
    fn key_names_are_width_five() {
        assert_eq!(FileNode::next_key_name(1), "00001");
        assert_eq!(FileNode::next_key_name(42), "00042");
    }
}
