use std::collections::BTreeMap;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::block::BlockId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    pub own_id: BlockId,
    pub areas: FnvHashMap<String, BlockId>,
}

impl SearchIndex {
    pub fn new(own_id: BlockId) -> Self {
        Self {
            own_id,
            areas: FnvHashMap::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub path: String,
    pub version_tag: String,
}

/// An ordered term index for a single area. `BTreeMap` gives ascending
/// term order on iteration for free, both for range queries and for codec
/// round-tripping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTree {
    pub own_id: BlockId,
    pub terms: BTreeMap<String, ThinVec<SearchMatch>>,
}

impl SearchTree {
    pub fn new(own_id: BlockId) -> Self {
        Self {
            own_id,
            terms: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;

    #[test]
    fn terms_iterate_in_ascending_order() {
        let mut tree = SearchTree::new(BlockId::new(BlockKind::SearchTree, 1));
        tree.terms.insert(
            "zebra".into(),
            ThinVec::from_iter([SearchMatch {
                path: "/z".into(),
                version_tag: "v000000001".into(),
            }]),
        );
        tree.terms.insert(
            "apple".into(),
            ThinVec::from_iter([SearchMatch {
                path: "/a".into(),
                version_tag: "v000000001".into(),
            }]),
        );
        let keys: Vec<_> = tree.terms.keys().collect();
        assert_eq!(keys, vec!["apple", "zebra"]);
    }
}
