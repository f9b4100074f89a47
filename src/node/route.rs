use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::block::BlockId;

/// An ordered list of data-block names that reconstitute a file version
/// when joined in sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataRoute {
    pub own_id: BlockId,
    pub route_name: String,
    pub data_block_names: ThinVec<String>,
}

impl DataRoute {
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            own_id: BlockId::NIL,
            route_name: route_name.into(),
            data_block_names: ThinVec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.data_block_names.push(name.into());
    }

    pub fn sort(&mut self) {
        self.data_block_names.sort();
    }
}
