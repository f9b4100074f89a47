//! Per-node file statistics and advisory permission bits.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Advisory permission bitmask. The core never enforces these; they are
    /// carried for external access-control layers to interpret.
    ///
    /// `Serialize`/`Deserialize` come from bitflags' own `serde` feature
    /// (see Cargo.toml), not from a derive here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        const OWNER_READ  = 0b0000_0001;
        const OWNER_WRITE = 0b0000_0010;
        const OWNER_EXEC  = 0b0000_0100;
        const GROUP_READ  = 0b0000_1000;
        const GROUP_WRITE = 0b0001_0000;
        const GROUP_EXEC  = 0b0010_0000;
        const OTHER_READ  = 0b0100_0000;
        const OTHER_WRITE = 0b1000_0000;
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::OWNER_READ | Permissions::OWNER_WRITE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    pub created: i64,
    pub modified: i64,
    pub accessed: i64,
    pub owner: u32,
    pub group: u32,
    pub permissions: Permissions,
    pub size: u64,
}

impl FileStats {
    pub fn new_at(now: i64) -> Self {
        Self {
            created: now,
            modified: now,
            accessed: now,
            owner: 0,
            group: 0,
            permissions: Permissions::default(),
            size: 0,
        }
    }

    pub fn touch_modified(&mut self, now: i64, size: u64) {
        self.modified = now;
        self.accessed = now;
        self.size = size;
    }
}
