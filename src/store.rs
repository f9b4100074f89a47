//! The interface the core consumes from a block store implementer, plus an
//! in-memory fixture satisfying it for this crate's own test suite.

use std::sync::atomic::{AtomicI64, Ordering};

use fnv::FnvHashMap;
use parking_lot::RwLock;

use crate::block::{BlockId, BlockKind};

/// Block store contract. Every method is infallible at this boundary: an
/// implementer that can fail internally is expected to swallow or log those
/// failures itself rather than surface a `Result` here. Methods take `&self`
/// because the cache's worker thread and API caller threads hold the same
/// trait object concurrently; an implementer supplies its own interior
/// mutability.
pub trait BlockStore: Send + Sync {
    fn init(&self, config: &str);
    fn format(&self, block_count: u64, block_size: u32);
    fn alloc(&self, kind: BlockKind) -> BlockId;
    fn alloc_data(&self, parent: BlockId, key: &str) -> BlockId;
    fn get(&self, id: BlockId) -> Vec<u8>;
    fn put(&self, id: BlockId, bytes: Vec<u8>) -> BlockId;
    fn free(&self, ids: &[BlockId]);
    fn dump_info(&self);
}

/// A dev/test fixture, not part of the consumed-interface contract. Kept
/// simple and in-memory; production deployments supply their own
/// `BlockStore` implementer.
pub struct MemoryBlockStore {
    blocks: RwLock<FnvHashMap<BlockId, Vec<u8>>>,
    next_id: AtomicI64,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(FnvHashMap::default()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore for MemoryBlockStore {
    fn init(&self, config: &str) {
        log::info!("memory block store init: {config}");
    }

    fn format(&self, block_count: u64, block_size: u32) {
        log::info!("formatting memory block store: {block_count} blocks of {block_size} bytes");
        self.blocks.write().clear();
        self.next_id.store(1, Ordering::SeqCst);
    }

    fn alloc(&self, kind: BlockKind) -> BlockId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        BlockId::new(kind, id)
    }

    fn alloc_data(&self, parent: BlockId, _key: &str) -> BlockId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        BlockId::data(id, parent.id)
    }

    fn get(&self, id: BlockId) -> Vec<u8> {
        self.blocks.read().get(&id).cloned().unwrap_or_default()
    }

    fn put(&self, id: BlockId, bytes: Vec<u8>) -> BlockId {
        self.blocks.write().insert(id, bytes);
        id
    }

    fn free(&self, ids: &[BlockId]) {
        let mut blocks = self.blocks.write();
        for id in ids {
            blocks.remove(id);
        }
    }

    fn dump_info(&self) {
        log::info!("memory block store holds {} blocks", self.blocks.read().len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryBlockStore::new();
        let id = store.alloc(BlockKind::Directory);
        store.put(id, vec![1, 2, 3]);
        assert_eq!(store.get(id), vec![1, 2, 3]);
    }

    #[test]
    fn free_clears_bytes() {
        let store = MemoryBlockStore::new();
        let id = store.alloc(BlockKind::File);
        store.put(id, vec![9]);
        store.free(&[id]);
        assert_eq!(store.get(id), Vec::<u8>::new());
    }

    #[test]
    fn format_resets_allocator() {
        let store = MemoryBlockStore::new();
        let first = store.alloc(BlockKind::File);
        store.format(10, 100);
        let after = store.alloc(BlockKind::File);
        assert_eq!(first.id, after.id);
    }
}
