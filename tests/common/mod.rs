use std::sync::Arc;

use blockfs::store::{BlockStore, MemoryBlockStore};
use blockfs::Filesystem;

/// A disposable filesystem backed by the in-process `MemoryBlockStore`
/// fixture, formatted and ready for a test's duration.
pub fn formatted(block_count: u64, block_size: u32) -> Filesystem {
    let store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    let mut fs = Filesystem::init(store, "integration-test");
    fs.format(block_count, block_size).unwrap();
    fs
}
