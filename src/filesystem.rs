//! Top-level API surface consumed by external layers (HTTP, CLI, TUI) —
//! none of which live in this crate.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::block::{BlockId, BlockKind};
use crate::cache::{Cache, CacheConfig};
use crate::codec;
use crate::error::{FilesystemError, Result};
use crate::node::{DirectoryNode, FileNode, FileStats, SearchIndex, SearchMatch, Superblock};
use crate::notify::Notifier;
use crate::path;
use crate::search;
use crate::file as file_engine;
use crate::store::BlockStore;

pub enum FileOrDirectory {
    File(FileNode),
    Directory(DirectoryNode),
}

#[derive(Debug, Clone, Default)]
pub struct FilesystemConfig {
    pub cache: CacheConfig,
    pub enable_notifications: bool,
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The block-addressed, versioned virtual filesystem. Coordinates the path
/// resolver, the deferred-write cache, and the inverted index over a
/// caller-supplied `BlockStore`.
pub struct Filesystem {
    store: Arc<dyn BlockStore>,
    cache: Cache,
    superblock: Superblock,
    subscriber: Mutex<Option<Receiver<String>>>,
}

impl Filesystem {
    /// Attaches to `store` using default cache tuning and no notification
    /// subscriber. `config` is an opaque diagnostic label passed straight
    /// through to the store's own `init`.
    pub fn init(store: Arc<dyn BlockStore>, config: &str) -> Self {
        Self::with_config(store, config, FilesystemConfig::default())
    }

    pub fn with_config(store: Arc<dyn BlockStore>, config: &str, fs_config: FilesystemConfig) -> Self {
        store.init(config);
        let (notifier, subscriber) = if fs_config.enable_notifications {
            let (notifier, receiver) = Notifier::channel();
            (notifier, Some(receiver))
        } else {
            (Notifier::disconnected(), None)
        };
        let cache = Cache::new(store.clone(), fs_config.cache, notifier);
        let superblock = Superblock::new(0, 0, BlockId::NIL, BlockId::NIL);
        Self {
            store,
            cache,
            superblock,
            subscriber: Mutex::new(subscriber),
        }
    }

    /// Takes the notification receiver, if one was configured. Returns
    /// `None` on a second call — at most one subscriber is supported.
    pub fn subscribe(&self) -> Option<Receiver<String>> {
        self.subscriber.lock().unwrap().take()
    }

    pub fn format(&mut self, block_count: u64, block_size: u32) -> Result<()> {
        log::info!("formatting filesystem: {block_count} blocks of {block_size} bytes");
        self.store.format(block_count, block_size);

        let root_id = self.store.alloc(BlockKind::Directory);
        self.cache.save_directory(DirectoryNode::new(root_id, now()));

        let search_index_id = self.store.alloc(BlockKind::SearchIndex);
        self.cache.save_search_index(SearchIndex::new(search_index_id));

        self.superblock = Superblock::new(block_count, block_size, root_id, search_index_id);
        self.store.put(BlockId::SUPERBLOCK, codec::encode(&self.superblock)?);
        Ok(())
    }

    fn root(&self) -> BlockId {
        self.superblock.root_directory
    }

    fn search_index(&self) -> BlockId {
        self.superblock.search_index
    }

    pub fn list_directory(&self, path: &str) -> Result<Vec<String>> {
        let components = path::split_path(path);
        let dir = path::find_parent(&self.cache, self.store.as_ref(), self.root(), &components, false, now())?;
        let mut names: Vec<String> = dir.folders.keys().cloned().chain(dir.files.keys().cloned()).collect();
        names.sort();
        Ok(names)
    }

    pub fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        file_engine::write(
            &self.cache,
            self.store.as_ref(),
            self.root(),
            self.search_index(),
            self.superblock.block_size,
            path,
            bytes,
            now(),
        )
    }

    pub fn append_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        file_engine::append(
            &self.cache,
            self.store.as_ref(),
            self.root(),
            self.search_index(),
            self.superblock.block_size,
            path,
            bytes,
            now(),
        )
    }

    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        file_engine::read(&self.cache, self.store.as_ref(), self.root(), path)
    }

    pub fn read_file_tag(&self, path: &str, tag: &str) -> Result<Vec<u8>> {
        file_engine::read_tag(&self.cache, self.store.as_ref(), self.root(), path, tag)
    }

    pub fn stat_file(&self, path: &str) -> Result<FileStats> {
        file_engine::stat(&self.cache, self.store.as_ref(), self.root(), path)
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        file_engine::delete(&self.cache, self.store.as_ref(), self.root(), path)
    }

    pub fn move_file_or_folder(&self, source: &str, target: &str) -> Result<()> {
        file_engine::move_entry(&self.cache, self.store.as_ref(), self.root(), source, target, now())
    }

    pub fn get_file_or_directory(&self, path: &str, create: bool) -> Result<FileOrDirectory> {
        let components = path::split_path(path);
        match path::find_node(&self.cache, self.store.as_ref(), self.root(), &components, false, now()) {
            Ok((_, file)) => Ok(FileOrDirectory::File(file)),
            Err(FilesystemError::NotFound(_)) => {
                let dir = path::find_parent(&self.cache, self.store.as_ref(), self.root(), &components, create, now())?;
                Ok(FileOrDirectory::Directory(dir))
            }
            Err(other) => Err(other),
        }
    }

    pub fn retrieve_file_node(&self, id: BlockId) -> Result<FileNode> {
        self.cache.get_file(id)
    }

    pub fn retrieve_directory_node(&self, id: BlockId) -> Result<DirectoryNode> {
        self.cache.get_directory(id)
    }

    pub fn get_tags(&self, path: &str) -> Result<Vec<String>> {
        file_engine::get_tags(&self.cache, self.store.as_ref(), self.root(), path)
    }

    pub fn save_new_block(&self, path: &str, key_name: &str, bytes: &[u8], sort_blocks: bool) -> Result<()> {
        file_engine::save_new_block(
            &self.cache,
            self.store.as_ref(),
            self.root(),
            self.search_index(),
            path,
            key_name,
            bytes,
            sort_blocks,
            now(),
        )
    }

    pub fn get_block(
        &self,
        path: &str,
        tag: Option<&str>,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        file_engine::get_block(&self.cache, self.store.as_ref(), self.root(), path, tag, start, end)
    }

    pub fn search_add_terms(&self, area: &str, terms: &[String], path: &str, version: &str) -> Result<()> {
        search::add_terms(&self.cache, self.store.as_ref(), self.search_index(), area, terms, path, version)
    }

    pub fn search_add_term(&self, area: &str, term: &str, path: &str, version: &str) -> Result<()> {
        search::add_term(&self.cache, self.store.as_ref(), self.search_index(), area, term, path, version)
    }

    pub fn search_find_terms(&self, area: &str, start: &str, end: &str) -> Result<Vec<SearchMatch>> {
        search::find_terms(&self.cache, self.search_index(), area, start, end)
    }

    pub fn search_remove_term(&self, area: &str, term: &str, path: &str) -> Result<()> {
        search::remove_term(&self.cache, self.search_index(), area, term, path)
    }

    pub fn dump_info(&self) {
        self.store.dump_info();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlockStore;

    fn new_fs() -> Filesystem {
        let store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
        let mut fs = Filesystem::init(store, "test");
        fs.format(100, 100).unwrap();
        fs
    }

    #[test]
    fn end_to_end_write_list_read_delete() {
        let fs = new_fs();
        fs.write_file("/docs/readme.txt", b"hello crate").unwrap();
        let listing = fs.list_directory("/docs").unwrap();
        assert_eq!(listing, vec!["readme.txt".to_string()]);
        assert_eq!(fs.read_file("/docs/readme.txt").unwrap(), b"hello crate");

        fs.delete_file("/docs/readme.txt").unwrap();
        assert!(fs.list_directory("/docs").unwrap().is_empty());
    }

    #[test]
    fn full_text_search_finds_written_words() {
        let fs = new_fs();
        fs.write_file("/notes.txt", b"the quick brown fox").unwrap();
        let matches = fs.search_find_terms("text", "brown", "fred").unwrap();
        assert!(matches.iter().any(|m| m.path == "/notes.txt"));
    }

    #[test]
    fn notifications_are_single_subscriber() {
        let store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
        let fs = Filesystem::with_config(
            store,
            "test",
            FilesystemConfig {
                cache: CacheConfig::default(),
                enable_notifications: true,
            },
        );
        assert!(fs.subscribe().is_some());
        assert!(fs.subscribe().is_none());
    }
}
