pub mod entry;
mod worker;

use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Duration;

use fnv::FnvHashMap;
use parking_lot::RwLock;

use crate::block::BlockId;
use crate::codec;
use crate::error::{FilesystemError, Result};
use crate::node::{DirectoryNode, FileNode, SearchIndex, SearchTree};
use crate::notify::Notifier;
use crate::store::BlockStore;

pub use entry::{CacheAction, CacheEntry, CachePayload};
use worker::WorkMessage;

pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cleanup_interval: Duration,
    pub channel_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

type CacheMap = Arc<RwLock<FnvHashMap<BlockId, CacheEntry>>>;

/// The deferred-write cache: a read-through, write-back map from block id to
/// decoded node, backed by a single writer thread. See `SPEC_FULL.md` §4.4.
pub struct Cache {
    map: CacheMap,
    store: Arc<dyn BlockStore>,
    sender: SyncSender<WorkMessage>,
    worker: Option<std::thread::JoinHandle<()>>,
    notifier: Notifier,
}

impl Cache {
    pub fn new(store: Arc<dyn BlockStore>, config: CacheConfig, notifier: Notifier) -> Self {
        let map: CacheMap = Arc::new(RwLock::new(FnvHashMap::default()));
        let (sender, receiver) = std::sync::mpsc::sync_channel(config.channel_capacity);
        let worker = worker::spawn(
            map.clone(),
            store.clone(),
            receiver,
            config.cleanup_interval,
            notifier.clone(),
        );
        Self {
            map,
            store,
            sender,
            worker: Some(worker),
            notifier,
        }
    }

    fn enqueue(&self, id: BlockId) {
        match self.sender.try_send(WorkMessage::Save(id)) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                // Backpressure: block until the worker catches up rather than
                // silently dropping a pending write.
                if let WorkMessage::Save(id) = msg {
                    let _ = self.sender.send(WorkMessage::Save(id));
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("cache worker channel disconnected; {id:?} will not persist");
            }
        }
    }

    fn read_through<T, F, D>(&self, id: BlockId, extract: F, decode: D) -> Result<T>
    where
        F: Fn(&CachePayload) -> Option<&T>,
        D: Fn(&[u8]) -> Result<CachePayload>,
        T: Clone,
    {
        {
            let guard = self.map.read();
            if let Some(entry) = guard.get(&id) {
                if entry.action == CacheAction::Delete {
                    log::trace!("cache hit (deleted) for {id:?}");
                    return Err(FilesystemError::Deleted(id));
                }
                return extract(&entry.payload)
                    .cloned()
                    .ok_or(FilesystemError::WrongKind(id));
            }
        }

        log::trace!("cache miss for {id:?}; loading from store");
        let bytes = self.store.get(id);
        let payload = decode(&bytes)?;
        let value = extract(&payload).cloned().ok_or(FilesystemError::WrongKind(id))?;

        let mut guard = self.map.write();
        guard.entry(id).or_insert(CacheEntry {
            id,
            dirty: false,
            action: CacheAction::Update,
            payload,
        });
        Ok(value)
    }

    pub fn get_directory(&self, id: BlockId) -> Result<DirectoryNode> {
        self.read_through(
            id,
            CachePayload::as_directory,
            |bytes| Ok(CachePayload::Directory(codec::decode(bytes)?)),
        )
    }

    pub fn get_file(&self, id: BlockId) -> Result<FileNode> {
        self.read_through(id, CachePayload::as_file, |bytes| {
            Ok(CachePayload::File(codec::decode(bytes)?))
        })
    }

    pub fn get_search_index(&self, id: BlockId) -> Result<SearchIndex> {
        self.read_through(id, CachePayload::as_search_index, |bytes| {
            Ok(CachePayload::SearchIndex(codec::decode(bytes)?))
        })
    }

    pub fn get_search_tree(&self, id: BlockId) -> Result<SearchTree> {
        self.read_through(id, CachePayload::as_search_tree, |bytes| {
            Ok(CachePayload::SearchTree(codec::decode(bytes)?))
        })
    }

    fn save(&self, id: BlockId, payload: CachePayload) {
        {
            let mut guard = self.map.write();
            guard.insert(
                id,
                CacheEntry {
                    id,
                    dirty: true,
                    action: CacheAction::Update,
                    payload,
                },
            );
        }
        log::debug!("cache save queued for {id:?}");
        self.notifier.emit(format!("save queued for {id:?}"));
        self.enqueue(id);
    }

    pub fn save_directory(&self, node: DirectoryNode) {
        self.save(node.own_id, CachePayload::Directory(node));
    }

    pub fn save_file(&self, node: FileNode) {
        self.save(node.own_id, CachePayload::File(node));
    }

    pub fn save_search_index(&self, node: SearchIndex) {
        self.save(node.own_id, CachePayload::SearchIndex(node));
    }

    pub fn save_search_tree(&self, node: SearchTree) {
        self.save(node.own_id, CachePayload::SearchTree(node));
    }

    /// Marks a file for deletion: the worker frees its block in the store on
    /// the next pass, and reads of the id return `Deleted` until eviction.
    pub fn delete_file(&self, node: FileNode) {
        let id = node.own_id;
        {
            let mut guard = self.map.write();
            guard.insert(
                id,
                CacheEntry {
                    id,
                    dirty: true,
                    action: CacheAction::Delete,
                    payload: CachePayload::File(node),
                },
            );
        }
        log::debug!("cache delete queued for {id:?}");
        self.notifier.emit(format!("delete queued for {id:?}"));
        self.enqueue(id);
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkMessage::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}
