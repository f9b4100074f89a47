//! The cache's single background writer/evictor thread.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use fnv::FnvHashMap;
use parking_lot::RwLock;

use crate::block::BlockId;
use crate::cache::entry::{CacheAction, CacheEntry};
use crate::codec;
use crate::notify::Notifier;
use crate::store::BlockStore;

pub enum WorkMessage {
    Save(BlockId),
    Shutdown,
}

type CacheMap = Arc<RwLock<FnvHashMap<BlockId, CacheEntry>>>;

pub fn spawn(
    map: CacheMap,
    store: Arc<dyn BlockStore>,
    receiver: Receiver<WorkMessage>,
    tick_interval: Duration,
    notifier: Notifier,
) -> JoinHandle<()> {
    std::thread::spawn(move || run(map, store, receiver, tick_interval, notifier))
}

fn run(
    map: CacheMap,
    store: Arc<dyn BlockStore>,
    receiver: Receiver<WorkMessage>,
    tick_interval: Duration,
    notifier: Notifier,
) {
    loop {
        match receiver.recv_timeout(tick_interval) {
            Ok(WorkMessage::Save(id)) => process(&map, store.as_ref(), id, &notifier),
            Ok(WorkMessage::Shutdown) => {
                log::debug!("cache worker shutting down");
                notifier.emit("worker shutdown");
                return;
            }
            Err(RecvTimeoutError::Timeout) => cleanup(&map, &notifier),
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn process(map: &CacheMap, store: &dyn BlockStore, id: BlockId, notifier: &Notifier) {
    let (action, encoded) = {
        let guard = map.read();
        let Some(entry) = guard.get(&id) else {
            return;
        };
        match entry.action {
            CacheAction::Delete => (CacheAction::Delete, None),
            CacheAction::Update => {
                let bytes = match &entry.payload {
                    crate::cache::entry::CachePayload::Directory(d) => codec::encode(d),
                    crate::cache::entry::CachePayload::File(f) => codec::encode(f),
                    crate::cache::entry::CachePayload::SearchIndex(s) => codec::encode(s),
                    crate::cache::entry::CachePayload::SearchTree(s) => codec::encode(s),
                };
                match bytes {
                    Ok(bytes) => (CacheAction::Update, Some(bytes)),
                    Err(err) => {
                        log::warn!("cache worker failed to encode block {id:?}: {err}");
                        notifier.emit(format!("encode failed for {id:?}: {err}"));
                        return;
                    }
                }
            }
        }
    };

    match action {
        CacheAction::Update => {
            if let Some(bytes) = encoded {
                store.put(id, bytes);
                log::debug!("cache worker persisted {id:?}");
                notifier.emit(format!("save {id:?}"));
            }
        }
        CacheAction::Delete => {
            store.free(&[id]);
            log::debug!("cache worker freed {id:?}");
            notifier.emit(format!("delete {id:?}"));
        }
    }

    let mut guard = map.write();
    if let Some(entry) = guard.get_mut(&id) {
        entry.dirty = false;
    }
}

fn cleanup(map: &CacheMap, notifier: &Notifier) {
    let mut guard = map.write();
    let before = guard.len();
    guard.retain(|_, entry| entry.dirty);
    let evicted = before - guard.len();
    if evicted > 0 {
        log::debug!("cache cleanup evicted {evicted} entries");
        notifier.emit(format!("cache cleanup evicted {evicted} entries"));
    }
}
