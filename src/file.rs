//! Write, append, read, stat, delete, move, and structured block retrieval
//! over file nodes, plus the automatic full-text indexer that rides along
//! with ordinary writes and appends.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::{BlockId, BlockKind};
use crate::cache::Cache;
use crate::codec;
use crate::error::{FilesystemError, Result};
use crate::node::{DataRoute, FileNode, FileStats};
use crate::path;
use crate::search;
use crate::store::BlockStore;

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

fn tokenize(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    WORD_PATTERN
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn chunk(bytes: &[u8], block_size: u32) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes
        .chunks(block_size.max(1) as usize)
        .map(|c| c.to_vec())
        .collect()
}

/// Writes `chunks` as sequential data blocks, finalizes a new version, and
/// (unless `sort_blocks` is set) tokenizes the freshly written bytes into
/// the `"text"` search area.
#[allow(clippy::too_many_arguments)]
fn commit_blocks(
    cache: &Cache,
    store: &dyn BlockStore,
    search_index_id: BlockId,
    path_str: &str,
    file: &mut FileNode,
    key_names: Vec<String>,
    chunks: Vec<Vec<u8>>,
    sort_blocks: bool,
    now: i64,
) -> Result<()> {
    let mut total_bytes = Vec::new();
    for (key, bytes) in key_names.into_iter().zip(chunks.into_iter()) {
        let data_id = store.alloc_data(file.own_id, &key);
        total_bytes.extend_from_slice(&bytes);
        store.put(data_id, bytes);
        file.data_blocks.insert(key.clone(), data_id);
        file.default_route.push(key);
    }
    if sort_blocks {
        file.default_route.sort();
    }

    file.version += 1;
    file.latest_tag = FileNode::next_version_tag(file.version);
    let route_id = store.alloc(BlockKind::Route);
    let mut route = file.default_route.clone();
    route.own_id = route_id;
    store.put(route_id, codec::encode(&route)?);
    file.alternate_routes.insert(file.latest_tag.clone(), route_id);

    let size = file.stats.size + total_bytes.len() as u64;
    file.stats.touch_modified(now, size);

    if !sort_blocks {
        let words = tokenize(&total_bytes);
        if !words.is_empty() {
            search::add_terms(cache, store, search_index_id, "text", &words, path_str, &file.latest_tag)?;
        }
    }

    cache.save_file(file.clone());
    Ok(())
}

pub fn write(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    search_index_id: BlockId,
    block_size: u32,
    path_str: &str,
    bytes: &[u8],
    now: i64,
) -> Result<()> {
    let components = path::split_path(path_str);
    let (parent, mut file) = path::find_node(cache, store, root, &components, true, now)?;

    let old_blocks: Vec<BlockId> = file.data_blocks.values().copied().collect();
    let old_routes: Vec<BlockId> = file.alternate_routes.values().copied().collect();
    if !old_blocks.is_empty() || !old_routes.is_empty() {
        let mut freed = old_blocks;
        freed.extend(old_routes);
        store.free(&freed);
    }
    file.data_blocks.clear();
    file.default_route = DataRoute::new("default");
    file.alternate_routes.clear();
    file.version = 0;
    file.latest_tag.clear();
    file.stats.size = 0;

    let chunks = chunk(bytes, block_size);
    let key_names: Vec<String> = (1..=chunks.len()).map(FileNode::next_key_name).collect();
    commit_blocks(cache, store, search_index_id, path_str, &mut file, key_names, chunks, false, now)?;
    cache.save_directory(parent);
    Ok(())
}

pub fn append(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    search_index_id: BlockId,
    block_size: u32,
    path_str: &str,
    bytes: &[u8],
    now: i64,
) -> Result<()> {
    let components = path::split_path(path_str);
    let (_parent, mut file) = path::find_node(cache, store, root, &components, true, now)?;

    let start = file.data_blocks.len() + 1;
    let chunks = chunk(bytes, block_size);
    let key_names: Vec<String> = (start..start + chunks.len()).map(FileNode::next_key_name).collect();
    commit_blocks(cache, store, search_index_id, path_str, &mut file, key_names, chunks, false, now)
}

pub fn save_new_block(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    search_index_id: BlockId,
    path_str: &str,
    key_name: &str,
    bytes: &[u8],
    sort_blocks: bool,
    now: i64,
) -> Result<()> {
    let components = path::split_path(path_str);
    let (_parent, mut file) = path::find_node(cache, store, root, &components, true, now)?;
    commit_blocks(
        cache,
        store,
        search_index_id,
        path_str,
        &mut file,
        vec![key_name.to_string()],
        vec![bytes.to_vec()],
        sort_blocks,
        now,
    )
}

pub fn read(cache: &Cache, store: &dyn BlockStore, root: BlockId, path_str: &str) -> Result<Vec<u8>> {
    let components = path::split_path(path_str);
    let (_parent, file) = path::find_node(cache, store, root, &components, false, 0)?;
    let mut out = Vec::new();
    for name in &file.default_route.data_block_names {
        let id = *file
            .data_blocks
            .get(name)
            .ok_or_else(|| FilesystemError::InvalidBlockStructure(name.clone()))?;
        out.extend_from_slice(&store.get(id));
    }
    Ok(out)
}

pub fn read_tag(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    path_str: &str,
    tag: &str,
) -> Result<Vec<u8>> {
    let components = path::split_path(path_str);
    let (_parent, file) = path::find_node(cache, store, root, &components, false, 0)?;
    let route_id = *file
        .alternate_routes
        .get(tag)
        .ok_or_else(|| FilesystemError::NotFound(tag.to_string()))?;
    let route: DataRoute = codec::decode(&store.get(route_id))?;
    let mut out = Vec::new();
    for name in &route.data_block_names {
        let id = *file
            .data_blocks
            .get(name)
            .ok_or_else(|| FilesystemError::InvalidBlockStructure(name.clone()))?;
        out.extend_from_slice(&store.get(id));
    }
    Ok(out)
}

pub fn stat(cache: &Cache, store: &dyn BlockStore, root: BlockId, path_str: &str) -> Result<FileStats> {
    let components = path::split_path(path_str);
    let (_parent, file) = path::find_node(cache, store, root, &components, false, 0)?;
    Ok(file.stats)
}

pub fn delete(cache: &Cache, store: &dyn BlockStore, root: BlockId, path_str: &str) -> Result<()> {
    let components = path::split_path(path_str);
    let (mut parent, file) = path::find_node(cache, store, root, &components, false, 0)?;
    let name = components
        .last()
        .ok_or_else(|| FilesystemError::NotFound(path_str.to_string()))?;

    let mut freed: Vec<BlockId> = file.data_blocks.values().copied().collect();
    freed.extend(file.alternate_routes.values().copied());
    store.free(&freed);

    parent.files.remove(*name);
    cache.save_directory(parent);
    cache.delete_file(file);
    Ok(())
}

pub fn move_entry(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    source_path: &str,
    target_path: &str,
    now: i64,
) -> Result<()> {
    let source_components = path::split_path(source_path);
    let (source_parent_components, source_name) = source_components
        .split_last()
        .ok_or_else(|| FilesystemError::NotFound(source_path.to_string()))?;
    let mut source_parent = path::find_parent(cache, store, root, source_parent_components, false, now)?;

    let (is_file, entry_id) = match (
        source_parent.files.get(*source_name).copied(),
        source_parent.folders.get(*source_name).copied(),
    ) {
        (Some(id), _) => (true, id),
        (None, Some(id)) => (false, id),
        (None, None) => return Err(FilesystemError::NotFound(source_path.to_string())),
    };

    let target_components = path::split_path(target_path);
    let (target_parent_components, target_name) = target_components
        .split_last()
        .ok_or_else(|| FilesystemError::InvalidTarget(target_path.to_string()))?;
    let mut target_parent = path::find_parent(cache, store, root, target_parent_components, true, now)?;

    let name_taken = if is_file {
        target_parent.files.contains_key(*target_name)
    } else {
        target_parent.folders.contains_key(*target_name)
    };
    if name_taken {
        return Err(FilesystemError::AlreadyExists(target_path.to_string()));
    }

    if source_parent.own_id == target_parent.own_id {
        if is_file {
            source_parent.files.remove(*source_name);
            source_parent.files.insert((*target_name).to_string(), entry_id);
        } else {
            source_parent.folders.remove(*source_name);
            source_parent.folders.insert((*target_name).to_string(), entry_id);
        }
        cache.save_directory(source_parent);
    } else {
        if is_file {
            source_parent.files.remove(*source_name);
            target_parent.files.insert((*target_name).to_string(), entry_id);
        } else {
            source_parent.folders.remove(*source_name);
            target_parent.folders.insert((*target_name).to_string(), entry_id);
        }
        cache.save_directory(source_parent);
        cache.save_directory(target_parent);
    }
    Ok(())
}

pub fn get_tags(cache: &Cache, store: &dyn BlockStore, root: BlockId, path_str: &str) -> Result<Vec<String>> {
    let components = path::split_path(path_str);
    let (_parent, file) = path::find_node(cache, store, root, &components, false, 0)?;
    let mut tags: Vec<String> = file.alternate_routes.keys().cloned().collect();
    tags.sort();
    Ok(tags)
}

pub fn get_block(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    path_str: &str,
    tag: Option<&str>,
    start: &str,
    end: &str,
) -> Result<Vec<(String, Vec<u8>)>> {
    let components = path::split_path(path_str);
    let (_parent, file) = path::find_node(cache, store, root, &components, false, 0)?;

    let route_names: Vec<String> = match tag {
        None | Some("") => file.default_route.data_block_names.iter().cloned().collect(),
        Some(tag) => {
            let route_id = *file
                .alternate_routes
                .get(tag)
                .ok_or_else(|| FilesystemError::NotFound(tag.to_string()))?;
            let route: DataRoute = codec::decode(&store.get(route_id))?;
            route.data_block_names.iter().cloned().collect()
        }
    };

    let mut out = Vec::new();
    for name in route_names {
        if !start.is_empty() && name.as_str() < start {
            continue;
        }
        if !end.is_empty() && name.as_str() >= end {
            continue;
        }
        let id = *file
            .data_blocks
            .get(&name)
            .ok_or_else(|| FilesystemError::InvalidBlockStructure(name.clone()))?;
        out.push((name, store.get(id)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::cache::CacheConfig;
    use crate::node::{DirectoryNode, SearchIndex};
    use crate::notify::Notifier;
    use crate::store::MemoryBlockStore;
    use std::sync::Arc;

    fn setup() -> (Cache, Arc<MemoryBlockStore>, BlockId, BlockId) {
        let store = Arc::new(MemoryBlockStore::new());
        let cache = Cache::new(store.clone(), CacheConfig::default(), Notifier::disconnected());
        let root = store.alloc(BlockKind::Directory);
        cache.save_directory(DirectoryNode::new(root, 0));
        let index_id = store.alloc(BlockKind::SearchIndex);
        cache.save_search_index(SearchIndex::new(index_id));
        (cache, store, root, index_id)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/hello.txt", b"hello world", 0).unwrap();
        let bytes = read(&cache, store.as_ref(), root, "/hello.txt").unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn append_accumulates_content() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"hello ", 0).unwrap();
        append(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"world", 1).unwrap();
        let bytes = read(&cache, store.as_ref(), root, "/a.txt").unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn read_tag_preserves_historical_version_after_append() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"v1", 0).unwrap();
        let tags = get_tags(&cache, store.as_ref(), root, "/a.txt").unwrap();
        let first_tag = tags[0].clone();
        append(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"-v2", 1).unwrap();
        let historical = read_tag(&cache, store.as_ref(), root, "/a.txt", &first_tag).unwrap();
        assert_eq!(historical, b"v1");
        let current = read(&cache, store.as_ref(), root, "/a.txt").unwrap();
        assert_eq!(current, b"v1-v2");
    }

    #[test]
    fn empty_write_has_no_data_blocks() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/empty.txt", b"", 0).unwrap();
        let bytes = read(&cache, store.as_ref(), root, "/empty.txt").unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn large_write_splits_across_blocks() {
        let (cache, store, root, index_id) = setup();
        let payload = vec![b'x'; 25];
        write(&cache, store.as_ref(), root, index_id, 10, "/big.txt", &payload, 0).unwrap();
        let bytes = read(&cache, store.as_ref(), root, "/big.txt").unwrap();
        assert_eq!(bytes, payload);
    }

    #[test]
    fn delete_removes_from_directory_and_blocks() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/gone.txt", b"bye", 0).unwrap();
        delete(&cache, store.as_ref(), root, "/gone.txt").unwrap();
        let err = read(&cache, store.as_ref(), root, "/gone.txt").unwrap_err();
        assert!(matches!(err, FilesystemError::NotFound(_)));
    }

    #[test]
    fn move_within_same_directory_renames() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"hi", 0).unwrap();
        move_entry(&cache, store.as_ref(), root, "/a.txt", "/b.txt", 1).unwrap();
        assert!(read(&cache, store.as_ref(), root, "/a.txt").is_err());
        assert_eq!(read(&cache, store.as_ref(), root, "/b.txt").unwrap(), b"hi");
    }

    #[test]
    fn move_onto_existing_name_fails() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 100, "/a.txt", b"1", 0).unwrap();
        write(&cache, store.as_ref(), root, index_id, 100, "/b.txt", b"2", 0).unwrap();
        let err = move_entry(&cache, store.as_ref(), root, "/a.txt", "/b.txt", 1).unwrap_err();
        assert!(matches!(err, FilesystemError::AlreadyExists(_)));
        assert_eq!(read(&cache, store.as_ref(), root, "/a.txt").unwrap(), b"1");
        assert_eq!(read(&cache, store.as_ref(), root, "/b.txt").unwrap(), b"2");
    }

    #[test]
    fn get_block_filters_range() {
        let (cache, store, root, index_id) = setup();
        write(&cache, store.as_ref(), root, index_id, 1, "/r.txt", b"abc", 0).unwrap();
        let blocks = get_block(&cache, store.as_ref(), root, "/r.txt", None, "00001", "00003").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, "00001");
    }
}
