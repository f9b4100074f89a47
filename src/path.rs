//! Directory-tree walking. All directory reads and creations go through the
//! cache; no canonicalization of `.`, `..`, or doubled slashes is performed
//! here — that is left to an external path-resolution layer.

use crate::block::{BlockId, BlockKind};
use crate::cache::Cache;
use crate::error::{FilesystemError, Result};
use crate::node::{DirectoryNode, FileNode};
use crate::store::BlockStore;

/// Splits an absolute, '/'-separated path into components, discarding only
/// the leading empty component produced by the root slash. Doubled slashes
/// elsewhere in the path are preserved as empty components — they are not
/// canonicalized here.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Walks from `root` through `components`, creating intermediate
/// directories when `create` is true, and returns the last directory
/// reached (i.e. the one that would contain the final component).
pub fn find_parent(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    components: &[&str],
    create: bool,
    now: i64,
) -> Result<DirectoryNode> {
    let mut current = cache.get_directory(root)?;
    for name in components {
        let next_id = match current.folders.get(*name) {
            Some(id) => *id,
            None if create => {
                let id = store.alloc(BlockKind::Directory);
                let node = DirectoryNode::new(id, now);
                current.folders.insert((*name).to_string(), id);
                cache.save_directory(node);
                cache.save_directory(current.clone());
                id
            }
            None => return Err(FilesystemError::NotFound(name.to_string())),
        };
        current = cache.get_directory(next_id)?;
    }
    Ok(current)
}

/// Resolves (and optionally creates) the file named by the last component
/// of `components`, returning its containing directory and the file node.
pub fn find_node(
    cache: &Cache,
    store: &dyn BlockStore,
    root: BlockId,
    components: &[&str],
    create: bool,
    now: i64,
) -> Result<(DirectoryNode, FileNode)> {
    let (parent_components, name) = components
        .split_last()
        .ok_or_else(|| FilesystemError::NotFound("/".to_string()))?;
    let parent_components: Vec<&str> = parent_components.to_vec();
    let mut parent = find_parent(cache, store, root, &parent_components, create, now)?;

    let file_id = match parent.files.get(*name) {
        Some(id) => *id,
        None if create => {
            let id = store.alloc(BlockKind::File);
            let node = FileNode::new(id, now);
            parent.files.insert((*name).to_string(), id);
            cache.save_file(node);
            cache.save_directory(parent.clone());
            id
        }
        None => return Err(FilesystemError::NotFound(name.to_string())),
    };
    let file = cache.get_file(file_id)?;
    Ok((parent, file))
}
