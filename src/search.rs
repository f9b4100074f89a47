//! Area-partitioned inverted index over ordered search trees.

use thin_vec::ThinVec;

use crate::block::{BlockId, BlockKind};
use crate::cache::Cache;
use crate::error::{FilesystemError, Result};
use crate::node::{SearchMatch, SearchTree};
use crate::store::BlockStore;

fn tree_for_area(
    cache: &Cache,
    store: &dyn BlockStore,
    search_index_id: BlockId,
    area: &str,
    create: bool,
) -> Result<SearchTree> {
    let mut index = cache.get_search_index(search_index_id)?;
    if let Some(tree_id) = index.areas.get(area) {
        return cache.get_search_tree(*tree_id);
    }
    if !create {
        return Err(FilesystemError::NoSearchArea(area.to_string()));
    }
    let tree_id = store.alloc(BlockKind::SearchTree);
    index.areas.insert(area.to_string(), tree_id);
    cache.save_search_index(index);
    Ok(SearchTree::new(tree_id))
}

pub fn add_terms(
    cache: &Cache,
    store: &dyn BlockStore,
    search_index_id: BlockId,
    area: &str,
    terms: &[String],
    path: &str,
    version: &str,
) -> Result<()> {
    let mut tree = tree_for_area(cache, store, search_index_id, area, true)?;
    for term in terms {
        let matches = tree.terms.entry(term.clone()).or_insert_with(ThinVec::new);
        matches.push(SearchMatch {
            path: path.to_string(),
            version_tag: version.to_string(),
        });
    }
    cache.save_search_tree(tree);
    Ok(())
}

pub fn add_term(
    cache: &Cache,
    store: &dyn BlockStore,
    search_index_id: BlockId,
    area: &str,
    term: &str,
    path: &str,
    version: &str,
) -> Result<()> {
    add_terms(cache, store, search_index_id, area, &[term.to_string()], path, version)
}

/// Range-scans `area`'s term index from `start` (inclusive) to `end`
/// (exclusive), deduplicating `(path, version_tag)` pairs by first
/// appearance in ascending term order.
pub fn find_terms(
    cache: &Cache,
    search_index_id: BlockId,
    area: &str,
    start: &str,
    end: &str,
) -> Result<Vec<SearchMatch>> {
    let index = cache.get_search_index(search_index_id)?;
    let tree_id = index
        .areas
        .get(area)
        .ok_or_else(|| FilesystemError::NoSearchArea(area.to_string()))?;
    let tree = cache.get_search_tree(*tree_id)?;

    use std::ops::Bound;
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start.to_string())
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end.to_string())
    };

    let mut seen = std::collections::HashSet::new();
    let mut results = Vec::new();
    for (_, matches) in tree.terms.range((lower, upper)) {
        for m in matches {
            let key = (m.path.clone(), m.version_tag.clone());
            if seen.insert(key) {
                results.push(m.clone());
            }
        }
    }
    Ok(results)
}

/// Removes every match for `(term, path)` across all versions. If the
/// term's match list becomes empty, the term entry is removed entirely.
/// Removal semantics here are a deliberate design decision: the original
/// interface point this is modeled on left this unspecified (see DESIGN.md).
pub fn remove_term(
    cache: &Cache,
    search_index_id: BlockId,
    area: &str,
    term: &str,
    path: &str,
) -> Result<()> {
    let index = cache.get_search_index(search_index_id)?;
    let tree_id = index
        .areas
        .get(area)
        .ok_or_else(|| FilesystemError::NoSearchArea(area.to_string()))?;
    let mut tree = cache.get_search_tree(*tree_id)?;

    if let Some(matches) = tree.terms.get_mut(term) {
        matches.retain(|m| m.path != path);
        if matches.is_empty() {
            tree.terms.remove(term);
        }
    }
    cache.save_search_tree(tree);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::node::SearchIndex;
    use crate::notify::Notifier;
    use crate::store::MemoryBlockStore;
    use std::sync::Arc;

    fn setup() -> (Cache, Arc<MemoryBlockStore>, BlockId) {
        let store = Arc::new(MemoryBlockStore::new());
        let cache = Cache::new(store.clone(), CacheConfig::default(), Notifier::disconnected());
        let index_id = store.alloc(BlockKind::SearchIndex);
        cache.save_search_index(SearchIndex::new(index_id));
        (cache, store, index_id)
    }

    #[test]
    fn add_then_find_terms_in_range() {
        let (cache, store, index_id) = setup();
        add_terms(
            &cache,
            store.as_ref(),
            index_id,
            "text",
            &["apple".to_string(), "banana".to_string(), "cherry".to_string()],
            "/a.txt",
            "v000000001",
        )
        .unwrap();

        let results = find_terms(&cache, index_id, "text", "apple", "cherry").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].path, "/a.txt");
    }

    #[test]
    fn find_terms_on_unknown_area_fails() {
        let (cache, _store, index_id) = setup();
        let err = find_terms(&cache, index_id, "missing", "a", "z").unwrap_err();
        assert!(matches!(err, FilesystemError::NoSearchArea(_)));
    }

    #[test]
    fn find_terms_deduplicates_by_first_appearance() {
        let (cache, store, index_id) = setup();
        add_terms(&cache, store.as_ref(), index_id, "text", &["apple".to_string()], "/a.txt", "v1").unwrap();
        add_terms(&cache, store.as_ref(), index_id, "text", &["apricot".to_string()], "/a.txt", "v1").unwrap();
        let results = find_terms(&cache, index_id, "text", "a", "b").unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn remove_term_drops_matching_path() {
        let (cache, store, index_id) = setup();
        add_terms(&cache, store.as_ref(), index_id, "text", &["apple".to_string()], "/a.txt", "v1").unwrap();
        add_terms(&cache, store.as_ref(), index_id, "text", &["apple".to_string()], "/b.txt", "v1").unwrap();
        remove_term(&cache, index_id, "text", "apple", "/a.txt").unwrap();
        let results = find_terms(&cache, index_id, "text", "apple", "applf").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "/b.txt");
    }
}
