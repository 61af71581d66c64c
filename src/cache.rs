//! Memoization of selector results within one evaluation run.

use std::collections::HashMap;

use tracing::trace;

use crate::{
    ast::NodeId,
    evaluator::Accumulate,
    path::{NormalizedPath, PathStem},
};

/// One recorded result: where it was found, relative to the value the
/// cached selector was applied to, and the value itself.
pub(crate) struct CacheEntry<'r, V> {
    path_stem: NormalizedPath,
    value: &'r V,
}

/// Records results instead of delivering them.
pub(crate) struct CacheEntryAccumulator<'r, V> {
    entries: Vec<CacheEntry<'r, V>>,
}

impl<'r, V> Default for CacheEntryAccumulator<'r, V> {
    fn default() -> Self {
        CacheEntryAccumulator { entries: Vec::new() }
    }
}

impl<'r, V> Accumulate<'r, V> for CacheEntryAccumulator<'r, V> {
    fn accumulate(&mut self, stem: PathStem, value: &'r V) {
        self.entries.push(CacheEntry {
            path_stem: stem.to_path(),
            value,
        });
    }
}

/// What a cached result depends on: the selector node, the value it was
/// applied to, and whether paths were being tracked when it was recorded.
///
/// Values are identified by address. That is stable for as long as the
/// document is borrowed, which bounds the lifetime of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    node: NodeId,
    input: usize,
    tracking: bool,
}

impl CacheKey {
    pub(crate) fn new<V>(node: NodeId, input: &V, tracking: bool) -> Self {
        CacheKey {
            node,
            input: std::ptr::from_ref(input) as usize,
            tracking,
        }
    }
}

/// Cache counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Distinct cached selector applications
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that had to evaluate
    pub misses: usize,
}

/// Per-run resources of a compiled expression.
pub(crate) struct DynamicResources<'r, V> {
    cache: HashMap<CacheKey, Vec<CacheEntry<'r, V>>>,
    hits: usize,
    misses: usize,
}

impl<'r, V> Default for DynamicResources<'r, V> {
    fn default() -> Self {
        DynamicResources {
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<'r, V> DynamicResources<'r, V> {
    pub(crate) fn is_cached(&mut self, key: &CacheKey) -> bool {
        let cached = self.cache.contains_key(key);
        if cached {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        cached
    }

    pub(crate) fn add_to_cache(&mut self, key: CacheKey, items: CacheEntryAccumulator<'r, V>) {
        trace!(node = %key.node, entries = items.entries.len(), "caching selector results");
        self.cache.insert(key, items.entries);
    }

    /// Replay recorded results, re-rooted at `stem`.
    pub(crate) fn retrieve_from_cache(
        &self,
        key: &CacheKey,
        stem: &PathStem,
        accumulator: &mut dyn Accumulate<'r, V>,
    ) {
        if let Some(items) = self.cache.get(key) {
            for item in items {
                accumulator.accumulate(stem.join(&item.path_stem), item.value);
            }
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
