//! Coboundary and neighbour queries, and the stamped side table caching them.
//!
//! Entries are keyed by `(element, connector type)` and stamped with the
//! collection's change counter. Any physical insertion or erase advances the
//! counter, so every entry goes stale at once and is recomputed in full on its
//! next query.

use std::cmp::Ordering;

use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};

use crate::storage::collection::ContainerCollection;
use crate::storage::handle::Handle;
use crate::topology::cache::{CacheEntry, CacheState, CacheStats, InvalidateCache};
use crate::topology::element_type::ElementType;

/// Elements of type `ty` whose boundary contains `handle`, in container order.
///
/// # Panics
/// If `ty` is not declared by `collection`.
pub fn coboundary_of<A>(collection: &ContainerCollection<A>, handle: Handle, ty: ElementType) -> Vec<Handle> {
    if ty.dimension() <= handle.element_type().dimension() {
        return Vec::new();
    }
    collection
        .get(ty)
        .iter_with_handles()
        .filter(|(_, e)| e.references(handle))
        .map(|(h, _)| h)
        .collect()
}

/// Other elements of `handle`'s type sharing an element of type `connector`
/// with it.
///
/// A lower-dimensional connector is looked for in the boundaries; a
/// higher-dimensional one is a common coboundary element. A connector of the
/// same dimension connects nothing.
///
/// # Panics
/// If `handle` does not resolve or a type involved is not declared.
pub fn neighbours_of<A>(
    collection: &ContainerCollection<A>,
    handle: Handle,
    connector: ElementType,
) -> Vec<Handle> {
    let ty = handle.element_type();
    let own = ty.dimension();
    let via = connector.dimension();
    match via.cmp(&own) {
        Ordering::Less => {
            let shared: HashSet<Handle> = collection
                .dereference(handle)
                .boundary(via)
                .iter()
                .copied()
                .filter(|h| h.element_type() == connector)
                .collect();
            if shared.is_empty() {
                return Vec::new();
            }
            collection
                .get(ty)
                .iter_with_handles()
                .filter(|&(h, e)| h != handle && e.boundary(via).iter().any(|b| shared.contains(b)))
                .map(|(h, _)| h)
                .collect()
        }
        Ordering::Greater => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            let cofaces = collection
                .get(connector)
                .iter()
                .filter(|e| e.references(handle));
            for coface in cofaces {
                for &b in coface.boundary(own) {
                    if b != handle && b.element_type() == ty && seen.insert(b) {
                        out.push(b);
                    }
                }
            }
            out
        }
        Ordering::Equal => Vec::new(),
    }
}

/// Stamped `(element, connector type) -> handles` side table.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyCache {
    entries: HashMap<(Handle, ElementType), CacheEntry<Handle>>,
    stats: CacheStats,
}

impl AdjacencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the entry for `(handle, ty)` relative to `current`.
    pub fn state(&self, handle: Handle, ty: ElementType, current: u64) -> CacheState {
        match self.entries.get(&(handle, ty)) {
            None => CacheState::Uninitialized,
            Some(e) if e.is_obsolete(current) => CacheState::Stale(e.stamp),
            Some(e) => CacheState::Valid(e.stamp),
        }
    }

    /// Cached list for `(handle, ty)`, recomputed through `compute` if absent
    /// or stamped with anything but `current`.
    pub fn get_or_compute(
        &mut self,
        handle: Handle,
        ty: ElementType,
        current: u64,
        compute: impl FnOnce() -> Vec<Handle>,
    ) -> &[Handle] {
        let entry = match self.entries.entry((handle, ty)) {
            Entry::Occupied(o) => {
                let e = o.into_mut();
                if e.is_obsolete(current) {
                    log::debug!("recomputing {handle:?} via {ty:?}: stamp {} -> {current}", e.stamp);
                    self.stats.misses += 1;
                    self.stats.recomputed += 1;
                    *e = CacheEntry {
                        stamp: current,
                        list: compute(),
                    };
                } else {
                    log::trace!("cache hit for {handle:?} via {ty:?}");
                    self.stats.hits += 1;
                }
                e
            }
            Entry::Vacant(v) => {
                log::debug!("computing {handle:?} via {ty:?} at stamp {current}");
                self.stats.misses += 1;
                v.insert(CacheEntry {
                    stamp: current,
                    list: compute(),
                })
            }
        };
        &entry.list
    }

    /// Drops every entry keyed on `handle`.
    pub fn forget(&mut self, handle: Handle) {
        self.entries.retain(|(h, _), _| *h != handle);
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl InvalidateCache for AdjacencyCache {
    fn invalidate_cache(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::container::ContainerConfig;
    use crate::storage::element::Element;

    fn some_handle() -> Handle {
        let mut c = ContainerCollection::<()>::from_configs([(ElementType::Vertex, ContainerConfig::default())]);
        c.get_mut(ElementType::Vertex).insert(Element::vertex()).0
    }

    #[test]
    fn entry_lifecycle() {
        let h = some_handle();
        let mut cache = AdjacencyCache::new();
        assert_eq!(cache.state(h, ElementType::Line, 0), CacheState::Uninitialized);

        let first = cache.get_or_compute(h, ElementType::Line, 0, || vec![h]).to_vec();
        assert_eq!(first, vec![h]);
        assert_eq!(cache.state(h, ElementType::Line, 0), CacheState::Valid(0));

        let again = cache.get_or_compute(h, ElementType::Line, 0, || unreachable!()).len();
        assert_eq!(again, 1);
        assert_eq!(cache.state(h, ElementType::Line, 1), CacheState::Stale(0));

        let recomputed = cache.get_or_compute(h, ElementType::Line, 1, Vec::new).len();
        assert_eq!(recomputed, 0);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 2,
                recomputed: 1
            }
        );
    }

    #[test]
    fn invalidate_and_forget() {
        let h = some_handle();
        let mut cache = AdjacencyCache::new();
        cache.get_or_compute(h, ElementType::Line, 0, Vec::new);
        cache.get_or_compute(h, ElementType::Triangle, 0, Vec::new);
        assert_eq!(cache.len(), 2);
        cache.forget(h);
        assert!(cache.is_empty());
        cache.get_or_compute(h, ElementType::Line, 0, Vec::new);
        cache.invalidate_cache();
        assert_eq!(cache.state(h, ElementType::Line, 0), CacheState::Uninitialized);
    }
}
