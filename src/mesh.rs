//! The mesh facade: a physical inserter plus adjacency caches and labels.

use std::collections::BTreeMap;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::config::MeshConfig;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshStoreError;
use crate::storage::collection::{CollectionId, ContainerCollection};
use crate::storage::element::Element;
use crate::storage::handle::{ContainerId, Handle};
use crate::storage::id::ElementId;
use crate::storage::inserter::{InsertChain, Inserter, PhysicalInserter};
use crate::storage::view::{View, ViewBase, ViewParent};
use crate::topology::adjacency::{AdjacencyCache, coboundary_of, neighbours_of};
use crate::topology::boundary::{BoundaryGenerator, StandardBoundary};
use crate::topology::cache::{CacheStats, InvalidateCache};
use crate::topology::element_type::ElementType;
use crate::topology::labels::LabelSet;

/// Element storage of one mesh, with appendix type `A`.
pub struct Mesh<A = ()> {
    inserter: PhysicalInserter<A>,
    coboundaries: AdjacencyCache,
    neighbours: AdjacencyCache,
    labels: LabelSet,
}

impl<A: Clone + Default> Mesh<A> {
    /// Mesh using the standard boundary generator.
    ///
    /// # Panics
    /// If `config` does not validate.
    ///
    /// # Example
    /// ```rust
    /// use mesh_store::prelude::*;
    /// let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
    /// let v: Vec<_> = (0..3).map(|_| mesh.insert_vertex(())).collect();
    /// let (tri, inserted) = mesh.insert_element(ElementType::Triangle, v.clone());
    /// assert!(inserted);
    /// assert_eq!(mesh.statistics()[&ElementType::Line], 3);
    /// assert_eq!(mesh.coboundary(v[0], ElementType::Triangle), &[tri]);
    /// ```
    pub fn new(config: MeshConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(config: MeshConfig) -> Result<Self, MeshStoreError> {
        Self::with_generator(config, Arc::new(StandardBoundary))
    }

    /// Inserts a vertex carrying `appendix`.
    pub fn insert_vertex(&mut self, appendix: A) -> Handle {
        self.insert(Element::vertex().with_appendix(appendix)).0
    }

    /// Inserts an element of type `ty` over `vertices`.
    pub fn insert_element(
        &mut self,
        ty: ElementType,
        vertices: impl IntoIterator<Item = Handle>,
    ) -> (Handle, bool) {
        self.insert(Element::new(ty).with_vertices(vertices))
    }
}

impl<A> Mesh<A> {
    /// Mesh using a custom boundary generator.
    pub fn with_generator(
        config: MeshConfig,
        generator: Arc<dyn BoundaryGenerator<A>>,
    ) -> Result<Self, MeshStoreError> {
        config.validate()?;
        Ok(Self {
            inserter: PhysicalInserter::new(config, generator),
            coboundaries: AdjacencyCache::new(),
            neighbours: AdjacencyCache::new(),
            labels: LabelSet::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &MeshConfig {
        self.inserter.config()
    }

    #[inline]
    pub fn collection(&self) -> &ContainerCollection<A> {
        self.inserter.collection()
    }

    /// The physical inserter, for building recursive inserters on top.
    #[inline]
    pub fn inserter(&mut self) -> &mut PhysicalInserter<A> {
        &mut self.inserter
    }

    /// Current change counter value.
    #[inline]
    pub fn change_counter(&self) -> u64 {
        self.inserter.change_counter().get()
    }

    pub fn get(&self, handle: Handle) -> Option<&Element<A>> {
        self.collection().get_element(handle)
    }

    /// Appendix of the element behind `handle`. Type, id and boundary stay
    /// read-only so the id and key indexes remain valid.
    pub fn appendix_mut(&mut self, handle: Handle) -> Option<&mut A> {
        self.inserter
            .collection_mut()
            .get_element_mut(handle)
            .map(Element::appendix_mut)
    }

    /// # Panics
    /// If `handle` does not resolve.
    pub fn dereference(&self, handle: Handle) -> &Element<A> {
        self.collection().dereference(handle)
    }

    pub fn find_by_id(&self, ty: ElementType, id: ElementId) -> Option<Handle> {
        self.collection().try_get(ty)?.find_by_id(id)
    }

    /// Element behind `handle`, or why it cannot be resolved.
    pub fn find_by_handle(&self, handle: Handle) -> Result<&Element<A>, MeshStoreError> {
        self.collection().try_dereference(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.collection().contains(handle)
    }

    /// Elements of type `ty` containing `handle` in their boundary.
    ///
    /// # Panics
    /// If `ty` is not declared.
    pub fn coboundary(&mut self, handle: Handle, ty: ElementType) -> &[Handle] {
        let stamp = self.change_counter();
        let collection = self.inserter.collection();
        self.coboundaries
            .get_or_compute(handle, ty, stamp, || coboundary_of(collection, handle, ty))
    }

    /// Other elements of `handle`'s type sharing a `connector` element.
    ///
    /// # Panics
    /// If `handle` does not resolve or `connector` is not declared.
    pub fn neighbours(&mut self, handle: Handle, connector: ElementType) -> &[Handle] {
        let stamp = self.change_counter();
        let collection = self.inserter.collection();
        self.neighbours
            .get_or_compute(handle, connector, stamp, || neighbours_of(collection, handle, connector))
    }

    /// Coboundary of `handle` restricted to the members of `view`.
    ///
    /// # Panics
    /// If `view` was not built over this mesh.
    pub fn coboundary_within(&mut self, view: &View, handle: Handle, ty: ElementType) -> Vec<Handle> {
        let root = self.collection().id();
        if view.root() != root {
            panic!(
                "{}",
                MeshStoreError::ViewChainMismatch {
                    expected: format!("{:?}", view.root()),
                    found: format!("{root:?}"),
                }
            );
        }
        self.coboundary(handle, ty)
            .iter()
            .copied()
            .filter(|&h| view.contains(h))
            .collect()
    }

    /// Vertex at local position `k` of the `position`-th boundary
    /// sub-element of dimension `dim`, in `host`'s local order.
    ///
    /// For `dim == 0` the sub-element is itself a vertex, so only `k == 0`
    /// is answered.
    pub fn local_vertex(&self, host: Handle, dim: u8, position: usize, k: usize) -> Option<Handle> {
        let element = self.get(host)?;
        let sub = *element.boundary(dim).get(position)?;
        if dim == 0 {
            return (k == 0).then_some(sub);
        }
        let orientation = element.orientation(dim, position)?;
        self.get(sub)?.vertices().get(orientation.apply(k)).copied()
    }

    /// Erases `handle` and every element whose boundary references it,
    /// directly or transitively. Returns the erased handles, highest
    /// dimension first.
    pub fn erase(&mut self, handle: Handle) -> Vec<Handle> {
        if !self.contains(handle) {
            return Vec::new();
        }
        let collection = self.inserter.collection();
        let mut doomed: HashSet<Handle> = HashSet::new();
        doomed.insert(handle);
        let mut higher: Vec<ElementType> = collection
            .element_types()
            .filter(|ty| ty.dimension() > handle.element_type().dimension())
            .collect();
        higher.sort_by_key(|ty| ty.dimension());
        for ty in higher {
            let hits: Vec<Handle> = collection
                .get(ty)
                .iter_with_handles()
                .filter(|(_, e)| e.layers().iter().any(|l| l.handles().iter().any(|b| doomed.contains(b))))
                .map(|(h, _)| h)
                .collect();
            doomed.extend(hits);
        }

        let mut by_type: BTreeMap<ElementType, Vec<Handle>> = BTreeMap::new();
        for h in doomed {
            by_type.entry(h.element_type()).or_default().push(h);
        }
        let mut order: Vec<(ElementType, Vec<Handle>)> = by_type.into_iter().collect();
        order.sort_by_key(|(ty, _)| std::cmp::Reverse(ty.dimension()));

        let mut erased = Vec::new();
        let mut erased_ids = Vec::new();
        for (ty, handles) in order {
            let removed = self.inserter.collection_mut().get_mut(ty).erase_all(&handles);
            for (h, element) in removed {
                if let Some(id) = element.id() {
                    erased_ids.push((ty, id));
                }
                self.coboundaries.forget(h);
                self.neighbours.forget(h);
                erased.push(h);
            }
        }
        self.labels.clear_elements(erased_ids);
        let stamp = self.inserter.touch();
        log::debug!("erased {} elements from {handle:?}, change counter now {stamp}", erased.len());
        erased
    }

    /// Drops every element. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.inserter.collection_mut().clear();
        self.inserter.touch();
        self.invalidate_cache();
        self.labels = LabelSet::new();
    }

    /// Element count per declared type.
    pub fn statistics(&self) -> BTreeMap<ElementType, usize> {
        self.collection().statistics()
    }

    pub fn len(&self) -> usize {
        self.collection().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection().is_empty()
    }

    /// Hit/miss counters of the coboundary and neighbour caches.
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.coboundaries.stats(), self.neighbours.stats())
    }

    #[inline]
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Tags the element behind `handle`. Returns the previous value.
    pub fn set_label(&mut self, handle: Handle, name: &str, value: i32) -> Result<Option<i32>, MeshStoreError> {
        let id = self.label_key(handle)?;
        Ok(self.labels.set_label(id, name, value))
    }

    pub fn get_label(&self, handle: Handle, name: &str) -> Option<i32> {
        let key = self.label_key(handle).ok()?;
        self.labels.get_label(key, name)
    }

    /// Handles of the live elements tagged `name == value`, ordered by type
    /// then id.
    pub fn labelled(&self, name: &str, value: i32) -> Vec<Handle> {
        self.labels
            .stratum(name, value)
            .into_iter()
            .filter_map(|(ty, id)| self.find_by_id(ty, id))
            .collect()
    }

    fn label_key(&self, handle: Handle) -> Result<(ElementType, ElementId), MeshStoreError> {
        let element = self.find_by_handle(handle)?;
        let id = element
            .id()
            .ok_or(MeshStoreError::MissingElementId(handle.element_type()))?;
        Ok((handle.element_type(), id))
    }
}

impl<A: Clone> Mesh<A> {
    /// Independent deep copy. Handles of `self` do not resolve in the copy;
    /// look elements up again by id.
    pub fn duplicate(&self) -> Self {
        Self {
            inserter: self.inserter.duplicate(),
            coboundaries: AdjacencyCache::new(),
            neighbours: AdjacencyCache::new(),
            labels: self.labels.clone(),
        }
    }
}

impl<A: Clone> Inserter<A> for Mesh<A> {
    fn target(&self) -> ViewParent {
        self.inserter.target()
    }

    fn chain(&mut self) -> InsertChain<'_, A> {
        self.inserter.chain()
    }
}

impl<A> ViewBase for Mesh<A> {
    fn root(&self) -> CollectionId {
        self.inserter.root()
    }

    fn as_parent(&self) -> ViewParent {
        self.inserter.as_parent()
    }

    fn base_container(&self, ty: ElementType) -> Option<ContainerId> {
        self.inserter.base_container(ty)
    }

    fn visible_handles(&self, ty: ElementType) -> Vec<Handle> {
        self.inserter.visible_handles(ty)
    }
}

impl<A> InvalidateCache for Mesh<A> {
    fn invalidate_cache(&mut self) {
        self.coboundaries.invalidate_cache();
        self.neighbours.invalidate_cache();
    }
}

impl<A> DebugInvariants for Mesh<A> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshStoreError> {
        self.collection().validate_invariants()
    }
}
