//! Views: non-owning subsets of a physical collection.
//!
//! A [`View`] holds, per element type it was built for, a [`ViewContainer`]
//! of handles into the root collection. Views may be built over a collection,
//! a mesh, or another view; in every case the stored handles are root
//! handles, and the view remembers its root collection and immediate parent.
//! Views hold no references, so they never keep the root alive and never
//! dangle: resolving through the wrong collection is detected by id.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshStoreError;
use crate::storage::collection::{CollectionId, ContainerCollection};
use crate::storage::container::ViewContainer;
use crate::storage::element::Element;
use crate::storage::handle::{ContainerId, Handle};
use crate::topology::element_type::ElementType;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    fn fresh() -> Self {
        ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Immediate parent of a view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ViewParent {
    Collection(CollectionId),
    View(ViewId),
}

/// Anything a view can be built over.
pub trait ViewBase {
    /// The physical collection at the root of the chain.
    fn root(&self) -> CollectionId;
    /// What a view built over `self` records as its parent.
    fn as_parent(&self) -> ViewParent;
    /// Root container holding elements of `ty`, if `self` exposes the type.
    fn base_container(&self, ty: ElementType) -> Option<ContainerId>;
    /// Handles of `ty` visible through `self`.
    fn visible_handles(&self, ty: ElementType) -> Vec<Handle>;
}

impl<A> ViewBase for ContainerCollection<A> {
    fn root(&self) -> CollectionId {
        self.id()
    }

    fn as_parent(&self) -> ViewParent {
        ViewParent::Collection(self.id())
    }

    fn base_container(&self, ty: ElementType) -> Option<ContainerId> {
        self.try_get(ty).map(|c| c.id())
    }

    fn visible_handles(&self, ty: ElementType) -> Vec<Handle> {
        self.try_get(ty).map(|c| c.handles().collect()).unwrap_or_default()
    }
}

/// Subset of a collection, restricted to some element types.
#[derive(Clone, Debug)]
pub struct View {
    id: ViewId,
    root: CollectionId,
    parent: ViewParent,
    containers: BTreeMap<ElementType, ViewContainer>,
}

impl View {
    /// View over `base` restricted to `types`. When `predicate` is given, only
    /// handles satisfying it now are included; it is never evaluated again.
    ///
    /// # Panics
    /// If `base` does not expose one of `types`.
    pub fn new(
        base: &impl ViewBase,
        types: impl IntoIterator<Item = ElementType>,
        predicate: Option<&dyn Fn(Handle) -> bool>,
    ) -> Self {
        let mut view = Self::empty(base, types);
        for (&ty, container) in view.containers.iter_mut() {
            for handle in base.visible_handles(ty) {
                if predicate.is_none_or(|keep| keep(handle)) {
                    container.insert_unique_handle(handle);
                }
            }
        }
        log::trace!(
            "{:?} built over {:?} with {} handles",
            view.id,
            view.parent,
            view.len()
        );
        view
    }

    /// View over `base` restricted to `types`, with no members.
    ///
    /// # Panics
    /// If `base` does not expose one of `types`.
    pub fn empty(base: &impl ViewBase, types: impl IntoIterator<Item = ElementType>) -> Self {
        let containers = types
            .into_iter()
            .map(|ty| {
                let container = base
                    .base_container(ty)
                    .unwrap_or_else(|| panic!("{}", MeshStoreError::UndeclaredElementType(ty)));
                (ty, ViewContainer::new(container, ty))
            })
            .collect();
        Self {
            id: ViewId::fresh(),
            root: base.root(),
            parent: base.as_parent(),
            containers,
        }
    }

    #[inline]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[inline]
    pub fn root(&self) -> CollectionId {
        self.root
    }

    #[inline]
    pub fn parent(&self) -> ViewParent {
        self.parent
    }

    pub fn element_types(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.containers.keys().copied()
    }

    #[inline]
    pub fn holds(&self, ty: ElementType) -> bool {
        self.containers.contains_key(&ty)
    }

    /// Adds `handle` unless present. Types the view does not hold are
    /// skipped. Returns whether the view changed.
    pub fn register(&mut self, handle: Handle) -> bool {
        let Some(container) = self.containers.get_mut(&handle.element_type()) else {
            return false;
        };
        let added = container.insert_unique_handle(handle);
        if added {
            log::trace!("{:?} registered {handle:?}", self.id);
        }
        added
    }

    /// Drops `handle` from the view. The element is untouched.
    pub fn erase(&mut self, handle: Handle) -> bool {
        self.containers
            .get_mut(&handle.element_type())
            .is_some_and(|c| c.erase(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.containers
            .get(&handle.element_type())
            .is_some_and(|c| c.contains(handle))
    }

    /// Number of handles over every held type.
    pub fn len(&self) -> usize {
        self.containers.values().map(ViewContainer::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.values().all(ViewContainer::is_empty)
    }

    /// Handles of `ty` in registration order (empty if not held).
    pub fn handles(&self, ty: ElementType) -> &[Handle] {
        self.containers
            .get(&ty)
            .map(ViewContainer::handles)
            .unwrap_or(&[])
    }

    pub fn container(&self, ty: ElementType) -> Option<&ViewContainer> {
        self.containers.get(&ty)
    }

    fn check_root<A>(&self, collection: &ContainerCollection<A>) {
        if collection.id() != self.root {
            panic!(
                "{}",
                MeshStoreError::ViewChainMismatch {
                    expected: format!("{:?}", self.root),
                    found: format!("{:?}", collection.id()),
                }
            );
        }
    }

    /// Elements of `ty` in the view, resolved through the root `collection`.
    /// Handles whose element has been erased are skipped.
    ///
    /// # Panics
    /// If `collection` is not the root of this view.
    pub fn elements<'c, A>(
        &'c self,
        ty: ElementType,
        collection: &'c ContainerCollection<A>,
    ) -> impl Iterator<Item = (Handle, &'c Element<A>)> + 'c {
        self.check_root(collection);
        self.handles(ty)
            .iter()
            .filter_map(move |&h| collection.get_element(h).map(|e| (h, e)))
    }

    /// Drops handles that no longer resolve in `collection`. Returns how many
    /// were dropped.
    ///
    /// # Panics
    /// If `collection` is not the root of this view.
    pub fn prune<A>(&mut self, collection: &ContainerCollection<A>) -> usize {
        self.check_root(collection);
        let before = self.len();
        for container in self.containers.values_mut() {
            container.retain(|h| collection.contains(h));
        }
        before - self.len()
    }

    pub fn clear(&mut self) {
        self.containers.values_mut().for_each(ViewContainer::clear);
    }
}

impl ViewBase for View {
    fn root(&self) -> CollectionId {
        self.root
    }

    fn as_parent(&self) -> ViewParent {
        ViewParent::View(self.id)
    }

    fn base_container(&self, ty: ElementType) -> Option<ContainerId> {
        self.containers.get(&ty).map(ViewContainer::base)
    }

    fn visible_handles(&self, ty: ElementType) -> Vec<Handle> {
        self.handles(ty).to_vec()
    }
}

impl DebugInvariants for View {
    fn validate_invariants(&self) -> Result<(), MeshStoreError> {
        for (&ty, container) in &self.containers {
            if container.element_type() != ty {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "{:?}: container for {:?} held under {ty:?}",
                    self.id,
                    container.element_type()
                )));
            }
            if let Some(&h) = container
                .handles()
                .iter()
                .find(|&&h| h.container() != container.base() || !container.contains(h))
            {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "{:?}: handle {h:?} out of sync with its container",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
