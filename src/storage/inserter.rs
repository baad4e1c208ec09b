//! Physical and recursive insertion.
//!
//! Every insertion ends in the single [`PhysicalInserter`] owning the
//! collection. A [`RecursiveInserter`] binds a [`View`] to a parent inserter;
//! chains of them are flattened into an [`InsertChain`] before inserting, so
//! the physical insert and each view registration borrow disjoint data.
//!
//! The protocol for one `insert(e)`:
//! 1. observe `e`'s id, or issue a fresh one and stamp it on `e`;
//! 2. insert into the owning container (deduplicating when configured);
//! 3. on first insertion, advance the change counter and run the boundary
//!    generator through the *same* chain;
//! 4. register the handle into the views, starting with the one the caller
//!    inserted through and ending with the one built over the collection.

use std::sync::Arc;

use crate::config::MeshConfig;
use crate::mesh_error::MeshStoreError;
use crate::storage::collection::{CollectionId, ContainerCollection};
use crate::storage::element::Element;
use crate::storage::handle::{ContainerId, Handle};
use crate::storage::id::IdGenerator;
use crate::storage::view::{View, ViewBase, ViewParent};
use crate::topology::boundary::{BoundaryGenerator, BoundaryInserter};
use crate::topology::cache::ChangeCounter;
use crate::topology::element_type::ElementType;
use crate::topology::orientation::Permutation;

/// Something elements can be inserted through.
pub trait Inserter<A: Clone> {
    /// What a view bound to this inserter must record as its parent.
    fn target(&self) -> ViewParent;

    /// The flattened chain from this inserter down to the physical one.
    fn chain(&mut self) -> InsertChain<'_, A>;

    /// Inserts `element` and returns its handle and whether it was created.
    fn insert(&mut self, element: Element<A>) -> (Handle, bool) {
        self.chain().insert(element)
    }
}

/// Owner of the physical collection and everything insertion mutates.
pub struct PhysicalInserter<A> {
    collection: ContainerCollection<A>,
    ids: IdGenerator,
    counter: ChangeCounter,
    config: MeshConfig,
    boundary: Arc<dyn BoundaryGenerator<A>>,
}

impl<A> PhysicalInserter<A> {
    pub fn new(config: MeshConfig, boundary: Arc<dyn BoundaryGenerator<A>>) -> Self {
        Self {
            collection: ContainerCollection::new(&config),
            ids: IdGenerator::new(),
            counter: ChangeCounter::new(),
            config,
            boundary,
        }
    }

    #[inline]
    pub fn collection(&self) -> &ContainerCollection<A> {
        &self.collection
    }

    #[inline]
    pub(crate) fn collection_mut(&mut self) -> &mut ContainerCollection<A> {
        &mut self.collection
    }

    #[inline]
    pub fn ids(&self) -> &IdGenerator {
        &self.ids
    }

    #[inline]
    pub fn change_counter(&self) -> ChangeCounter {
        self.counter
    }

    /// Advances the change counter outside of insertion (erase, clear).
    pub(crate) fn touch(&mut self) -> u64 {
        self.counter.bump()
    }

    #[inline]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn boundary_generator(&self) -> &Arc<dyn BoundaryGenerator<A>> {
        &self.boundary
    }
}

impl<A: Clone> PhysicalInserter<A> {
    /// Independent copy with fresh collection and container identities.
    pub(crate) fn duplicate(&self) -> Self {
        let (collection, _) = self.collection.duplicate();
        Self {
            collection,
            ids: self.ids.clone(),
            counter: self.counter,
            config: self.config.clone(),
            boundary: Arc::clone(&self.boundary),
        }
    }
}

impl<A: Clone> Inserter<A> for PhysicalInserter<A> {
    fn target(&self) -> ViewParent {
        ViewParent::Collection(self.collection.id())
    }

    fn chain(&mut self) -> InsertChain<'_, A> {
        InsertChain {
            physical: self,
            views: Vec::new(),
        }
    }
}

impl<A> ViewBase for PhysicalInserter<A> {
    fn root(&self) -> CollectionId {
        self.collection.root()
    }

    fn as_parent(&self) -> ViewParent {
        self.collection.as_parent()
    }

    fn base_container(&self, ty: ElementType) -> Option<ContainerId> {
        self.collection.base_container(ty)
    }

    fn visible_handles(&self, ty: ElementType) -> Vec<Handle> {
        self.collection.visible_handles(ty)
    }
}

/// Inserter bound to a view: forwards to its parent, then registers the
/// returned handle into the view.
pub struct RecursiveInserter<'a, P: ?Sized> {
    view: &'a mut View,
    parent: &'a mut P,
}

impl<'a, P: ?Sized> RecursiveInserter<'a, P> {
    /// # Panics
    /// If `view` was not built over `parent`'s target.
    pub fn new<A: Clone>(view: &'a mut View, parent: &'a mut P) -> Self
    where
        P: Inserter<A>,
    {
        let found = parent.target();
        if view.parent() != found {
            panic!(
                "{}",
                MeshStoreError::ViewChainMismatch {
                    expected: format!("{:?}", view.parent()),
                    found: format!("{found:?}"),
                }
            );
        }
        Self { view, parent }
    }

    #[inline]
    pub fn view(&self) -> &View {
        self.view
    }
}

impl<A: Clone, P: Inserter<A> + ?Sized> Inserter<A> for RecursiveInserter<'_, P> {
    fn target(&self) -> ViewParent {
        ViewParent::View(self.view.id())
    }

    fn chain(&mut self) -> InsertChain<'_, A> {
        let mut chain = self.parent.chain();
        chain.views.push(&mut *self.view);
        chain
    }
}

/// A physical inserter plus the views stacked on it, the view built over the
/// collection first.
pub struct InsertChain<'a, A> {
    physical: &'a mut PhysicalInserter<A>,
    views: Vec<&'a mut View>,
}

impl<A> InsertChain<'_, A> {
    /// Number of views in the chain.
    #[inline]
    pub fn depth(&self) -> usize {
        self.views.len()
    }
}

impl<A: Clone> InsertChain<'_, A> {
    pub fn insert(&mut self, mut element: Element<A>) -> (Handle, bool) {
        let ty = element.element_type();
        match element.id() {
            Some(id) => self.physical.ids.observe(ty, id),
            None => element.assign_id(self.physical.ids.next(ty)),
        }

        let (handle, inserted) = self.physical.collection.get_mut(ty).insert(element);
        if inserted {
            let stamp = self.physical.counter.bump();
            log::debug!("inserted {handle:?}, change counter now {stamp}");
            let descriptor = self
                .physical
                .config
                .descriptor(ty)
                .filter(|d| d.higher_boundary().next().is_some())
                .cloned();
            if let Some(descriptor) = descriptor {
                let host = self.physical.collection.dereference(handle).clone();
                let generator = Arc::clone(&self.physical.boundary);
                generator.on_inserted(&descriptor, &host, handle, self);
            }
        }

        for view in self.views.iter_mut().rev() {
            view.register(handle);
        }
        (handle, inserted)
    }
}

impl<A: Clone> BoundaryInserter<A> for InsertChain<'_, A> {
    /// Inserts `sub` through the chain and records it on `host`.
    ///
    /// For oriented layouts the host also records how its local vertex order
    /// of `sub` maps onto the stored order: identity when `sub` was created
    /// here, resolved against the stored sub-element otherwise.
    ///
    /// # Panics
    /// If `host`'s descriptor has no boundary spec for `sub`'s dimension, or
    /// if `position` lies outside a fixed arity.
    fn insert_boundary(&mut self, host: Handle, position: usize, sub: Element<A>) -> (Handle, bool) {
        let host_type = host.element_type();
        let spec = self
            .physical
            .config
            .descriptor(host_type)
            .and_then(|d| d.spec(sub.dimension()))
            .copied()
            .unwrap_or_else(|| {
                panic!(
                    "{}",
                    MeshStoreError::MissingBoundaryType {
                        host: host_type,
                        boundary: sub.element_type(),
                    }
                )
            });
        debug_assert_eq!(spec.element_type, sub.element_type());
        if let Some(arity) = spec.arity.fixed().filter(|&n| position >= n) {
            panic!(
                "{}",
                MeshStoreError::BoundaryArity {
                    host: host_type,
                    dimension: spec.dimension,
                    position,
                    arity,
                }
            );
        }

        let local = sub.vertices().to_vec();
        let (handle, inserted) = self.insert(sub);
        let orientation = if !spec.layout.is_oriented() {
            Permutation::default()
        } else if inserted {
            Permutation::identity(local.len())
        } else {
            let canonical = self.physical.collection.dereference(handle).vertices();
            Permutation::resolve(&local, canonical)
        };
        self.physical
            .collection
            .dereference_mut(host)
            .layer_mut(&spec)
            .set(position, handle, orientation);
        (handle, inserted)
    }
}
