//! Type-indexed aggregate of owning containers.
//!
//! A [`ContainerCollection`] holds exactly one [`Container`] per element type
//! declared by its [`MeshConfig`]. The set of types is fixed at construction;
//! asking for an undeclared type is a programming error and panics.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;

use crate::config::MeshConfig;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshStoreError;
use crate::storage::container::{Container, ContainerConfig};
use crate::storage::element::Element;
use crate::storage::handle::{ContainerId, Handle};
use crate::topology::element_type::ElementType;

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one physical collection.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId(u64);

impl CollectionId {
    fn fresh() -> Self {
        CollectionId(NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collection#{}", self.0)
    }
}

/// One owning container per declared element type.
#[derive(Clone, Debug)]
pub struct ContainerCollection<A> {
    id: CollectionId,
    containers: BTreeMap<ElementType, Container<Element<A>>>,
}

impl<A> ContainerCollection<A> {
    pub fn new(config: &MeshConfig) -> Self {
        Self::from_configs(config.types().map(|ty| (ty, config.container(ty).copied().unwrap_or_default())))
    }

    pub fn from_configs(configs: impl IntoIterator<Item = (ElementType, ContainerConfig)>) -> Self {
        let containers = configs
            .into_iter()
            .map(|(ty, config)| (ty, Container::new(ty, config)))
            .collect();
        Self {
            id: CollectionId::fresh(),
            containers,
        }
    }

    #[inline]
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Declared element types, ascending.
    pub fn element_types(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.containers.keys().copied()
    }

    #[inline]
    pub fn declares(&self, element_type: ElementType) -> bool {
        self.containers.contains_key(&element_type)
    }

    /// # Panics
    /// If `element_type` is not declared.
    pub fn get(&self, element_type: ElementType) -> &Container<Element<A>> {
        self.try_get(element_type)
            .unwrap_or_else(|| panic!("{}", MeshStoreError::UndeclaredElementType(element_type)))
    }

    /// # Panics
    /// If `element_type` is not declared.
    pub fn get_mut(&mut self, element_type: ElementType) -> &mut Container<Element<A>> {
        self.try_get_mut(element_type)
            .unwrap_or_else(|| panic!("{}", MeshStoreError::UndeclaredElementType(element_type)))
    }

    pub fn try_get(&self, element_type: ElementType) -> Option<&Container<Element<A>>> {
        self.containers.get(&element_type)
    }

    pub fn try_get_mut(&mut self, element_type: ElementType) -> Option<&mut Container<Element<A>>> {
        self.containers.get_mut(&element_type)
    }

    /// Element behind `handle`, dispatching on its element type.
    pub fn get_element(&self, handle: Handle) -> Option<&Element<A>> {
        self.try_get(handle.element_type())?.get(handle)
    }

    pub fn get_element_mut(&mut self, handle: Handle) -> Option<&mut Element<A>> {
        self.try_get_mut(handle.element_type())?.get_mut(handle)
    }

    pub fn try_dereference(&self, handle: Handle) -> Result<&Element<A>, MeshStoreError> {
        self.try_get(handle.element_type())
            .ok_or(MeshStoreError::UndeclaredElementType(handle.element_type()))?
            .try_dereference(handle)
    }

    /// # Panics
    /// If the handle's type is undeclared or the handle does not resolve.
    pub fn dereference(&self, handle: Handle) -> &Element<A> {
        self.get(handle.element_type()).dereference(handle)
    }

    /// # Panics
    /// If the handle's type is undeclared or the handle does not resolve.
    pub fn dereference_mut(&mut self, handle: Handle) -> &mut Element<A> {
        self.get_mut(handle.element_type()).dereference_mut(handle)
    }

    /// Whether `handle` resolves to a live element of this collection.
    pub fn contains(&self, handle: Handle) -> bool {
        self.try_get(handle.element_type())
            .is_some_and(|c| c.contains(handle))
    }

    /// Visits every container once, in ascending type order.
    pub fn for_each(&self, mut f: impl FnMut(&Container<Element<A>>)) {
        self.containers.values().for_each(|c| f(c));
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Container<Element<A>>)) {
        self.containers.values_mut().for_each(|c| f(c));
    }

    /// Total number of stored elements.
    pub fn len(&self) -> usize {
        let mut total = 0;
        self.for_each(|c| total += c.len());
        total
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element count per declared type.
    pub fn statistics(&self) -> BTreeMap<ElementType, usize> {
        let mut stats = BTreeMap::new();
        self.for_each(|c| {
            stats.insert(c.element_type(), c.len());
        });
        stats
    }

    pub fn clear(&mut self) {
        self.for_each_mut(Container::clear);
    }
}

impl<A: Clone> ContainerCollection<A> {
    /// Deep copy with fresh collection and container identities. Every
    /// boundary handle stored in the copy is re-homed into the copy.
    ///
    /// Returns the copy and the mapping from old to new container ids.
    pub fn duplicate(&self) -> (Self, HashMap<ContainerId, ContainerId>) {
        let mut containers = BTreeMap::new();
        let mut mapping = HashMap::new();
        for (&ty, container) in &self.containers {
            let copy = container.duplicate(|_| {});
            mapping.insert(container.id(), copy.id());
            containers.insert(ty, copy);
        }
        let remap = |h: Handle| match mapping.get(&h.container()) {
            Some(&id) => h.rehome(id),
            None => h,
        };
        for container in containers.values_mut() {
            container.rewrite(|e: &mut Element<A>| e.remap_handles(&remap));
        }
        let copy = Self {
            id: CollectionId::fresh(),
            containers,
        };
        (copy, mapping)
    }
}

impl<A> DebugInvariants for ContainerCollection<A> {
    /// Every container is internally consistent and every stored boundary
    /// handle resolves inside this collection.
    fn validate_invariants(&self) -> Result<(), MeshStoreError> {
        for (&ty, container) in &self.containers {
            if container.element_type() != ty {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "container for {:?} registered under {ty:?}",
                    container.element_type()
                )));
            }
            container.validate_invariants()?;
            for element in container.iter() {
                for layer in element.layers() {
                    if let Some(&h) = layer.handles().iter().find(|&&h| !self.contains(h)) {
                        return Err(MeshStoreError::StaleHandle(h));
                    }
                }
            }
        }
        Ok(())
    }
}
