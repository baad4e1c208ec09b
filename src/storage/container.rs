//! Homogeneous element containers.
//!
//! [`Container`] owns the values of one element type. Values live in a slot
//! table; a dense `order` vector records insertion order and gives each live
//! value its *position*. Two side indexes hang off the slots:
//!
//! - an id index (dense array or ordered map, see [`IdLookup`]) used by
//!   [`Container::find_by_id`] and by id-addressed handles;
//! - an optional deduplication index keyed by [`Storable::natural_key`].
//!
//! [`ViewContainer`] holds no values, only handles into an owning container.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshStoreError;
use crate::storage::handle::{ContainerId, Handle, HandleKind, HandleStrategy, SlotRef, SlotTable};
use crate::storage::id::ElementId;
use crate::topology::element_type::ElementType;

/// Values a [`Container`] can hold.
pub trait Storable {
    /// Order-invariant structural key used for deduplication.
    type Key: Eq + Hash + Clone + fmt::Debug;

    fn element_type(&self) -> ElementType;
    fn id(&self) -> Option<ElementId>;
    fn natural_key(&self) -> Self::Key;
}

/// How ids are looked up inside one container.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum IdLookup {
    /// Array indexed by id, O(1). Falls back to `Ordered` for sparse ids.
    #[default]
    Dense,
    /// Ordered map, O(log n).
    Ordered,
}

/// Per-container storage policy.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub handle: HandleKind,
    pub deduplicate: bool,
    pub id_lookup: IdLookup,
}

impl ContainerConfig {
    pub fn deduplicating() -> Self {
        Self {
            deduplicate: true,
            ..Self::default()
        }
    }

    pub fn with_handle(mut self, handle: HandleKind) -> Self {
        self.handle = handle;
        self
    }

    pub fn with_id_lookup(mut self, id_lookup: IdLookup) -> Self {
        self.id_lookup = id_lookup;
        self
    }
}

/// Dense ids beyond this value switch the index to ordered mode.
const DENSE_ID_LIMIT: u64 = 1 << 22;

#[derive(Clone, Debug)]
enum IdIndex {
    Dense(Vec<Option<u32>>),
    Ordered(BTreeMap<ElementId, u32>),
}

impl IdIndex {
    fn new(lookup: IdLookup) -> Self {
        match lookup {
            IdLookup::Dense => IdIndex::Dense(Vec::new()),
            IdLookup::Ordered => IdIndex::Ordered(BTreeMap::new()),
        }
    }

    fn get(&self, id: ElementId) -> Option<u32> {
        match self {
            IdIndex::Dense(v) => v.get(id.get() as usize).copied().flatten(),
            IdIndex::Ordered(m) => m.get(&id).copied(),
        }
    }

    fn insert(&mut self, id: ElementId, slot: u32) -> Option<u32> {
        if let IdIndex::Dense(v) = self {
            if id.get() > DENSE_ID_LIMIT {
                log::debug!("id {id} exceeds the dense id range, switching to ordered lookup");
                let ordered = v
                    .iter()
                    .enumerate()
                    .filter_map(|(raw, s)| {
                        let slot = (*s)?;
                        ElementId::new(raw as u64).ok().map(|id| (id, slot))
                    })
                    .collect();
                *self = IdIndex::Ordered(ordered);
            }
        }
        match self {
            IdIndex::Dense(v) => {
                let at = id.get() as usize;
                if v.len() <= at {
                    v.resize(at + 1, None);
                }
                v[at].replace(slot)
            }
            IdIndex::Ordered(m) => m.insert(id, slot),
        }
    }

    fn remove(&mut self, id: ElementId) {
        match self {
            IdIndex::Dense(v) => {
                if let Some(s) = v.get_mut(id.get() as usize) {
                    *s = None;
                }
            }
            IdIndex::Ordered(m) => {
                m.remove(&id);
            }
        }
    }

    fn clear(&mut self) {
        match self {
            IdIndex::Dense(v) => v.clear(),
            IdIndex::Ordered(m) => m.clear(),
        }
    }

    fn entries(&self) -> Vec<(ElementId, u32)> {
        match self {
            IdIndex::Dense(v) => v
                .iter()
                .enumerate()
                .filter_map(|(raw, s)| Some((ElementId::new(raw as u64).ok()?, (*s)?)))
                .collect(),
            IdIndex::Ordered(m) => m.iter().map(|(&id, &s)| (id, s)).collect(),
        }
    }
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    position: u32,
    value: Option<T>,
}

/// Owning container of one element type.
#[derive(Clone, Debug)]
pub struct Container<T: Storable> {
    id: ContainerId,
    element_type: ElementType,
    config: ContainerConfig,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: Vec<u32>,
    epoch: u32,
    ids: IdIndex,
    keys: Option<HashMap<T::Key, u32>>,
}

impl<T: Storable> SlotTable for Container<T> {
    fn epoch(&self) -> u32 {
        self.epoch
    }

    fn slot_at(&self, position: u32) -> Option<u32> {
        self.order.get(position as usize).copied()
    }

    fn live_generation(&self, index: u32) -> Option<u32> {
        self.slots
            .get(index as usize)
            .filter(|s| s.value.is_some())
            .map(|s| s.generation)
    }

    fn slot_of_id(&self, id: ElementId) -> Option<u32> {
        self.ids.get(id)
    }
}

impl<T: Storable> Container<T> {
    pub fn new(element_type: ElementType, config: ContainerConfig) -> Self {
        Self {
            id: ContainerId::fresh(),
            element_type,
            config,
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            epoch: 0,
            ids: IdIndex::new(config.id_lookup),
            keys: config.deduplicate.then(HashMap::new),
        }
    }

    #[inline]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    #[inline]
    pub fn is_deduplicating(&self) -> bool {
        self.keys.is_some()
    }

    #[inline]
    fn strategy(&self) -> &'static dyn HandleStrategy {
        self.config.handle.strategy()
    }

    fn handle_of_slot(&self, index: u32) -> Handle {
        let slot = &self.slots[index as usize];
        let slot_ref = SlotRef {
            index,
            generation: slot.generation,
            position: slot.position,
            epoch: self.epoch,
            id: slot.value.as_ref().and_then(Storable::id),
        };
        let locator = self
            .strategy()
            .locate(&slot_ref)
            .unwrap_or_else(|| panic!("{}", MeshStoreError::MissingElementId(self.element_type)));
        Handle::new(self.id, self.element_type, locator)
    }

    /// Slot index behind `handle`, if it is live and belongs here.
    fn resolve(&self, handle: Handle) -> Option<u32> {
        if handle.container() != self.id {
            return None;
        }
        self.strategy().resolve(self, &handle.locator())
    }

    /// Inserts `value`.
    ///
    /// A deduplicating container first looks up the natural key and returns
    /// `(existing, false)` on a hit. Otherwise the value is appended and
    /// `(handle, true)` is returned.
    ///
    /// # Panics
    /// If the container uses id handles and `value` carries no id, or if
    /// `value`'s id already belongs to a live element.
    pub fn insert(&mut self, value: T) -> (Handle, bool) {
        debug_assert_eq!(value.element_type(), self.element_type);
        let key = match &self.keys {
            Some(keys) => {
                let key = value.natural_key();
                if let Some(&existing) = keys.get(&key) {
                    return (self.handle_of_slot(existing), false);
                }
                Some(key)
            }
            None => None,
        };
        let id = value.id();
        if self.config.handle == HandleKind::Id && id.is_none() {
            panic!("{}", MeshStoreError::MissingElementId(self.element_type));
        }
        if let Some(id) = id.filter(|&id| self.ids.get(id).is_some()) {
            panic!("{}", MeshStoreError::DuplicateElementId(self.element_type, id));
        }

        let position = self.order.len() as u32;
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.position = position;
                slot.value = Some(value);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    position,
                    value: Some(value),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.order.push(index);
        if let Some(id) = id {
            self.ids.insert(id, index);
        }
        if let (Some(keys), Some(key)) = (self.keys.as_mut(), key) {
            keys.insert(key, index);
        }
        (self.handle_of_slot(index), true)
    }

    /// Removes the element behind `handle` and returns it.
    ///
    /// Positions of later elements shift down by one and the erase epoch
    /// advances, which invalidates every location handle of this container.
    pub fn erase(&mut self, handle: Handle) -> Option<T> {
        let index = self.resolve(handle)?;
        let value = self.remove_slot(index);
        self.epoch = self.epoch.wrapping_add(1);
        value
    }

    /// Erases every element behind `handles` as one operation: all handles
    /// are resolved before anything is removed, so location handles in the
    /// batch stay usable. Returns the erased `(handle, value)` pairs.
    pub fn erase_all(&mut self, handles: &[Handle]) -> Vec<(Handle, T)> {
        let mut resolved: Vec<(Handle, u32)> = handles
            .iter()
            .filter_map(|&h| Some((h, self.resolve(h)?)))
            .collect();
        resolved.sort_unstable_by_key(|&(_, index)| index);
        resolved.dedup_by_key(|&mut (_, index)| index);
        let erased: Vec<(Handle, T)> = resolved
            .into_iter()
            .filter_map(|(h, index)| Some((h, self.remove_slot(index)?)))
            .collect();
        if !erased.is_empty() {
            self.epoch = self.epoch.wrapping_add(1);
        }
        erased
    }

    fn remove_slot(&mut self, index: u32) -> Option<T> {
        let slot = &mut self.slots[index as usize];
        let value = slot.value.take()?;
        let position = slot.position as usize;
        slot.generation = slot.generation.wrapping_add(1);

        self.order.remove(position);
        for &later in &self.order[position..] {
            self.slots[later as usize].position -= 1;
        }
        self.free.push(index);

        if let Some(id) = value.id() {
            if self.ids.get(id) == Some(index) {
                self.ids.remove(id);
            }
        }
        if let Some(keys) = self.keys.as_mut() {
            let key = value.natural_key();
            if keys.get(&key) == Some(&index) {
                keys.remove(&key);
            }
        }
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = self.resolve(handle)?;
        self.slots[index as usize].value.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.resolve(handle)?;
        self.slots[index as usize].value.as_mut()
    }

    /// Like [`get`](Self::get), reporting why the handle did not resolve.
    pub fn try_dereference(&self, handle: Handle) -> Result<&T, MeshStoreError> {
        if handle.container() != self.id {
            return Err(MeshStoreError::ForeignHandle(handle));
        }
        self.get(handle)
            .ok_or(MeshStoreError::StaleHandle(handle))
    }

    /// # Panics
    /// If `handle` is foreign or no longer valid.
    pub fn dereference(&self, handle: Handle) -> &T {
        match self.try_dereference(handle) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }

    /// # Panics
    /// If `handle` is foreign or no longer valid.
    pub fn dereference_mut(&mut self, handle: Handle) -> &mut T {
        if handle.container() != self.id {
            panic!("{}", MeshStoreError::ForeignHandle(handle));
        }
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("{}", MeshStoreError::StaleHandle(handle)),
        }
    }

    pub fn find_by_id(&self, id: ElementId) -> Option<Handle> {
        self.ids.get(id).map(|index| self.handle_of_slot(index))
    }

    /// Handle of the element with natural key `key`. Only deduplicating
    /// containers index their keys; others always return `None`.
    pub fn find_by_key(&self, key: &T::Key) -> Option<Handle> {
        let index = *self.keys.as_ref()?.get(key)?;
        Some(self.handle_of_slot(index))
    }

    /// Handle of the `position`-th element in insertion order.
    pub fn handle_at(&self, position: usize) -> Option<Handle> {
        self.order.get(position).map(|&index| self.handle_of_slot(index))
    }

    /// Values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order
            .iter()
            .filter_map(|&index| self.slots[index as usize].value.as_ref())
    }

    /// Handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.order.iter().map(|&index| self.handle_of_slot(index))
    }

    pub fn iter_with_handles(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.order.iter().filter_map(|&index| {
            let value = self.slots[index as usize].value.as_ref()?;
            Some((self.handle_of_slot(index), value))
        })
    }

    /// Whether `handle` belongs to this container and resolves.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        handle.element_type() == self.element_type && self.is_valid(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops every element. Outstanding handles of every kind become invalid.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.order.clear();
        self.ids.clear();
        if let Some(keys) = self.keys.as_mut() {
            keys.clear();
        }
        self.epoch = self.epoch.wrapping_add(1);
    }
}

impl<T: Storable + Clone> Container<T> {
    /// Deep copy under a fresh container identity. `rewrite` sees every
    /// copied value before the deduplication index is rebuilt.
    pub fn duplicate(&self, rewrite: impl FnMut(&mut T)) -> Self {
        let mut copy = self.clone();
        copy.id = ContainerId::fresh();
        copy.rewrite(rewrite);
        copy
    }
}

impl<T: Storable> Container<T> {
    /// Applies `rewrite` to every stored value, then rebuilds the
    /// deduplication index. Handles stay valid.
    pub fn rewrite(&mut self, mut rewrite: impl FnMut(&mut T)) {
        for value in self.slots.iter_mut().filter_map(|s| s.value.as_mut()) {
            rewrite(value);
        }
        if let Some(keys) = self.keys.as_mut() {
            keys.clear();
            for &index in &self.order {
                if let Some(value) = self.slots[index as usize].value.as_ref() {
                    keys.insert(value.natural_key(), index);
                }
            }
        }
    }
}

impl<T: Storable> Index<Handle> for Container<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        self.dereference(handle)
    }
}

impl<T: Storable> IndexMut<Handle> for Container<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        self.dereference_mut(handle)
    }
}

impl<T: Storable> DebugInvariants for Container<T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Container");
    }

    fn validate_invariants(&self) -> Result<(), MeshStoreError> {
        let live = self.slots.iter().filter(|s| s.value.is_some()).count();
        if live != self.order.len() || live + self.free.len() != self.slots.len() {
            return Err(MeshStoreError::InvariantViolation(format!(
                "{:?}: {live} live slots, {} ordered, {} free of {}",
                self.element_type,
                self.order.len(),
                self.free.len(),
                self.slots.len()
            )));
        }
        for (position, &index) in self.order.iter().enumerate() {
            let slot = &self.slots[index as usize];
            if slot.position as usize != position || slot.value.is_none() {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "{:?}: slot {index} out of place at position {position}",
                    self.element_type
                )));
            }
        }
        for (id, index) in self.ids.entries() {
            let stored = self.slots[index as usize].value.as_ref().and_then(Storable::id);
            if stored != Some(id) {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "{:?}: id index maps {id} to slot {index} holding {stored:?}",
                    self.element_type
                )));
            }
        }
        if let Some(keys) = &self.keys {
            if keys.len() != live {
                return Err(MeshStoreError::InvariantViolation(format!(
                    "{:?}: {} keys for {live} elements",
                    self.element_type,
                    keys.len()
                )));
            }
            for (key, &index) in keys {
                let matches = self.slots[index as usize]
                    .value
                    .as_ref()
                    .is_some_and(|v| v.natural_key() == *key);
                if !matches {
                    return Err(MeshStoreError::InvariantViolation(format!(
                        "{:?}: dedup index points at slot {index} with a different key",
                        self.element_type
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Non-owning container: handles into one owning container.
#[derive(Clone, Debug)]
pub struct ViewContainer {
    base: ContainerId,
    element_type: ElementType,
    handles: Vec<Handle>,
    members: HashSet<Handle>,
}

impl ViewContainer {
    pub fn new(base: ContainerId, element_type: ElementType) -> Self {
        Self {
            base,
            element_type,
            handles: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Identity of the owning container the handles point into.
    #[inline]
    pub fn base(&self) -> ContainerId {
        self.base
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn check(&self, handle: Handle) {
        if handle.container() != self.base || handle.element_type() != self.element_type {
            panic!("{}", MeshStoreError::ForeignHandle(handle));
        }
    }

    /// Appends `handle`, even if already present.
    pub fn insert_handle(&mut self, handle: Handle) {
        self.check(handle);
        self.members.insert(handle);
        self.handles.push(handle);
    }

    /// Appends `handle` unless already present. Returns whether it was added.
    pub fn insert_unique_handle(&mut self, handle: Handle) -> bool {
        self.check(handle);
        if !self.members.insert(handle) {
            return false;
        }
        self.handles.push(handle);
        true
    }

    /// Drops every occurrence of `handle`. The element itself is untouched.
    pub fn erase(&mut self, handle: Handle) -> bool {
        if !self.members.remove(&handle) {
            return false;
        }
        self.handles.retain(|&h| h != handle);
        true
    }

    /// Keeps only the handles satisfying `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle) -> bool) {
        self.handles.retain(|&h| keep(h));
        self.members.retain(|h| keep(*h));
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.members.contains(&handle)
    }

    /// Handles in registration order.
    #[inline]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn clear(&mut self) {
        self.handles.clear();
        self.members.clear();
    }
}
