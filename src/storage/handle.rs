//! Handles: opaque references to one element inside one container.
//!
//! A [`Handle`] pairs the identity of the owning container with a
//! [`Locator`]. How a locator is produced and resolved is decided once per
//! container by its [`HandleKind`], whose [`HandleStrategy`] implementation
//! fixes the invalidation contract:
//!
//! | Kind                    | Locator                  | Invalidated by                          |
//! |-------------------------|--------------------------|-----------------------------------------|
//! | [`HandleKind::Location`] | position + erase epoch  | any erase in the owning container       |
//! | [`HandleKind::Stable`]   | slot + generation       | erasure of that element only            |
//! | [`HandleKind::Id`]       | element id              | erasure of that element only (lookup)   |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::storage::id::ElementId;
use crate::topology::element_type::ElementType;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one owning container. Never reused within a process.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn fresh() -> Self {
        ContainerId(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContainerId").field(&self.0).finish()
    }
}

/// Handle strategy selected per container.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum HandleKind {
    /// Raw location: position in the container's dense order.
    Location,
    /// Stable iterator: slot index plus generation.
    #[default]
    Stable,
    /// Integer id, resolved through the container's id index.
    Id,
}

impl HandleKind {
    /// The strategy implementing this kind.
    pub fn strategy(self) -> &'static dyn HandleStrategy {
        match self {
            HandleKind::Location => &LocationHandles,
            HandleKind::Stable => &StableHandles,
            HandleKind::Id => &IdHandles,
        }
    }
}

/// Where a handle points inside its container.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locator {
    Location { position: u32, epoch: u32 },
    Slot { index: u32, generation: u32 },
    Id(ElementId),
}

/// Opaque, comparable reference to one element in one container.
///
/// Two handles compare equal iff they resolve to the same element: every
/// container hands out exactly one locator per live element.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    container: ContainerId,
    element_type: ElementType,
    locator: Locator,
}

impl Handle {
    pub(crate) fn new(container: ContainerId, element_type: ElementType, locator: Locator) -> Self {
        Self {
            container,
            element_type,
            locator,
        }
    }

    /// Identity of the owning container.
    #[inline]
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Type of the referenced element.
    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn locator(&self) -> Locator {
        self.locator
    }

    /// Kind of the locator carried by this handle.
    pub fn kind(&self) -> HandleKind {
        match self.locator {
            Locator::Location { .. } => HandleKind::Location,
            Locator::Slot { .. } => HandleKind::Stable,
            Locator::Id(_) => HandleKind::Id,
        }
    }

    /// Same locator, re-homed into another container (used when copying).
    pub(crate) fn rehome(self, container: ContainerId) -> Self {
        Self { container, ..self }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}:", self.element_type, self.container.0)?;
        match self.locator {
            Locator::Location { position, epoch } => write!(f, "@{position}e{epoch}"),
            Locator::Slot { index, generation } => write!(f, "s{index}g{generation}"),
            Locator::Id(id) => write!(f, "id{id}"),
        }
    }
}

/// Snapshot of a live slot, used to build a locator for it.
#[derive(Clone, Copy, Debug)]
pub struct SlotRef {
    pub index: u32,
    pub generation: u32,
    pub position: u32,
    pub epoch: u32,
    pub id: Option<ElementId>,
}

/// The slot bookkeeping a strategy needs to resolve locators.
pub trait SlotTable {
    /// Current erase epoch.
    fn epoch(&self) -> u32;
    /// Live slot at dense position `position`.
    fn slot_at(&self, position: u32) -> Option<u32>;
    /// Generation of slot `index`, if it holds a live element.
    fn live_generation(&self, index: u32) -> Option<u32>;
    /// Live slot holding the element with id `id`.
    fn slot_of_id(&self, id: ElementId) -> Option<u32>;
}

/// Produces and resolves locators for one container.
pub trait HandleStrategy: Sync {
    fn kind(&self) -> HandleKind;

    /// Locator for a live slot; `None` if the strategy cannot address it
    /// (id strategy and an element without id).
    fn locate(&self, slot: &SlotRef) -> Option<Locator>;

    /// Slot index the locator points at, or `None` if it is no longer valid.
    fn resolve(&self, table: &dyn SlotTable, locator: &Locator) -> Option<u32>;

    #[inline]
    fn is_valid(&self, table: &dyn SlotTable, locator: &Locator) -> bool {
        self.resolve(table, locator).is_some()
    }
}

/// Raw-location handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocationHandles;

impl HandleStrategy for LocationHandles {
    fn kind(&self) -> HandleKind {
        HandleKind::Location
    }

    fn locate(&self, slot: &SlotRef) -> Option<Locator> {
        Some(Locator::Location {
            position: slot.position,
            epoch: slot.epoch,
        })
    }

    fn resolve(&self, table: &dyn SlotTable, locator: &Locator) -> Option<u32> {
        match *locator {
            Locator::Location { position, epoch } if epoch == table.epoch() => {
                table.slot_at(position)
            }
            _ => None,
        }
    }
}

/// Stable-iterator handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct StableHandles;

impl HandleStrategy for StableHandles {
    fn kind(&self) -> HandleKind {
        HandleKind::Stable
    }

    fn locate(&self, slot: &SlotRef) -> Option<Locator> {
        Some(Locator::Slot {
            index: slot.index,
            generation: slot.generation,
        })
    }

    fn resolve(&self, table: &dyn SlotTable, locator: &Locator) -> Option<u32> {
        match *locator {
            Locator::Slot { index, generation } => table
                .live_generation(index)
                .filter(|&g| g == generation)
                .map(|_| index),
            _ => None,
        }
    }
}

/// Integer-id handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdHandles;

impl HandleStrategy for IdHandles {
    fn kind(&self) -> HandleKind {
        HandleKind::Id
    }

    fn locate(&self, slot: &SlotRef) -> Option<Locator> {
        slot.id.map(Locator::Id)
    }

    fn resolve(&self, table: &dyn SlotTable, locator: &Locator) -> Option<u32> {
        match *locator {
            Locator::Id(id) => table.slot_of_id(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three live slots at positions 0..3, ids 10, 20, 30.
    struct Fixture {
        epoch: u32,
        generations: Vec<Option<u32>>,
    }

    impl SlotTable for Fixture {
        fn epoch(&self) -> u32 {
            self.epoch
        }
        fn slot_at(&self, position: u32) -> Option<u32> {
            (position < 3).then_some(position)
        }
        fn live_generation(&self, index: u32) -> Option<u32> {
            self.generations.get(index as usize).copied().flatten()
        }
        fn slot_of_id(&self, id: ElementId) -> Option<u32> {
            match id.get() {
                10 => Some(0),
                20 => Some(1),
                30 => Some(2),
                _ => None,
            }
        }
    }

    fn slot(index: u32) -> SlotRef {
        SlotRef {
            index,
            generation: 1,
            position: index,
            epoch: 0,
            id: ElementId::new(u64::from(index + 1) * 10).ok(),
        }
    }

    #[test]
    fn location_invalidated_by_epoch() {
        let mut table = Fixture {
            epoch: 0,
            generations: vec![Some(1); 3],
        };
        let loc = LocationHandles.locate(&slot(2)).unwrap();
        assert_eq!(LocationHandles.resolve(&table, &loc), Some(2));
        table.epoch = 1;
        assert!(!LocationHandles.is_valid(&table, &loc));
    }

    #[test]
    fn stable_checks_generation() {
        let mut table = Fixture {
            epoch: 0,
            generations: vec![Some(1); 3],
        };
        let loc = StableHandles.locate(&slot(1)).unwrap();
        assert_eq!(StableHandles.resolve(&table, &loc), Some(1));
        table.generations[1] = Some(2);
        assert_eq!(StableHandles.resolve(&table, &loc), None);
        table.generations[1] = None;
        assert_eq!(StableHandles.resolve(&table, &loc), None);
    }

    #[test]
    fn id_resolves_by_lookup() {
        let table = Fixture {
            epoch: 7,
            generations: vec![None; 3],
        };
        let loc = IdHandles.locate(&slot(0)).unwrap();
        assert_eq!(loc, Locator::Id(ElementId::new(10).unwrap()));
        assert_eq!(IdHandles.resolve(&table, &loc), Some(0));
        let missing = SlotRef { id: None, ..slot(0) };
        assert!(IdHandles.locate(&missing).is_none());
    }

    #[test]
    fn strategies_reject_foreign_locators() {
        let table = Fixture {
            epoch: 0,
            generations: vec![Some(1); 3],
        };
        let loc = StableHandles.locate(&slot(0)).unwrap();
        assert_eq!(LocationHandles.resolve(&table, &loc), None);
        assert_eq!(IdHandles.resolve(&table, &loc), None);
    }

    #[test]
    fn kind_roundtrip() {
        for kind in [HandleKind::Location, HandleKind::Stable, HandleKind::Id] {
            assert_eq!(kind.strategy().kind(), kind);
        }
    }

    #[test]
    fn fresh_container_ids_differ() {
        assert_ne!(ContainerId::fresh(), ContainerId::fresh());
    }
}
