//! `ElementId`: a strong, zero-cost identifier for stored elements, and the
//! per-type [`IdGenerator`] that hands them out.
//!
//! Every element inserted through the physical inserter receives an id that
//! is unique within its element type. `ElementId` wraps a nonzero `u64`, so
//! `Option<ElementId>` costs nothing extra and 0 stays reserved as a sentinel.

use std::collections::HashMap;
use std::{fmt, num::NonZeroU64};

use crate::mesh_error::MeshStoreError;
use crate::topology::element_type::ElementType;

/// Per-type element identifier.
///
/// # Memory layout
/// This type is `repr(transparent)` over `NonZeroU64`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ElementId(NonZeroU64);

impl ElementId {
    /// Creates a new `ElementId` from a raw `u64` value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidElementId` if `raw == 0`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mesh_store::storage::id::ElementId;
    /// let id = ElementId::new(1).unwrap();
    /// assert_eq!(id.get(), 1);
    /// assert!(ElementId::new(0).is_err());
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, MeshStoreError> {
        NonZeroU64::new(raw)
            .map(ElementId)
            .ok_or(MeshStoreError::InvalidElementId)
    }

    /// Returns the inner `u64` value of this `ElementId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementId").field(&self.get()).finish()
    }
}

/// Prints the numeric ID without any wrapper text.
impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

// -----------------------------------------------------------------------------
// Id generation
// -----------------------------------------------------------------------------

/// Monotonic per-type id counter.
///
/// `next` never returns a value that was previously issued or observed for
/// the same type, even after the element carrying it has been erased.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    /// Highest id issued or observed per type (absent means none yet).
    last: HashMap<ElementType, u64>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id for `element_type` and advances the counter.
    ///
    /// # Panics
    /// Panics once the `u64` id space of the type is exhausted.
    pub fn next(&mut self, element_type: ElementType) -> ElementId {
        let last = self.last.entry(element_type).or_insert(0);
        let raw = last
            .checked_add(1)
            .unwrap_or_else(|| panic!("{}", MeshStoreError::IdOverflow(element_type)));
        *last = raw;
        ElementId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Raises the floor so that `id` is never issued by [`next`](Self::next).
    ///
    /// Idempotent and monotone: observing an id below the current floor is a
    /// no-op.
    pub fn observe(&mut self, element_type: ElementType, id: ElementId) {
        let last = self.last.entry(element_type).or_insert(0);
        if id.get() > *last {
            *last = id.get();
        }
    }

    /// The id the next call to [`next`](Self::next) would return, if any is left.
    pub fn peek(&self, element_type: ElementType) -> Option<ElementId> {
        let last = self.last.get(&element_type).copied().unwrap_or(0);
        last.checked_add(1).and_then(|raw| ElementId::new(raw).ok())
    }

    /// Forget everything issued so far.
    pub fn reset(&mut self) {
        self.last.clear();
    }
}

// -----------------------------------------------------------------------------
// Testing and assertions
// -----------------------------------------------------------------------------
