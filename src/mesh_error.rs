//! MeshStoreError: Unified error type for mesh-store public APIs
//!
//! Recoverable failures (lookups that may miss, malformed configuration,
//! malformed permutations) are returned through this type. Contract
//! violations such as dereferencing an erased handle panic with the
//! `Display` text of the matching variant.

use thiserror::Error;

use crate::storage::handle::Handle;
use crate::storage::id::ElementId;
use crate::topology::element_type::ElementType;

/// Unified error type for mesh-store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshStoreError {
    /// Attempted to construct an ElementId with a zero value (invalid).
    #[error("ElementId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidElementId,
    /// The per-type id space is exhausted.
    #[error("id space exhausted for element type {0:?}")]
    IdOverflow(ElementType),
    /// A collection or view was asked for a type it was not configured with.
    #[error("element type {0:?} is not declared by this collection")]
    UndeclaredElementType(ElementType),
    /// A handle was resolved against a container it does not belong to.
    #[error("handle {0:?} belongs to a different container")]
    ForeignHandle(Handle),
    /// The element behind a handle has been erased (or the handle was
    /// invalidated by an erase in a location-addressed container).
    #[error("handle {0:?} does not resolve to a live element")]
    StaleHandle(Handle),
    /// A boundary spec references a type the configuration does not declare.
    #[error("element type {host:?} declares boundary type {boundary:?}, which is not configured")]
    MissingBoundaryType {
        /// The element type carrying the boundary spec.
        host: ElementType,
        /// The undeclared boundary type.
        boundary: ElementType,
    },
    /// A boundary spec is inconsistent with the host dimension.
    #[error("element type {host:?} has a boundary spec of dimension {dimension}, expected < {host_dimension}")]
    BoundaryDimension {
        /// The element type carrying the boundary spec.
        host: ElementType,
        /// Declared boundary dimension.
        dimension: u8,
        /// Dimension of the host type.
        host_dimension: u8,
    },
    /// A boundary generator wrote past the fixed sub-element count.
    #[error("element type {host:?} received dimension-{dimension} boundary position {position}, outside its arity of {arity}")]
    BoundaryArity {
        /// The element type carrying the boundary spec.
        host: ElementType,
        /// Dimension of the sub-element.
        dimension: u8,
        /// Requested position.
        position: usize,
        /// Declared sub-element count.
        arity: usize,
    },
    /// Id-addressed handles need every stored element to carry an id.
    #[error("id-addressed container for {0:?} received an element without an id")]
    MissingElementId(ElementType),
    /// A new element carries an id already held by a live element of the
    /// same type.
    #[error("element type {0:?} already holds a live element with id {1}")]
    DuplicateElementId(ElementType, ElementId),
    /// A permutation slice is not a bijection on `0..len`.
    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),
    /// A permutation is longer than the supported local vertex count.
    #[error("permutation of length {len} exceeds the maximum of {max} local vertices")]
    PermutationTooLong {
        /// Requested length.
        len: usize,
        /// Supported maximum.
        max: usize,
    },
    /// An internal index disagrees with the stored elements.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// A view (or recursive inserter) was combined with the wrong parent.
    #[error("view chain mismatch: expected parent {expected}, found {found}")]
    ViewChainMismatch {
        /// Parent the view was built over.
        expected: String,
        /// Parent actually supplied.
        found: String,
    },
}
