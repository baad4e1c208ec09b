//! Topology side of the store.
//!
//! This module provides the element type metadata the storage core consumes,
//! orientation permutations, the boundary generators, the adjacency caches
//! and the label side-table.

pub mod adjacency;
pub mod boundary;
pub mod cache;
pub mod element_type;
pub mod labels;
pub mod orientation;

pub use cache::InvalidateCache;
pub use element_type::{ElementType, ElementTypeDescriptor};
pub use orientation::*;
