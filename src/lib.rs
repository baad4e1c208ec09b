#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-store
//!
//! mesh-store is the element-storage engine underneath a mesh/topology library. It stores
//! heterogeneous collections of mesh elements (vertices, lines, triangles, quadrilaterals,
//! polygons, tetrahedra, hexahedra), hands out handles to them, deduplicates structurally
//! identical elements on insert, and caches derived adjacency with stamp-based invalidation.
//!
//! ## Features
//! - Three handle strategies per container: raw location, stable slot, integer id
//! - Deduplicating containers keyed by sorted vertex handles
//! - Views and views of views, fed through recursive inserters
//! - Boundary cascade on first insertion, with orientation permutations for shared sub-elements
//! - Coboundary and neighbour queries behind a change-counter gated cache
//! - Erase with cascade, deep copies, integer labels
//!
//! ## Handles
//!
//! Handles never borrow the mesh. Each one names its owning container, so resolving a handle
//! against the wrong collection is reported instead of silently reading another element.
//! Which mutations invalidate a handle depends on the container's [`HandleKind`](storage::handle::HandleKind).
//!
//! ## Usage
//!
//! ```rust
//! use mesh_store::prelude::*;
//!
//! let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
//! let v: Vec<_> = (0..4).map(|_| mesh.insert_vertex(())).collect();
//! mesh.insert_element(ElementType::Triangle, [v[0], v[1], v[3]]);
//! mesh.insert_element(ElementType::Triangle, [v[1], v[2], v[3]]);
//! // the edge (v1, v3) is stored once
//! assert_eq!(mesh.statistics()[&ElementType::Line], 5);
//! assert_eq!(mesh.coboundary(v[3], ElementType::Triangle).len(), 2);
//! ```
//!
//! Views restrict a mesh to a subset and pick up elements inserted through them:
//!
//! ```rust
//! use mesh_store::prelude::*;
//!
//! let mut mesh: Mesh = Mesh::new(MeshConfig::for_cell(ElementType::Triangle));
//! let v: Vec<_> = (0..3).map(|_| mesh.insert_vertex(())).collect();
//! let mut boundary = View::empty(&mesh, [ElementType::Line]);
//! let mut inserter = RecursiveInserter::new(&mut boundary, &mut mesh);
//! let (edge, _) = inserter.insert(Element::new(ElementType::Line).with_vertices([v[0], v[1]]));
//! assert!(boundary.contains(edge));
//! ```

pub mod config;
pub mod debug_invariants;
pub mod mesh;
pub mod mesh_error;
pub mod storage;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::config::{MeshConfig, TypeConfig};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::Mesh;
    pub use crate::mesh_error::MeshStoreError;
    pub use crate::storage::collection::ContainerCollection;
    pub use crate::storage::container::{Container, ContainerConfig, IdLookup, Storable};
    pub use crate::storage::element::Element;
    pub use crate::storage::handle::{Handle, HandleKind};
    pub use crate::storage::id::{ElementId, IdGenerator};
    pub use crate::storage::inserter::{Inserter, PhysicalInserter, RecursiveInserter};
    pub use crate::storage::view::{View, ViewBase};
    pub use crate::topology::boundary::{BoundaryGenerator, NoBoundary, StandardBoundary};
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::element_type::{ElementType, ElementTypeDescriptor};
    pub use crate::topology::labels::LabelSet;
    pub use crate::topology::orientation::Permutation;
}
