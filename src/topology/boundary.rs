//! Boundary generation for freshly inserted elements.
//!
//! The inserter calls [`BoundaryGenerator::on_inserted`] exactly once per
//! first-time physical insertion. The generator builds each boundary
//! sub-element from the host's vertices and hands it back through
//! [`BoundaryInserter::insert_boundary`], which inserts it through the same
//! inserter chain and records handle and orientation on the host.
//!
//! Tensor-product cells number their vertices `x + 2y + 4z`; polygons list
//! theirs cyclically.

use crate::storage::element::Element;
use crate::storage::handle::Handle;
use crate::topology::element_type::{
    BoundarySpec, ElementType, ElementTypeDescriptor, hypercube_faces, simplex_faces,
};

/// Sink for boundary sub-elements of one host.
pub trait BoundaryInserter<A> {
    /// Inserts `sub` and stores it at `position` of the host's layer for
    /// `sub`'s dimension. Returns the sub-element handle and whether it was
    /// newly created.
    fn insert_boundary(&mut self, host: Handle, position: usize, sub: Element<A>) -> (Handle, bool);
}

/// Creates the boundary sub-elements of a newly inserted element.
pub trait BoundaryGenerator<A>: Send + Sync {
    fn on_inserted(
        &self,
        descriptor: &ElementTypeDescriptor,
        host: &Element<A>,
        handle: Handle,
        inserter: &mut dyn BoundaryInserter<A>,
    );
}

/// Generator that creates nothing; higher layers stay empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBoundary;

impl<A> BoundaryGenerator<A> for NoBoundary {
    fn on_inserted(
        &self,
        _descriptor: &ElementTypeDescriptor,
        _host: &Element<A>,
        _handle: Handle,
        _inserter: &mut dyn BoundaryInserter<A>,
    ) {
    }
}

/// Simplices, tensor-product cells and polygons.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardBoundary;

impl StandardBoundary {
    /// Local vertex indices of every sub-element described by `spec`, for a
    /// host with `vertex_count` vertices.
    pub fn local_faces(host: ElementType, spec: &BoundarySpec, vertex_count: usize) -> Vec<Vec<usize>> {
        let k = spec.dimension as usize;
        match host {
            ElementType::Line | ElementType::Triangle | ElementType::Tetrahedron => {
                simplex_faces(vertex_count, k)
            }
            ElementType::Quadrilateral | ElementType::Hexahedron => {
                hypercube_faces(host.dimension() as usize, k)
            }
            ElementType::Polygon if k == 1 && vertex_count >= 2 => (0..vertex_count)
                .map(|i| vec![i, (i + 1) % vertex_count])
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl<A: Default> BoundaryGenerator<A> for StandardBoundary {
    fn on_inserted(
        &self,
        descriptor: &ElementTypeDescriptor,
        host: &Element<A>,
        handle: Handle,
        inserter: &mut dyn BoundaryInserter<A>,
    ) {
        let vertices = host.vertices();
        if let Some(expected) = host.element_type().vertex_count() {
            if vertices.len() != expected {
                log::warn!(
                    "{handle:?} has {} vertices, expected {expected}; boundary not generated",
                    vertices.len()
                );
                return;
            }
        }
        for spec in descriptor.higher_boundary() {
            let faces = Self::local_faces(host.element_type(), spec, vertices.len());
            for (position, face) in faces.iter().enumerate() {
                let sub = Element::new(spec.element_type)
                    .with_vertices(face.iter().map(|&i| vertices[i]));
                inserter.insert_boundary(handle, position, sub);
            }
        }
    }
}
