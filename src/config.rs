//! Resolved per-type mesh configuration.
//!
//! A [`MeshConfig`] lists the element types a mesh stores; for each one the
//! boundary descriptor and the container policy (handle kind, deduplication,
//! id lookup). Configurations are plain data and round-trip through serde.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshStoreError;
use crate::storage::container::{ContainerConfig, IdLookup};
use crate::storage::handle::HandleKind;
use crate::topology::element_type::{ElementType, ElementTypeDescriptor};

/// Configuration of one element type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    pub descriptor: ElementTypeDescriptor,
    pub container: ContainerConfig,
}

/// Configuration of every element type a mesh stores.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshConfig {
    types: BTreeMap<ElementType, TypeConfig>,
}

impl MeshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `cell` and, transitively, every type on its boundary, with standard
    /// descriptors. Intermediate types deduplicate; vertices and `cell` do
    /// not.
    ///
    /// # Example
    /// ```rust
    /// use mesh_store::config::MeshConfig;
    /// use mesh_store::topology::element_type::ElementType;
    /// let cfg = MeshConfig::for_cell(ElementType::Tetrahedron);
    /// assert_eq!(cfg.types().count(), 4);
    /// assert!(cfg.container(ElementType::Triangle).unwrap().deduplicate);
    /// assert!(!cfg.container(ElementType::Tetrahedron).unwrap().deduplicate);
    /// ```
    pub fn for_cell(cell: ElementType) -> Self {
        let mut config = Self::new();
        config.add_standard(cell, false);
        config
    }

    /// Simplicial mesh of dimension `dim` (1 to 3).
    ///
    /// # Panics
    /// For dimensions without a simplex type.
    pub fn simplicial(dim: u8) -> Self {
        let cell = ElementType::simplex(dim)
            .filter(|_| dim > 0)
            .unwrap_or_else(|| panic!("no simplicial cell of dimension {dim}"));
        Self::for_cell(cell)
    }

    /// Tensor-product mesh of dimension `dim` (1 to 3).
    ///
    /// # Panics
    /// For dimensions without a tensor-product type.
    pub fn hypercube(dim: u8) -> Self {
        let cell = ElementType::hypercube(dim)
            .filter(|_| dim > 0)
            .unwrap_or_else(|| panic!("no tensor-product cell of dimension {dim}"));
        Self::for_cell(cell)
    }

    fn add_standard(&mut self, ty: ElementType, deduplicate: bool) {
        if self.types.contains_key(&ty) {
            return;
        }
        let descriptor = ElementTypeDescriptor::standard(ty);
        let subs: Vec<ElementType> = descriptor.boundary.iter().map(|s| s.element_type).collect();
        let container = ContainerConfig {
            deduplicate: deduplicate && ty != ElementType::Vertex,
            ..ContainerConfig::default()
        };
        self.types.insert(ty, TypeConfig { descriptor, container });
        for sub in subs {
            self.add_standard(sub, true);
        }
    }

    /// Adds (or replaces) one type.
    pub fn with_type(mut self, descriptor: ElementTypeDescriptor, container: ContainerConfig) -> Self {
        self.types.insert(
            descriptor.element_type,
            TypeConfig {
                descriptor,
                container,
            },
        );
        self
    }

    /// Adds `cell` with its standard boundary types, keeping types already
    /// configured.
    pub fn with_cell(mut self, cell: ElementType) -> Self {
        self.add_standard(cell, false);
        self
    }

    /// Replaces the container policy of `ty`, if declared.
    pub fn with_container(mut self, ty: ElementType, container: ContainerConfig) -> Self {
        if let Some(tc) = self.types.get_mut(&ty) {
            tc.container = container;
        }
        self
    }

    /// Uses `kind` handles for every declared type.
    pub fn with_handle_kind(mut self, kind: HandleKind) -> Self {
        self.types.values_mut().for_each(|tc| tc.container.handle = kind);
        self
    }

    /// Uses `lookup` id indexes for every declared type.
    pub fn with_id_lookup(mut self, lookup: IdLookup) -> Self {
        self.types.values_mut().for_each(|tc| tc.container.id_lookup = lookup);
        self
    }

    /// Declared types, ascending.
    pub fn types(&self) -> impl Iterator<Item = ElementType> + '_ {
        self.types.keys().copied()
    }

    pub fn declares(&self, ty: ElementType) -> bool {
        self.types.contains_key(&ty)
    }

    pub fn type_config(&self, ty: ElementType) -> Option<&TypeConfig> {
        self.types.get(&ty)
    }

    pub fn descriptor(&self, ty: ElementType) -> Option<&ElementTypeDescriptor> {
        self.types.get(&ty).map(|tc| &tc.descriptor)
    }

    pub fn container(&self, ty: ElementType) -> Option<&ContainerConfig> {
        self.types.get(&ty).map(|tc| &tc.container)
    }

    /// Checks that boundary specs stay below their host dimension and name
    /// declared types.
    pub fn validate(&self) -> Result<(), MeshStoreError> {
        for (&ty, tc) in &self.types {
            for spec in &tc.descriptor.boundary {
                if spec.dimension >= tc.descriptor.dimension {
                    return Err(MeshStoreError::BoundaryDimension {
                        host: ty,
                        dimension: spec.dimension,
                        host_dimension: tc.descriptor.dimension,
                    });
                }
                if !self.declares(spec.element_type) {
                    log::warn!(
                        "{ty:?} declares boundary type {:?}, which is not configured",
                        spec.element_type
                    );
                    return Err(MeshStoreError::MissingBoundaryType {
                        host: ty,
                        boundary: spec.element_type,
                    });
                }
            }
            if tc.container.deduplicate && ty == ElementType::Vertex {
                log::warn!("vertices have no natural key; deduplicating them merges all vertices");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_mesh_defaults() {
        let cfg = MeshConfig::for_cell(ElementType::Triangle);
        let types: Vec<_> = cfg.types().collect();
        assert_eq!(
            types,
            vec![ElementType::Vertex, ElementType::Line, ElementType::Triangle]
        );
        assert!(!cfg.container(ElementType::Vertex).unwrap().deduplicate);
        assert!(cfg.container(ElementType::Line).unwrap().deduplicate);
        assert!(!cfg.container(ElementType::Triangle).unwrap().deduplicate);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn hex_mesh_pulls_in_quads() {
        let cfg = MeshConfig::hypercube(3);
        assert!(cfg.declares(ElementType::Quadrilateral));
        assert!(cfg.container(ElementType::Quadrilateral).unwrap().deduplicate);
    }

    #[test]
    fn mixed_cells() {
        let cfg = MeshConfig::for_cell(ElementType::Triangle).with_cell(ElementType::Quadrilateral);
        assert!(!cfg.container(ElementType::Quadrilateral).unwrap().deduplicate);
        assert!(cfg.container(ElementType::Line).unwrap().deduplicate);
    }

    #[test]
    fn missing_boundary_type_is_reported() {
        let cfg = MeshConfig::new().with_type(
            ElementTypeDescriptor::standard(ElementType::Line),
            ContainerConfig::default(),
        );
        assert_eq!(
            cfg.validate(),
            Err(MeshStoreError::MissingBoundaryType {
                host: ElementType::Line,
                boundary: ElementType::Vertex,
            })
        );
    }

    #[test]
    fn handle_kind_applies_to_all_types() {
        let cfg = MeshConfig::simplicial(2).with_handle_kind(HandleKind::Id);
        assert!(cfg.types().all(|ty| cfg.container(ty).unwrap().handle == HandleKind::Id));
    }

    #[test]
    fn json_roundtrip() {
        let cfg = MeshConfig::simplicial(3).with_id_lookup(IdLookup::Ordered);
        let s = serde_json::to_string(&cfg).unwrap();
        let back: MeshConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(back, cfg);
    }
}
