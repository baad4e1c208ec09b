//! Stored mesh elements.
//!
//! An [`Element`] carries its type, an optional id, one [`BoundaryLayer`] per
//! boundary dimension and an opaque appendix. The vertex layer (dimension 0)
//! is supplied by the caller; higher layers are filled by the boundary
//! generator when the element is first physically inserted.

use crate::storage::container::Storable;
use crate::storage::handle::Handle;
use crate::storage::id::ElementId;
use crate::topology::element_type::{BoundaryLayout, BoundarySpec, ElementType};
use crate::topology::orientation::Permutation;

/// Natural key of an [`Element`]: its vertex handles, sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(Vec<Handle>);

impl ElementKey {
    pub fn from_vertices(vertices: &[Handle]) -> Self {
        let mut sorted = vertices.to_vec();
        sorted.sort_unstable();
        ElementKey(sorted)
    }

    pub fn vertices(&self) -> &[Handle] {
        &self.0
    }
}

/// Boundary handles of one dimension, as seen from the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryLayer {
    element_type: ElementType,
    layout: BoundaryLayout,
    handles: Vec<Handle>,
    /// One entry per handle for oriented layouts, empty otherwise.
    orientations: Vec<Permutation>,
}

impl BoundaryLayer {
    pub fn new(element_type: ElementType, layout: BoundaryLayout) -> Self {
        Self {
            element_type,
            layout,
            handles: Vec::new(),
            orientations: Vec::new(),
        }
    }

    pub fn from_spec(spec: &BoundarySpec) -> Self {
        Self::new(spec.element_type, spec.layout)
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn layout(&self) -> BoundaryLayout {
        self.layout
    }

    #[inline]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Orientation of the sub-element at `position`; identity for layouts
    /// that do not record orientations.
    pub fn orientation(&self, position: usize) -> Option<Permutation> {
        if position >= self.handles.len() {
            return None;
        }
        Some(self.orientations.get(position).copied().unwrap_or_default())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn position_of(&self, handle: Handle) -> Option<usize> {
        self.handles.iter().position(|&h| h == handle)
    }

    /// Stores `handle` at `position`, appending when `position == len()`.
    /// `Set` layouts ignore the position and skip handles already present.
    ///
    /// # Panics
    /// If `position > len()` on a positional layout.
    pub fn set(&mut self, position: usize, handle: Handle, orientation: Permutation) {
        if self.layout == BoundaryLayout::Set {
            if !self.contains(handle) {
                self.handles.push(handle);
            }
            return;
        }
        assert!(
            position <= self.handles.len(),
            "boundary position {position} skips past layer of length {}",
            self.handles.len()
        );
        let oriented = self.layout.is_oriented();
        if position == self.handles.len() {
            self.handles.push(handle);
            if oriented {
                self.orientations.push(orientation);
            }
        } else {
            self.handles[position] = handle;
            if oriented {
                self.orientations[position] = orientation;
            }
        }
    }

    fn remap(&mut self, f: &impl Fn(Handle) -> Handle) {
        self.handles.iter_mut().for_each(|h| *h = f(*h));
    }
}

/// A mesh element with appendix `A`.
#[derive(Clone, Debug, PartialEq)]
pub struct Element<A> {
    element_type: ElementType,
    id: Option<ElementId>,
    /// Indexed by boundary dimension.
    boundary: Vec<BoundaryLayer>,
    appendix: A,
}

impl<A: Default> Element<A> {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            id: None,
            boundary: Vec::new(),
            appendix: A::default(),
        }
    }

    pub fn vertex() -> Self {
        Self::new(ElementType::Vertex)
    }
}

impl<A> Element<A> {
    /// Sets the vertex layer.
    ///
    /// # Panics
    /// On a vertex element.
    pub fn with_vertices(mut self, vertices: impl IntoIterator<Item = Handle>) -> Self {
        assert!(
            self.element_type != ElementType::Vertex,
            "vertices carry no boundary"
        );
        let mut layer = BoundaryLayer::new(ElementType::Vertex, BoundaryLayout::Array);
        layer.handles = vertices.into_iter().collect();
        if self.boundary.is_empty() {
            self.boundary.push(layer);
        } else {
            self.boundary[0] = layer;
        }
        self
    }

    /// Pre-assigns an id; the inserter observes it instead of issuing one.
    pub fn with_id(mut self, id: ElementId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_appendix(mut self, appendix: A) -> Self {
        self.appendix = appendix;
        self
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn id(&self) -> Option<ElementId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ElementId) {
        debug_assert!(self.id.is_none());
        self.id = Some(id);
    }

    #[inline]
    pub fn appendix(&self) -> &A {
        &self.appendix
    }

    #[inline]
    pub fn appendix_mut(&mut self) -> &mut A {
        &mut self.appendix
    }

    #[inline]
    pub fn dimension(&self) -> u8 {
        self.element_type.dimension()
    }

    /// Vertex handles in local order (empty for vertices).
    pub fn vertices(&self) -> &[Handle] {
        self.boundary(0)
    }

    /// Boundary handles of dimension `dimension` (empty if none recorded).
    pub fn boundary(&self, dimension: u8) -> &[Handle] {
        self.layer(dimension).map(BoundaryLayer::handles).unwrap_or(&[])
    }

    pub fn layer(&self, dimension: u8) -> Option<&BoundaryLayer> {
        self.boundary.get(dimension as usize)
    }

    pub fn layers(&self) -> &[BoundaryLayer] {
        &self.boundary
    }

    /// Orientation recorded for the boundary sub-element at `position`.
    pub fn orientation(&self, dimension: u8, position: usize) -> Option<Permutation> {
        self.layer(dimension)?.orientation(position)
    }

    /// Whether any boundary layer references `handle`.
    pub fn references(&self, handle: Handle) -> bool {
        self.layer(handle.element_type().dimension())
            .is_some_and(|layer| layer.contains(handle))
    }

    /// Layer for `spec.dimension`, created on first use. Lower layers that do
    /// not exist yet are created empty.
    pub(crate) fn layer_mut(&mut self, spec: &BoundarySpec) -> &mut BoundaryLayer {
        let dim = spec.dimension as usize;
        while self.boundary.len() <= dim {
            let k = self.boundary.len();
            let placeholder = if k == dim {
                BoundaryLayer::from_spec(spec)
            } else {
                BoundaryLayer::new(ElementType::Vertex, BoundaryLayout::Array)
            };
            self.boundary.push(placeholder);
        }
        let layer = &mut self.boundary[dim];
        if layer.is_empty() {
            layer.element_type = spec.element_type;
            layer.layout = spec.layout;
        }
        layer
    }

    /// Rewrites every stored boundary handle through `f`.
    pub(crate) fn remap_handles(&mut self, f: &impl Fn(Handle) -> Handle) {
        self.boundary.iter_mut().for_each(|layer| layer.remap(f));
    }
}

impl<A> Storable for Element<A> {
    type Key = ElementKey;

    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn id(&self) -> Option<ElementId> {
        self.id
    }

    fn natural_key(&self) -> ElementKey {
        ElementKey::from_vertices(self.vertices())
    }
}
