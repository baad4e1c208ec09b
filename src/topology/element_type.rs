//! Element type metadata consumed by the storage core.
//!
//! An [`ElementType`] names a kind of mesh element; an
//! [`ElementTypeDescriptor`] lists, per lower dimension, which boundary
//! sub-elements the type carries, how many, and how the host stores them.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Element kinds known to the standard configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Line,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 2D polygon with a variable number of vertices.
    Polygon,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
}

impl Default for ElementType {
    fn default() -> Self {
        ElementType::Vertex
    }
}

impl ElementType {
    /// Returns the topological dimension of the element.
    pub fn dimension(self) -> u8 {
        match self {
            ElementType::Vertex => 0,
            ElementType::Line => 1,
            ElementType::Triangle | ElementType::Quadrilateral | ElementType::Polygon => 2,
            ElementType::Tetrahedron | ElementType::Hexahedron => 3,
        }
    }

    /// Number of vertices, when fixed by the type.
    pub fn vertex_count(self) -> Option<usize> {
        match self {
            ElementType::Vertex => Some(1),
            ElementType::Line => Some(2),
            ElementType::Triangle => Some(3),
            ElementType::Quadrilateral | ElementType::Tetrahedron => Some(4),
            ElementType::Hexahedron => Some(8),
            ElementType::Polygon => None,
        }
    }

    /// True for simplices (vertex, line, triangle, tetrahedron).
    pub fn is_simplex(self) -> bool {
        matches!(
            self,
            ElementType::Vertex | ElementType::Line | ElementType::Triangle | ElementType::Tetrahedron
        )
    }

    /// The simplex of dimension `dim`, if one is defined.
    pub fn simplex(dim: u8) -> Option<Self> {
        match dim {
            0 => Some(ElementType::Vertex),
            1 => Some(ElementType::Line),
            2 => Some(ElementType::Triangle),
            3 => Some(ElementType::Tetrahedron),
            _ => None,
        }
    }

    /// The tensor-product cell of dimension `dim`, if one is defined.
    pub fn hypercube(dim: u8) -> Option<Self> {
        match dim {
            0 => Some(ElementType::Vertex),
            1 => Some(ElementType::Line),
            2 => Some(ElementType::Quadrilateral),
            3 => Some(ElementType::Hexahedron),
            _ => None,
        }
    }
}

/// How many boundary sub-elements of one dimension an element has.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Arity {
    /// Known from the type alone.
    Fixed(usize),
    /// Depends on the individual element (polygons).
    Dynamic,
}

impl Arity {
    /// The fixed count, if any.
    pub fn fixed(self) -> Option<usize> {
        match self {
            Arity::Fixed(n) => Some(n),
            Arity::Dynamic => None,
        }
    }
}

/// How the host stores the handles of one boundary dimension.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum BoundaryLayout {
    /// Positional handles, no orientation.
    #[default]
    Array,
    /// Unordered, unique handles.
    Set,
    /// Positional handles to deduplicated sub-elements, each paired with an
    /// orientation permutation.
    DedupMap,
}

impl BoundaryLayout {
    /// Whether hosts record an orientation per boundary handle.
    #[inline]
    pub fn is_oriented(self) -> bool {
        matches!(self, BoundaryLayout::DedupMap)
    }
}

/// Boundary sub-elements of one dimension.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BoundarySpec {
    /// Dimension of the sub-elements.
    pub dimension: u8,
    /// Their element type.
    pub element_type: ElementType,
    /// How many a host has.
    pub arity: Arity,
    /// How the host stores them.
    pub layout: BoundaryLayout,
}

/// Per-type boundary description handed to the core.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeDescriptor {
    /// The described type.
    pub element_type: ElementType,
    /// Its topological dimension.
    pub dimension: u8,
    /// One entry per boundary dimension, ascending.
    pub boundary: Vec<BoundarySpec>,
}

impl ElementTypeDescriptor {
    /// Descriptor for `element_type` with the usual combinatorics.
    ///
    /// The vertex layer is positional; every other boundary dimension refers
    /// to deduplicated sub-elements and records orientations.
    ///
    /// # Example
    /// ```rust
    /// use mesh_store::topology::element_type::{Arity, ElementType, ElementTypeDescriptor};
    /// let tri = ElementTypeDescriptor::standard(ElementType::Triangle);
    /// assert_eq!(tri.boundary.len(), 2);
    /// assert_eq!(tri.spec(1).unwrap().arity, Arity::Fixed(3));
    /// ```
    pub fn standard(element_type: ElementType) -> Self {
        let dimension = element_type.dimension();
        let boundary = (0..dimension)
            .map(|k| {
                let layout = if k == 0 {
                    BoundaryLayout::Array
                } else {
                    BoundaryLayout::DedupMap
                };
                let (sub, arity) = standard_boundary(element_type, k);
                BoundarySpec {
                    dimension: k,
                    element_type: sub,
                    arity,
                    layout,
                }
            })
            .collect();
        Self {
            element_type,
            dimension,
            boundary,
        }
    }

    /// Replace the layout of one boundary dimension.
    pub fn with_layout(mut self, dimension: u8, layout: BoundaryLayout) -> Self {
        if let Some(spec) = self.boundary.iter_mut().find(|s| s.dimension == dimension) {
            spec.layout = layout;
        }
        self
    }

    /// Boundary spec for dimension `dimension`, if the type has one.
    pub fn spec(&self, dimension: u8) -> Option<&BoundarySpec> {
        self.boundary.iter().find(|s| s.dimension == dimension)
    }

    /// Boundary specs above the vertex layer.
    pub fn higher_boundary(&self) -> impl Iterator<Item = &BoundarySpec> {
        self.boundary.iter().filter(|s| s.dimension > 0)
    }
}

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Boundary type and count of `host` in dimension `k < host.dimension()`.
fn standard_boundary(host: ElementType, k: u8) -> (ElementType, Arity) {
    match host {
        ElementType::Line | ElementType::Triangle | ElementType::Tetrahedron => {
            let n = host.dimension() as usize + 1;
            let sub = ElementType::simplex(k).unwrap_or_default();
            (sub, Arity::Fixed(binomial(n, k as usize + 1)))
        }
        ElementType::Quadrilateral | ElementType::Hexahedron => {
            let d = host.dimension() as usize;
            let k = k as usize;
            // k-faces of a d-cube: choose the fixed axes, then their values.
            let count = binomial(d, d - k) << (d - k);
            let sub = ElementType::hypercube(k as u8).unwrap_or_default();
            (sub, Arity::Fixed(count))
        }
        ElementType::Polygon => {
            let sub = ElementType::simplex(k).unwrap_or_default();
            (sub, Arity::Dynamic)
        }
        ElementType::Vertex => (ElementType::Vertex, Arity::Fixed(0)),
    }
}

/// Local vertex indices of every `k`-face of the `d`-dimensional tensor-product
/// cell with vertices numbered `x + 2y + 4z`, in lexicographic order.
pub fn hypercube_faces(d: usize, k: usize) -> Vec<Vec<usize>> {
    let vertex_count = 1usize << d;
    let mut faces: Vec<Vec<usize>> = (0..d)
        .combinations(d - k)
        .flat_map(|fixed_axes| {
            (0..1usize << fixed_axes.len()).map(move |values| {
                (0..vertex_count)
                    .filter(|v| {
                        fixed_axes
                            .iter()
                            .enumerate()
                            .all(|(i, &axis)| (v >> axis) & 1 == (values >> i) & 1)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    faces.sort();
    faces
}

/// Local vertex indices of every `k`-face of an `n`-vertex simplex, in
/// lexicographic order.
pub fn simplex_faces(n: usize, k: usize) -> Vec<Vec<usize>> {
    (0..n).combinations(k + 1).collect()
}
