//! Orientation permutations for deduplicated boundary sub-elements.
//!
//! When two hosts share a boundary sub-element, only one of them decides the
//! stored (canonical) vertex order. Every host therefore keeps a
//! [`Permutation`] per shared sub-element mapping its own local vertex order
//! onto the canonical one: `perm.apply(local) == canonical`.

use core::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshStoreError;

/// Largest number of vertices a permuted sub-element may have.
pub const MAX_LOCAL_VERTICES: usize = 16;

/// Permutation of up to [`MAX_LOCAL_VERTICES`] local indices.
///
/// Positions beyond `len` act as fixed points, so the empty permutation
/// (`Default`) is the identity of every length.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Permutation {
    len: u8,
    map: [u8; MAX_LOCAL_VERTICES],
}

impl Default for Permutation {
    fn default() -> Self {
        Self::identity(0)
    }
}

impl Debug for Permutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Permutation").field(&self.as_slice()).finish()
    }
}

impl Permutation {
    /// Identity on `0..len`.
    ///
    /// # Panics
    /// Panics if `len > MAX_LOCAL_VERTICES`.
    pub fn identity(len: usize) -> Self {
        assert!(
            len <= MAX_LOCAL_VERTICES,
            "{}",
            MeshStoreError::PermutationTooLong {
                len,
                max: MAX_LOCAL_VERTICES
            }
        );
        let mut map = [0u8; MAX_LOCAL_VERTICES];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Permutation {
            len: len as u8,
            map,
        }
    }

    /// Builds a permutation from `local -> canonical` images.
    ///
    /// # Errors
    /// `InvalidPermutation` unless `images` is a bijection on `0..images.len()`,
    /// `PermutationTooLong` if it exceeds [`MAX_LOCAL_VERTICES`].
    pub fn try_from_slice(images: &[usize]) -> Result<Self, MeshStoreError> {
        if images.len() > MAX_LOCAL_VERTICES {
            return Err(MeshStoreError::PermutationTooLong {
                len: images.len(),
                max: MAX_LOCAL_VERTICES,
            });
        }
        let mut seen = [false; MAX_LOCAL_VERTICES];
        let mut perm = Self::identity(images.len());
        for (local, &canonical) in images.iter().enumerate() {
            if canonical >= images.len() || seen[canonical] {
                return Err(MeshStoreError::InvalidPermutation(images.to_vec()));
            }
            seen[canonical] = true;
            perm.map[local] = canonical as u8;
        }
        Ok(perm)
    }

    /// Number of permuted positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Canonical index of local position `local`.
    #[inline]
    pub fn apply(&self, local: usize) -> usize {
        if local < self.len() {
            self.map[local] as usize
        } else {
            local
        }
    }

    /// `local -> canonical` images as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.map[..self.len()]
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.as_slice().iter().enumerate().all(|(i, &c)| i == c as usize)
    }

    /// Records, for each local vertex of `local`, where the same vertex sits in
    /// `canonical`: `perm[j] = i` whenever `local[j] == canonical[i]`.
    ///
    /// Both slices are expected to hold the same set of vertices; positions of
    /// `local` without a match keep their identity image.
    ///
    /// # Example
    /// ```rust
    /// use mesh_store::topology::orientation::Permutation;
    /// let perm = Permutation::resolve(&['b', 'a'], &['a', 'b']);
    /// assert_eq!(perm.as_slice(), &[1, 0]);
    /// ```
    pub fn resolve<T: PartialEq>(local: &[T], canonical: &[T]) -> Self {
        let mut perm = Self::identity(local.len());
        for (i, c) in canonical.iter().enumerate() {
            if let Some(j) = local.iter().position(|l| l == c) {
                perm.map[j] = i as u8;
            }
        }
        perm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_default() {
        let id = Permutation::identity(3);
        assert!(id.is_identity());
        assert_eq!(id.as_slice(), &[0, 1, 2]);
        assert!(Permutation::default().is_empty());
        assert_eq!(Permutation::default().apply(5), 5);
    }

    #[test]
    fn resolve_reversed_edge() {
        let perm = Permutation::resolve(&[7u32, 3], &[3u32, 7]);
        assert_eq!(perm.as_slice(), &[1, 0]);
        assert_eq!(perm.apply(0), 1);
    }

    #[test]
    fn resolve_rotated_triangle() {
        // local (b, c, a) against canonical (a, b, c)
        let perm = Permutation::resolve(&['b', 'c', 'a'], &['a', 'b', 'c']);
        assert_eq!(perm.as_slice(), &[1, 2, 0]);
        let local = ['b', 'c', 'a'];
        let canonical = ['a', 'b', 'c'];
        for (j, l) in local.iter().enumerate() {
            assert_eq!(canonical[perm.apply(j)], *l);
        }
    }

    #[test]
    fn try_from_slice_rejects_non_bijection() {
        assert!(Permutation::try_from_slice(&[0, 2, 1]).is_ok());
        assert_eq!(
            Permutation::try_from_slice(&[0, 0]),
            Err(MeshStoreError::InvalidPermutation(vec![0, 0]))
        );
        assert!(matches!(
            Permutation::try_from_slice(&[0; MAX_LOCAL_VERTICES + 1]),
            Err(MeshStoreError::PermutationTooLong { .. })
        ));
    }
}
