//! Internal consistency checks for containers, collections, views and meshes.

use crate::mesh_error::MeshStoreError;

/// Structures whose internal indexes can be cross-checked.
pub trait DebugInvariants {
    /// Validate invariants and return the first violation encountered.
    fn validate_invariants(&self) -> Result<(), MeshStoreError>;

    /// Panic on a violation in debug builds or when invariant checking is
    /// enabled; a no-op otherwise.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), std::any::type_name::<Self>());
    }
}

/// Runs a fallible check and panics with `context` on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $context:expr) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!("[invariants] {}: {}", $context, e);
        }
    };
}
