//! Element storage: handles, containers, collections, views and inserters.
//!
//! Everything here is single-threaded. The physical collection is owned by a
//! [`PhysicalInserter`](inserter::PhysicalInserter); views and recursive
//! inserters only hold handles or short-lived borrows.

pub mod collection;
pub mod container;
pub mod element;
pub mod handle;
pub mod id;
pub mod inserter;
pub mod view;

pub use collection::{CollectionId, ContainerCollection};
pub use container::{Container, ContainerConfig, IdLookup, Storable, ViewContainer};
pub use element::{BoundaryLayer, Element, ElementKey};
pub use handle::{ContainerId, Handle, HandleKind, HandleStrategy, Locator};
pub use id::{ElementId, IdGenerator};
pub use inserter::{InsertChain, Inserter, PhysicalInserter, RecursiveInserter};
pub use view::{View, ViewBase, ViewId, ViewParent};
