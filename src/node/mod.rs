//! Node capabilities and the shared handle every container holds.
//!
//! Concrete filters live outside this crate. They implement [`capability::Node`] plus whichever of
//! [`capability::Output`] / [`capability::Input`] they support, and containers check those
//! capabilities when a node is composed rather than through a type hierarchy.

pub mod capability;
pub mod handle;
pub mod opaque;
pub mod registry;
pub mod targets;
