//! Composite nodes and the declarative chain representation.

pub mod chain;
pub mod group;
pub mod representation;
