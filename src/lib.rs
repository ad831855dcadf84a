//! imagechain assembles GPU-bound filter stages into composable pipelines.
//!
//! Filters are opaque nodes implementing the [`Output`] and/or [`Input`] capabilities. Two
//! composites arrange them:
//!
//! - [`Chain`]: an ordered, named sequence wired output-to-input, mutable by index.
//! - [`Group`]: a sub-graph with declared entry nodes and a single exit node.
//!
//! Both composites are nodes themselves, so they nest. A chain's structure can be written to a
//! declarative [`ChainRepresentation`] and rebuilt through a [`NodeFactory`] such as
//! [`NodeRegistry`]; groups nested in it are written as a [`GroupRepresentation`].
//!
//! The crate never renders anything. GPU work, scheduling and threading belong to the node
//! implementations and the host; a pipeline is built, mutated and driven from one thread, with
//! mutations happening between frames.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod node;
mod pipeline;

pub use foundation::core::{Frame, FrameIndex, FrameSize, Notice, TextureId};
pub use foundation::error::{PipelineError, PipelineResult};
pub use node::capability::{
    Capabilities, Input, Node, Output, ParameterKind, ParameterSpec, Parameters,
};
pub use node::handle::{NodeHandle, Target};
pub use node::opaque::OpaqueFilter;
pub use node::registry::{NodeConstructor, NodeFactory, NodeRegistry};
pub use node::targets::Targets;
pub use pipeline::chain::{CHAIN_TYPE, Chain};
pub use pipeline::group::{GROUP_TYPE, Group, ParameterDescription};
pub use pipeline::representation::{
    ChainRepresentation, GroupRepresentation, ItemRepresentation, LinkRepresentation, LoadOpts,
    UnknownTypePolicy,
};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
