/// Convenience result type used across imagechain.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level error taxonomy used by the pipeline APIs.
///
/// Structural errors are raised before any link is touched, so a failed call leaves the topology
/// exactly as it was.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// A capability or connectivity precondition does not hold.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A node cannot play any role inside a group.
    #[error("invalid capability: {0}")]
    InvalidCapability(String),

    /// An index-addressed operation was given an out-of-bounds index.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the sequence at the time of the call.
        len: usize,
    },

    /// `remove_filter` found a different node at the given index.
    #[error("node mismatch at index {index}")]
    NodeMismatch {
        /// Index whose occupant differed from the expected node.
        index: usize,
    },

    /// A declarative representation is missing fields or names an unknown type.
    #[error("malformed representation: {0}")]
    MalformedRepresentation(String),

    /// The node factory does not know the requested type identifier.
    #[error("unknown node type '{0}'")]
    UnknownType(String),

    /// The node factory rejected the parameters for a known type.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Errors when serializing or deserializing representations.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Build a [`PipelineError::InvalidTopology`] value.
    pub fn invalid_topology(msg: impl Into<String>) -> Self {
        Self::InvalidTopology(msg.into())
    }

    /// Build a [`PipelineError::InvalidCapability`] value.
    pub fn invalid_capability(msg: impl Into<String>) -> Self {
        Self::InvalidCapability(msg.into())
    }

    /// Build a [`PipelineError::IndexOutOfRange`] value.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Build a [`PipelineError::MalformedRepresentation`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRepresentation(msg.into())
    }

    /// Build a [`PipelineError::UnknownType`] value.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType(type_name.into())
    }

    /// Build a [`PipelineError::InvalidParameters`] value.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Build a [`PipelineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
