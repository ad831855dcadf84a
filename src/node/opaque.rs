use crate::{
    foundation::core::Frame,
    foundation::error::PipelineResult,
    node::capability::{Input, Node, Output, Parameters},
    node::handle::{NodeHandle, Target},
    node::targets::Targets,
};

/// Pass-through stage that carries a type identifier and a parameter map verbatim.
///
/// Stands in for filter types the local registry does not know, so a representation can be
/// loaded, edited and written back without the concrete filter library. Frames are forwarded
/// unchanged.
#[derive(Clone, Debug)]
pub struct OpaqueFilter {
    type_name: String,
    parameters: Parameters,
    targets: Targets,
}

impl OpaqueFilter {
    /// Build an unwired pass-through node.
    pub fn new(type_name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            type_name: type_name.into(),
            parameters,
            targets: Targets::new(),
        }
    }

    /// Current value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters.get(name)
    }

    /// Set or replace a parameter value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.parameters.insert(name.into(), value);
    }
}

impl Node for OpaqueFilter {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_output(&self) -> Option<&dyn Output> {
        Some(self)
    }

    fn as_output_mut(&mut self) -> Option<&mut dyn Output> {
        Some(self)
    }

    fn as_input(&self) -> Option<&dyn Input> {
        Some(self)
    }

    fn as_input_mut(&mut self) -> Option<&mut dyn Input> {
        Some(self)
    }

    fn parameters(&self) -> Option<Parameters> {
        Some(self.parameters.clone())
    }

    fn duplicate(&self) -> Option<NodeHandle> {
        Some(NodeHandle::new(Self::new(
            self.type_name.clone(),
            self.parameters.clone(),
        )))
    }
}

impl Output for OpaqueFilter {
    fn add_target(&mut self, target: NodeHandle, input_index: usize) {
        self.targets.add(target, input_index);
    }

    fn remove_target(&mut self, target: &NodeHandle) {
        self.targets.remove(target);
    }

    fn remove_all_targets(&mut self) {
        self.targets.clear();
    }

    fn targets(&self) -> Vec<Target> {
        self.targets.to_vec()
    }
}

impl Input for OpaqueFilter {
    fn new_frame_ready(&mut self, frame: &Frame, _input_index: usize) -> PipelineResult<()> {
        self.targets.push_frame(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/opaque.rs"]
mod tests;
