use crate::{
    foundation::core::{Frame, Notice},
    foundation::error::PipelineResult,
    node::handle::{NodeHandle, Target},
};

/// Serializable parameter state of a node, keyed by parameter name.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Producer side of a stage: owns the list of downstream consumers.
///
/// Attaching never fails. Containers check capabilities before they touch any link, so a rewire
/// never stops half way.
pub trait Output {
    /// Attach `target`, which will receive frames on `input_index`.
    fn add_target(&mut self, target: NodeHandle, input_index: usize);
    /// Detach `target` if attached.
    fn remove_target(&mut self, target: &NodeHandle);
    /// Detach every target.
    fn remove_all_targets(&mut self);
    /// Snapshot of the attached targets in attachment order.
    fn targets(&self) -> Vec<Target>;
}

/// Consumer side of a stage.
pub trait Input {
    /// Input slot the next upstream should be attached to.
    fn next_available_input_index(&self) -> usize {
        0
    }

    /// Receive a frame from upstream and push the result to this node's own targets.
    fn new_frame_ready(&mut self, frame: &Frame, input_index: usize) -> PipelineResult<()>;

    /// Handle an out-of-band notice.
    ///
    /// Delivery is driven by the enclosing container, so leaf nodes only update themselves and
    /// must not forward the notice to their targets. Composites forward it across their interior.
    fn notify(&mut self, notice: &Notice, input_index: usize) -> PipelineResult<()> {
        let _ = (notice, input_index);
        Ok(())
    }
}

/// Which capabilities a node implements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Implements [`Output`].
    pub output: bool,
    /// Implements [`Input`].
    pub input: bool,
}

impl Capabilities {
    /// Implements both capabilities, as interior links must.
    pub fn both(self) -> bool {
        self.output && self.input
    }

    /// Implements neither capability.
    pub fn none(self) -> bool {
        !self.output && !self.input
    }
}

/// Kind of value a tunable parameter takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Floating point scalar.
    Float,
    /// Integer scalar.
    Integer,
    /// On/off switch.
    Boolean,
    /// RGBA color given as four floats.
    Color,
    /// Free-form string.
    Text,
}

/// Description of one tunable parameter, for host editors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterSpec {
    /// Parameter name as used in [`Parameters`].
    pub name: String,
    /// Value kind.
    pub kind: ParameterKind,
    /// Value used when the parameter is omitted.
    pub default: serde_json::Value,
    /// Inclusive lower bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for numeric kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ParameterSpec {
    /// Describe a parameter without bounds.
    pub fn new(name: impl Into<String>, kind: ParameterKind, default: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
            min: None,
            max: None,
        }
    }

    /// Describe a float parameter.
    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, ParameterKind::Float, serde_json::Value::from(default))
    }

    /// Describe an integer parameter.
    pub fn integer(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, ParameterKind::Integer, serde_json::Value::from(default))
    }

    /// Describe a boolean parameter.
    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ParameterKind::Boolean, serde_json::Value::from(default))
    }

    /// Attach an inclusive numeric range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Same description under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Any object that can take part in a pipeline topology.
pub trait Node {
    /// Type identifier used in representations and resolved by a node factory.
    fn type_name(&self) -> &str;

    /// The [`Output`] capability, if implemented.
    fn as_output(&self) -> Option<&dyn Output> {
        None
    }

    /// Mutable access to the [`Output`] capability.
    fn as_output_mut(&mut self) -> Option<&mut dyn Output> {
        None
    }

    /// The [`Input`] capability, if implemented.
    fn as_input(&self) -> Option<&dyn Input> {
        None
    }

    /// Mutable access to the [`Input`] capability.
    fn as_input_mut(&mut self) -> Option<&mut dyn Input> {
        None
    }

    /// Serializable parameter state ("describe self"). `None` if the node cannot describe itself.
    fn parameters(&self) -> Option<Parameters> {
        None
    }

    /// Tunable parameters this node exposes.
    fn parameter_specs(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    /// Independent copy of this node, unwired. `None` if the node cannot be copied.
    ///
    /// Links live in the nodes, so containers that copy themselves need every member to support
    /// this.
    fn duplicate(&self) -> Option<NodeHandle> {
        None
    }

    /// Check that the node can be used as a stage right now.
    ///
    /// Composites with lazily checked invariants report violations here.
    fn ensure_ready(&self) -> PipelineResult<()> {
        Ok(())
    }

    /// Capabilities derived from the capability accessors.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            output: self.as_output().is_some(),
            input: self.as_input().is_some(),
        }
    }
}
