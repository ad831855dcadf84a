use std::{cell::RefCell, rc::Rc};

use crate::{
    Frame, FrameIndex, FrameSize, Input, Node, NodeHandle, Notice, Output, ParameterSpec,
    Parameters, PipelineResult, Target, Targets, TextureId,
};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn log() -> Log {
    Rc::default()
}

pub(crate) fn frame(index: u64) -> Frame {
    Frame::new(
        FrameIndex(index),
        FrameSize {
            width: 4,
            height: 4,
        },
        TextureId(index),
    )
}

/// Stage with switchable capabilities that logs what reaches it and forwards frames.
#[derive(Clone)]
pub(crate) struct Stage {
    label: String,
    type_name: String,
    parameters: Parameters,
    specs: Vec<ParameterSpec>,
    output: bool,
    input: bool,
    copyable: bool,
    log: Log,
    targets: Targets,
}

impl Stage {
    pub(crate) fn new(label: &str, log: &Log) -> Self {
        Self {
            label: label.to_string(),
            type_name: label.to_string(),
            parameters: Parameters::new(),
            specs: Vec::new(),
            output: true,
            input: true,
            copyable: true,
            log: log.clone(),
            targets: Targets::new(),
        }
    }

    pub(crate) fn source(label: &str, log: &Log) -> Self {
        Self {
            input: false,
            ..Self::new(label, log)
        }
    }

    pub(crate) fn sink(label: &str, log: &Log) -> Self {
        Self {
            output: false,
            ..Self::new(label, log)
        }
    }

    pub(crate) fn inert(label: &str) -> Self {
        Self {
            output: false,
            input: false,
            ..Self::new(label, &log())
        }
    }

    pub(crate) fn typed(mut self, type_name: &str, parameters: serde_json::Value) -> Self {
        self.type_name = type_name.to_string();
        if let serde_json::Value::Object(map) = parameters {
            self.parameters = map;
        }
        self
    }

    /// Stage that refuses to be duplicated.
    pub(crate) fn pinned(mut self) -> Self {
        self.copyable = false;
        self
    }

    pub(crate) fn spec(mut self, spec: ParameterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub(crate) fn handle(self) -> NodeHandle {
        NodeHandle::new(self)
    }
}

impl Node for Stage {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_output(&self) -> Option<&dyn Output> {
        if self.output { Some(self) } else { None }
    }

    fn as_output_mut(&mut self) -> Option<&mut dyn Output> {
        if self.output { Some(self) } else { None }
    }

    fn as_input(&self) -> Option<&dyn Input> {
        if self.input { Some(self) } else { None }
    }

    fn as_input_mut(&mut self) -> Option<&mut dyn Input> {
        if self.input { Some(self) } else { None }
    }

    fn parameters(&self) -> Option<Parameters> {
        Some(self.parameters.clone())
    }

    fn parameter_specs(&self) -> Vec<ParameterSpec> {
        self.specs.clone()
    }

    fn duplicate(&self) -> Option<NodeHandle> {
        if !self.copyable {
            return None;
        }
        let mut copy = self.clone();
        copy.targets = Targets::new();
        Some(NodeHandle::new(copy))
    }
}

impl Output for Stage {
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

impl Input for Stage {
    fn new_frame_ready(&mut self, frame: &Frame, _input_index: usize) -> PipelineResult<()> {
        self.log.borrow_mut().push(self.label.clone());
        self.targets.push_frame(frame)
    }

    fn notify(&mut self, _notice: &Notice, _input_index: usize) -> PipelineResult<()> {
        self.log.borrow_mut().push(format!("{}!", self.label));
        Ok(())
    }
}

/// Push one frame into `head` and return the labels it reached, in order.
pub(crate) fn trace(head: &NodeHandle, log: &Log) -> Vec<String> {
    log.borrow_mut().clear();
    head.push_frame(&frame(0), 0).unwrap();
    log.borrow().clone()
}
