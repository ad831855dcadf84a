#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use imagechain::{
    Frame, FrameIndex, FrameSize, Input, Node, NodeHandle, NodeRegistry, Notice, Output,
    Parameters, PipelineResult, Target, Targets, TextureId,
};

pub type Log = Rc<RefCell<Vec<String>>>;

/// Pass-through filter that records every frame and notice it sees.
#[derive(Clone)]
pub struct Recorder {
    type_name: String,
    parameters: Parameters,
    copyable: bool,
    log: Log,
    targets: Targets,
}

impl Recorder {
    pub fn new(type_name: &str, parameters: Parameters, log: &Log) -> Self {
        Self {
            type_name: type_name.to_string(),
            parameters,
            copyable: true,
            log: log.clone(),
            targets: Targets::new(),
        }
    }

    pub fn handle(type_name: &str, log: &Log) -> NodeHandle {
        NodeHandle::new(Self::new(type_name, Parameters::new(), log))
    }

    /// Recorder that refuses to be duplicated.
    pub fn pinned(type_name: &str, log: &Log) -> NodeHandle {
        NodeHandle::new(Self {
            copyable: false,
            ..Self::new(type_name, Parameters::new(), log)
        })
    }
}

impl Node for Recorder {
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
        if !self.copyable {
            return None;
        }
        Some(NodeHandle::new(Self {
            targets: Targets::new(),
            ..self.clone()
        }))
    }
}

impl Output for Recorder {
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

impl Input for Recorder {
    fn new_frame_ready(&mut self, frame: &Frame, _input_index: usize) -> PipelineResult<()> {
        self.log.borrow_mut().push(self.type_name.clone());
        self.targets.push_frame(frame)
    }

    fn notify(&mut self, _notice: &Notice, _input_index: usize) -> PipelineResult<()> {
        self.log.borrow_mut().push(format!("{}!", self.type_name));
        Ok(())
    }
}

/// Built-in registry plus recording constructors for `types`.
pub fn registry(types: &[&'static str], log: &Log) -> NodeRegistry {
    let mut registry = NodeRegistry::with_builtins();
    for &type_name in types {
        let log = log.clone();
        registry
            .register(type_name, move |params, _| {
                Ok(NodeHandle::new(Recorder::new(type_name, params.clone(), &log)))
            })
            .unwrap();
    }
    registry
}

pub fn frame(index: u64) -> Frame {
    Frame::new(
        FrameIndex(index),
        FrameSize::new(16, 16).unwrap(),
        TextureId(index),
    )
}

/// Push one frame into `head` and return what the recorders saw.
pub fn run(head: &NodeHandle, log: &Log) -> Vec<String> {
    log.borrow_mut().clear();
    head.push_frame(&frame(0), 0).unwrap();
    log.borrow().clone()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
