use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use crate::{
    foundation::core::{Frame, Notice},
    foundation::error::{PipelineError, PipelineResult},
    node::capability::{Capabilities, Node, Parameters},
};

/// Shared, single-thread handle to a pipeline node.
///
/// Containers hold clones of the handle, never the node itself, so a node stays alive for as long
/// as any chain, group or caller references it. Identity is pointer identity.
#[derive(Clone)]
pub struct NodeHandle(Rc<RefCell<dyn Node>>);

/// A downstream consumer together with the input slot it receives frames on.
#[derive(Clone, Debug)]
pub struct Target {
    /// Downstream node.
    pub node: NodeHandle,
    /// Input slot on `node`.
    pub input_index: usize,
}

impl NodeHandle {
    /// Wrap a node in a fresh handle.
    pub fn new<N: Node + 'static>(node: N) -> Self {
        Self(Rc::new(RefCell::new(node)))
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &NodeHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the node.
    ///
    /// Panics if the node is mutably borrowed, i.e. while it is processing a frame.
    pub fn borrow(&self) -> Ref<'_, dyn Node> {
        self.0.borrow()
    }

    /// Mutably borrow the node.
    ///
    /// Panics if the node is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Node> {
        self.0.borrow_mut()
    }

    /// Number of handles sharing this node.
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Type identifier of the node.
    pub fn type_name(&self) -> String {
        self.0.borrow().type_name().to_string()
    }

    /// Parameter state of the node, empty when it cannot describe itself.
    pub fn parameters(&self) -> Parameters {
        self.0.borrow().parameters().unwrap_or_default()
    }

    /// Check that the node is ready for composition and report its capabilities.
    ///
    /// A node that is currently borrowed (for example a chain asked to contain itself) is rejected
    /// instead of panicking.
    pub fn inspect(&self) -> PipelineResult<Capabilities> {
        let node = self.0.try_borrow().map_err(|_| {
            PipelineError::invalid_topology("node is in use; pipelines must be acyclic")
        })?;
        node.ensure_ready()?;
        Ok(node.capabilities())
    }

    /// Independent, unwired copy of the node.
    ///
    /// Fails with [`PipelineError::InvalidCapability`] when the node does not support copying.
    pub fn duplicate(&self) -> PipelineResult<NodeHandle> {
        let node = self.0.try_borrow().map_err(|_| {
            PipelineError::invalid_topology("node is in use; pipelines must be acyclic")
        })?;
        node.duplicate().ok_or_else(|| {
            PipelineError::invalid_capability(format!(
                "node '{}' cannot be duplicated",
                node.type_name()
            ))
        })
    }

    /// Fail instead of panicking if the node cannot be mutably borrowed right now.
    pub(crate) fn ensure_free(&self) -> PipelineResult<()> {
        self.0.try_borrow_mut().map(|_| ()).map_err(|_| {
            PipelineError::invalid_topology("node is in use; pipelines must be acyclic")
        })
    }

    /// Wire this node's output to `downstream`'s next available input.
    ///
    /// Used to build group interiors by hand. Linking an already linked pair is a no-op.
    pub fn link(&self, downstream: &NodeHandle) -> PipelineResult<()> {
        if self.ptr_eq(downstream) {
            return Err(PipelineError::invalid_topology(
                "a node cannot target itself",
            ));
        }
        if !self.inspect()?.output {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' does not implement Output",
                self.type_name()
            )));
        }
        if !downstream.inspect()?.input {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' does not implement Input",
                downstream.type_name()
            )));
        }
        let input_index = downstream.next_input_index();
        self.attach(downstream, input_index);
        Ok(())
    }

    /// Remove the link to `downstream`. Returns whether a link existed.
    pub fn unlink(&self, downstream: &NodeHandle) -> bool {
        self.detach(downstream).is_some()
    }

    /// Targets attached to this node's output (empty without [`crate::Output`]).
    pub fn targets(&self) -> Vec<Target> {
        self.0
            .borrow()
            .as_output()
            .map(|out| out.targets())
            .unwrap_or_default()
    }

    /// Input slot the next upstream should use.
    pub fn next_input_index(&self) -> usize {
        self.0
            .borrow()
            .as_input()
            .map(|input| input.next_available_input_index())
            .unwrap_or(0)
    }

    /// Deliver a frame to this node's input.
    pub fn push_frame(&self, frame: &Frame, input_index: usize) -> PipelineResult<()> {
        let mut node = self.0.try_borrow_mut().map_err(|_| {
            PipelineError::invalid_topology(
                "frame re-entered a node that is still processing; pipelines must be acyclic",
            )
        })?;
        if let Some(input) = node.as_input_mut() {
            return input.new_frame_ready(frame, input_index);
        }
        Err(PipelineError::invalid_topology(format!(
            "node '{}' does not implement Input",
            node.type_name()
        )))
    }

    /// Deliver a notice to this node's input. Nodes without [`crate::Input`] are skipped.
    pub fn push_notice(&self, notice: &Notice, input_index: usize) -> PipelineResult<()> {
        let mut node = self.0.try_borrow_mut().map_err(|_| {
            PipelineError::invalid_topology(
                "notice re-entered a node that is still processing; pipelines must be acyclic",
            )
        })?;
        match node.as_input_mut() {
            Some(input) => input.notify(notice, input_index),
            None => Ok(()),
        }
    }

    pub(crate) fn attach(&self, target: &NodeHandle, input_index: usize) {
        let mut node = self.0.borrow_mut();
        if let Some(out) = node.as_output_mut() {
            if !out.targets().iter().any(|t| t.node.ptr_eq(target)) {
                out.add_target(target.clone(), input_index);
            }
            return;
        }
        tracing::warn!(node = node.type_name(), "attach skipped: node has no Output");
    }

    pub(crate) fn detach(&self, target: &NodeHandle) -> Option<usize> {
        let mut node = self.0.borrow_mut();
        let out = node.as_output_mut()?;
        let input_index = out
            .targets()
            .into_iter()
            .find(|t| t.node.ptr_eq(target))
            .map(|t| t.input_index)?;
        out.remove_target(target);
        Some(input_index)
    }
}

impl<N: Node + 'static> From<Rc<RefCell<N>>> for NodeHandle {
    fn from(node: Rc<RefCell<N>>) -> Self {
        Self(node)
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(node) => write!(f, "NodeHandle({} @ {:p})", node.type_name(), Rc::as_ptr(&self.0)),
            Err(_) => write!(f, "NodeHandle(<in use> @ {:p})", Rc::as_ptr(&self.0)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/handle.rs"]
mod tests;
