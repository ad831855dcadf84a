use crate::{
    foundation::core::{Frame, Notice},
    foundation::error::PipelineResult,
    node::handle::{NodeHandle, Target},
};

/// Downstream list that node implementors embed to back their [`crate::Output`].
///
/// Targets keep attachment order, and a node is attached at most once.
#[derive(Clone, Debug, Default)]
pub struct Targets {
    entries: Vec<Target>,
}

impl Targets {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `node` on `input_index`. Attaching an already attached node is ignored.
    pub fn add(&mut self, node: NodeHandle, input_index: usize) {
        if self.contains(&node) {
            return;
        }
        self.entries.push(Target { node, input_index });
    }

    /// Detach `node`, returning the input index it was attached on.
    pub fn remove(&mut self, node: &NodeHandle) -> Option<usize> {
        let pos = self.entries.iter().position(|t| t.node.ptr_eq(node))?;
        Some(self.entries.remove(pos).input_index)
    }

    /// Detach everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `node` is attached.
    pub fn contains(&self, node: &NodeHandle) -> bool {
        self.entries.iter().any(|t| t.node.ptr_eq(node))
    }

    /// Input index `node` is attached on.
    pub fn input_index_of(&self, node: &NodeHandle) -> Option<usize> {
        self.entries
            .iter()
            .find(|t| t.node.ptr_eq(node))
            .map(|t| t.input_index)
    }

    /// Number of attached targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no target is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate targets in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.entries.iter()
    }

    /// Owned snapshot, as returned by [`crate::Output::targets`].
    pub fn to_vec(&self) -> Vec<Target> {
        self.entries.clone()
    }

    /// Push `frame` to every target in attachment order, stopping at the first error.
    pub fn push_frame(&self, frame: &Frame) -> PipelineResult<()> {
        for t in &self.entries {
            t.node.push_frame(frame, t.input_index)?;
        }
        Ok(())
    }

    /// Push `notice` to every target in attachment order.
    ///
    /// For sources at the edge of a pipeline; nodes inside a container leave notice delivery to
    /// the container.
    pub fn push_notice(&self, notice: &Notice) -> PipelineResult<()> {
        for t in &self.entries {
            t.node.push_notice(notice, t.input_index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/targets.rs"]
mod tests;
