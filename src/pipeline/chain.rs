use std::path::Path;

use crate::{
    foundation::core::{Frame, Notice},
    foundation::error::{PipelineError, PipelineResult},
    node::capability::{Input, Node, Output, ParameterSpec, Parameters},
    node::handle::{NodeHandle, Target},
    node::registry::NodeFactory,
    node::targets::Targets,
    pipeline::representation::{ChainRepresentation, ItemRepresentation, LoadOpts},
};

/// Type identifier chains use in representations.
pub const CHAIN_TYPE: &str = "Chain";

/// Ordered, named sequence of nodes wired output-to-input.
///
/// Outside of a call, `items[i]` always targets `items[i + 1]`. The chain is a node itself: its
/// input is `items[0]`'s input and its output is `items[last]`'s output. Consumers attached to the
/// chain are recorded so they follow whichever item is last after a mutation.
#[derive(Debug)]
pub struct Chain {
    name: String,
    items: Vec<NodeHandle>,
    targets: Targets,
}

impl Chain {
    /// Build a chain and wire each adjacent pair.
    ///
    /// Every item but the last must implement [`Output`] and every item but the first must
    /// implement [`Input`]. A node may appear only once. Links that already exist are kept as
    /// they are.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn new(name: impl Into<String>, items: Vec<NodeHandle>) -> PipelineResult<Self> {
        check_sequence(&items)?;
        let chain = Self {
            name: name.into(),
            items,
            targets: Targets::new(),
        };
        chain.wire_items();
        Ok(chain)
    }

    /// Empty chain.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            targets: Targets::new(),
        }
    }

    /// Rebuild a chain from its dynamic representation, rejecting unknown types.
    pub fn from_representation(
        repr: &serde_json::Value,
        factory: &dyn NodeFactory,
    ) -> PipelineResult<Self> {
        Self::from_representation_with_opts(repr, factory, &LoadOpts::default())
    }

    /// Rebuild a chain from its dynamic representation.
    pub fn from_representation_with_opts(
        repr: &serde_json::Value,
        factory: &dyn NodeFactory,
        opts: &LoadOpts,
    ) -> PipelineResult<Self> {
        ChainRepresentation::from_value(repr)?.instantiate(factory, opts)
    }

    /// Rebuild a chain from a JSON string.
    pub fn from_json_str(s: &str, factory: &dyn NodeFactory) -> PipelineResult<Self> {
        ChainRepresentation::from_json_str(s)?.instantiate(factory, &LoadOpts::default())
    }

    /// Rebuild a chain from a JSON file.
    pub fn from_path(
        path: impl AsRef<Path>,
        factory: &dyn NodeFactory,
        opts: &LoadOpts,
    ) -> PipelineResult<Self> {
        ChainRepresentation::from_path(path)?.instantiate(factory, opts)
    }

    /// Chain label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the chain.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the chain has no items (and so no external input or output).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in wiring order.
    pub fn items(&self) -> &[NodeHandle] {
        &self.items
    }

    /// Item at `index`.
    pub fn item_at(&self, index: usize) -> PipelineResult<&NodeHandle> {
        self.items
            .get(index)
            .ok_or_else(|| PipelineError::index_out_of_range(index, self.items.len()))
    }

    /// Position of `node` in the chain.
    pub fn position_of(&self, node: &NodeHandle) -> Option<usize> {
        self.items.iter().position(|n| n.ptr_eq(node))
    }

    /// Item type identifiers in order.
    pub fn type_names(&self) -> Vec<String> {
        self.items.iter().map(NodeHandle::type_name).collect()
    }

    /// Insert `node` at `index` (`0..=len`) and splice it into the wiring.
    ///
    /// Capabilities of the new node and of the neighbours whose role changes are checked before
    /// any link is touched, so a failed insert leaves the chain as it was.
    #[tracing::instrument(skip(self, node), fields(chain = %self.name, node = ?node))]
    pub fn insert_filter(&mut self, node: NodeHandle, index: usize) -> PipelineResult<()> {
        let len = self.items.len();
        if index > len {
            return Err(PipelineError::index_out_of_range(index, len));
        }
        if self.position_of(&node).is_some() {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' is already in chain '{}'",
                node.type_name(),
                self.name
            )));
        }

        let caps = node.inspect()?;
        let feeds_downstream = index < len || !self.targets.is_empty();
        if feeds_downstream && !caps.output {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' must implement Output at index {index}",
                node.type_name()
            )));
        }
        if index > 0 && !caps.input {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' must implement Input at index {index}",
                node.type_name()
            )));
        }
        if index == 0 && len > 0 && !self.items[0].inspect()?.input {
            return Err(PipelineError::invalid_topology(format!(
                "current head '{}' does not implement Input",
                self.items[0].type_name()
            )));
        }
        if index == len && len > 0 && !self.items[len - 1].inspect()?.output {
            return Err(PipelineError::invalid_topology(format!(
                "current tail '{}' does not implement Output",
                self.items[len - 1].type_name()
            )));
        }

        let upstream = index.checked_sub(1).map(|i| self.items[i].clone());
        let downstream = self.items.get(index).cloned();
        for n in [Some(&node), upstream.as_ref(), downstream.as_ref()]
            .into_iter()
            .flatten()
        {
            n.ensure_free()?;
        }
        match (&upstream, &downstream) {
            (Some(up), Some(down)) => {
                let input_index = up
                    .detach(down)
                    .unwrap_or_else(|| down.next_input_index());
                node.attach(down, input_index);
                up.attach(&node, node.next_input_index());
            }
            (Some(up), None) => {
                self.move_targets(Some(up), Some(&node));
                up.attach(&node, node.next_input_index());
            }
            (None, Some(down)) => {
                node.attach(down, down.next_input_index());
            }
            (None, None) => self.move_targets(None, Some(&node)),
        }
        self.items.insert(index, node);
        tracing::debug!(len = self.items.len(), "filter inserted");
        Ok(())
    }

    /// Remove `node`, expected at `index`, and reconnect its neighbours.
    ///
    /// Returns the removed handle, detached from its in-chain downstream and from the chain's
    /// external consumers. Fails with [`PipelineError::NodeMismatch`] if a different node occupies
    /// `index`.
    #[tracing::instrument(skip(self, node), fields(chain = %self.name, node = ?node))]
    pub fn remove_filter(&mut self, node: &NodeHandle, index: usize) -> PipelineResult<NodeHandle> {
        let len = self.items.len();
        if index >= len {
            return Err(PipelineError::index_out_of_range(index, len));
        }
        if !self.items[index].ptr_eq(node) {
            return Err(PipelineError::NodeMismatch { index });
        }
        let upstream = index.checked_sub(1).map(|i| self.items[i].clone());
        let downstream = self.items.get(index + 1).cloned();
        for n in [Some(node), upstream.as_ref(), downstream.as_ref()]
            .into_iter()
            .flatten()
        {
            n.ensure_free()?;
        }

        let removed = self.items.remove(index);
        match (&upstream, &downstream) {
            (Some(up), Some(down)) => {
                up.detach(&removed);
                let input_index = removed
                    .detach(down)
                    .unwrap_or_else(|| down.next_input_index());
                up.attach(down, input_index);
            }
            (Some(up), None) => {
                up.detach(&removed);
                self.move_targets(Some(&removed), Some(up));
            }
            (None, Some(down)) => {
                removed.detach(down);
            }
            (None, None) => self.move_targets(Some(&removed), None),
        }
        tracing::debug!(len = self.items.len(), "filter removed");
        Ok(removed)
    }

    /// Declarative description of the current structure.
    ///
    /// Items that cannot describe themselves contribute an empty parameter map.
    pub fn representation(&self) -> ChainRepresentation {
        ChainRepresentation {
            name: self.name.clone(),
            items: self
                .items
                .iter()
                .map(|n| ItemRepresentation::new(n.type_name(), n.parameters()))
                .collect(),
        }
    }

    /// Pretty-printed JSON of [`Chain::representation`].
    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        self.representation().to_json_pretty()
    }

    /// Copy with a new item sequence.
    ///
    /// Every item is copied through [`Node::duplicate`] and the copies are wired among
    /// themselves, so mutating the copy never touches the original's links. The copy has no
    /// external consumers. Fails with [`PipelineError::InvalidCapability`] if an item cannot be
    /// duplicated.
    pub fn try_clone(&self) -> PipelineResult<Self> {
        let items = self
            .items
            .iter()
            .map(NodeHandle::duplicate)
            .collect::<PipelineResult<Vec<_>>>()?;
        let copy = Self {
            name: self.name.clone(),
            items,
            targets: Targets::new(),
        };
        copy.wire_items();
        Ok(copy)
    }

    fn wire_items(&self) {
        for pair in self.items.windows(2) {
            pair[0].attach(&pair[1], pair[1].next_input_index());
        }
        tracing::debug!(chain = %self.name, items = self.items.len(), "chain wired");
    }

    fn move_targets(&self, from: Option<&NodeHandle>, to: Option<&NodeHandle>) {
        for t in self.targets.iter() {
            if let Some(from) = from {
                from.detach(&t.node);
            }
            if let Some(to) = to {
                to.attach(&t.node, t.input_index);
            }
        }
    }

    fn link_index(&self, position: usize) -> Option<usize> {
        let up = self.items.get(position.checked_sub(1)?)?;
        let down = &self.items[position];
        up.targets()
            .into_iter()
            .find(|t| t.node.ptr_eq(down))
            .map(|t| t.input_index)
    }
}

impl Node for Chain {
    fn type_name(&self) -> &str {
        CHAIN_TYPE
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
        match self.representation().to_value() {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    fn parameter_specs(&self) -> Vec<ParameterSpec> {
        self.items
            .iter()
            .enumerate()
            .flat_map(|(i, n)| {
                n.borrow()
                    .parameter_specs()
                    .into_iter()
                    .map(move |spec| {
                        let name = format!("{i}.{}", spec.name);
                        spec.renamed(name)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn duplicate(&self) -> Option<NodeHandle> {
        match self.try_clone() {
            Ok(copy) => Some(NodeHandle::new(copy)),
            Err(err) => {
                tracing::debug!(chain = %self.name, %err, "chain not duplicated");
                None
            }
        }
    }
}

impl Output for Chain {
    fn add_target(&mut self, target: NodeHandle, input_index: usize) {
        if let Some(last) = self.items.last() {
            last.attach(&target, input_index);
        }
        self.targets.add(target, input_index);
    }

    fn remove_target(&mut self, target: &NodeHandle) {
        if self.targets.remove(target).is_some()
            && let Some(last) = self.items.last()
        {
            last.detach(target);
        }
    }

    fn remove_all_targets(&mut self) {
        self.move_targets(self.items.last(), None);
        self.targets.clear();
    }

    fn targets(&self) -> Vec<Target> {
        self.targets.to_vec()
    }
}

impl Input for Chain {
    fn next_available_input_index(&self) -> usize {
        self.items
            .first()
            .map(NodeHandle::next_input_index)
            .unwrap_or(0)
    }

    fn new_frame_ready(&mut self, frame: &Frame, input_index: usize) -> PipelineResult<()> {
        let Some(head) = self.items.first() else {
            return Err(PipelineError::invalid_topology(format!(
                "chain '{}' is empty and has no input",
                self.name
            )));
        };
        tracing::trace!(chain = %self.name, frame = frame.index.0, "frame enters chain");
        head.push_frame(frame, input_index)
    }

    fn notify(&mut self, notice: &Notice, input_index: usize) -> PipelineResult<()> {
        for (i, item) in self.items.iter().enumerate() {
            let slot = if i == 0 {
                input_index
            } else {
                self.link_index(i).unwrap_or(0)
            };
            item.push_notice(notice, slot)?;
        }
        Ok(())
    }
}

fn check_sequence(items: &[NodeHandle]) -> PipelineResult<()> {
    let last = items.len().saturating_sub(1);
    for (i, item) in items.iter().enumerate() {
        let caps = item.inspect()?;
        if items[..i].iter().any(|prev| prev.ptr_eq(item)) {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' appears more than once",
                item.type_name()
            )));
        }
        if i < last && !caps.output {
            return Err(PipelineError::invalid_topology(format!(
                "item {i} ('{}') must implement Output",
                item.type_name()
            )));
        }
        if i > 0 && !caps.input {
            return Err(PipelineError::invalid_topology(format!(
                "item {i} ('{}') must implement Input",
                item.type_name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/chain.rs"]
mod tests;
