use std::{cell::OnceCell, collections::VecDeque};

use crate::{
    foundation::core::{Frame, Notice},
    foundation::error::{PipelineError, PipelineResult},
    node::capability::{Input, Node, Output, ParameterSpec, Parameters},
    node::handle::{NodeHandle, Target},
    node::registry::NodeFactory,
    node::targets::Targets,
    pipeline::representation::{GroupRepresentation, ItemRepresentation, LinkRepresentation},
};

/// Type identifier groups use in representations.
pub const GROUP_TYPE: &str = "FilterGroup";

/// Tunable parameter of one group member, as shown by a host editor.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ParameterDescription {
    /// Position of the member in the group's filters.
    pub filter_index: usize,
    /// Type identifier of the member.
    pub filter_type: String,
    /// The parameter itself.
    #[serde(flatten)]
    pub spec: ParameterSpec,
}

/// Sub-graph of filters with declared entry nodes and one exit node.
///
/// The client wires the members (see [`NodeHandle::link`]) and designates the initial filters and
/// the terminal filter. Those designations are plain assignments; the invariants below are
/// checked at first use as a node, i.e. when the group is composed into a container, receives a
/// frame or a notice, or when [`Group::validate`] is called:
///
/// - the terminal filter is a member and implements [`Output`];
/// - there is at least one initial filter, each a member implementing [`Input`];
/// - interior members implement both capabilities;
/// - every member, the terminal filter included, is reachable from the initial filters through
///   member links.
#[derive(Debug)]
pub struct Group {
    name: String,
    filters: Vec<NodeHandle>,
    initial_filters: Vec<NodeHandle>,
    terminal_filter: Option<NodeHandle>,
    input_filter_to_ignore_for_updates: Option<NodeHandle>,
    parameters_descriptions: OnceCell<Vec<ParameterDescription>>,
    targets: Targets,
    attached_terminal: Option<NodeHandle>,
    checked: bool,
}

impl Default for Group {
    fn default() -> Self {
        Self::named(GROUP_TYPE)
    }
}

impl Group {
    /// Empty group labelled [`GROUP_TYPE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty group labelled `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            initial_filters: Vec::new(),
            terminal_filter: None,
            input_filter_to_ignore_for_updates: None,
            parameters_descriptions: OnceCell::new(),
            targets: Targets::new(),
            attached_terminal: None,
            checked: false,
        }
    }

    /// Group named `name` with `filters` added in order.
    pub fn with_filters(
        name: impl Into<String>,
        filters: impl IntoIterator<Item = NodeHandle>,
    ) -> PipelineResult<Self> {
        let mut group = Self::named(name);
        for f in filters {
            group.add_filter(f)?;
        }
        Ok(group)
    }

    /// Rebuild a group from its dynamic representation (see [`GroupRepresentation`]).
    ///
    /// The rebuilt group is validated.
    pub fn from_representation(
        repr: &serde_json::Value,
        factory: &dyn NodeFactory,
    ) -> PipelineResult<Self> {
        GroupRepresentation::from_value(repr)?.instantiate(factory)
    }

    /// Add `members` in order, then restore the links and roles described by `repr`.
    ///
    /// Indices in `repr` must already be checked against `members`.
    pub(crate) fn assemble(
        name: String,
        members: Vec<NodeHandle>,
        repr: &GroupRepresentation,
    ) -> PipelineResult<Self> {
        let mut group = Self::with_filters(name, members)?;
        for link in &repr.links {
            let from = group.filter_at_index(link.from)?;
            let to = group.filter_at_index(link.to)?;
            if !from.inspect()?.output || !to.inspect()?.input {
                return Err(PipelineError::invalid_topology(format!(
                    "group '{}' cannot link member {} to member {}",
                    group.name, link.from, link.to
                )));
            }
            from.attach(&to, link.input_index);
        }
        let initial = repr
            .initial_filters
            .iter()
            .map(|&i| group.filter_at_index(i))
            .collect::<PipelineResult<Vec<_>>>()?;
        let terminal = repr
            .terminal_filter
            .map(|i| group.filter_at_index(i))
            .transpose()?;
        let ignored = repr
            .input_filter_to_ignore_for_updates
            .map(|i| group.filter_at_index(i))
            .transpose()?;
        group.initial_filters = initial;
        group.terminal_filter = terminal;
        group.input_filter_to_ignore_for_updates = ignored;
        Ok(group)
    }

    /// Copy with duplicated members, linked and designated like the original.
    ///
    /// The copy has no external consumers. Fails with [`PipelineError::InvalidCapability`] if a
    /// member cannot be duplicated.
    pub fn try_clone(&self) -> PipelineResult<Self> {
        let members = self
            .filters
            .iter()
            .map(NodeHandle::duplicate)
            .collect::<PipelineResult<Vec<_>>>()?;
        Self::assemble(self.name.clone(), members, &self.representation())
    }

    /// Declarative description of the members, their links and the designated roles.
    ///
    /// Designations pointing outside the group are left out.
    pub fn representation(&self) -> GroupRepresentation {
        let index = |node: &NodeHandle| self.index_of(node);
        GroupRepresentation {
            name: self.name.clone(),
            filters: self
                .filters
                .iter()
                .map(|f| ItemRepresentation::new(f.type_name(), f.parameters()))
                .collect(),
            links: self.member_links(),
            initial_filters: self.initial_filters.iter().filter_map(index).collect(),
            terminal_filter: self.terminal_filter.as_ref().and_then(index),
            input_filter_to_ignore_for_updates: self
                .input_filter_to_ignore_for_updates
                .as_ref()
                .and_then(index),
        }
    }

    /// Group label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a member.
    ///
    /// The node must implement at least one of [`Output`] and [`Input`]; the requirements of the
    /// role it ends up playing are checked at first use.
    pub fn add_filter(&mut self, node: NodeHandle) -> PipelineResult<()> {
        if self.contains(&node) {
            return Err(PipelineError::invalid_topology(format!(
                "node '{}' is already in group '{}'",
                node.type_name(),
                self.name
            )));
        }
        let caps = node.inspect()?;
        if caps.none() {
            return Err(PipelineError::invalid_capability(format!(
                "node '{}' implements neither Output nor Input",
                node.type_name()
            )));
        }
        self.filters.push(node);
        self.parameters_descriptions = OnceCell::new();
        self.checked = false;
        Ok(())
    }

    /// Member at `index` in insertion order.
    pub fn filter_at_index(&self, index: usize) -> PipelineResult<NodeHandle> {
        self.filters
            .get(index)
            .cloned()
            .ok_or_else(|| PipelineError::index_out_of_range(index, self.filters.len()))
    }

    /// Members in insertion order.
    pub fn filters(&self) -> &[NodeHandle] {
        &self.filters
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether `node` is a member.
    pub fn contains(&self, node: &NodeHandle) -> bool {
        self.index_of(node).is_some()
    }

    /// Position of `node` among the members.
    pub fn index_of(&self, node: &NodeHandle) -> Option<usize> {
        self.filters.iter().position(|f| f.ptr_eq(node))
    }

    /// Node whose output is the group's output.
    pub fn terminal_filter(&self) -> Option<&NodeHandle> {
        self.terminal_filter.as_ref()
    }

    /// Designate the exit node.
    pub fn set_terminal_filter(&mut self, node: NodeHandle) {
        self.terminal_filter = Some(node);
        self.checked = false;
    }

    /// Nodes receiving the group's input, in delivery order.
    pub fn initial_filters(&self) -> &[NodeHandle] {
        &self.initial_filters
    }

    /// Designate the entry nodes.
    pub fn set_initial_filters(&mut self, nodes: Vec<NodeHandle>) {
        self.initial_filters = nodes;
        self.checked = false;
    }

    /// Member left out of notice propagation.
    pub fn input_filter_to_ignore_for_updates(&self) -> Option<&NodeHandle> {
        self.input_filter_to_ignore_for_updates.as_ref()
    }

    /// Leave `node` out of notice propagation, typically because its real upstream lies outside
    /// the group. `None` clears the designation.
    pub fn set_input_filter_to_ignore_for_updates(&mut self, node: Option<NodeHandle>) {
        self.input_filter_to_ignore_for_updates = node;
    }

    /// Tunable parameters of every member, in member order. Built once per member set.
    pub fn parameters_descriptions(&self) -> &[ParameterDescription] {
        self.parameters_descriptions.get_or_init(|| {
            self.filters
                .iter()
                .enumerate()
                .flat_map(|(filter_index, f)| {
                    let (filter_type, specs) = {
                        let node = f.borrow();
                        (node.type_name().to_string(), node.parameter_specs())
                    };
                    specs
                        .into_iter()
                        .map(|spec| ParameterDescription {
                            filter_index,
                            filter_type: filter_type.clone(),
                            spec,
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        })
    }

    /// Check the group invariants now.
    #[tracing::instrument(skip(self), fields(group = %self.name, filters = self.filters.len()))]
    pub fn validate(&self) -> PipelineResult<()> {
        let Some(terminal) = &self.terminal_filter else {
            return Err(PipelineError::invalid_topology(format!(
                "group '{}' has no terminal filter",
                self.name
            )));
        };
        if !self.contains(terminal) {
            return Err(PipelineError::invalid_topology(format!(
                "terminal filter of group '{}' is not a member",
                self.name
            )));
        }
        if self.initial_filters.is_empty() {
            return Err(PipelineError::invalid_topology(format!(
                "group '{}' has no initial filters",
                self.name
            )));
        }
        if let Some(pos) = self.initial_filters.iter().position(|f| !self.contains(f)) {
            return Err(PipelineError::invalid_topology(format!(
                "initial filter {pos} of group '{}' is not a member",
                self.name
            )));
        }

        for (i, f) in self.filters.iter().enumerate() {
            let caps = f.inspect()?;
            let is_initial = self.initial_filters.iter().any(|n| n.ptr_eq(f));
            let is_terminal = terminal.ptr_eq(f);
            if is_initial && !caps.input {
                return Err(PipelineError::invalid_topology(format!(
                    "initial filter '{}' does not implement Input",
                    f.type_name()
                )));
            }
            if is_terminal && !caps.output {
                return Err(PipelineError::invalid_topology(format!(
                    "terminal filter '{}' does not implement Output",
                    f.type_name()
                )));
            }
            if !is_initial && !is_terminal && !caps.both() {
                return Err(PipelineError::invalid_topology(format!(
                    "interior member {i} ('{}') must implement Output and Input",
                    f.type_name()
                )));
            }
        }

        let reachable = self.reachable_members(0);
        let is_reachable = |node: &NodeHandle| reachable.iter().any(|t| t.node.ptr_eq(node));
        if !is_reachable(terminal) {
            return Err(PipelineError::invalid_topology(format!(
                "terminal filter of group '{}' is not reachable from the initial filters",
                self.name
            )));
        }
        if let Some((i, f)) = self.filters.iter().enumerate().find(|(_, f)| !is_reachable(f)) {
            return Err(PipelineError::invalid_topology(format!(
                "member {i} ('{}') of group '{}' is not reachable from the initial filters",
                f.type_name(),
                self.name
            )));
        }
        Ok(())
    }

    fn member_links(&self) -> Vec<LinkRepresentation> {
        let mut links = Vec::new();
        for (from, f) in self.filters.iter().enumerate() {
            for t in f.targets() {
                if let Some(to) = self.index_of(&t.node) {
                    links.push(LinkRepresentation {
                        from,
                        to,
                        input_index: t.input_index,
                    });
                }
            }
        }
        links
    }

    /// Members reachable from the initial filters, breadth first, each once.
    ///
    /// Initial filters are reported on `input_index`; other members on the slot of the link they
    /// were first reached through.
    fn reachable_members(&self, input_index: usize) -> Vec<Target> {
        let mut seen: Vec<Target> = Vec::new();
        let mut queue: VecDeque<Target> = self
            .initial_filters
            .iter()
            .map(|n| Target {
                node: n.clone(),
                input_index,
            })
            .collect();
        while let Some(next) = queue.pop_front() {
            if seen.iter().any(|t| t.node.ptr_eq(&next.node)) {
                continue;
            }
            for t in next.node.targets() {
                if self.contains(&t.node) {
                    queue.push_back(t);
                }
            }
            seen.push(next);
        }
        seen
    }

    /// Check invariants once per change and keep recorded targets on the current terminal.
    fn ensure_usable(&mut self) -> PipelineResult<NodeHandle> {
        if !self.checked {
            self.validate()?;
            self.checked = true;
        }
        let terminal = self.terminal_filter.clone().ok_or_else(|| {
            PipelineError::invalid_topology(format!(
                "group '{}' has no terminal filter",
                self.name
            ))
        })?;
        let stale = self
            .attached_terminal
            .as_ref()
            .is_none_or(|t| !t.ptr_eq(&terminal));
        if stale {
            if let Some(old) = self.attached_terminal.take() {
                for t in self.targets.iter() {
                    old.detach(&t.node);
                }
            }
            for t in self.targets.iter() {
                terminal.attach(&t.node, t.input_index);
            }
            tracing::debug!(group = %self.name, targets = self.targets.len(), "group output bound to terminal filter");
            self.attached_terminal = Some(terminal.clone());
        }
        Ok(terminal)
    }
}

impl Node for Group {
    fn type_name(&self) -> &str {
        GROUP_TYPE
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
        self.parameters_descriptions()
            .iter()
            .map(|d| {
                let name = format!("{}.{}", d.filter_index, d.spec.name);
                d.spec.clone().renamed(name)
            })
            .collect()
    }

    fn duplicate(&self) -> Option<NodeHandle> {
        match self.try_clone() {
            Ok(copy) => Some(NodeHandle::new(copy)),
            Err(err) => {
                tracing::debug!(group = %self.name, %err, "group not duplicated");
                None
            }
        }
    }

    fn ensure_ready(&self) -> PipelineResult<()> {
        self.validate()
    }
}

impl Output for Group {
    fn add_target(&mut self, target: NodeHandle, input_index: usize) {
        self.targets.add(target.clone(), input_index);
        match self.ensure_usable() {
            Ok(terminal) => terminal.attach(&target, input_index),
            Err(err) => {
                tracing::debug!(group = %self.name, %err, "group target recorded, attachment deferred")
            }
        }
    }

    fn remove_target(&mut self, target: &NodeHandle) {
        if self.targets.remove(target).is_some()
            && let Some(terminal) = &self.attached_terminal
        {
            terminal.detach(target);
        }
    }

    fn remove_all_targets(&mut self) {
        if let Some(terminal) = &self.attached_terminal {
            for t in self.targets.iter() {
                terminal.detach(&t.node);
            }
        }
        self.targets.clear();
    }

    fn targets(&self) -> Vec<Target> {
        self.targets.to_vec()
    }
}

impl Input for Group {
    fn next_available_input_index(&self) -> usize {
        self.initial_filters
            .first()
            .map(NodeHandle::next_input_index)
            .unwrap_or(0)
    }

    fn new_frame_ready(&mut self, frame: &Frame, input_index: usize) -> PipelineResult<()> {
        self.ensure_usable()?;
        tracing::trace!(group = %self.name, frame = frame.index.0, "frame enters group");
        for f in &self.initial_filters {
            f.push_frame(frame, input_index)?;
        }
        Ok(())
    }

    fn notify(&mut self, notice: &Notice, input_index: usize) -> PipelineResult<()> {
        self.ensure_usable()?;
        let ignored = self.input_filter_to_ignore_for_updates.as_ref();
        for t in self.reachable_members(input_index) {
            if ignored.is_some_and(|n| n.ptr_eq(&t.node)) {
                continue;
            }
            t.node.push_notice(notice, t.input_index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/group.rs"]
mod tests;
