use std::{fs::File, io::BufReader, path::Path};

use crate::{
    foundation::error::{PipelineError, PipelineResult},
    node::capability::Parameters,
    node::registry::{NodeFactory, PlaceholderFactory},
    pipeline::chain::Chain,
    pipeline::group::{GROUP_TYPE, Group},
};

/// Declarative description of a chain: its name and the ordered item types with their parameters.
///
/// JSON shape:
///
/// ```json
/// { "name": "C1", "items": [ { "type": "Blur", "parameters": { "radius": 2 } } ] }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChainRepresentation {
    /// Chain label.
    pub name: String,
    /// Items in wiring order.
    pub items: Vec<ItemRepresentation>,
}

/// One chain item: a type identifier plus opaque parameter state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemRepresentation {
    /// Type identifier resolved by the node factory.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Parameters forwarded verbatim to the factory. May be omitted on input.
    #[serde(default)]
    pub parameters: Parameters,
}

/// What to do with item types the factory does not know.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Fail with [`PipelineError::MalformedRepresentation`].
    #[default]
    Reject,
    /// Load the item as an [`crate::OpaqueFilter`] that keeps type and parameters verbatim.
    Placeholder,
}

/// Options for rebuilding a chain from its representation.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOpts {
    /// Handling of unregistered item types, applied at every nesting depth.
    pub unknown_types: UnknownTypePolicy,
}

/// Declarative description of a group: members, the links between them and the designated roles.
///
/// Roles and links refer to members by their index in `filters`. Links to nodes outside the group
/// are not part of it.
///
/// ```json
/// {
///   "name": "Look",
///   "filters": [ { "type": "Blur" }, { "type": "Levels" } ],
///   "links": [ { "from": 0, "to": 1, "input_index": 0 } ],
///   "initial_filters": [0],
///   "terminal_filter": 1
/// }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupRepresentation {
    /// Group label.
    #[serde(default = "default_group_name")]
    pub name: String,
    /// Members in insertion order.
    pub filters: Vec<ItemRepresentation>,
    /// Output-to-input links between members.
    #[serde(default)]
    pub links: Vec<LinkRepresentation>,
    /// Indices of the entry members.
    #[serde(default)]
    pub initial_filters: Vec<usize>,
    /// Index of the exit member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_filter: Option<usize>,
    /// Index of the member left out of notice propagation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_filter_to_ignore_for_updates: Option<usize>,
}

/// Link from member `from` to input slot `input_index` of member `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkRepresentation {
    /// Upstream member index.
    pub from: usize,
    /// Downstream member index.
    pub to: usize,
    /// Input slot on the downstream member.
    #[serde(default)]
    pub input_index: usize,
}

fn default_group_name() -> String {
    GROUP_TYPE.to_string()
}

impl ItemRepresentation {
    /// Item with the given type and parameters.
    pub fn new(type_name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            type_name: type_name.into(),
            parameters,
        }
    }
}

impl ChainRepresentation {
    /// Parse and check a representation from a dynamic JSON mapping.
    pub fn from_value(value: &serde_json::Value) -> PipelineResult<Self> {
        if !value.is_object() {
            return Err(PipelineError::malformed("representation must be a mapping"));
        }
        let repr: Self = serde_json::from_value(value.clone())
            .map_err(|e| PipelineError::malformed(e.to_string()))?;
        repr.check()?;
        Ok(repr)
    }

    /// Parse a representation from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PipelineResult<Self> {
        let value: serde_json::Value = serde_json::from_reader(r)
            .map_err(|e| PipelineError::serde(format!("parse chain JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Parse a representation from a JSON string.
    pub fn from_json_str(s: &str) -> PipelineResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a representation from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PipelineError::Other(
                anyhow::Error::new(e).context(format!("open chain JSON '{}'", path.display())),
            )
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Dynamic JSON form of this representation.
    pub fn to_value(&self) -> PipelineResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::serde(e.to_string()))
    }

    /// Pretty-printed JSON form of this representation.
    pub fn to_json_pretty(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::serde(e.to_string()))
    }

    /// Item type identifiers in order.
    pub fn type_names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.type_name.as_str()).collect()
    }

    /// Build a chain from this representation.
    ///
    /// Every item type is checked against `factory` before any node is created. Errors the
    /// factory raises while creating nodes are returned unchanged.
    #[tracing::instrument(skip(self, factory), fields(chain = %self.name, items = self.items.len()))]
    pub fn instantiate(&self, factory: &dyn NodeFactory, opts: &LoadOpts) -> PipelineResult<Chain> {
        let placeholder;
        let factory: &dyn NodeFactory = match opts.unknown_types {
            UnknownTypePolicy::Reject => factory,
            UnknownTypePolicy::Placeholder => {
                placeholder = PlaceholderFactory::new(factory);
                &placeholder
            }
        };

        if let Some(item) = self.items.iter().find(|i| !factory.knows(&i.type_name)) {
            return Err(PipelineError::malformed(format!(
                "chain '{}' uses unregistered node type '{}'",
                self.name, item.type_name
            )));
        }

        let nodes = self
            .items
            .iter()
            .map(|item| factory.create(&item.type_name, &item.parameters))
            .collect::<PipelineResult<Vec<_>>>()?;
        Chain::new(self.name.clone(), nodes)
    }

    fn check(&self) -> PipelineResult<()> {
        for (i, item) in self.items.iter().enumerate() {
            if item.type_name.trim().is_empty() {
                return Err(PipelineError::malformed(format!(
                    "item {i} has an empty type identifier"
                )));
            }
        }
        Ok(())
    }
}

impl GroupRepresentation {
    /// Parse and check a group representation from a dynamic JSON mapping.
    pub fn from_value(value: &serde_json::Value) -> PipelineResult<Self> {
        if !value.is_object() {
            return Err(PipelineError::malformed("group representation must be a mapping"));
        }
        let repr: Self = serde_json::from_value(value.clone())
            .map_err(|e| PipelineError::malformed(e.to_string()))?;
        repr.check()?;
        Ok(repr)
    }

    /// Dynamic JSON form of this representation.
    pub fn to_value(&self) -> PipelineResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::serde(e.to_string()))
    }

    /// Build and validate a group from this representation.
    ///
    /// Member types are checked against `factory` before any node is built, as for chains.
    #[tracing::instrument(skip(self, factory), fields(group = %self.name, filters = self.filters.len()))]
    pub fn instantiate(&self, factory: &dyn NodeFactory) -> PipelineResult<Group> {
        if let Some(item) = self.filters.iter().find(|i| !factory.knows(&i.type_name)) {
            return Err(PipelineError::malformed(format!(
                "group '{}' uses unregistered node type '{}'",
                self.name, item.type_name
            )));
        }
        let members = self
            .filters
            .iter()
            .map(|item| factory.create(&item.type_name, &item.parameters))
            .collect::<PipelineResult<Vec<_>>>()?;
        let group = Group::assemble(self.name.clone(), members, self)?;
        group.validate()?;
        Ok(group)
    }

    fn check(&self) -> PipelineResult<()> {
        let len = self.filters.len();
        for (i, item) in self.filters.iter().enumerate() {
            if item.type_name.trim().is_empty() {
                return Err(PipelineError::malformed(format!(
                    "member {i} has an empty type identifier"
                )));
            }
        }
        let out_of_range = |index: usize| index >= len;
        if let Some(link) = self
            .links
            .iter()
            .find(|l| out_of_range(l.from) || out_of_range(l.to) || l.from == l.to)
        {
            return Err(PipelineError::malformed(format!(
                "group '{}' has an invalid link {} -> {}",
                self.name, link.from, link.to
            )));
        }
        let roles = self
            .initial_filters
            .iter()
            .chain(&self.terminal_filter)
            .chain(&self.input_filter_to_ignore_for_updates);
        for &index in roles {
            if out_of_range(index) {
                return Err(PipelineError::malformed(format!(
                    "group '{}' refers to member {index} but has {len}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/representation.rs"]
mod tests;
