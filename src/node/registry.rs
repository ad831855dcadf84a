use std::{collections::BTreeMap, fmt};

use crate::{
    foundation::error::{PipelineError, PipelineResult},
    node::capability::Parameters,
    node::handle::NodeHandle,
    node::opaque::OpaqueFilter,
    pipeline::chain::{CHAIN_TYPE, Chain},
    pipeline::group::{GROUP_TYPE, Group},
};

/// Instantiates concrete nodes from a type identifier and a parameter map.
pub trait NodeFactory {
    /// Whether `type_name` can be instantiated.
    fn knows(&self, type_name: &str) -> bool;

    /// Instantiate `type_name`.
    ///
    /// `root` is the outermost factory of the current load. Composite constructors build their
    /// members through it so that wrapping factories apply at every nesting depth.
    fn create_within(
        &self,
        type_name: &str,
        parameters: &Parameters,
        root: &dyn NodeFactory,
    ) -> PipelineResult<NodeHandle>;
}

impl<'a> dyn NodeFactory + 'a {
    /// Instantiate `type_name` with this factory as the root.
    pub fn create(&self, type_name: &str, parameters: &Parameters) -> PipelineResult<NodeHandle> {
        self.create_within(type_name, parameters, self)
    }
}

/// Constructor stored in a [`NodeRegistry`].
pub type NodeConstructor =
    Box<dyn Fn(&Parameters, &dyn NodeFactory) -> PipelineResult<NodeHandle>>;

/// String-keyed node factory.
#[derive(Default)]
pub struct NodeRegistry {
    constructors: BTreeMap<String, NodeConstructor>,
}

impl NodeRegistry {
    /// Registry with no known types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that knows the composite types defined by this crate (`"Chain"` and
    /// `"FilterGroup"`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(
            CHAIN_TYPE.to_string(),
            Box::new(|parameters, root| {
                let repr = serde_json::Value::Object(parameters.clone());
                Ok(NodeHandle::new(Chain::from_representation(&repr, root)?))
            }),
        );
        registry.constructors.insert(
            GROUP_TYPE.to_string(),
            Box::new(|parameters, root| {
                let repr = serde_json::Value::Object(parameters.clone());
                Ok(NodeHandle::new(Group::from_representation(&repr, root)?))
            }),
        );
        registry
    }

    /// Register a constructor for `type_name`.
    ///
    /// Registering the same name twice is rejected.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F) -> PipelineResult<()>
    where
        F: Fn(&Parameters, &dyn NodeFactory) -> PipelineResult<NodeHandle> + 'static,
    {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            return Err(PipelineError::invalid_parameters(format!(
                "node type '{type_name}' is already registered"
            )));
        }
        self.constructors.insert(type_name, Box::new(constructor));
        Ok(())
    }

    /// Whether `type_name` is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type identifiers in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Instantiate `type_name` with this registry as the root factory.
    pub fn create(&self, type_name: &str, parameters: &Parameters) -> PipelineResult<NodeHandle> {
        self.create_within(type_name, parameters, self)
    }
}

impl NodeFactory for NodeRegistry {
    fn knows(&self, type_name: &str) -> bool {
        self.contains(type_name)
    }

    fn create_within(
        &self,
        type_name: &str,
        parameters: &Parameters,
        root: &dyn NodeFactory,
    ) -> PipelineResult<NodeHandle> {
        let constructor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| PipelineError::unknown_type(type_name))?;
        constructor(parameters, root)
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Factory that resolves unknown types to [`OpaqueFilter`] placeholders.
pub(crate) struct PlaceholderFactory<'a> {
    inner: &'a dyn NodeFactory,
}

impl<'a> PlaceholderFactory<'a> {
    pub(crate) fn new(inner: &'a dyn NodeFactory) -> Self {
        Self { inner }
    }
}

impl NodeFactory for PlaceholderFactory<'_> {
    fn knows(&self, _type_name: &str) -> bool {
        true
    }

    fn create_within(
        &self,
        type_name: &str,
        parameters: &Parameters,
        root: &dyn NodeFactory,
    ) -> PipelineResult<NodeHandle> {
        if self.inner.knows(type_name) {
            return self.inner.create_within(type_name, parameters, root);
        }
        tracing::debug!(type_name, "unknown node type loaded as placeholder");
        Ok(NodeHandle::new(OpaqueFilter::new(
            type_name,
            parameters.clone(),
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/node/registry.rs"]
mod tests;
