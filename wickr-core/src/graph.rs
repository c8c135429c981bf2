//! Graph - Arena of declared resources addressed by handles
//!
//! Resources are added once and never mutated afterwards. Cross references
//! are made through [`ResourceHandle`]s, which are resolved to logical IDs at
//! the moment a reference value is built.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use crate::resource::{Resource, Value};

/// Handle to a resource stored in a [`ResourceGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(usize);

/// Errors raised while building or ordering a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Duplicate logical ID: {0}")]
    DuplicateLogicalId(String),

    #[error("Dependency cycle through {0}")]
    Cycle(String),
}

/// Ordered collection of resources
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, returning a handle for later references
    pub fn add(&mut self, resource: Resource) -> Result<ResourceHandle, GraphError> {
        let logical_id = resource.logical_id().to_string();
        if self.index.contains_key(&logical_id) {
            return Err(GraphError::DuplicateLogicalId(logical_id));
        }

        debug!("declared {}", resource.id);
        let handle = ResourceHandle(self.resources.len());
        self.index.insert(logical_id, handle.0);
        self.resources.push(resource);
        Ok(handle)
    }

    pub fn get(&self, handle: ResourceHandle) -> &Resource {
        &self.resources[handle.0]
    }

    pub fn logical_id(&self, handle: ResourceHandle) -> &str {
        self.get(handle).logical_id()
    }

    /// `Ref` to the resource behind the handle
    pub fn ref_value(&self, handle: ResourceHandle) -> Value {
        Value::reference(self.logical_id(handle))
    }

    /// `Fn::GetAtt` of an attribute of the resource behind the handle
    pub fn attr_value(&self, handle: ResourceHandle, attribute: &str) -> Value {
        Value::GetAtt(self.logical_id(handle).to_string(), attribute.to_string())
    }

    pub fn find(&self, logical_id: &str) -> Option<&Resource> {
        self.index.get(logical_id).map(|&i| &self.resources[i])
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.index.contains_key(logical_id)
    }

    /// Resources in declaration order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| r.id.resource_type == resource_type)
    }

    pub fn count_of(&self, resource_type: &str) -> usize {
        self.of_type(resource_type).count()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Dependencies of a resource that are themselves resources in this graph
    pub fn dependencies_of(&self, resource: &Resource) -> BTreeSet<String> {
        resource
            .dependencies()
            .into_iter()
            .filter(|name| self.contains(name))
            .collect()
    }

    /// Resources sorted so that every resource follows its dependencies.
    /// Ties keep declaration order.
    pub fn topological_order(&self) -> Result<Vec<&Resource>, GraphError> {
        fn visit<'a>(
            graph: &'a ResourceGraph,
            resource: &'a Resource,
            visited: &mut HashSet<&'a str>,
            visiting: &mut HashSet<&'a str>,
            sorted: &mut Vec<&'a Resource>,
        ) -> Result<(), GraphError> {
            let name = resource.logical_id();
            if visited.contains(name) {
                return Ok(());
            }
            if !visiting.insert(name) {
                return Err(GraphError::Cycle(name.to_string()));
            }

            for dep in graph.dependencies_of(resource) {
                if let Some(dep_resource) = graph.find(&dep) {
                    visit(graph, dep_resource, visited, visiting, sorted)?;
                }
            }

            visiting.remove(name);
            visited.insert(name);
            sorted.push(resource);
            Ok(())
        }

        let mut sorted = Vec::with_capacity(self.resources.len());
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        for resource in &self.resources {
            visit(self, resource, &mut visited, &mut visiting, &mut sorted)?;
        }
        Ok(sorted)
    }
}
