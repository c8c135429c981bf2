//! State file structures for recording applied declarations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wickr_core::resource::{Resource, ResourceId, State, Value};

use crate::backend::{BackendError, BackendResult};

/// The recorded state of one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Incremented on every write
    pub serial: u64,
    /// Identifies one state history; a write never crosses lineages
    pub lineage: String,
    /// Version of wickr that last wrote this state
    pub tool_version: String,
    pub stack_name: String,
    /// Recorded resources, dependencies first
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            stack_name: stack_name.into(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and stamp the tool version for a new write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.tool_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Replace the recorded resources with `resources`, keeping their order
    pub fn record(&mut self, resources: &[Resource]) {
        self.resources = resources.iter().map(ResourceState::from_resource).collect();
    }

    pub fn remove_resource(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == id.resource_type && r.name == id.name)?;
        Some(self.resources.remove(pos))
    }

    /// Recorded resources as states the differ understands
    pub fn states(&self) -> BackendResult<Vec<State>> {
        self.resources.iter().map(ResourceState::to_state).collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new("")
    }
}

/// Recorded state of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub resource_type: String,
    /// Logical ID in the template
    pub name: String,
    /// Attributes in template intrinsic form
    pub attributes: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceState {
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            resource_type: resource.id.resource_type.clone(),
            name: resource.id.name.clone(),
            attributes: resource
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
            depends_on: resource.depends_on.clone(),
        }
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    pub fn to_state(&self) -> BackendResult<State> {
        let mut attributes = HashMap::with_capacity(self.attributes.len());
        for (key, json) in &self.attributes {
            let value = Value::from_json(json).ok_or_else(|| {
                BackendError::InvalidState(format!(
                    "{}: attribute '{}' has an unreadable value",
                    self.id(),
                    key
                ))
            })?;
            attributes.insert(key.clone(), value);
        }
        Ok(State::existing(self.id(), attributes))
    }
}
