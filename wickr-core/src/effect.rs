//! Effect - A single change between recorded and declared state

use crate::resource::{Resource, ResourceId, State};

/// A change the provisioning engine would have to make
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Create(Resource),
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    Delete(ResourceId),
}

impl Effect {
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Create(r) => &r.id,
            Effect::Update { id, .. } => id,
            Effect::Delete(id) => id,
        }
    }

    /// Symbol used when listing effects (`+`, `~`, `-`)
    pub fn symbol(&self) -> char {
        match self {
            Effect::Create(_) => '+',
            Effect::Update { .. } => '~',
            Effect::Delete(_) => '-',
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Effect::Create(_) => "Create",
            Effect::Update { .. } => "Update",
            Effect::Delete(_) => "Delete",
        };
        write!(f, "{} {}", verb, self.resource_id())
    }
}
