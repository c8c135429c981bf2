//! Differ - Compare declared state with recorded state to generate a Plan
//!
//! Compares the resources produced by the declaration with the state recorded
//! by the last apply, and lists the Effects needed to converge.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Attributes that differ between desired and current state, sorted.
/// Attributes only present in the current state count as changed too.
pub fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();

    changed.extend(
        current
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .cloned(),
    );

    changed.sort();
    changed
}

/// Compute Diffs for all declared resources and generate a Plan.
///
/// Recorded resources that are no longer declared are deleted in reverse
/// recorded order. State is recorded in dependency order, so dependents go
/// first.
pub fn create_plan(desired: &[Resource], current_states: &[State]) -> Plan {
    let mut plan = Plan::new();
    let by_id: HashMap<&ResourceId, &State> =
        current_states.iter().map(|s| (&s.id, s)).collect();

    for resource in desired {
        let current = by_id
            .get(&resource.id)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => plan.add(Effect::Update { id, from, to }),
            Diff::NoChange(_) => {}
        }
    }

    let declared: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    for state in current_states.iter().rev() {
        if state.exists && !declared.contains(&state.id) {
            plan.add(Effect::Delete(state.id.clone()));
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("subnet", "PublicSubnet1");
        let current = State::not_found(ResourceId::new("subnet", "PublicSubnet1"));

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = Resource::new("subnet", "PublicSubnet1")
            .with_attribute("availability_zone", Value::string("eu-west-2a"));

        let mut attrs = HashMap::new();
        attrs.insert("availability_zone".to_string(), Value::string("eu-west-2a"));
        let current = State::existing(ResourceId::new("subnet", "PublicSubnet1"), attrs);

        let result = diff(&desired, &current);
        assert!(!result.is_change());
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("subnet", "PublicSubnet1")
            .with_attribute("availability_zone", Value::string("eu-west-2b"));

        let mut attrs = HashMap::new();
        attrs.insert("availability_zone".to_string(), Value::string("eu-west-2a"));
        attrs.insert("map_public_ip_on_launch".to_string(), Value::Bool(true));
        let current = State::existing(ResourceId::new("subnet", "PublicSubnet1"), attrs);

        match diff(&desired, &current) {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert_eq!(
                    changed_attributes,
                    vec![
                        "availability_zone".to_string(),
                        "map_public_ip_on_launch".to_string()
                    ]
                );
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("eip", "NewEip"),
            Resource::new("instance", "Existing").with_attribute("key_name", Value::string("new")),
        ];

        let mut attrs = HashMap::new();
        attrs.insert("key_name".to_string(), Value::string("old"));
        let current_states = vec![
            State::existing(ResourceId::new("instance", "Existing"), attrs),
            State::existing(ResourceId::new("eip", "Gone"), HashMap::new()),
        ];

        let plan = create_plan(&resources, &current_states);

        assert_eq!(plan.effects().len(), 3);
        assert!(matches!(plan.effects()[0], Effect::Create(_)));
        assert!(matches!(plan.effects()[1], Effect::Update { .. }));
        assert_eq!(
            plan.effects()[2],
            Effect::Delete(ResourceId::new("eip", "Gone"))
        );
    }

    #[test]
    fn identical_state_yields_empty_plan() {
        let resource = Resource::new("vpc", "VPC").with_attribute("cidr_block", Value::string("10.0.0.0/16"));
        let state = State::existing(resource.id.clone(), resource.attributes.clone());

        assert!(create_plan(&[resource], &[state]).is_empty());
    }
}
