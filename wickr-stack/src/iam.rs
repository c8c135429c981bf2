//! Access role shared by all instances

use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::{Resource, Value};

use crate::error::StackError;

pub const ROLE_ID: &str = "ec2Role";
pub const SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const SESSION_MANAGER_POLICY: &str = "AmazonSSMManagedInstanceCore";

/// Role and the instance profile carrying it onto instances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessRole {
    pub role: ResourceHandle,
    pub instance_profile: ResourceHandle,
}

impl AccessRole {
    pub fn declare(graph: &mut ResourceGraph) -> Result<AccessRole, StackError> {
        let role = graph.add(
            Resource::new("iam_role", ROLE_ID)
                .with_attribute("assume_role_policy_document", trust_policy(SERVICE_PRINCIPAL))
                .with_attribute(
                    "managed_policy_arns",
                    Value::List(vec![managed_policy_arn(SESSION_MANAGER_POLICY)]),
                ),
        )?;
        let instance_profile = graph.add(
            Resource::new("iam_instance_profile", format!("{}InstanceProfile", ROLE_ID))
                .with_attribute("roles", Value::List(vec![graph.ref_value(role)])),
        )?;

        Ok(AccessRole {
            role,
            instance_profile,
        })
    }
}

/// Policy letting `service` assume the role
fn trust_policy(service: &str) -> Value {
    Value::map([
        ("version", Value::string("2012-10-17")),
        (
            "statement",
            Value::List(vec![Value::map([
                ("action", Value::string("sts:AssumeRole")),
                ("effect", Value::string("Allow")),
                ("principal", Value::map([("service", Value::string(service))])),
            ])]),
        ),
    ])
}

/// ARN of an AWS managed policy in the current partition
fn managed_policy_arn(name: &str) -> Value {
    Value::Join(
        String::new(),
        vec![
            Value::string("arn:"),
            Value::reference("AWS::Partition"),
            Value::string(format!(":iam::aws:policy/{}", name)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wickr_core::schemas::iam;

    #[test]
    fn role_is_trusted_by_ec2_only() {
        let mut graph = ResourceGraph::new();
        let access = AccessRole::declare(&mut graph).unwrap();
        let role = graph.get(access.role);

        let document = role.attribute("assume_role_policy_document").unwrap();
        let statements = document.as_map().unwrap()["statement"].as_list().unwrap();
        assert_eq!(statements.len(), 1);
        let principal = statements[0].as_map().unwrap()["principal"].as_map().unwrap();
        assert_eq!(principal.len(), 1);
        assert_eq!(principal["service"], Value::string(SERVICE_PRINCIPAL));

        assert!(iam::role_schema().validate(&role.attributes).is_ok());
    }

    #[test]
    fn role_carries_one_managed_policy() {
        let mut graph = ResourceGraph::new();
        let access = AccessRole::declare(&mut graph).unwrap();
        let policies = graph
            .get(access.role)
            .attribute("managed_policy_arns")
            .and_then(Value::as_list)
            .unwrap();

        assert_eq!(policies.len(), 1);
        assert!(policies[0].references().contains("AWS::Partition"));
        assert_eq!(
            graph.get(access.instance_profile).attribute("roles"),
            Some(&Value::List(vec![Value::reference(ROLE_ID)]))
        );
    }
}
