//! Schemas for every resource type the stack declares

pub mod ec2;
pub mod iam;

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId};
use crate::schema::{ResourceSchema, TypeError};

/// Returns all known resource schemas
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = ec2::schemas();
    schemas.extend(iam::schemas());
    schemas
}

/// Schemas keyed by resource type
pub fn schema_map() -> HashMap<String, ResourceSchema> {
    all_schemas()
        .into_iter()
        .map(|schema| (schema.resource_type.clone(), schema))
        .collect()
}

/// A schema violation in one resource
#[derive(Debug, Clone, thiserror::Error)]
#[error("{resource}: {error}")]
pub struct LintError {
    pub resource: ResourceId,
    pub error: TypeError,
}

/// Check resolved resources against their schemas. Values the engine
/// resolves later (references, intrinsics) are accepted as they are.
pub fn lint(resources: &[Resource]) -> Vec<LintError> {
    let schemas = schema_map();
    let mut errors = Vec::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            errors.push(LintError {
                resource: resource.id.clone(),
                error: TypeError::ValidationFailed {
                    message: format!("unknown resource type '{}'", resource.id.resource_type),
                },
            });
            continue;
        };

        if let Err(found) = schema.validate(&resource.attributes) {
            errors.extend(found.into_iter().map(|error| LintError {
                resource: resource.id.clone(),
                error,
            }));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Value;

    #[test]
    fn resource_types_are_unique() {
        let schemas = all_schemas();
        assert_eq!(schemas.len(), schema_map().len());
    }

    #[test]
    fn cloudformation_types_are_namespaced() {
        for schema in all_schemas() {
            assert!(
                schema.cloudformation_type.starts_with("AWS::"),
                "{} maps to {}",
                schema.resource_type,
                schema.cloudformation_type
            );
        }
    }

    #[test]
    fn lint_reports_each_violation_with_its_resource() {
        let resources = vec![
            Resource::new("vpc", "VPC").with_attribute("cidr_block", Value::string("10.0.0.0/16")),
            Resource::new("subnet", "Subnet")
                .with_attribute("vpc_id", Value::reference("VPC"))
                .with_attribute("cidr_block", Value::string("10.0.0.0/18"))
                .with_attribute("availability_zone", Value::string("nowhere")),
            Resource::new("teleporter", "Beam"),
        ];

        let errors = lint(&resources);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].resource, ResourceId::new("subnet", "Subnet"));
        assert!(errors[0].to_string().starts_with("subnet.Subnet: "));
        assert_eq!(errors[1].resource, ResourceId::new("teleporter", "Beam"));
    }
}
