//! IAM resource schema definitions

use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Trust/permission policy document
pub fn policy_document() -> AttributeType {
    let statement = AttributeType::Struct(vec![
        AttributeSchema::new("action", AttributeType::String).required(),
        AttributeSchema::new(
            "effect",
            AttributeType::Enum(vec!["Allow".to_string(), "Deny".to_string()]),
        )
        .required(),
        AttributeSchema::new("principal", AttributeType::Map(Box::new(AttributeType::String))),
    ]);

    AttributeType::Struct(vec![
        AttributeSchema::new("version", AttributeType::String).required(),
        AttributeSchema::new("statement", AttributeType::List(Box::new(statement))).required(),
    ])
}

/// Returns the schema for Role
pub fn role_schema() -> ResourceSchema {
    ResourceSchema::new("iam_role", "AWS::IAM::Role")
        .with_description("An IAM role assumable by a service principal")
        .attribute(
            AttributeSchema::new("assume_role_policy_document", policy_document())
                .required()
                .with_description("Who may assume the role"),
        )
        .attribute(AttributeSchema::new(
            "managed_policy_arns",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
}

/// Returns the schema for Instance Profile
pub fn instance_profile_schema() -> ResourceSchema {
    ResourceSchema::new("iam_instance_profile", "AWS::IAM::InstanceProfile")
        .with_description("Carries a role onto an instance")
        .attribute(
            AttributeSchema::new("roles", AttributeType::List(Box::new(AttributeType::String)))
                .required(),
        )
}

/// Returns all IAM-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![role_schema(), instance_profile_schema()]
}
