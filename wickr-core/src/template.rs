//! Template - Engine-consumable document synthesized from a resource graph
//!
//! The output is a CloudFormation template: declared parameters, resources
//! with their engine type names and PascalCase properties, and outputs.

use std::collections::HashMap;

use serde_json::json;

use crate::case_convert::to_property_name;
use crate::graph::ResourceGraph;
use crate::parameter::ParameterSet;
use crate::resource::{Resource, Value};
use crate::schema::ResourceSchema;
use crate::schemas;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// Errors raised while synthesizing a template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("No engine type known for resource type '{resource_type}' ({logical_id})")]
    UnknownResourceType {
        resource_type: String,
        logical_id: String,
    },

    #[error("Logical ID '{0}' is used by both a parameter and a resource")]
    NameClash(String),

    #[error("'{from}' references undeclared name '{name}'")]
    DanglingReference { from: String, name: String },
}

/// Named value surfaced to the operator after deployment
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub logical_id: String,
    pub value: Value,
    pub description: Option<String>,
}

impl Output {
    pub fn new(logical_id: impl Into<String>, value: Value) -> Self {
        Self {
            logical_id: logical_id.into(),
            value,
            description: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// A synthesized template
#[derive(Debug, Clone)]
pub struct Template<'a> {
    pub description: Option<String>,
    pub parameters: &'a ParameterSet,
    pub graph: &'a ResourceGraph,
    pub outputs: &'a [Output],
}

impl<'a> Template<'a> {
    pub fn new(parameters: &'a ParameterSet, graph: &'a ResourceGraph, outputs: &'a [Output]) -> Self {
        Self {
            description: None,
            parameters,
            graph,
            outputs,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Render the template as a JSON document
    pub fn to_json(&self) -> Result<serde_json::Value, TemplateError> {
        self.check_names()?;
        let schemas = schemas::schema_map();

        let mut parameters = serde_json::Map::new();
        for spec in self.parameters.specs() {
            parameters.insert(spec.name.clone(), spec.to_json());
        }

        let mut resources = serde_json::Map::new();
        for resource in self.graph.resources() {
            resources.insert(
                resource.logical_id().to_string(),
                resource_json(resource, &schemas)?,
            );
        }

        let mut outputs = serde_json::Map::new();
        for output in self.outputs {
            let mut obj = serde_json::Map::new();
            if let Some(desc) = &output.description {
                obj.insert("Description".into(), json!(desc));
            }
            obj.insert("Value".into(), output.value.to_json());
            outputs.insert(output.logical_id.clone(), serde_json::Value::Object(obj));
        }

        let mut doc = serde_json::Map::new();
        doc.insert("AWSTemplateFormatVersion".into(), json!(FORMAT_VERSION));
        if let Some(desc) = &self.description {
            doc.insert("Description".into(), json!(desc));
        }
        doc.insert("Parameters".into(), serde_json::Value::Object(parameters));
        doc.insert("Resources".into(), serde_json::Value::Object(resources));
        if !outputs.is_empty() {
            doc.insert("Outputs".into(), serde_json::Value::Object(outputs));
        }
        Ok(serde_json::Value::Object(doc))
    }

    /// Render the template as pretty-printed JSON text
    pub fn to_string_pretty(&self) -> Result<String, TemplateError> {
        let json = self.to_json()?;
        Ok(serde_json::to_string_pretty(&json).unwrap_or_default())
    }

    /// Parameters and resources share one namespace, and every reference
    /// must land in it (pseudo parameters such as `AWS::Partition` excepted).
    fn check_names(&self) -> Result<(), TemplateError> {
        for spec in self.parameters.specs() {
            if self.graph.contains(&spec.name) {
                return Err(TemplateError::NameClash(spec.name.clone()));
            }
        }

        let known = |name: &str| {
            name.starts_with("AWS::") || self.graph.contains(name) || self.parameters.contains(name)
        };

        for resource in self.graph.resources() {
            if let Some(name) = resource.dependencies().into_iter().find(|n| !known(n)) {
                return Err(TemplateError::DanglingReference {
                    from: resource.logical_id().to_string(),
                    name,
                });
            }
        }
        for output in self.outputs {
            if let Some(name) = output.value.references().into_iter().find(|n| !known(n)) {
                return Err(TemplateError::DanglingReference {
                    from: output.logical_id.clone(),
                    name,
                });
            }
        }
        Ok(())
    }
}

fn resource_json(
    resource: &Resource,
    schemas: &HashMap<String, ResourceSchema>,
) -> Result<serde_json::Value, TemplateError> {
    let schema = schemas.get(&resource.id.resource_type).ok_or_else(|| {
        TemplateError::UnknownResourceType {
            resource_type: resource.id.resource_type.clone(),
            logical_id: resource.logical_id().to_string(),
        }
    })?;

    let mut properties = serde_json::Map::new();
    for (key, value) in &resource.attributes {
        properties.insert(
            to_property_name(key),
            value.to_json_with_keys(&to_property_name),
        );
    }

    let mut obj = serde_json::Map::new();
    obj.insert("Type".into(), json!(schema.cloudformation_type));
    if !properties.is_empty() {
        obj.insert("Properties".into(), serde_json::Value::Object(properties));
    }
    if !resource.depends_on.is_empty() {
        obj.insert("DependsOn".into(), json!(resource.depends_on));
    }
    Ok(serde_json::Value::Object(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterSpec;

    fn sample() -> (ParameterSet, ResourceGraph, Vec<Output>) {
        let mut params = ParameterSet::new();
        let size = params.declare(ParameterSpec::number("size").with_default(Value::Int(120)));

        let mut graph = ResourceGraph::new();
        let vpc = graph
            .add(Resource::new("vpc", "VPC").with_attribute("cidr_block", Value::string("10.0.0.0/16")))
            .unwrap();
        let vpc_ref = graph.ref_value(vpc);
        graph
            .add(
                Resource::new("instance", "Web")
                    .with_attribute("subnet_id", vpc_ref)
                    .with_attribute(
                        "block_device_mappings",
                        Value::List(vec![Value::map([(
                            "ebs",
                            Value::map([("volume_size", size)]),
                        )])]),
                    )
                    .with_dependency("VPC"),
            )
            .unwrap();

        let outputs = vec![
            Output::new("WebIp", Value::GetAtt("Web".into(), "PublicIp".into()))
                .with_description("Public address"),
        ];
        (params, graph, outputs)
    }

    #[test]
    fn renders_cloudformation_document() {
        let (params, graph, outputs) = sample();
        let json = Template::new(&params, &graph, &outputs)
            .with_description("test")
            .to_json()
            .unwrap();

        assert_eq!(json["AWSTemplateFormatVersion"], json!("2010-09-09"));
        assert_eq!(json["Parameters"]["size"]["Type"], json!("Number"));
        assert_eq!(json["Resources"]["VPC"]["Type"], json!("AWS::EC2::VPC"));
        assert_eq!(
            json["Resources"]["VPC"]["Properties"]["CidrBlock"],
            json!("10.0.0.0/16")
        );

        let web = &json["Resources"]["Web"];
        assert_eq!(web["Properties"]["SubnetId"], json!({ "Ref": "VPC" }));
        assert_eq!(
            web["Properties"]["BlockDeviceMappings"][0]["Ebs"]["VolumeSize"],
            json!({ "Ref": "size" })
        );
        assert_eq!(web["DependsOn"], json!(["VPC"]));
        assert_eq!(
            json["Outputs"]["WebIp"]["Value"],
            json!({ "Fn::GetAtt": ["Web", "PublicIp"] })
        );
    }

    #[test]
    fn unknown_resource_type_fails() {
        let params = ParameterSet::new();
        let mut graph = ResourceGraph::new();
        graph.add(Resource::new("teleporter", "Beam")).unwrap();

        let err = Template::new(&params, &graph, &[]).to_json().unwrap_err();
        assert!(matches!(err, TemplateError::UnknownResourceType { .. }));
    }

    #[test]
    fn dangling_reference_fails() {
        let params = ParameterSet::new();
        let mut graph = ResourceGraph::new();
        graph
            .add(Resource::new("subnet", "Subnet").with_attribute("vpc_id", Value::reference("Nope")))
            .unwrap();

        let err = Template::new(&params, &graph, &[]).to_json().unwrap_err();
        assert_eq!(
            err,
            TemplateError::DanglingReference {
                from: "Subnet".to_string(),
                name: "Nope".to_string()
            }
        );
    }

    #[test]
    fn parameter_resource_clash_fails() {
        let mut params = ParameterSet::new();
        params.declare(ParameterSpec::string("VPC"));
        let mut graph = ResourceGraph::new();
        graph.add(Resource::new("vpc", "VPC")).unwrap();

        let err = Template::new(&params, &graph, &[]).to_json().unwrap_err();
        assert_eq!(err, TemplateError::NameClash("VPC".to_string()));
    }
}
