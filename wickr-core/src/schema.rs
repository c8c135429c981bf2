//! Schema - Type schemas for declared resources
//!
//! Each resource type has a schema listing its attributes. Schemas are used
//! to lint a resolved declaration and to map resource types to the engine's
//! type names.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Map with a fixed set of typed fields
    Struct(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type.
    ///
    /// References are only known to the engine, so they are accepted
    /// wherever a scalar is expected.
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        if is_deferred(value) && self.is_scalar() {
            return Ok(());
        }

        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Struct(fields), Value::Map(map)) => {
                for field in fields {
                    match map.get(&field.name) {
                        Some(v) => field.attr_type.validate(v).map_err(|e| {
                            TypeError::MapValueError {
                                key: field.name.clone(),
                                inner: Box::new(e),
                            }
                        })?,
                        None if field.required => {
                            return Err(TypeError::MissingRequired {
                                name: field.name.clone(),
                            });
                        }
                        None => {}
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn is_scalar(&self) -> bool {
        match self {
            AttributeType::String
            | AttributeType::Int
            | AttributeType::Bool
            | AttributeType::Enum(_) => true,
            AttributeType::Custom { base, .. } => base.is_scalar(),
            AttributeType::List(_) | AttributeType::Map(_) | AttributeType::Struct(_) => false,
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Struct(_) => "Struct".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn is_deferred(value: &Value) -> bool {
    matches!(
        value,
        Value::Ref(_) | Value::GetAtt(_, _) | Value::Join(_, _) | Value::Base64(_)
    )
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Ref(name) => format!("Ref({})", name),
            Value::GetAtt(name, attr) => format!("GetAtt({}.{})", name, attr),
            Value::Base64(_) => "Base64".to_string(),
            Value::Join(_, _) => "Join".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    /// Engine type name (e.g., "AWS::EC2::VPC")
    pub cloudformation_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>, cloudformation_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            cloudformation_type: cloudformation_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        let mut names: Vec<_> = attributes.keys().collect();
        names.sort();
        for name in names {
            match self.attributes.get(name) {
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(&attributes[name]) {
                        errors.push(e);
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use regex::Regex;

    use super::*;

    /// Minimum root volume size the server software supports, in GB
    pub const MIN_ROOT_VOLUME_GB: i64 = 120;

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_cidr(s),
                _ => Ok(()),
            },
        }
    }

    /// Port number type (0-65535, or -1 for all ports)
    pub fn port_number() -> AttributeType {
        AttributeType::Custom {
            name: "PortNumber".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (-1..=65535).contains(n) => Ok(()),
                Value::Int(_) => Err("Port number must be between 0 and 65535".to_string()),
                _ => Ok(()),
            },
        }
    }

    /// Protocol type for security group rules
    pub fn protocol() -> AttributeType {
        AttributeType::Enum(vec![
            "tcp".to_string(),
            "udp".to_string(),
            "icmp".to_string(),
            "-1".to_string(), // All traffic
        ])
    }

    /// Availability zone name (e.g., "eu-west-2a")
    pub fn availability_zone() -> AttributeType {
        AttributeType::Custom {
            name: "AvailabilityZone".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_availability_zone(s),
                _ => Ok(()),
            },
        }
    }

    /// Root EBS volume size in GB, at least [`MIN_ROOT_VOLUME_GB`]
    pub fn root_volume_size() -> AttributeType {
        AttributeType::Custom {
            name: "RootVolumeSize".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n >= MIN_ROOT_VOLUME_GB => Ok(()),
                Value::Int(n) => Err(format!(
                    "Root volume size {} GB is below the {} GB minimum",
                    n, MIN_ROOT_VOLUME_GB
                )),
                _ => Ok(()),
            },
        }
    }

    /// Validate an availability zone name such as "eu-west-2a"
    pub fn validate_availability_zone(zone: &str) -> Result<(), String> {
        let re = Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d+[a-z]$").map_err(|e| e.to_string())?;
        if re.is_match(zone) {
            Ok(())
        } else {
            Err(format!(
                "Invalid availability zone '{}': expected a name like eu-west-2a",
                zone
            ))
        }
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid CIDR format '{}': expected IP/prefix",
            cidr
        ));
    }

    let ip = parts[0];
    let prefix = parts[1];

    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn references_pass_scalar_types() {
        assert!(AttributeType::Int.validate(&Value::reference("EBSsize")).is_ok());
        assert!(
            types::cidr()
                .validate(&Value::GetAtt("VPC".into(), "CidrBlock".into()))
                .is_ok()
        );
        assert!(
            AttributeType::List(Box::new(AttributeType::String))
                .validate(&Value::reference("Subnets"))
                .is_err()
        );
    }

    #[test]
    fn validate_enum_type() {
        let t = types::protocol();
        assert!(t.validate(&Value::String("tcp".to_string())).is_ok());
        assert!(t.validate(&Value::String("-1".to_string())).is_ok());
        assert!(t.validate(&Value::String("sctp".to_string())).is_err());
    }

    #[test]
    fn validate_struct_type() {
        let t = AttributeType::Struct(vec![
            AttributeSchema::new("device_name", AttributeType::String).required(),
            AttributeSchema::new("encrypted", AttributeType::Bool),
        ]);

        let ok = Value::map([
            ("device_name", Value::string("/dev/xvda")),
            ("encrypted", Value::Bool(true)),
        ]);
        assert!(t.validate(&ok).is_ok());

        let missing = Value::map([("encrypted", Value::Bool(true))]);
        assert!(matches!(
            t.validate(&missing),
            Err(TypeError::MissingRequired { .. })
        ));
    }

    #[test]
    fn root_volume_minimum() {
        let t = types::root_volume_size();
        assert!(t.validate(&Value::Int(120)).is_ok());
        assert!(t.validate(&Value::Int(500)).is_ok());
        assert!(t.validate(&Value::Int(119)).is_err());
        assert!(t.validate(&Value::string("120")).is_err());
    }

    #[test]
    fn availability_zone_names() {
        assert!(types::validate_availability_zone("eu-west-2a").is_ok());
        assert!(types::validate_availability_zone("us-gov-west-1b").is_ok());
        assert!(types::validate_availability_zone("eu-west-2").is_err());
        assert!(types::validate_availability_zone("EU-WEST-2A").is_err());
    }

    #[test]
    fn unknown_and_missing_attributes() {
        let schema = ResourceSchema::new("bucket", "AWS::S3::Bucket")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let mut attrs = HashMap::new();
        attrs.insert("colour".to_string(), Value::string("blue"));
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();

        assert!(
            t.validate(&Value::String("10.0.0.0/16".to_string()))
                .is_ok()
        );
        assert!(t.validate(&Value::String("0.0.0.0/0".to_string())).is_ok());
        assert!(
            t.validate(&Value::String("203.0.113.5/32".to_string()))
                .is_ok()
        );

        assert!(t.validate(&Value::String("10.0.0.0".to_string())).is_err());
        assert!(
            t.validate(&Value::String("10.0.0.0/33".to_string()))
                .is_err()
        );
        assert!(
            t.validate(&Value::String("10.0.0.256/16".to_string()))
                .is_err()
        );
        assert!(t.validate(&Value::Int(42)).is_err());
    }
}
