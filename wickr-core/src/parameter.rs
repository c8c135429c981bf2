//! Parameter - Deploy-time inputs of a template and their resolution
//!
//! Resolution mirrors what the provisioning engine does before touching any
//! resource: supplied value, else default, else the parameter is missing.
//! Values are not range- or format-checked here.

use std::collections::HashMap;

use serde_json::json;

use crate::resource::Value;

/// Parameter type as understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Number,
    /// Image ID looked up by the engine from an SSM parameter path
    SsmImageId,
}

impl ParameterType {
    pub fn cloudformation_type(&self) -> &'static str {
        match self {
            ParameterType::String => "String",
            ParameterType::Number => "Number",
            ParameterType::SsmImageId => "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>",
        }
    }

    /// Whether the engine resolves this parameter itself
    pub fn is_engine_resolved(&self) -> bool {
        matches!(self, ParameterType::SsmImageId)
    }
}

/// Declared template parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParameterType,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: None,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Number)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.param_type.is_engine_resolved()
    }

    /// The `Ref` value resources use to consume this parameter
    pub fn value(&self) -> Value {
        Value::reference(&self.name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("Type".into(), json!(self.param_type.cloudformation_type()));
        if let Some(default) = &self.default {
            obj.insert("Default".into(), default.to_json());
        }
        if let Some(desc) = &self.description {
            obj.insert("Description".into(), json!(desc));
        }
        serde_json::Value::Object(obj)
    }
}

/// Parameter resolution errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("Missing required parameters: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Unknown parameter: {0}")]
    Unknown(String),

    #[error("Parameter '{name}' must be a number, got '{value}'")]
    NotANumber { name: String, value: String },

    #[error("Parameter '{0}' is resolved by the provisioning engine and cannot be supplied")]
    EngineResolved(String),
}

/// Ordered set of parameters declared by a stack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    specs: Vec<ParameterSpec>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter and return the value that references it
    pub fn declare(&mut self, spec: ParameterSpec) -> Value {
        let value = spec.value();
        self.specs.retain(|s| s.name != spec.name);
        self.specs.push(spec);
        value
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve operator-supplied values against the declared parameters.
    ///
    /// Every missing required parameter is reported in one error. The
    /// returned map holds one value per non-engine-resolved parameter.
    pub fn resolve(
        &self,
        supplied: &HashMap<String, String>,
    ) -> Result<HashMap<String, Value>, ParameterError> {
        let mut unknown: Vec<&String> = supplied.keys().filter(|k| !self.contains(k)).collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(ParameterError::Unknown((*name).clone()));
        }

        let mut resolved = HashMap::new();
        let mut missing = Vec::new();

        for spec in &self.specs {
            if spec.param_type.is_engine_resolved() {
                if supplied.contains_key(&spec.name) {
                    return Err(ParameterError::EngineResolved(spec.name.clone()));
                }
                continue;
            }

            let value = match (supplied.get(&spec.name), &spec.default) {
                (Some(raw), _) => parse_value(spec, raw)?,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    missing.push(spec.name.clone());
                    continue;
                }
            };
            resolved.insert(spec.name.clone(), value);
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(ParameterError::Missing(missing))
        }
    }
}

fn parse_value(spec: &ParameterSpec, raw: &str) -> Result<Value, ParameterError> {
    match spec.param_type {
        ParameterType::Number => {
            raw.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ParameterError::NotANumber {
                    name: spec.name.clone(),
                    value: raw.to_string(),
                })
        }
        ParameterType::String | ParameterType::SsmImageId => Ok(Value::string(raw)),
    }
}
