//! Resource - Representing declared resources and their recorded state

use std::collections::{BTreeSet, HashMap};

use serde_json::json;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "subnet", "instance")
    pub resource_type: String,
    /// Logical ID of the resource in the template
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to a resource or a template parameter by logical name
    Ref(String),
    /// Attribute of another resource (logical_id, attribute_name)
    GetAtt(String, String),
    /// Value that the engine base64-encodes (instance user data)
    Base64(Box<Value>),
    /// String concatenation of the parts with a separator
    Join(String, Vec<Value>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Value::Ref(name.into())
    }

    /// Build a map value from `(key, value)` pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Logical names this value refers to, through `Ref` or `GetAtt`
    pub fn references(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut BTreeSet<String>) {
        match self {
            Value::Ref(name) | Value::GetAtt(name, _) => {
                names.insert(name.clone());
            }
            Value::List(items) | Value::Join(_, items) => {
                for item in items {
                    item.collect_references(names);
                }
            }
            Value::Map(map) => {
                for v in map.values() {
                    v.collect_references(names);
                }
            }
            Value::Base64(inner) => inner.collect_references(names),
            Value::String(_) | Value::Int(_) | Value::Bool(_) => {}
        }
    }

    /// Replace every `Ref` to a name present in `params` with its value
    pub fn substitute(&self, params: &HashMap<String, Value>) -> Value {
        match self {
            Value::Ref(name) => params.get(name).cloned().unwrap_or_else(|| self.clone()),
            Value::List(items) => Value::List(items.iter().map(|v| v.substitute(params)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.substitute(params)))
                    .collect(),
            ),
            Value::Base64(inner) => Value::Base64(Box::new(inner.substitute(params))),
            Value::Join(sep, parts) => Value::Join(
                sep.clone(),
                parts.iter().map(|v| v.substitute(params)).collect(),
            ),
            Value::String(_) | Value::Int(_) | Value::Bool(_) | Value::GetAtt(_, _) => {
                self.clone()
            }
        }
    }

    /// Convert to JSON, writing references in CloudFormation intrinsic form.
    /// Map keys are emitted unchanged.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_with_keys(&|k: &str| k.to_string())
    }

    /// Convert to JSON, renaming every map key with `rename`
    pub fn to_json_with_keys(&self, rename: &dyn Fn(&str) -> String) -> serde_json::Value {
        match self {
            Value::String(s) => json!(s),
            Value::Int(n) => json!(n),
            Value::Bool(b) => json!(b),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(|v| v.to_json_with_keys(rename)).collect(),
            ),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (rename(k), v.to_json_with_keys(rename)))
                    .collect(),
            ),
            Value::Ref(name) => json!({ "Ref": name }),
            Value::GetAtt(name, attr) => json!({ "Fn::GetAtt": [name, attr] }),
            Value::Base64(inner) => json!({ "Fn::Base64": inner.to_json_with_keys(rename) }),
            Value::Join(sep, parts) => {
                let parts: Vec<_> = parts.iter().map(|v| v.to_json_with_keys(rename)).collect();
                json!({ "Fn::Join": [sep, parts] })
            }
        }
    }

    /// Parse the JSON form produced by [`Value::to_json`]
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;

        match json {
            Json::String(s) => Some(Value::String(s.clone())),
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::Number(n) => n.as_i64().map(Value::Int),
            Json::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Json::Object(obj) if obj.len() == 1 => {
                let (key, inner) = obj.iter().next()?;
                match key.as_str() {
                    "Ref" => inner.as_str().map(Value::reference),
                    "Fn::GetAtt" => {
                        let pair = inner.as_array()?;
                        match pair.as_slice() {
                            [Json::String(name), Json::String(attr)] => {
                                Some(Value::GetAtt(name.clone(), attr.clone()))
                            }
                            _ => None,
                        }
                    }
                    "Fn::Base64" => Value::from_json(inner).map(|v| Value::Base64(Box::new(v))),
                    "Fn::Join" => {
                        let pair = inner.as_array()?;
                        match pair.as_slice() {
                            [Json::String(sep), Json::Array(parts)] => parts
                                .iter()
                                .map(Value::from_json)
                                .collect::<Option<Vec<_>>>()
                                .map(|parts| Value::Join(sep.clone(), parts)),
                            _ => None,
                        }
                    }
                    _ => Value::from_json(inner).map(|v| Value::map([(key.clone(), v)])),
                }
            }
            Json::Object(obj) => obj
                .iter()
                .map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                .collect::<Option<HashMap<_, _>>>()
                .map(Value::Map),
            Json::Null => None,
        }
    }
}

/// Desired state of one resource in the declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// Explicit ordering dependencies beyond attribute references
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn logical_id(&self) -> &str {
        &self.id.name
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Logical names this resource needs to exist first
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps: BTreeSet<String> = self.depends_on.iter().cloned().collect();
        for value in self.attributes.values() {
            value.collect_references(&mut deps);
        }
        deps
    }

    /// Copy of this resource with parameter references replaced by values
    pub fn substitute(&self, params: &HashMap<String, Value>) -> Resource {
        Resource {
            id: self.id.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.substitute(params)))
                .collect(),
            depends_on: self.depends_on.clone(),
        }
    }
}

/// Recorded state of a resource from a previous apply
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            attributes,
            exists: true,
        }
    }
}
