//! Project configuration (`wickr.json`)
//!
//! Every field is optional. A missing file means all defaults.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;
use wickr_stack::StackProps;
use wickr_stack::props::{DEFAULT_SCRIPTS_DIR, DEFAULT_STACK_NAME};
use wickr_state::{BackendConfig, LocalBackend};

pub const DEFAULT_CONFIG_FILE: &str = "wickr.json";
pub const DEFAULT_OUT_DIR: &str = "cdk.out";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub stack_name: String,
    pub scripts_dir: PathBuf,
    pub out_dir: PathBuf,
    pub nat_gateways: Option<usize>,
    pub backend: BackendSection,
    /// Deploy-time parameter values, strings or numbers
    pub parameters: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSection {
    #[serde(rename = "type")]
    pub backend_type: String,
    pub path: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            nat_gateways: None,
            backend: BackendSection::default(),
            parameters: BTreeMap::new(),
        }
    }
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            backend_type: "local".to_string(),
            path: PathBuf::from(LocalBackend::DEFAULT_STATE_FILE),
        }
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))
    }

    pub fn stack_props(&self) -> StackProps {
        let props = StackProps::new(&self.scripts_dir).with_stack_name(&self.stack_name);
        match self.nat_gateways {
            Some(count) => props.with_nat_gateways(count),
            None => props,
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::local(&self.backend.path);
        config.backend_type = self.backend.backend_type.clone();
        config
    }

    pub fn template_path(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}.template.json", self.stack_name))
    }

    /// Parameter values from the config file, overridden by `key=value`
    /// pairs from the command line
    pub fn supplied_parameters(&self, overrides: &[String]) -> Result<HashMap<String, String>, String> {
        let mut supplied = HashMap::new();
        for (name, value) in &self.parameters {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(format!(
                        "Parameter '{}' must be a string or a number, got {}",
                        name, other
                    ));
                }
            };
            supplied.insert(name.clone(), value);
        }

        for pair in overrides {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Expected key=value, got '{}'", pair))?;
            supplied.insert(name.trim().to_string(), value.to_string());
        }

        Ok(supplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(&dir.path().join("wickr.json")).unwrap();

        assert_eq!(config.stack_name, "WickrEntCdk");
        assert_eq!(config.scripts_dir, PathBuf::from("src"));
        assert_eq!(
            config.template_path(),
            PathBuf::from("cdk.out/WickrEntCdk.template.json")
        );
        assert_eq!(config.backend_config().get_string("path"), Some("wickr.state.json"));
    }

    #[test]
    fn reads_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wickr.json");
        fs::write(
            &path,
            r#"{
                "stackName": "Staging",
                "natGateways": 1,
                "backend": { "path": "state/staging.json" },
                "parameters": { "sshIp": "203.0.113.5/32", "EBSsize": 200 }
            }"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.stack_name, "Staging");
        assert_eq!(config.stack_props().nat_gateways, 1);
        assert_eq!(config.backend.backend_type, "local");

        let supplied = config.supplied_parameters(&[]).unwrap();
        assert_eq!(supplied["EBSsize"], "200");
        assert_eq!(supplied["sshIp"], "203.0.113.5/32");
    }

    #[test]
    fn command_line_overrides_config() {
        let mut config = ProjectConfig::default();
        config
            .parameters
            .insert("keyPair".to_string(), serde_json::json!("old"));

        let supplied = config
            .supplied_parameters(&["keyPair=new".to_string(), "sshIp=10.0.0.1/32".to_string()])
            .unwrap();
        assert_eq!(supplied["keyPair"], "new");
        assert_eq!(supplied["sshIp"], "10.0.0.1/32");

        assert!(config.supplied_parameters(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn rejects_non_scalar_parameters() {
        let mut config = ProjectConfig::default();
        config
            .parameters
            .insert("sshIp".to_string(), serde_json::json!(["a"]));
        assert!(config.supplied_parameters(&[]).is_err());
    }
}
