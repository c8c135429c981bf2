//! Build-time properties of the stack

use std::path::{Path, PathBuf};

pub const DEFAULT_STACK_NAME: &str = "WickrEntCdk";
pub const DEFAULT_SCRIPTS_DIR: &str = "src";

/// Properties fixed when the declaration is built, as opposed to template
/// parameters which are resolved at deploy time
#[derive(Debug, Clone, PartialEq)]
pub struct StackProps {
    pub stack_name: String,
    /// Directory holding the three bootstrap scripts
    pub scripts_dir: PathBuf,
    /// NAT gateways to spread over the public subnets (one per zone by default)
    pub nat_gateways: usize,
}

impl StackProps {
    pub fn new(scripts_dir: impl AsRef<Path>) -> Self {
        Self {
            scripts_dir: scripts_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_stack_name(mut self, name: impl Into<String>) -> Self {
        self.stack_name = name.into();
        self
    }

    pub fn with_nat_gateways(mut self, count: usize) -> Self {
        self.nat_gateways = count;
        self
    }
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            nat_gateways: 2,
        }
    }
}
