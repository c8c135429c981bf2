//! Bootstrap scripts and the first-boot payload built from them
//!
//! Script content is opaque. It is read once when the stack is built and
//! never inspected.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use wickr_core::resource::Value;

use crate::error::BootstrapError;
use crate::server::Server;

const SHEBANG: &str = "#!/bin/bash";

/// Scripts of all three servers
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapScripts {
    scripts: HashMap<Server, String>,
}

impl BootstrapScripts {
    /// Read every server's script from `dir`. Fails on the first missing or
    /// unreadable file.
    pub fn load(dir: &Path) -> Result<Self, BootstrapError> {
        let mut scripts = HashMap::new();
        for server in Server::ALL {
            let path = dir.join(server.script_file());
            let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => BootstrapError::NotFound { path: path.clone() },
                _ => BootstrapError::Read {
                    path: path.clone(),
                    source: e,
                },
            })?;
            debug!("loaded {} ({} bytes)", path.display(), content.len());
            scripts.insert(server, content);
        }
        Ok(Self { scripts })
    }

    pub fn script(&self, server: Server) -> &str {
        self.scripts.get(&server).map(String::as_str).unwrap_or_default()
    }

    /// First-boot payload of `server`
    pub fn user_data(&self, server: Server) -> Value {
        user_data(self.script(server))
    }
}

/// Linux user data running `script` under bash
pub fn user_data(script: &str) -> Value {
    Value::Base64(Box::new(Value::string(format!("{}\n{}", SHEBANG, script))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_scripts(dir: &Path, servers: &[Server]) {
        for server in servers {
            fs::write(dir.join(server.script_file()), format!("echo {}\n", server)).unwrap();
        }
    }

    #[test]
    fn loads_all_scripts() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(dir.path(), &Server::ALL);

        let scripts = BootstrapScripts::load(dir.path()).unwrap();
        assert_eq!(scripts.script(Server::Messaging), "echo Messaging\n");
        assert_eq!(
            scripts.user_data(Server::Compliance),
            Value::Base64(Box::new(Value::string("#!/bin/bash\necho Compliance\n")))
        );
    }

    #[test]
    fn missing_script_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(dir.path(), &[Server::Compliance, Server::Messaging]);

        match BootstrapScripts::load(dir.path()) {
            Err(BootstrapError::NotFound { path }) => {
                assert_eq!(path, dir.path().join("voicevideo-config.sh"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
