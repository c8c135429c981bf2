//! The three Wickr servers and what sets each apart

use std::fmt;

use crate::network::SubnetType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Server {
    /// Compliance/retention server, private subnet only
    Compliance,
    Messaging,
    VoiceVideo,
}

impl Server {
    /// Declaration order of the instances
    pub const ALL: [Server; 3] = [Server::Compliance, Server::Messaging, Server::VoiceVideo];

    /// Logical ID of the server's instance
    pub fn instance_id(&self) -> &'static str {
        match self {
            Server::Compliance => "Retention",
            Server::Messaging => "Messaging",
            Server::VoiceVideo => "VoiceVideo",
        }
    }

    pub fn security_group_id(&self) -> &'static str {
        match self {
            Server::Compliance => "ComplianceSecurityGroup",
            Server::Messaging => "MessagingSecurityGroup",
            Server::VoiceVideo => "VoiceandVideoSecurityGroup",
        }
    }

    pub fn security_group_name(&self) -> String {
        format!("{} Ingress", self)
    }

    pub fn security_group_description(&self) -> String {
        format!("Ingress rules required for Wickr {} Server", self)
    }

    /// File name of the bootstrap script in the scripts directory
    pub fn script_file(&self) -> &'static str {
        match self {
            Server::Compliance => "compliance-config.sh",
            Server::Messaging => "messaging-config.sh",
            Server::VoiceVideo => "voicevideo-config.sh",
        }
    }

    pub fn subnet_type(&self) -> SubnetType {
        match self {
            Server::Compliance => SubnetType::Private,
            Server::Messaging | Server::VoiceVideo => SubnetType::Public,
        }
    }

    /// Whether the server gets an elastic address
    pub fn has_public_address(&self) -> bool {
        self.subnet_type() == SubnetType::Public
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Server::Compliance => "Compliance",
            Server::Messaging => "Messaging",
            Server::VoiceVideo => "Voice and Video",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_follow_server_names() {
        assert_eq!(Server::Compliance.security_group_name(), "Compliance Ingress");
        assert_eq!(
            Server::VoiceVideo.security_group_description(),
            "Ingress rules required for Wickr Voice and Video Server"
        );
    }

    #[test]
    fn only_compliance_is_private() {
        let public: Vec<_> = Server::ALL
            .into_iter()
            .filter(Server::has_public_address)
            .collect();
        assert_eq!(public, vec![Server::Messaging, Server::VoiceVideo]);
    }
}
