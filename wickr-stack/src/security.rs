//! Security groups and their ingress rules
//!
//! Rules with a CIDR peer are declared inline on their group. Rules whose
//! peer is another group become standalone ingress resources, so groups that
//! reference each other never form a dependency cycle.

use std::fmt;

use wickr_core::case_convert::to_logical_id;
use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::{Resource, Value};

use crate::error::StackError;
use crate::network::ANY_IPV4;
use crate::server::Server;

/// Source of inbound traffic
#[derive(Debug, Clone, PartialEq)]
pub enum Peer {
    AnyIpv4,
    /// A CIDR block, usually a parameter reference
    Cidr(Value),
    /// Members of another server's security group
    Group(Server),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// Protocol and inclusive port range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub protocol: Protocol,
    pub from: u16,
    pub to: u16,
}

impl Port {
    pub fn tcp(port: u16) -> Self {
        Self::tcp_range(port, port)
    }

    pub fn tcp_range(from: u16, to: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            from,
            to,
        }
    }

    pub fn udp_range(from: u16, to: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            from,
            to,
        }
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.from..=self.to).contains(&port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = self.protocol.as_str().to_uppercase();
        if self.from == self.to {
            write!(f, "{} {}", protocol, self.from)
        } else {
            write!(f, "{} {}-{}", protocol, self.from, self.to)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngressRule {
    pub peer: Peer,
    pub port: Port,
    pub description: &'static str,
}

impl IngressRule {
    fn new(peer: Peer, port: Port, description: &'static str) -> Self {
        Self {
            peer,
            port,
            description,
        }
    }

    /// Rule fields shared by inline and standalone declarations
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("ip_protocol", Value::string(self.port.protocol.as_str())),
            ("from_port", Value::Int(i64::from(self.port.from))),
            ("to_port", Value::Int(i64::from(self.port.to))),
            ("description", Value::string(self.description)),
        ]
    }
}

/// Inbound rules of `server`'s group. `ssh_ip` is the administrator's CIDR.
pub fn ingress_rules(server: Server, ssh_ip: &Value) -> Vec<IngressRule> {
    let admin = || Peer::Cidr(ssh_ip.clone());

    match server {
        Server::Messaging => vec![
            IngressRule::new(Peer::AnyIpv4, Port::tcp(22), "SSH Access"),
            IngressRule::new(admin(), Port::tcp(8800), "Installer UI Admin Console"),
            IngressRule::new(Peer::AnyIpv4, Port::tcp(443), "Client"),
            IngressRule::new(
                Peer::Group(Server::VoiceVideo),
                Port::tcp_range(9870, 9881),
                "Voice and Video",
            ),
            IngressRule::new(
                Peer::Group(Server::Compliance),
                Port::tcp(443),
                "Compliance Server",
            ),
        ],
        Server::VoiceVideo => vec![
            IngressRule::new(admin(), Port::tcp(22), "Allow SSH Access"),
            IngressRule::new(Peer::AnyIpv4, Port::udp_range(16384, 17384), "Audio and Video"),
            IngressRule::new(
                Peer::Group(Server::Messaging),
                Port::tcp(444),
                "Messaging Server",
            ),
            IngressRule::new(Peer::AnyIpv4, Port::tcp(8001), "SOCKS Proxy"),
            IngressRule::new(Peer::AnyIpv4, Port::tcp(443), "TCP Proxy"),
        ],
        // Reachable through the session manager only
        Server::Compliance => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecurityGroups {
    pub compliance: ResourceHandle,
    pub messaging: ResourceHandle,
    pub voice_video: ResourceHandle,
}

impl SecurityGroups {
    /// Declare the three groups, then the rules linking them
    pub fn declare(
        graph: &mut ResourceGraph,
        vpc: ResourceHandle,
        ssh_ip: &Value,
    ) -> Result<SecurityGroups, StackError> {
        let vpc_id = graph.ref_value(vpc);
        let groups = SecurityGroups {
            compliance: declare_group(graph, Server::Compliance, &vpc_id, ssh_ip)?,
            messaging: declare_group(graph, Server::Messaging, &vpc_id, ssh_ip)?,
            voice_video: declare_group(graph, Server::VoiceVideo, &vpc_id, ssh_ip)?,
        };

        for server in Server::ALL {
            for rule in ingress_rules(server, ssh_ip) {
                let Peer::Group(source) = &rule.peer else {
                    continue;
                };
                let source = *source;
                let id = to_logical_id(&format!(
                    "{} from {}:{}-{}",
                    server.security_group_id(),
                    source.security_group_id(),
                    rule.port.from,
                    rule.port.to
                ));

                let mut resource = Resource::new("security_group_ingress", id)
                    .with_attribute("group_id", graph.attr_value(groups.get(server), "GroupId"))
                    .with_attribute(
                        "source_security_group_id",
                        graph.attr_value(groups.get(source), "GroupId"),
                    );
                for (key, value) in rule.fields() {
                    resource = resource.with_attribute(key, value);
                }
                graph.add(resource)?;
            }
        }

        Ok(groups)
    }

    pub fn get(&self, server: Server) -> ResourceHandle {
        match server {
            Server::Compliance => self.compliance,
            Server::Messaging => self.messaging,
            Server::VoiceVideo => self.voice_video,
        }
    }
}

fn declare_group(
    graph: &mut ResourceGraph,
    server: Server,
    vpc_id: &Value,
    ssh_ip: &Value,
) -> Result<ResourceHandle, StackError> {
    let inline: Vec<Value> = ingress_rules(server, ssh_ip)
        .into_iter()
        .filter_map(|rule| {
            let cidr = match &rule.peer {
                Peer::AnyIpv4 => Value::string(ANY_IPV4),
                Peer::Cidr(cidr) => cidr.clone(),
                Peer::Group(_) => return None,
            };
            let mut fields = rule.fields();
            fields.push(("cidr_ip", cidr));
            Some(Value::map(fields))
        })
        .collect();

    let mut resource = Resource::new("security_group", server.security_group_id())
        .with_attribute("group_description", Value::string(server.security_group_description()))
        .with_attribute("group_name", Value::string(server.security_group_name()))
        .with_attribute("vpc_id", vpc_id.clone())
        .with_attribute(
            "security_group_egress",
            Value::List(vec![Value::map([
                ("ip_protocol", Value::string("-1")),
                ("cidr_ip", Value::string(ANY_IPV4)),
                ("description", Value::string("Allow all outbound traffic by default")),
            ])]),
        );
    if !inline.is_empty() {
        resource = resource.with_attribute("security_group_ingress", Value::List(inline));
    }

    Ok(graph.add(resource)?)
}
