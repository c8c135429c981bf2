//! Errors raised while building the stack

use std::path::PathBuf;

use thiserror::Error;
use wickr_core::graph::GraphError;
use wickr_core::parameter::ParameterError;
use wickr_core::template::TemplateError;

use crate::network::SubnetType;
use crate::server::Server;

/// Failure to load a bootstrap script
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Bootstrap script not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read bootstrap script {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid CIDR block '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("A network needs at least one availability zone")]
    NoZones,

    #[error("{requested} NAT gateways requested for {zones} availability zones")]
    NatGatewayCount { requested: usize, zones: usize },

    #[error("No {subnet_type} subnet available for the {server} server")]
    NoSubnet {
        subnet_type: SubnetType,
        server: Server,
    },
}
