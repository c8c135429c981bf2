//! Elastic addresses of the public servers
//!
//! Addresses are allocated on their own and bound to their instance with a
//! separate association once the instance exists.

use wickr_core::case_convert::to_logical_id;
use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::{Resource, Value};

use crate::error::StackError;
use crate::server::Server;

/// Allocate an unbound address for `server`
pub fn allocate(graph: &mut ResourceGraph, server: Server) -> Result<ResourceHandle, StackError> {
    let id = to_logical_id(&format!("{} EIP", server.instance_id()));
    Ok(graph.add(Resource::new("eip", id).with_attribute("domain", Value::string("vpc")))?)
}

/// Bind `eip` to `instance`
pub fn associate(
    graph: &mut ResourceGraph,
    server: Server,
    eip: ResourceHandle,
    instance: ResourceHandle,
) -> Result<ResourceHandle, StackError> {
    let id = to_logical_id(&format!("{} Ec2 EIP Association", server.instance_id()));
    Ok(graph.add(
        Resource::new("eip_association", id)
            .with_attribute("eip", graph.ref_value(eip))
            .with_attribute("instance_id", graph.ref_value(instance)),
    )?)
}
