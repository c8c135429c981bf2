//! Compute instances

use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::{Resource, Value};

use crate::error::StackError;
use crate::iam::AccessRole;
use crate::network::{Subnet, SubnetType, name_tag};
use crate::parameters::Parameters;
use crate::server::Server;

/// One size class for all three servers
pub const INSTANCE_TYPE: &str = "t3.large";
pub const ROOT_DEVICE: &str = "/dev/xvda";

/// Everything an instance is wired to
#[derive(Debug, Clone)]
pub struct InstanceSpec<'a> {
    pub server: Server,
    pub subnet: &'a Subnet,
    pub security_group: ResourceHandle,
    pub access: AccessRole,
    pub user_data: Value,
}

pub fn declare(
    graph: &mut ResourceGraph,
    stack_name: &str,
    params: &Parameters,
    spec: InstanceSpec<'_>,
) -> Result<ResourceHandle, StackError> {
    let id = spec.server.instance_id();

    let mut resource = Resource::new("instance", id)
        .with_attribute("image_id", params.image_id.clone())
        .with_attribute("instance_type", Value::string(INSTANCE_TYPE))
        .with_attribute("subnet_id", graph.ref_value(spec.subnet.handle))
        .with_attribute("availability_zone", spec.subnet.zone.clone())
        .with_attribute(
            "security_group_ids",
            Value::List(vec![graph.attr_value(spec.security_group, "GroupId")]),
        )
        .with_attribute(
            "iam_instance_profile",
            graph.ref_value(spec.access.instance_profile),
        )
        .with_attribute("key_name", params.key_pair.clone())
        .with_attribute("block_device_mappings", root_volume(&params.ebs_size))
        .with_attribute("user_data", spec.user_data)
        .with_attribute("tags", name_tag(&format!("{}/{}", stack_name, id)))
        .with_dependency(graph.logical_id(spec.access.role));

    // Public instances need their route before they can reach the internet
    if spec.subnet.subnet_type == SubnetType::Public {
        resource = resource.with_dependency(graph.logical_id(spec.subnet.default_route));
    }

    Ok(graph.add(resource)?)
}

/// Encrypted root volume of `size` GB, deleted with the instance
pub fn root_volume(size: &Value) -> Value {
    Value::List(vec![Value::map([
        ("device_name", Value::string(ROOT_DEVICE)),
        (
            "ebs",
            Value::map([
                ("volume_size", size.clone()),
                ("encrypted", Value::Bool(true)),
                ("delete_on_termination", Value::Bool(true)),
            ]),
        ),
    ])])
}
