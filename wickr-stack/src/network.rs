//! Network - VPC, subnets, gateways and routes
//!
//! The VPC block is split evenly between the subnets, public subnets first.
//! Each zone gets one public and one private subnet. Public subnets route to
//! the internet gateway, private subnets to a NAT gateway placed in a public
//! subnet.

use std::fmt;
use std::net::Ipv4Addr;

use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::{Resource, Value};

use crate::error::StackError;

pub const VPC_CIDR: &str = "10.0.0.0/16";
pub const ANY_IPV4: &str = "0.0.0.0/0";

const VPC_ID: &str = "VPC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetType {
    Public,
    Private,
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetType::Public => write!(f, "Public"),
            SubnetType::Private => write!(f, "Private"),
        }
    }
}

/// A declared subnet and the routing that belongs to it
#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub handle: ResourceHandle,
    pub subnet_type: SubnetType,
    pub zone: Value,
    pub cidr: String,
    pub route_table: ResourceHandle,
    pub default_route: ResourceHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub vpc: ResourceHandle,
    pub internet_gateway: ResourceHandle,
    pub gateway_attachment: ResourceHandle,
    subnets: Vec<Subnet>,
    nat_gateways: Vec<ResourceHandle>,
}

impl Network {
    /// Declare the network over `zones`, in order
    pub fn declare(
        graph: &mut ResourceGraph,
        stack_name: &str,
        zones: &[Value],
        nat_gateways: usize,
    ) -> Result<Network, StackError> {
        if zones.is_empty() {
            return Err(StackError::NoZones);
        }
        if nat_gateways == 0 || nat_gateways > zones.len() {
            return Err(StackError::NatGatewayCount {
                requested: nat_gateways,
                zones: zones.len(),
            });
        }

        let cidrs = carve(VPC_CIDR, zones.len() * 2)?;
        let (public_cidrs, private_cidrs) = cidrs.split_at(zones.len());

        let vpc = graph.add(
            Resource::new("vpc", VPC_ID)
                .with_attribute("cidr_block", Value::string(VPC_CIDR))
                .with_attribute("enable_dns_hostnames", Value::Bool(true))
                .with_attribute("enable_dns_support", Value::Bool(true))
                .with_attribute("instance_tenancy", Value::string("default"))
                .with_attribute("tags", name_tag(&format!("{}/{}", stack_name, VPC_ID))),
        )?;
        let vpc_id = graph.ref_value(vpc);

        let internet_gateway = graph.add(
            Resource::new("internet_gateway", format!("{}IGW", VPC_ID))
                .with_attribute("tags", name_tag(&format!("{}/{}", stack_name, VPC_ID))),
        )?;
        let gateway_attachment = graph.add(
            Resource::new("vpc_gateway_attachment", format!("{}VPCGW", VPC_ID))
                .with_attribute("vpc_id", vpc_id.clone())
                .with_attribute("internet_gateway_id", graph.ref_value(internet_gateway)),
        )?;

        let mut subnets = Vec::with_capacity(zones.len() * 2);
        let mut nats = Vec::with_capacity(nat_gateways);

        for (i, (zone, cidr)) in zones.iter().zip(public_cidrs).enumerate() {
            let base = SubnetBase::new(stack_name, SubnetType::Public, i, zone, cidr);
            let (subnet, route_table, association) = base.declare(graph, &vpc_id)?;
            let default_route = graph.add(
                Resource::new("route", base.id("DefaultRoute"))
                    .with_attribute("route_table_id", graph.ref_value(route_table))
                    .with_attribute("destination_cidr_block", Value::string(ANY_IPV4))
                    .with_attribute("gateway_id", graph.ref_value(internet_gateway))
                    .with_dependency(graph.logical_id(gateway_attachment)),
            )?;

            if i < nat_gateways {
                let eip = graph.add(
                    Resource::new("eip", base.id("EIP"))
                        .with_attribute("domain", Value::string("vpc"))
                        .with_attribute("tags", name_tag(&base.path)),
                )?;
                let nat = graph.add(
                    Resource::new("nat_gateway", base.id("NATGateway"))
                        .with_attribute("allocation_id", graph.attr_value(eip, "AllocationId"))
                        .with_attribute("subnet_id", graph.ref_value(subnet))
                        .with_attribute("tags", name_tag(&base.path))
                        .with_dependency(graph.logical_id(default_route))
                        .with_dependency(graph.logical_id(association)),
                )?;
                nats.push(nat);
            }

            subnets.push(Subnet {
                handle: subnet,
                subnet_type: SubnetType::Public,
                zone: zone.clone(),
                cidr: cidr.clone(),
                route_table,
                default_route,
            });
        }

        for (i, (zone, cidr)) in zones.iter().zip(private_cidrs).enumerate() {
            let base = SubnetBase::new(stack_name, SubnetType::Private, i, zone, cidr);
            let (subnet, route_table, _) = base.declare(graph, &vpc_id)?;
            let nat = nats[i.min(nats.len() - 1)];
            let default_route = graph.add(
                Resource::new("route", base.id("DefaultRoute"))
                    .with_attribute("route_table_id", graph.ref_value(route_table))
                    .with_attribute("destination_cidr_block", Value::string(ANY_IPV4))
                    .with_attribute("nat_gateway_id", graph.ref_value(nat)),
            )?;

            subnets.push(Subnet {
                handle: subnet,
                subnet_type: SubnetType::Private,
                zone: zone.clone(),
                cidr: cidr.clone(),
                route_table,
                default_route,
            });
        }

        Ok(Network {
            vpc,
            internet_gateway,
            gateway_attachment,
            subnets,
            nat_gateways: nats,
        })
    }

    /// First subnet of `subnet_type` in `zone`. When two zones are the same
    /// the first declared subnet wins.
    pub fn select(&self, subnet_type: SubnetType, zone: &Value) -> Option<&Subnet> {
        self.subnets
            .iter()
            .find(|s| s.subnet_type == subnet_type && &s.zone == zone)
    }

    pub fn subnets(&self, subnet_type: SubnetType) -> impl Iterator<Item = &Subnet> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    pub fn nat_gateways(&self) -> &[ResourceHandle] {
        &self.nat_gateways
    }
}

/// Naming and the resources shared by public and private subnets
struct SubnetBase<'a> {
    prefix: String,
    path: String,
    subnet_type: SubnetType,
    zone: &'a Value,
    cidr: &'a str,
}

impl<'a> SubnetBase<'a> {
    fn new(
        stack_name: &str,
        subnet_type: SubnetType,
        index: usize,
        zone: &'a Value,
        cidr: &'a str,
    ) -> Self {
        let name = format!("{}Subnet{}", subnet_type, index + 1);
        Self {
            prefix: format!("{}{}", VPC_ID, name),
            path: format!("{}/{}/{}", stack_name, VPC_ID, name),
            subnet_type,
            zone,
            cidr,
        }
    }

    fn id(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Subnet, route table and their association
    fn declare(
        &self,
        graph: &mut ResourceGraph,
        vpc_id: &Value,
    ) -> Result<(ResourceHandle, ResourceHandle, ResourceHandle), StackError> {
        let subnet = graph.add(
            Resource::new("subnet", self.id("Subnet"))
                .with_attribute("vpc_id", vpc_id.clone())
                .with_attribute("cidr_block", Value::string(self.cidr))
                .with_attribute("availability_zone", self.zone.clone())
                .with_attribute(
                    "map_public_ip_on_launch",
                    Value::Bool(self.subnet_type == SubnetType::Public),
                )
                .with_attribute("tags", name_tag(&self.path)),
        )?;
        let route_table = graph.add(
            Resource::new("route_table", self.id("RouteTable"))
                .with_attribute("vpc_id", vpc_id.clone())
                .with_attribute("tags", name_tag(&self.path)),
        )?;
        let association = graph.add(
            Resource::new("subnet_route_table_association", self.id("RouteTableAssociation"))
                .with_attribute("route_table_id", graph.ref_value(route_table))
                .with_attribute("subnet_id", graph.ref_value(subnet)),
        )?;
        Ok((subnet, route_table, association))
    }
}

/// Single `Name` tag
pub fn name_tag(name: &str) -> Value {
    Value::List(vec![Value::map([
        ("key", Value::string("Name")),
        ("value", Value::string(name)),
    ])])
}

/// Split `cidr` into `count` equal blocks, rounding the count up to a power
/// of two
pub fn carve(cidr: &str, count: usize) -> Result<Vec<String>, StackError> {
    let invalid = |reason: &str| StackError::InvalidCidr {
        cidr: cidr.to_string(),
        reason: reason.to_string(),
    };

    let (addr, prefix) = cidr.split_once('/').ok_or_else(|| invalid("expected IP/prefix"))?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid("bad address"))?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid("bad prefix"))?;
    if prefix > 32 {
        return Err(invalid("prefix longer than 32"));
    }

    let new_prefix = prefix + count.max(1).next_power_of_two().trailing_zeros();
    if new_prefix > 32 {
        return Err(invalid("too small for the requested subnets"));
    }

    let mask = (u64::MAX << (32 - prefix)) as u32;
    let base = u64::from(u32::from(addr) & mask);
    let size = 1u64 << (32 - new_prefix);

    Ok((0..count as u64)
        .map(|i| format!("{}/{}", Ipv4Addr::from((base + i * size) as u32), new_prefix))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> Vec<Value> {
        vec![Value::reference("zoneA"), Value::reference("zoneB")]
    }

    #[test]
    fn carve_splits_into_quarters() {
        assert_eq!(
            carve(VPC_CIDR, 4).unwrap(),
            vec!["10.0.0.0/18", "10.0.64.0/18", "10.0.128.0/18", "10.0.192.0/18"]
        );
    }

    #[test]
    fn carve_rounds_up_to_power_of_two() {
        assert_eq!(
            carve("10.1.0.0/24", 3).unwrap(),
            vec!["10.1.0.0/26", "10.1.0.64/26", "10.1.0.128/26"]
        );
    }

    #[test]
    fn carve_rejects_bad_blocks() {
        assert!(carve("10.0.0.0", 2).is_err());
        assert!(carve("10.0.0.0/31", 4).is_err());
    }

    #[test]
    fn two_zones_give_four_subnets() {
        let mut graph = ResourceGraph::new();
        let network = Network::declare(&mut graph, "Test", &zones(), 2).unwrap();

        assert_eq!(graph.count_of("vpc"), 1);
        assert_eq!(graph.count_of("subnet"), 4);
        assert_eq!(graph.count_of("nat_gateway"), 2);
        assert_eq!(graph.count_of("eip"), 2);
        assert_eq!(graph.count_of("internet_gateway"), 1);
        assert_eq!(network.subnets(SubnetType::Public).count(), 2);

        let public = network.select(SubnetType::Public, &zones()[0]).unwrap();
        assert_eq!(graph.logical_id(public.handle), "VPCPublicSubnet1Subnet");
        assert_eq!(public.cidr, "10.0.0.0/18");

        let private = network.select(SubnetType::Private, &zones()[1]).unwrap();
        assert_eq!(graph.logical_id(private.handle), "VPCPrivateSubnet2Subnet");
        assert_eq!(private.cidr, "10.0.192.0/18");
        assert_eq!(
            graph.get(private.handle).attribute("map_public_ip_on_launch"),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn private_subnets_share_a_single_nat() {
        let mut graph = ResourceGraph::new();
        let network = Network::declare(&mut graph, "Test", &zones(), 1).unwrap();
        let nat = graph.ref_value(network.nat_gateways()[0]);

        for subnet in network.subnets(SubnetType::Private) {
            let route = graph.get(subnet.default_route);
            assert_eq!(route.attribute("nat_gateway_id"), Some(&nat));
        }
    }

    #[test]
    fn equal_zones_select_first_subnet() {
        let zone = Value::string("eu-west-2a");
        let mut graph = ResourceGraph::new();
        let network =
            Network::declare(&mut graph, "Test", &[zone.clone(), zone.clone()], 2).unwrap();

        let selected = network.select(SubnetType::Private, &zone).unwrap();
        assert_eq!(graph.logical_id(selected.handle), "VPCPrivateSubnet1Subnet");
    }

    #[test]
    fn nat_count_is_bounded_by_zones() {
        let mut graph = ResourceGraph::new();
        assert!(matches!(
            Network::declare(&mut graph, "Test", &zones(), 3),
            Err(StackError::NatGatewayCount { .. })
        ));
        assert!(matches!(
            Network::declare(&mut ResourceGraph::new(), "Test", &zones(), 0),
            Err(StackError::NatGatewayCount { .. })
        ));
    }
}
