//! EC2 resource schema definitions

use crate::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Tag list (`[{ key, value }]`)
pub fn tags() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Struct(vec![
        AttributeSchema::new("key", AttributeType::String).required(),
        AttributeSchema::new("value", AttributeType::String).required(),
    ])))
}

fn tags_attribute() -> AttributeSchema {
    AttributeSchema::new("tags", tags()).with_description("Resource tags")
}

fn reference(name: &str, description: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
        .required()
        .with_description(description)
}

/// One security group rule, as embedded in a group or declared standalone
fn rule_fields(peer_field: &str) -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new("ip_protocol", types::protocol()).required(),
        AttributeSchema::new("from_port", types::port_number()),
        AttributeSchema::new("to_port", types::port_number()),
        AttributeSchema::new(peer_field, types::cidr()),
        AttributeSchema::new("source_security_group_id", AttributeType::String),
        AttributeSchema::new("description", AttributeType::String),
    ]
}

/// Returns the schema for VPC
pub fn vpc_schema() -> ResourceSchema {
    ResourceSchema::new("vpc", "AWS::EC2::VPC")
        .with_description("A virtual private cloud")
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_description("The IPv4 CIDR block for the VPC"),
        )
        .attribute(AttributeSchema::new("enable_dns_hostnames", AttributeType::Bool))
        .attribute(AttributeSchema::new("enable_dns_support", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "instance_tenancy",
            AttributeType::Enum(vec![
                "default".to_string(),
                "dedicated".to_string(),
                "host".to_string(),
            ]),
        ))
        .attribute(tags_attribute())
}

/// Returns the schema for Subnet
pub fn subnet_schema() -> ResourceSchema {
    ResourceSchema::new("subnet", "AWS::EC2::Subnet")
        .with_description("A subnet of the VPC in one availability zone")
        .attribute(reference("vpc_id", "VPC to create the subnet in"))
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_description("The IPv4 CIDR block for the subnet"),
        )
        .attribute(
            AttributeSchema::new("availability_zone", types::availability_zone())
                .required()
                .with_description("The availability zone for the subnet"),
        )
        .attribute(AttributeSchema::new("map_public_ip_on_launch", AttributeType::Bool))
        .attribute(tags_attribute())
}

/// Returns the schema for Route Table
pub fn route_table_schema() -> ResourceSchema {
    ResourceSchema::new("route_table", "AWS::EC2::RouteTable")
        .with_description("A route table of the VPC")
        .attribute(reference("vpc_id", "VPC for the route table"))
        .attribute(tags_attribute())
}

/// Returns the schema for Subnet Route Table Association
pub fn subnet_route_table_association_schema() -> ResourceSchema {
    ResourceSchema::new(
        "subnet_route_table_association",
        "AWS::EC2::SubnetRouteTableAssociation",
    )
    .with_description("Binds a subnet to its route table")
    .attribute(reference("route_table_id", "Route table"))
    .attribute(reference("subnet_id", "Subnet"))
}

/// Returns the schema for Route
pub fn route_schema() -> ResourceSchema {
    ResourceSchema::new("route", "AWS::EC2::Route")
        .with_description("A route in a route table")
        .attribute(reference("route_table_id", "Route table"))
        .attribute(
            AttributeSchema::new("destination_cidr_block", types::cidr())
                .required()
                .with_description("Destination of the route"),
        )
        .attribute(
            AttributeSchema::new("gateway_id", AttributeType::String)
                .with_description("Internet gateway target"),
        )
        .attribute(
            AttributeSchema::new("nat_gateway_id", AttributeType::String)
                .with_description("NAT gateway target"),
        )
}

/// Returns the schema for Internet Gateway
pub fn internet_gateway_schema() -> ResourceSchema {
    ResourceSchema::new("internet_gateway", "AWS::EC2::InternetGateway")
        .with_description("Internet gateway of the VPC")
        .attribute(tags_attribute())
}

/// Returns the schema for VPC Gateway Attachment
pub fn vpc_gateway_attachment_schema() -> ResourceSchema {
    ResourceSchema::new("vpc_gateway_attachment", "AWS::EC2::VPCGatewayAttachment")
        .with_description("Attaches the internet gateway to the VPC")
        .attribute(reference("vpc_id", "VPC"))
        .attribute(reference("internet_gateway_id", "Internet gateway"))
}

/// Returns the schema for Elastic IP
pub fn eip_schema() -> ResourceSchema {
    ResourceSchema::new("eip", "AWS::EC2::EIP")
        .with_description("A static public IPv4 address")
        .attribute(AttributeSchema::new(
            "domain",
            AttributeType::Enum(vec!["vpc".to_string(), "standard".to_string()]),
        ))
        .attribute(tags_attribute())
}

/// Returns the schema for NAT Gateway
pub fn nat_gateway_schema() -> ResourceSchema {
    ResourceSchema::new("nat_gateway", "AWS::EC2::NatGateway")
        .with_description("NAT gateway for private subnet egress")
        .attribute(reference("allocation_id", "Allocation ID of the gateway's EIP"))
        .attribute(reference("subnet_id", "Public subnet hosting the gateway"))
        .attribute(tags_attribute())
}

/// Returns the schema for EIP Association
pub fn eip_association_schema() -> ResourceSchema {
    ResourceSchema::new("eip_association", "AWS::EC2::EIPAssociation")
        .with_description("Binds an elastic IP to an instance")
        .attribute(reference("eip", "Elastic IP address"))
        .attribute(reference("instance_id", "Instance receiving the address"))
}

/// Returns the schema for Security Group
pub fn security_group_schema() -> ResourceSchema {
    ResourceSchema::new("security_group", "AWS::EC2::SecurityGroup")
        .with_description("A VPC security group")
        .attribute(
            AttributeSchema::new("group_description", AttributeType::String)
                .required()
                .with_description("Description of the security group"),
        )
        .attribute(AttributeSchema::new("group_name", AttributeType::String))
        .attribute(reference("vpc_id", "VPC for the security group"))
        .attribute(AttributeSchema::new(
            "security_group_ingress",
            AttributeType::List(Box::new(AttributeType::Struct(rule_fields("cidr_ip")))),
        ))
        .attribute(AttributeSchema::new(
            "security_group_egress",
            AttributeType::List(Box::new(AttributeType::Struct(rule_fields("cidr_ip")))),
        ))
        .attribute(tags_attribute())
}

/// Returns the schema for a standalone Security Group Ingress rule
pub fn security_group_ingress_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("security_group_ingress", "AWS::EC2::SecurityGroupIngress")
        .with_description("An inbound rule attached to a security group")
        .attribute(reference("group_id", "Security group receiving the rule"));

    rule_fields("cidr_ip")
        .into_iter()
        .fold(schema, |schema, field| schema.attribute(field))
}

/// Returns the schema for Instance
pub fn instance_schema() -> ResourceSchema {
    let ebs = AttributeType::Struct(vec![
        AttributeSchema::new("volume_size", types::root_volume_size()).required(),
        AttributeSchema::new("encrypted", AttributeType::Bool),
        AttributeSchema::new("delete_on_termination", AttributeType::Bool),
    ]);
    let block_device = AttributeType::Struct(vec![
        AttributeSchema::new("device_name", AttributeType::String).required(),
        AttributeSchema::new("ebs", ebs).required(),
    ]);

    ResourceSchema::new("instance", "AWS::EC2::Instance")
        .with_description("A compute instance")
        .attribute(reference("image_id", "Machine image"))
        .attribute(reference("instance_type", "Instance size class"))
        .attribute(reference("subnet_id", "Subnet placement"))
        .attribute(AttributeSchema::new(
            "availability_zone",
            types::availability_zone(),
        ))
        .attribute(
            AttributeSchema::new(
                "security_group_ids",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("iam_instance_profile", AttributeType::String))
        .attribute(AttributeSchema::new("key_name", AttributeType::String))
        .attribute(AttributeSchema::new(
            "block_device_mappings",
            AttributeType::List(Box::new(block_device)),
        ))
        .attribute(
            AttributeSchema::new("user_data", AttributeType::String)
                .with_description("First-boot script"),
        )
        .attribute(tags_attribute())
}

/// Returns all EC2-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![
        vpc_schema(),
        subnet_schema(),
        route_table_schema(),
        subnet_route_table_association_schema(),
        route_schema(),
        internet_gateway_schema(),
        vpc_gateway_attachment_schema(),
        eip_schema(),
        nat_gateway_schema(),
        eip_association_schema(),
        security_group_schema(),
        security_group_ingress_schema(),
        instance_schema(),
    ]
}
