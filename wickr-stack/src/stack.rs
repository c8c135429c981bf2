//! Stack - Assembly of the whole declaration
//!
//! Build order follows the resource graph: parameters, network, access role,
//! security groups, addresses, instances, address associations, outputs.

use std::collections::HashMap;

use log::{info, warn};
use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::parameter::ParameterSet;
use wickr_core::resource::Resource;
use wickr_core::template::{Output, Template};

use crate::address;
use crate::error::StackError;
use crate::iam::AccessRole;
use crate::instance::{self, InstanceSpec};
use crate::network::Network;
use crate::outputs::outputs;
use crate::parameters::{COMPLIANCE_AZ, MESS_VOICE_VID_AZ, Parameters};
use crate::props::StackProps;
use crate::security::SecurityGroups;
use crate::server::Server;
use crate::user_data::BootstrapScripts;

pub const DESCRIPTION: &str = "Wickr Enterprise: Messaging, Voice/Video and Compliance servers";

#[derive(Debug, Clone)]
pub struct WickrStack {
    pub name: String,
    parameters: ParameterSet,
    params: Parameters,
    graph: ResourceGraph,
    network: Network,
    access: AccessRole,
    groups: SecurityGroups,
    instances: HashMap<Server, ResourceHandle>,
    addresses: HashMap<Server, ResourceHandle>,
    outputs: Vec<Output>,
}

impl WickrStack {
    /// Build the declaration. Bootstrap scripts are read first, so a missing
    /// script fails before anything is declared.
    pub fn build(props: &StackProps) -> Result<WickrStack, StackError> {
        let scripts = BootstrapScripts::load(&props.scripts_dir)?;

        let mut parameters = ParameterSet::new();
        let params = Parameters::declare(&mut parameters);

        let mut graph = ResourceGraph::new();
        let network = Network::declare(
            &mut graph,
            &props.stack_name,
            &params.zones(),
            props.nat_gateways,
        )?;
        let access = AccessRole::declare(&mut graph)?;
        let groups = SecurityGroups::declare(&mut graph, network.vpc, &params.ssh_ip)?;

        let mut addresses = HashMap::new();
        for server in Server::ALL.into_iter().filter(Server::has_public_address) {
            addresses.insert(server, address::allocate(&mut graph, server)?);
        }

        let mut instances = HashMap::new();
        for server in Server::ALL {
            let subnet_type = server.subnet_type();
            let subnet = network
                .select(subnet_type, params.zone_for(server))
                .ok_or(StackError::NoSubnet {
                    subnet_type,
                    server,
                })?;
            let spec = InstanceSpec {
                server,
                subnet,
                security_group: groups.get(server),
                access,
                user_data: scripts.user_data(server),
            };
            let handle = instance::declare(&mut graph, &props.stack_name, &params, spec)?;
            instances.insert(server, handle);
        }

        for server in Server::ALL {
            if let (Some(&eip), Some(&instance)) = (addresses.get(&server), instances.get(&server)) {
                address::associate(&mut graph, server, eip, instance)?;
            }
        }

        let outputs = outputs(&graph, |server| instances[&server]);

        info!(
            "built stack {} with {} resources and {} outputs",
            props.stack_name,
            graph.len(),
            outputs.len()
        );

        Ok(WickrStack {
            name: props.stack_name.clone(),
            parameters,
            params,
            graph,
            network,
            access,
            groups,
            instances,
            addresses,
            outputs,
        })
    }

    pub fn template(&self) -> Template<'_> {
        Template::new(&self.parameters, &self.graph, &self.outputs).with_description(DESCRIPTION)
    }

    /// Pretty-printed template JSON
    pub fn synth(&self) -> Result<String, StackError> {
        Ok(self.template().to_string_pretty()?)
    }

    /// Resolve deploy-time parameters and substitute them into every
    /// resource. Resources come back dependencies first.
    pub fn resolve(&self, supplied: &HashMap<String, String>) -> Result<Vec<Resource>, StackError> {
        let values = self.parameters.resolve(supplied)?;
        if values.get(MESS_VOICE_VID_AZ) == values.get(COMPLIANCE_AZ) {
            warn!(
                "{} and {} are the same zone; all servers share one availability zone",
                MESS_VOICE_VID_AZ, COMPLIANCE_AZ
            );
        }

        let order = self.graph.topological_order()?;
        Ok(order.into_iter().map(|r| r.substitute(&values)).collect())
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn access_role(&self) -> AccessRole {
        self.access
    }

    pub fn security_group(&self, server: Server) -> ResourceHandle {
        self.groups.get(server)
    }

    pub fn instance(&self, server: Server) -> ResourceHandle {
        self.instances[&server]
    }

    /// Elastic address of `server`, if it has one
    pub fn address(&self, server: Server) -> Option<ResourceHandle> {
        self.addresses.get(&server).copied()
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use wickr_core::differ::create_plan;
    use wickr_core::parameter::ParameterError;
    use wickr_core::resource::{State, Value};

    use crate::error::BootstrapError;
    use crate::network::SubnetType;
    use crate::parameters::{EBS_SIZE, KEY_PAIR, SSH_IP};

    const ADMIN_CIDR: &str = "203.0.113.5/32";

    fn scripts_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for server in Server::ALL {
            fs::write(
                dir.path().join(server.script_file()),
                format!("echo configuring {}\n", server),
            )
            .unwrap();
        }
        dir
    }

    fn build(dir: &tempfile::TempDir) -> WickrStack {
        WickrStack::build(&StackProps::new(dir.path())).unwrap()
    }

    fn supplied(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut values: HashMap<String, String> = [(SSH_IP, ADMIN_CIDR), (KEY_PAIR, "ops-key")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (k, v) in extra {
            values.insert(k.to_string(), v.to_string());
        }
        values
    }

    fn find<'a>(resources: &'a [Resource], logical_id: &str) -> &'a Resource {
        resources
            .iter()
            .find(|r| r.logical_id() == logical_id)
            .unwrap_or_else(|| panic!("{} not declared", logical_id))
    }

    fn referenced<'a>(resources: &'a [Resource], value: Option<&Value>) -> &'a Resource {
        match value {
            Some(Value::Ref(name)) => find(resources, name),
            other => panic!("Expected a reference, got {:?}", other),
        }
    }

    fn group_id(server: Server) -> Value {
        Value::GetAtt(server.security_group_id().to_string(), "GroupId".to_string())
    }

    /// Standalone rules granting `source` access into `target`
    fn group_rules<'a>(
        resources: &'a [Resource],
        target: Server,
        source: Server,
    ) -> Vec<&'a Resource> {
        resources
            .iter()
            .filter(|r| r.id.resource_type == "security_group_ingress")
            .filter(|r| r.attribute("group_id") == Some(&group_id(target)))
            .filter(|r| r.attribute("source_security_group_id") == Some(&group_id(source)))
            .collect()
    }

    fn ports(rule: &Resource) -> (i64, i64) {
        let port = |key| rule.attribute(key).and_then(Value::as_int).unwrap();
        (port("from_port"), port("to_port"))
    }

    fn inline_rule<'a>(resources: &'a [Resource], server: Server, port: i64) -> &'a Value {
        let group = find(resources, server.security_group_id());
        group
            .attribute("security_group_ingress")
            .and_then(Value::as_list)
            .unwrap()
            .iter()
            .find(|r| r.as_map().unwrap()["from_port"] == Value::Int(port))
            .unwrap()
    }

    #[test]
    fn declares_expected_resource_counts() {
        let dir = scripts_dir();
        let stack = build(&dir);
        let graph = stack.graph();

        assert_eq!(graph.count_of("instance"), 3);
        assert_eq!(graph.count_of("security_group"), 3);
        assert_eq!(graph.count_of("vpc"), 1);
        assert_eq!(graph.count_of("iam_role"), 1);
        assert_eq!(graph.count_of("eip_association"), 2);

        // NAT gateways hold EIPs of their own; count the associated ones
        let associated: Vec<_> = graph
            .of_type("eip_association")
            .filter_map(|a| a.attribute("eip").cloned())
            .collect();
        assert_eq!(associated.len(), 2);
        assert_ne!(associated[0], associated[1]);
        assert!(stack.address(Server::Compliance).is_none());
    }

    #[test]
    fn servers_are_placed_by_zone_and_subnet_type() {
        let dir = scripts_dir();
        let resources = build(&dir).resolve(&supplied(&[])).unwrap();

        let placement = |server: Server| {
            let instance = find(&resources, server.instance_id());
            let subnet = referenced(&resources, instance.attribute("subnet_id"));
            (
                subnet.attribute("map_public_ip_on_launch").cloned(),
                subnet.attribute("availability_zone").cloned(),
            )
        };

        assert_eq!(
            placement(Server::Compliance),
            (Some(Value::Bool(false)), Some(Value::string("eu-west-2b")))
        );
        for server in [Server::Messaging, Server::VoiceVideo] {
            assert_eq!(
                placement(server),
                (Some(Value::Bool(true)), Some(Value::string("eu-west-2a")))
            );
        }
    }

    #[test]
    fn placement_follows_zone_parameters() {
        let dir = scripts_dir();
        let stack = build(&dir);
        let compliance = stack.graph().get(stack.instance(Server::Compliance));
        let subnet = stack
            .network()
            .select(SubnetType::Private, &stack.params().compliance_az)
            .unwrap();

        assert_eq!(
            compliance.attribute("subnet_id"),
            Some(&stack.graph().ref_value(subnet.handle))
        );
    }

    #[test]
    fn root_volumes_match_ebs_size() {
        let dir = scripts_dir();
        let resources = build(&dir)
            .resolve(&supplied(&[(EBS_SIZE, "200")]))
            .unwrap();

        for server in Server::ALL {
            let instance = find(&resources, server.instance_id());
            let mappings = instance
                .attribute("block_device_mappings")
                .and_then(Value::as_list)
                .unwrap();
            let ebs = mappings[0].as_map().unwrap()["ebs"].as_map().unwrap();

            assert_eq!(ebs["volume_size"], Value::Int(200), "{}", server);
            assert_eq!(ebs["encrypted"], Value::Bool(true));
            assert_eq!(ebs["delete_on_termination"], Value::Bool(true));
        }
    }

    #[test]
    fn messaging_trusts_voice_video_and_compliance_groups() {
        let dir = scripts_dir();
        let resources = build(&dir).resolve(&supplied(&[])).unwrap();

        let from_voice_video = group_rules(&resources, Server::Messaging, Server::VoiceVideo);
        assert_eq!(from_voice_video.len(), 1);
        assert_eq!(ports(from_voice_video[0]), (9870, 9881));

        let from_compliance = group_rules(&resources, Server::Messaging, Server::Compliance);
        assert_eq!(from_compliance.len(), 1);
        assert_eq!(ports(from_compliance[0]), (443, 443));

        // Compliance gets nothing anywhere else
        assert!(group_rules(&resources, Server::VoiceVideo, Server::Compliance).is_empty());
    }

    #[test]
    fn voice_video_trusts_messaging_on_444_only() {
        let dir = scripts_dir();
        let resources = build(&dir).resolve(&supplied(&[])).unwrap();

        let from_messaging = group_rules(&resources, Server::VoiceVideo, Server::Messaging);
        assert_eq!(from_messaging.len(), 1);
        assert_eq!(ports(from_messaging[0]), (444, 444));
        assert_eq!(
            from_messaging[0].attribute("ip_protocol"),
            Some(&Value::string("tcp"))
        );
    }

    #[test]
    fn admin_rules_are_scoped_to_ssh_ip() {
        let dir = scripts_dir();
        let resources = build(&dir).resolve(&supplied(&[])).unwrap();

        let console = inline_rule(&resources, Server::Messaging, 8800);
        assert_eq!(console.as_map().unwrap()["cidr_ip"], Value::string(ADMIN_CIDR));

        let ssh = inline_rule(&resources, Server::VoiceVideo, 22);
        assert_eq!(ssh.as_map().unwrap()["cidr_ip"], Value::string(ADMIN_CIDR));

        let client = inline_rule(&resources, Server::Messaging, 443);
        assert_eq!(client.as_map().unwrap()["cidr_ip"], Value::string("0.0.0.0/0"));
    }

    #[test]
    fn missing_ssh_ip_or_key_pair_fails_resolution() {
        let dir = scripts_dir();
        let stack = build(&dir);

        match stack.resolve(&HashMap::new()) {
            Err(StackError::Parameter(ParameterError::Missing(names))) => {
                assert_eq!(names, vec![SSH_IP.to_string(), KEY_PAIR.to_string()]);
            }
            other => panic!("Expected missing parameters, got {:?}", other),
        }

        let mut only_ip = HashMap::new();
        only_ip.insert(SSH_IP.to_string(), ADMIN_CIDR.to_string());
        assert!(matches!(
            stack.resolve(&only_ip),
            Err(StackError::Parameter(ParameterError::Missing(_)))
        ));
    }

    #[test]
    fn rebuilding_with_same_inputs_changes_nothing() {
        let dir = scripts_dir();
        let applied = build(&dir).resolve(&supplied(&[])).unwrap();
        let recorded: Vec<State> = applied
            .iter()
            .map(|r| State::existing(r.id.clone(), r.attributes.clone()))
            .collect();

        let again = build(&dir).resolve(&supplied(&[])).unwrap();
        assert_eq!(applied, again);
        assert!(create_plan(&again, &recorded).is_empty());
    }

    #[test]
    fn missing_script_fails_build() {
        let dir = scripts_dir();
        fs::remove_file(dir.path().join("messaging-config.sh")).unwrap();

        let err = WickrStack::build(&StackProps::new(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            StackError::Bootstrap(BootstrapError::NotFound { .. })
        ));
        assert!(err.to_string().contains("messaging-config.sh"));
    }

    #[test]
    fn template_carries_parameters_resources_and_outputs() {
        let dir = scripts_dir();
        let json: serde_json::Value =
            serde_json::from_str(&build(&dir).synth().unwrap()).unwrap();

        assert_eq!(json["Parameters"]["EBSsize"]["Default"], 120);
        assert_eq!(json["Parameters"]["messVoiceVidAZ"]["Default"], "eu-west-2a");
        assert!(json["Parameters"]["sshIp"].get("Default").is_none());
        assert_eq!(json["Outputs"].as_object().unwrap().len(), 3);

        let messaging = &json["Resources"]["Messaging"];
        assert_eq!(messaging["Type"], "AWS::EC2::Instance");
        assert_eq!(messaging["Properties"]["InstanceType"], "t3.large");
        assert_eq!(messaging["Properties"]["KeyName"], serde_json::json!({ "Ref": "keyPair" }));
        assert_eq!(
            messaging["Properties"]["UserData"],
            serde_json::json!({ "Fn::Base64": "#!/bin/bash\necho configuring Messaging\n" })
        );
        assert_eq!(
            json["Resources"]["MessagingEc2EIPAssociation"]["Properties"]["EIP"],
            serde_json::json!({ "Ref": "MessagingEIP" })
        );
    }

    #[test]
    fn resolved_declaration_passes_schema_lint() {
        let dir = scripts_dir();
        let resources = build(&dir).resolve(&supplied(&[])).unwrap();
        assert!(wickr_core::schemas::lint(&resources).is_empty());

        let small = build(&dir)
            .resolve(&supplied(&[(EBS_SIZE, "60")]))
            .unwrap();
        assert_eq!(wickr_core::schemas::lint(&small).len(), 3);
    }
}
