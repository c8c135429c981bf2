//! Deploy-time parameters of the stack

use wickr_core::case_convert::to_logical_id;
use wickr_core::parameter::{ParameterSet, ParameterSpec, ParameterType};
use wickr_core::resource::Value;

use crate::server::Server;

pub const MESS_VOICE_VID_AZ: &str = "messVoiceVidAZ";
pub const COMPLIANCE_AZ: &str = "complianceAZ";
pub const SSH_IP: &str = "sshIp";
pub const KEY_PAIR: &str = "keyPair";
pub const EBS_SIZE: &str = "EBSsize";

pub const DEFAULT_MESS_VOICE_VID_AZ: &str = "eu-west-2a";
pub const DEFAULT_COMPLIANCE_AZ: &str = "eu-west-2b";
pub const DEFAULT_EBS_SIZE: i64 = 120;

/// SSM path of the latest Amazon Linux 2 x86_64 image
pub const AMAZON_LINUX_2_IMAGE: &str =
    "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2";

/// Name of the engine-resolved image parameter
pub fn image_parameter_name() -> String {
    format!("SsmParameterValue{}Parameter", to_logical_id(AMAZON_LINUX_2_IMAGE))
}

/// References to every declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub mess_voice_vid_az: Value,
    pub compliance_az: Value,
    pub ssh_ip: Value,
    pub key_pair: Value,
    pub ebs_size: Value,
    pub image_id: Value,
}

impl Parameters {
    pub fn declare(set: &mut ParameterSet) -> Self {
        let mess_voice_vid_az = set.declare(
            ParameterSpec::string(MESS_VOICE_VID_AZ)
                .with_default(Value::string(DEFAULT_MESS_VOICE_VID_AZ))
                .with_description("The AZ used for your Messaging and VoiceVideo instances."),
        );
        let compliance_az = set.declare(
            ParameterSpec::string(COMPLIANCE_AZ)
                .with_default(Value::string(DEFAULT_COMPLIANCE_AZ))
                .with_description("The AZ used for your Compliance instance."),
        );
        let ssh_ip = set.declare(
            ParameterSpec::string(SSH_IP)
                .with_description("The IP that you will administer the instances from via SSH."),
        );
        let key_pair = set.declare(
            ParameterSpec::string(KEY_PAIR)
                .with_description("The keypair that you will use for SSH into your instances."),
        );
        let ebs_size = set.declare(
            ParameterSpec::number(EBS_SIZE)
                .with_default(Value::Int(DEFAULT_EBS_SIZE))
                .with_description("The size in GB of the instances (120G minimum required)."),
        );
        let image_id = set.declare(
            ParameterSpec::new(image_parameter_name(), ParameterType::SsmImageId)
                .with_default(Value::string(AMAZON_LINUX_2_IMAGE)),
        );

        Self {
            mess_voice_vid_az,
            compliance_az,
            ssh_ip,
            key_pair,
            ebs_size,
            image_id,
        }
    }

    /// Zones the network spans. The order decides which subnet pair lands
    /// in which zone.
    pub fn zones(&self) -> Vec<Value> {
        vec![self.mess_voice_vid_az.clone(), self.compliance_az.clone()]
    }

    pub fn zone_for(&self, server: Server) -> &Value {
        match server {
            Server::Compliance => &self.compliance_az,
            Server::Messaging | Server::VoiceVideo => &self.mess_voice_vid_az,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_operator_and_image_parameters() {
        let mut set = ParameterSet::new();
        let params = Parameters::declare(&mut set);

        let names: Vec<_> = set.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names[..5],
            [MESS_VOICE_VID_AZ, COMPLIANCE_AZ, SSH_IP, KEY_PAIR, EBS_SIZE]
        );
        assert_eq!(params.ssh_ip, Value::reference(SSH_IP));
        assert!(set.get(SSH_IP).unwrap().is_required());
        assert!(set.get(KEY_PAIR).unwrap().is_required());
        assert!(!set.get(&image_parameter_name()).unwrap().is_required());
    }

    #[test]
    fn image_parameter_name_is_alphanumeric() {
        assert_eq!(
            image_parameter_name(),
            "SsmParameterValueawsserviceamiamazonlinuxlatestamzn2amihvmx8664gp2Parameter"
        );
    }

    #[test]
    fn compliance_gets_its_own_zone() {
        let params = Parameters::declare(&mut ParameterSet::new());
        assert_eq!(params.zone_for(Server::Compliance), &Value::reference(COMPLIANCE_AZ));
        assert_eq!(params.zone_for(Server::VoiceVideo), &Value::reference(MESS_VOICE_VID_AZ));
        assert_eq!(params.zones()[0], Value::reference(MESS_VOICE_VID_AZ));
    }
}
