//! Case conversion between declaration attribute names and CloudFormation
//! property names
//!
//! Declarations use snake_case (e.g., `security_group_ids`), CloudFormation
//! uses PascalCase (e.g., `SecurityGroupIds`). A few properties do not follow
//! the regular mapping and are listed explicitly.

use heck::ToPascalCase;

/// Properties whose CloudFormation spelling is not plain PascalCase
const EXCEPTIONS: &[(&str, &str)] = &[("eip", "EIP")];

/// Convert a snake_case attribute name to its CloudFormation property name
pub fn to_property_name(name: &str) -> String {
    EXCEPTIONS
        .iter()
        .find(|(snake, _)| *snake == name)
        .map(|(_, property)| property.to_string())
        .unwrap_or_else(|| name.to_pascal_case())
}

/// Strip everything but ASCII alphanumerics, as logical IDs require
pub fn to_logical_id(path: &str) -> String {
    path.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names() {
        assert_eq!(to_property_name("cidr_ip"), "CidrIp");
        assert_eq!(to_property_name("iam_instance_profile"), "IamInstanceProfile");
        assert_eq!(to_property_name("map_public_ip_on_launch"), "MapPublicIpOnLaunch");
        assert_eq!(to_property_name("eip"), "EIP");
    }

    #[test]
    fn logical_ids() {
        assert_eq!(to_logical_id("Voice & Video Public IP"), "VoiceVideoPublicIP");
        assert_eq!(
            to_logical_id("Compliance Private IP (use SSM Session Manager/SSM SSH for access"),
            "CompliancePrivateIPuseSSMSessionManagerSSMSSHforaccess"
        );
    }
}
