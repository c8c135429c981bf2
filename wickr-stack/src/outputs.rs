//! Values surfaced to the operator after deployment

use wickr_core::case_convert::to_logical_id;
use wickr_core::graph::{ResourceGraph, ResourceHandle};
use wickr_core::resource::Value;
use wickr_core::template::Output;

use crate::server::Server;

pub const COMPLIANCE_OUTPUT: &str =
    "Compliance Private IP (use SSM Session Manager/SSM SSH for access";
pub const MESSAGING_OUTPUT: &str = "Messaging Public IP";
pub const VOICE_VIDEO_OUTPUT: &str = "Voice & Video Public IP";

/// Compliance is reported by instance ID since it has no public address.
/// `instance` maps each server to its declared instance.
pub fn outputs(graph: &ResourceGraph, instance: impl Fn(Server) -> ResourceHandle) -> Vec<Output> {
    vec![
        output(COMPLIANCE_OUTPUT, graph.ref_value(instance(Server::Compliance))),
        output(
            MESSAGING_OUTPUT,
            graph.attr_value(instance(Server::Messaging), "PublicIp"),
        ),
        output(
            VOICE_VIDEO_OUTPUT,
            graph.attr_value(instance(Server::VoiceVideo), "PublicIp"),
        ),
    ]
}

fn output(title: &str, value: Value) -> Output {
    Output::new(to_logical_id(title), value).with_description(title)
}
