//! Terminal rendering of plans, templates and outputs

use std::collections::HashMap;

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use wickr_core::effect::Effect;
use wickr_core::plan::Plan;
use wickr_core::resource::{Resource, Value};
use wickr_core::template::Output;

pub fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        match effect {
            Effect::Create(r) => {
                print_header("+".green().bold(), &r.id.resource_type, &r.id.name);
                for key in sorted_keys(&r.attributes) {
                    println!(
                        "      {}: {}",
                        key,
                        format_value(&r.attributes[key]).green()
                    );
                }
            }
            Effect::Update { id, from, to } => {
                print_header("~".yellow().bold(), &id.resource_type, &id.name);
                let mut keys = sorted_keys(&to.attributes);
                keys.extend(
                    sorted_keys(&from.attributes)
                        .into_iter()
                        .filter(|k| !to.attributes.contains_key(*k)),
                );
                for key in keys {
                    let old = from.attributes.get(key);
                    let new = to.attributes.get(key);
                    if old == new {
                        continue;
                    }
                    let show = |v: Option<&Value>| {
                        v.map(format_value).unwrap_or_else(|| "(none)".to_string())
                    };
                    println!(
                        "      {}: {} → {}",
                        key,
                        show(old).red(),
                        show(new).green()
                    );
                }
            }
            Effect::Delete(id) => {
                print_header("-".red().bold(), &id.resource_type, &id.name);
            }
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to add, {} to change, {} to destroy.",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.delete.to_string().red()
    );
}

fn print_header(symbol: colored::ColoredString, resource_type: &str, name: &str) {
    println!("  {} {} {}", symbol, resource_type.cyan().bold(), name.bold());
}

fn sorted_keys(attributes: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<_> = attributes.keys().collect();
    keys.sort();
    keys
}

/// Resource counts by type, in first-declared order
pub fn print_resource_summary(resources: &[Resource]) {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for resource in resources {
        let resource_type = resource.id.resource_type.as_str();
        match counts.iter_mut().find(|(t, _)| *t == resource_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((resource_type, 1)),
        }
    }

    for (resource_type, count) in counts {
        println!("  • {} × {}", count, resource_type);
    }
}

pub fn print_outputs(outputs: &[Output]) {
    if outputs.is_empty() {
        return;
    }
    println!();
    println!("{}", "Outputs:".cyan().bold());
    for output in outputs {
        let label = output.description.as_deref().unwrap_or(&output.logical_id);
        println!("  {} = {}", label.bold(), format_value(&output.value));
    }
}

/// Line diff between the previous and the new template text
pub fn print_template_diff(previous: &str, current: &str) {
    let diff = TextDiff::from_lines(previous, current);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", line);
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let strs: Vec<_> = sorted_keys(map)
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
        Value::Ref(name) => format!("ref({})", name),
        Value::GetAtt(name, attr) => format!("{}.{}", name, attr),
        // User data is too long to show inline
        Value::Base64(inner) => match inner.as_ref() {
            Value::String(s) => format!("base64(<{} bytes>)", s.len()),
            other => format!("base64({})", format_value(other)),
        },
        Value::Join(sep, parts) => {
            let strs: Vec<_> = parts.iter().map(format_value).collect();
            format!("join({:?}, [{}])", sep, strs.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_intrinsics() {
        assert_eq!(format_value(&Value::reference("keyPair")), "ref(keyPair)");
        assert_eq!(
            format_value(&Value::GetAtt("Messaging".into(), "PublicIp".into())),
            "Messaging.PublicIp"
        );
        assert_eq!(
            format_value(&Value::Base64(Box::new(Value::string("#!/bin/bash\n")))),
            "base64(<12 bytes>)"
        );
    }

    #[test]
    fn formats_maps_in_key_order() {
        let value = Value::map([
            ("to_port", Value::Int(443)),
            ("from_port", Value::Int(443)),
            ("ip_protocol", Value::string("tcp")),
        ]);
        assert_eq!(
            format_value(&value),
            "{from_port: 443, ip_protocol: \"tcp\", to_port: 443}"
        );
    }
}
