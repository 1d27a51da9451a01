//! Controller configuration payload.
//!
//! The controller learns about its agent fleets from a rendered YAML
//! configuration file plus a set of environment variables injected into its
//! container. Dynamic values (scaling group names, host addresses) are passed
//! through the environment so the payload itself stays static text.

use crate::error::Result;
use buildfleet_core::{AgentDescriptor, DesktopRequest, TemplateRenderer};
use serde_json::json;

/// SSH credentials id used for desktop agents.
pub const DESKTOP_CREDENTIALS_ID: &str = "instance-ssh-key-ec2-user";

/// Environment variable carrying a fleet's scaling group name.
pub fn fleet_group_env(fleet_name: &str) -> String {
    format!("FLEET_GROUP_NAME_{}", env_suffix(fleet_name))
}

/// Environment variable carrying a fleet's launch template id.
pub fn fleet_template_env(fleet_name: &str) -> String {
    format!("FLEET_LAUNCH_TEMPLATE_ID_{}", env_suffix(fleet_name))
}

/// Environment variable carrying a desktop agent's address.
pub fn desktop_host_env(desktop_name: &str) -> String {
    format!("DESKTOP_HOST_{}", env_suffix(desktop_name))
}

fn env_suffix(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

const CONTROLLER_CONFIG_TEMPLATE: &str = r#"# Generated by buildfleet for deployment '{{ deployment }}'. Do not edit by hand.
controller:
  url: ${CONTROLLER_URL}
  executors: 0
  environment:
{% for key in env_keys %}    - {{ key }}
{% endfor %}agents:
{% for f in fleets %}  - fleet:
      name: {{ f.name }}
      label: {{ f.label }}
      group_name_env: {{ f.group_env }}
      launch_template_env: {{ f.template_env }}
      min_capacity: {{ f.min_capacity }}
      max_capacity: {{ f.max_capacity }}
      executors: {{ f.executors }}
      fs_root: '{{ f.fs_root }}'
      credentials_id: {{ f.credentials_id }}
      connect_timeout_seconds: {{ f.connect_timeout_secs }}
      connect_max_retries: {{ f.connect_max_retries }}
      connect_retry_wait_seconds: {{ f.connect_retry_wait_secs }}
{% if f.command_prefix %}      command_prefix: '{{ f.command_prefix }}'
{% endif %}{% if f.command_suffix %}      command_suffix: '{{ f.command_suffix }}'
{% endif %}{% endfor %}{% for d in desktops %}  - host:
      name: {{ d.name }}
      address_env: {{ d.host_env }}
      credentials_id: {{ d.credentials_id }}
{% endfor %}"#;

/// Render the controller configuration payload for a deployment.
pub fn render_controller_config(
    deployment: &str,
    env_keys: &[String],
    fleets: &[AgentDescriptor],
    desktops: &[DesktopRequest],
) -> Result<String> {
    let fleet_entries: Vec<serde_json::Value> = fleets
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "label": f.label,
                "group_env": fleet_group_env(&f.name),
                "template_env": fleet_template_env(&f.name),
                "min_capacity": f.min_capacity,
                "max_capacity": f.max_capacity,
                "executors": f.executors,
                "fs_root": f.fs_root,
                "credentials_id": f.credentials_id,
                "connect_timeout_secs": f.connect.timeout_secs,
                "connect_max_retries": f.connect.max_retries,
                "connect_retry_wait_secs": f.connect.retry_wait_secs,
                "command_prefix": f.command_prefix,
                "command_suffix": f.command_suffix,
            })
        })
        .collect();

    let desktop_entries: Vec<serde_json::Value> = desktops
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "host_env": desktop_host_env(&d.name),
                "credentials_id": DESKTOP_CREDENTIALS_ID,
            })
        })
        .collect();

    let mut renderer = TemplateRenderer::new();
    renderer.insert("deployment", &deployment);
    renderer.insert("env_keys", &env_keys);
    renderer.insert("fleets", &fleet_entries);
    renderer.insert("desktops", &desktop_entries);

    Ok(renderer.render_str(CONTROLLER_CONFIG_TEMPLATE)?)
}
