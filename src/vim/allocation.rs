//! Compute allocation with compensating recovery.
//!
//! A failed launch is ambiguous: the VIM may have created the server anyway.
//! Recovery runs in three tiers, and every tier ends in an error that carries
//! the best instance that could be reconstructed:
//!
//! 1. the driver error carries the server: build the instance from it
//! 2. a server with the generated hostname is listed on the VIM: build from it
//! 3. otherwise: a placeholder in `ERROR` state with external id `unknown`

use rand::Rng;
use tracing::{debug, info, warn};

use super::driver::LaunchRequest;
use super::generic::GenericVim;
use super::LaunchOptions;
use crate::constants::{
    AVAILABILITY_ZONE_KEY, ERROR_STATE, HOSTNAME_PLACEHOLDER, HOSTNAME_SUFFIX_RANGE,
    UNKNOWN_EXT_ID,
};
use crate::error::{DriverError, VimError, VimResult};
use crate::models::{
    ComponentInstance, ComponentTemplate, ConnectionPoint, DeploymentUnit, FunctionRecord,
    InfrastructureInstance, Ip, ProviderExtras, Server,
};

impl GenericVim {
    pub(crate) async fn allocate_component(
        &self,
        vim: &InfrastructureInstance,
        unit: &DeploymentUnit,
        record: &mut FunctionRecord,
        component: &ComponentTemplate,
        options: &LaunchOptions,
    ) -> VimResult<ComponentInstance> {
        debug!(
            vim = %vim.name,
            unit = %unit.name,
            record = %record.name,
            component = %component.id,
            "🚀 ALLOCATE: Launching new instance"
        );

        let image_ext_id = choose_image(&unit.vm_images, vim)?;
        let flavor_key = requested_flavor_key(unit, record);
        let flavor_ext_id = resolve_flavor_ext_id(&flavor_key, vim)?;

        if component.connection_points.is_empty() {
            return Err(VimError::new(format!(
                "Component {} of unit {} has no connection points",
                component.id, unit.name
            )));
        }

        let hostname = generate_hostname(&record.name);
        let user_data = options
            .user_data
            .replace(HOSTNAME_PLACEHOLDER, &format!("Hostname={hostname}"));

        let (key_pair, security_groups) = match &vim.provider {
            ProviderExtras::OpenStack {
                key_pair,
                security_groups,
            } => (key_pair.clone().unwrap_or_default(), security_groups.clone()),
            ProviderExtras::Generic => (String::new(), Default::default()),
        };

        let mut target = vim.clone();
        if vim.is_openstack() {
            if let Some(zone) = unit.metadata.get(AVAILABILITY_ZONE_KEY) {
                target
                    .metadata
                    .insert(AVAILABILITY_ZONE_KEY.to_string(), zone.clone());
            }
        }

        let request = LaunchRequest {
            hostname: hostname.clone(),
            image_ext_id,
            flavor_ext_id,
            key_pair,
            connection_points: component.connection_points.clone(),
            security_groups,
            user_data,
            floating_ips: options.floating_ips.clone(),
            keys: options.keys.clone(),
        };

        match self.driver.launch_instance_and_wait(&target, &request).await {
            Ok(server) => {
                let instance =
                    build_component_instance(vim, component, &hostname, &server, options, record);
                if self.check_integrity || options.check_integrity {
                    check_integrity(unit, component, &instance, &server, &flavor_key)?;
                }
                info!(
                    vim = %vim.name,
                    hostname = %instance.hostname,
                    ext_id = %instance.ext_id,
                    "🚀 ALLOCATE: Launched instance"
                );
                Ok(instance)
            }
            Err(cause) => Err(self
                .recover(vim, unit, record, component, &hostname, options, cause)
                .await),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn recover(
        &self,
        vim: &InfrastructureInstance,
        unit: &DeploymentUnit,
        record: &mut FunctionRecord,
        component: &ComponentTemplate,
        hostname: &str,
        options: &LaunchOptions,
        cause: DriverError,
    ) -> VimError {
        let message = format!(
            "Not launched VM with hostname {hostname} successfully on VimInstance {}. Caused by: {cause}",
            vim.name
        );
        warn!(vim = %vim.name, hostname = %hostname, error = %cause, "🚀 ALLOCATE: Launch failed, recovering");

        let server = match cause.server.as_deref() {
            Some(server) => Some(server.clone()),
            None => self.find_server_by_hostname(vim, hostname).await,
        };

        let instance = match server {
            Some(server) => {
                info!(
                    vim = %vim.name,
                    hostname = %hostname,
                    ext_id = ?server.ext_id,
                    "🚀 ALLOCATE: Recovered server created despite the failure"
                );
                build_component_instance(vim, component, hostname, &server, options, record)
            }
            None => {
                warn!(vim = %vim.name, hostname = %hostname, "🚀 ALLOCATE: No server to recover");
                placeholder_instance(vim, component, hostname)
            }
        };

        VimError::caused_by(message, cause).with_partial(unit.clone(), instance)
    }

    async fn find_server_by_hostname(
        &self,
        vim: &InfrastructureInstance,
        hostname: &str,
    ) -> Option<Server> {
        match self.driver.list_servers(vim).await {
            Ok(servers) => servers.into_iter().find(|server| server.hostname == hostname),
            Err(error) => {
                warn!(
                    vim = %vim.name,
                    error = %error,
                    "🚀 ALLOCATE: Unable to list servers while recovering"
                );
                None
            }
        }
    }
}

/// External id of the first active image, trying names in preference order.
pub fn choose_image(candidates: &[String], vim: &InfrastructureInstance) -> VimResult<String> {
    if candidates.is_empty() {
        return Err(VimError::new(format!(
            "No images are available on VimInstance {}",
            vim.name
        )));
    }
    candidates
        .iter()
        .find_map(|name| {
            vim.active_images_named(name)
                .first()
                .map(|image| image.ext_id.clone())
        })
        .ok_or_else(|| {
            VimError::new(format!(
                "Not found any image with name {candidates:?} on VimInstance {}",
                vim.name
            ))
        })
}

/// External flavor id for `key`; empty for providers without flavor ids.
pub fn resolve_flavor_ext_id(key: &str, vim: &InfrastructureInstance) -> VimResult<String> {
    if !vim.is_openstack() {
        return Ok(String::new());
    }
    vim.flavours
        .iter()
        .find(|flavour| flavour.matches(key))
        .map(|flavour| flavour.ext_id.clone())
        .ok_or_else(|| {
            VimError::new(format!(
                "Not found DeploymentFlavour with name {key} on VimInstance {}",
                vim.name
            ))
        })
}

fn requested_flavor_key(unit: &DeploymentUnit, record: &FunctionRecord) -> String {
    match unit.computation_requirement.as_deref() {
        Some(requirement) if !requirement.is_empty() => requirement.to_string(),
        _ => record.deployment_flavour_key.clone(),
    }
}

pub fn generate_hostname(base: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..HOSTNAME_SUFFIX_RANGE);
    format!("{base}-{suffix}")
}

/// Map a VIM server onto a component instance and record its addresses.
fn build_component_instance(
    vim: &InfrastructureInstance,
    component: &ComponentTemplate,
    hostname: &str,
    server: &Server,
    options: &LaunchOptions,
    record: &mut FunctionRecord,
) -> ComponentInstance {
    let connection_points = component
        .connection_points
        .iter()
        .map(|cp| ConnectionPoint {
            virtual_link_reference: cp.virtual_link_reference.clone(),
            cp_type: cp.cp_type.clone(),
            floating_ip: server.floating_ips.get(&cp.virtual_link_reference).cloned(),
        })
        .collect();

    let floating_ips = if options.floating_ips.is_empty() {
        Vec::new()
    } else {
        server
            .floating_ips
            .iter()
            .map(|(net_name, ip)| Ip {
                net_name: net_name.clone(),
                ip: ip.clone(),
            })
            .collect()
    };

    let mut ips = Vec::with_capacity(server.ips.len());
    for (net_name, addresses) in &server.ips {
        if let Some(first) = addresses.first() {
            ips.push(Ip {
                net_name: net_name.clone(),
                ip: first.clone(),
            });
        }
        record.addresses.extend(addresses.iter().cloned());
    }

    ComponentInstance {
        id: uuid::Uuid::new_v4().to_string(),
        hostname: hostname.to_string(),
        ext_id: server
            .ext_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_EXT_ID.to_string()),
        vim_id: vim.id.clone(),
        component_id: component.id.clone(),
        state: Some(
            server
                .status
                .clone()
                .unwrap_or_else(|| ERROR_STATE.to_string()),
        ),
        connection_points,
        ips,
        floating_ips,
    }
}

fn placeholder_instance(
    vim: &InfrastructureInstance,
    component: &ComponentTemplate,
    hostname: &str,
) -> ComponentInstance {
    ComponentInstance {
        id: uuid::Uuid::new_v4().to_string(),
        hostname: hostname.to_string(),
        ext_id: UNKNOWN_EXT_ID.to_string(),
        vim_id: vim.id.clone(),
        component_id: component.id.clone(),
        state: Some(ERROR_STATE.to_string()),
        connection_points: component.connection_points.clone(),
        ips: Vec::new(),
        floating_ips: Vec::new(),
    }
}

/// Validate a launched instance against the request.
pub fn check_integrity(
    unit: &DeploymentUnit,
    component: &ComponentTemplate,
    instance: &ComponentInstance,
    server: &Server,
    flavor_key: &str,
) -> VimResult<()> {
    let fail = |reason: String| {
        Err(VimError::new(format!(
            "Component instance {} was not deployed correctly -> {reason}",
            instance.hostname
        ))
        .with_partial(unit.clone(), instance.clone()))
    };

    let expected_ips = component.connection_points.len();
    if expected_ips != instance.ips.len() {
        return fail(format!(
            "Not all (or too many) internal IPs were associated. Expected: {expected_ips}, actual: {}",
            instance.ips.len()
        ));
    }

    let expected_floating = component
        .connection_points
        .iter()
        .filter(|cp| cp.requests_floating_ip())
        .count();
    if expected_floating != instance.floating_ips.len() {
        return fail(format!(
            "Not all (or too many) floating IPs were associated. Expected: {expected_floating}, actual: {}",
            instance.floating_ips.len()
        ));
    }

    let image_name = server.image.as_ref().map(|image| image.name.as_str());
    if !image_name.is_some_and(|name| unit.vm_images.iter().any(|candidate| candidate == name)) {
        return fail(format!(
            "Server launched with incorrect image. Expected one of {:?}, actual: {image_name:?}",
            unit.vm_images
        ));
    }

    let launched_flavor = server.flavor.as_ref().map(|flavor| flavor.flavour_key.as_str());
    if launched_flavor != Some(flavor_key) {
        return fail(format!(
            "Server launched with incorrect flavor. Expected: {flavor_key}, actual: {launched_flavor:?}"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeploymentFlavour, Image};

    fn openstack_vim() -> InfrastructureInstance {
        let mut vim = InfrastructureInstance::new("vim-1", "openstack");
        vim.provider = ProviderExtras::OpenStack {
            key_pair: None,
            security_groups: Default::default(),
        };
        vim.images = vec![Image::new("cirros", "img-cirros"), Image::new("ubuntu", "img-ubuntu")];
        vim.flavours = vec![DeploymentFlavour::new("m1.small", "flv-2")];
        vim
    }

    #[test]
    fn test_choose_image_uses_preference_order() {
        let vim = openstack_vim();
        let candidates = vec!["debian".to_string(), "ubuntu".to_string(), "cirros".to_string()];
        assert_eq!(choose_image(&candidates, &vim).unwrap(), "img-ubuntu");
        assert!(choose_image(&["debian".to_string()], &vim).is_err());
        assert!(choose_image(&[], &vim).is_err());
    }

    #[test]
    fn test_flavor_resolution_is_openstack_only() {
        let vim = openstack_vim();
        assert_eq!(resolve_flavor_ext_id("m1.small", &vim).unwrap(), "flv-2");
        assert!(resolve_flavor_ext_id("m1.huge", &vim).is_err());

        let generic = InfrastructureInstance::new("vim-2", "test");
        assert_eq!(resolve_flavor_ext_id("m1.huge", &generic).unwrap(), "");
    }

    #[test]
    fn test_generated_hostname_has_numeric_suffix() {
        let hostname = generate_hostname("fw");
        let suffix = hostname.strip_prefix("fw-").unwrap();
        assert!(suffix.parse::<u32>().unwrap() < HOSTNAME_SUFFIX_RANGE);
    }
}
