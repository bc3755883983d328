use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::driver::VimDriver;
use super::{LaunchOptions, Vim};
use crate::error::{DriverError, VimError, VimResult};
use crate::logging::log_vim_operation;
use crate::models::{
    ComponentInstance, ComponentTemplate, DeploymentFlavour, DeploymentUnit, FunctionRecord, Image,
    ImageSource, InfrastructureInstance, Network, Quota, Server,
};

/// [`Vim`] implementation delegating provider calls to a [`VimDriver`].
#[derive(Clone)]
pub struct GenericVim {
    pub(crate) driver: Arc<dyn VimDriver>,
    pub(crate) check_integrity: bool,
}

impl GenericVim {
    pub fn new(driver: Arc<dyn VimDriver>) -> Self {
        Self {
            driver,
            check_integrity: false,
        }
    }

    /// Validate every launched instance against what was requested, whatever
    /// the [`LaunchOptions`] of the allocation ask for
    pub fn with_integrity_check(mut self, enabled: bool) -> Self {
        self.check_integrity = enabled;
        self
    }

    /// Convert a driver failure into a [`VimError`] and log it.
    pub(crate) fn driver_failure<T>(
        vim: &InfrastructureInstance,
        what: impl Display,
        result: Result<T, DriverError>,
    ) -> VimResult<T> {
        result.map_err(|cause| {
            let message = format!("{what} on VimInstance {} failed. Caused by: {cause}", vim.name);
            error!(vim = %vim.name, error = %cause, "☁️ VIM: {what} failed");
            VimError::caused_by(message, cause)
        })
    }

    fn completed(vim: &InfrastructureInstance, operation: &str, started: Instant) {
        log_vim_operation(
            operation,
            &vim.name,
            &vim.vim_type,
            "completed",
            Some(started.elapsed().as_millis() as u64),
            None,
        );
    }
}

impl std::fmt::Debug for GenericVim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericVim")
            .field("check_integrity", &self.check_integrity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Vim for GenericVim {
    async fn add_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<DeploymentFlavour> {
        debug!(vim = %vim.name, flavor = %flavor.flavour_key, "☁️ VIM: Creating flavor");
        let created = Self::driver_failure(
            vim,
            format!("Creating flavor {}", flavor.flavour_key),
            self.driver.add_flavor(vim, flavor).await,
        )?;
        info!(vim = %vim.name, flavor = %created.flavour_key, "☁️ VIM: Created flavor");
        Ok(created)
    }

    async fn update_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<DeploymentFlavour> {
        Self::driver_failure(
            vim,
            format!("Updating flavor {}", flavor.flavour_key),
            self.driver.update_flavor(vim, flavor).await,
        )
    }

    async fn delete_flavor(&self, vim: &InfrastructureInstance, flavor: &DeploymentFlavour) -> VimResult<()> {
        let deleted = Self::driver_failure(
            vim,
            format!("Deleting flavor {}", flavor.flavour_key),
            self.driver.delete_flavor(vim, &flavor.ext_id).await,
        )?;
        if !deleted {
            return Err(VimError::new(format!(
                "Flavor {} was not deleted on VimInstance {}",
                flavor.flavour_key, vim.name
            )));
        }
        Ok(())
    }

    async fn query_flavors(&self, vim: &InfrastructureInstance) -> VimResult<Vec<DeploymentFlavour>> {
        Self::driver_failure(vim, "Listing flavors", self.driver.list_flavors(vim).await)
    }

    async fn add_image(&self, vim: &InfrastructureInstance, image: &Image, source: &ImageSource) -> VimResult<Image> {
        let started = Instant::now();
        let result = match source {
            ImageSource::Bytes(content) => self.driver.add_image(vim, image, content).await,
            ImageSource::Url(url) => self.driver.add_image_from_url(vim, image, url).await,
        };
        let created = Self::driver_failure(vim, format!("Creating image {}", image.name), result)?;
        Self::completed(vim, "add_image", started);
        Ok(created)
    }

    async fn update_image(&self, vim: &InfrastructureInstance, image: &Image) -> VimResult<Image> {
        Self::driver_failure(
            vim,
            format!("Updating image {}", image.name),
            self.driver.update_image(vim, image).await,
        )
    }

    async fn delete_image(&self, vim: &InfrastructureInstance, image: &Image) -> VimResult<()> {
        let deleted = Self::driver_failure(
            vim,
            format!("Deleting image {}", image.name),
            self.driver.delete_image(vim, image).await,
        )?;
        if !deleted {
            return Err(VimError::new(format!(
                "Image {} was not deleted on VimInstance {}",
                image.name, vim.name
            )));
        }
        Ok(())
    }

    async fn query_images(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Image>> {
        Self::driver_failure(vim, "Listing images", self.driver.list_images(vim).await)
    }

    async fn copy_image(&self, vim: &InfrastructureInstance, image: &Image, content: &[u8]) -> VimResult<Image> {
        Self::driver_failure(
            vim,
            format!("Copying image {}", image.name),
            self.driver.copy_image(vim, image, content).await,
        )
    }

    async fn add_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<Network> {
        self.create_network_with_subnets(vim, network).await
    }

    async fn update_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<Network> {
        self.reconcile_network(vim, network).await
    }

    async fn delete_network(&self, vim: &InfrastructureInstance, network: &Network) -> VimResult<()> {
        let ext_id = network.ext_id.as_deref().ok_or_else(|| {
            VimError::new(format!(
                "Network {} has no external id on VimInstance {}",
                network.name, vim.name
            ))
        })?;
        let deleted = Self::driver_failure(
            vim,
            format!("Deleting network {}", network.name),
            self.driver.delete_network(vim, ext_id).await,
        )?;
        if !deleted {
            return Err(VimError::new(format!(
                "Network {} was not deleted on VimInstance {}",
                network.name, vim.name
            )));
        }
        Ok(())
    }

    async fn query_networks(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Network>> {
        Self::driver_failure(vim, "Listing networks", self.driver.list_networks(vim).await)
    }

    async fn query_network(&self, vim: &InfrastructureInstance, ext_id: &str) -> VimResult<Network> {
        Self::driver_failure(
            vim,
            format!("Finding network {ext_id}"),
            self.driver.get_network(vim, ext_id).await,
        )
    }

    async fn query_resources(&self, vim: &InfrastructureInstance) -> VimResult<Vec<Server>> {
        Self::driver_failure(vim, "Listing servers", self.driver.list_servers(vim).await)
    }

    async fn allocate(
        &self,
        vim: &InfrastructureInstance,
        unit: &DeploymentUnit,
        record: &mut FunctionRecord,
        component: &ComponentTemplate,
        options: &LaunchOptions,
    ) -> VimResult<ComponentInstance> {
        let started = Instant::now();
        let instance = self.allocate_component(vim, unit, record, component, options).await?;
        Self::completed(vim, "allocate", started);
        Ok(instance)
    }

    async fn release(&self, vim: &InfrastructureInstance, instance: &ComponentInstance) -> VimResult<()> {
        debug!(vim = %vim.name, ext_id = %instance.ext_id, "☁️ VIM: Removing server");
        let started = Instant::now();
        Self::driver_failure(
            vim,
            format!("Removing server {}", instance.ext_id),
            self.driver.delete_server_and_wait(vim, &instance.ext_id).await,
        )?;
        Self::completed(vim, "release", started);
        Ok(())
    }

    async fn get_quota(&self, vim: &InfrastructureInstance) -> VimResult<Quota> {
        Self::driver_failure(vim, "Listing quota", self.driver.get_quota(vim).await)
    }

    async fn refresh(&self, vim: &InfrastructureInstance) -> VimResult<InfrastructureInstance> {
        Self::driver_failure(vim, "Refreshing", self.driver.refresh(vim).await)
    }
}
