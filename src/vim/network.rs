//! Network creation and subnet reconciliation.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::generic::GenericVim;
use crate::error::{VimError, VimResult};
use crate::models::{InfrastructureInstance, Network, Subnet};

impl GenericVim {
    /// Create a network, then each of its subnets.
    pub(crate) async fn create_network_with_subnets(
        &self,
        vim: &InfrastructureInstance,
        network: &Network,
    ) -> VimResult<Network> {
        debug!(vim = %vim.name, network = %network.name, "🌐 NETWORK: Creating network");
        let mut created = Self::driver_failure(
            vim,
            format!("Creating network {}", network.name),
            self.driver.create_network(vim, network).await,
        )?;

        let mut subnets = Vec::with_capacity(network.subnets.len());
        for subnet in &network.subnets {
            subnets.push(self.create_subnet(vim, &created, subnet).await?);
        }
        created.subnets = subnets;

        info!(
            vim = %vim.name,
            network = %created.name,
            subnets = created.subnets.len(),
            "🌐 NETWORK: Created network"
        );
        Ok(created)
    }

    /// Update a network and converge its subnets to the requested set.
    ///
    /// Requested subnets without an external id are created, the others are
    /// updated, and every subnet on the VIM whose external id is not part of
    /// the resulting set is deleted. Re-applying the returned network issues
    /// no create or delete.
    pub(crate) async fn reconcile_network(
        &self,
        vim: &InfrastructureInstance,
        network: &Network,
    ) -> VimResult<Network> {
        debug!(vim = %vim.name, network = %network.name, "🌐 NETWORK: Updating network");
        let mut updated = Self::driver_failure(
            vim,
            format!("Updating network {}", network.name),
            self.driver.update_network(vim, network).await,
        )?;

        let mut desired = Vec::with_capacity(network.subnets.len());
        let mut desired_ext_ids = BTreeSet::new();
        for subnet in &network.subnets {
            let applied = match subnet.ext_id {
                Some(_) => self.update_subnet(vim, &updated, subnet).await?,
                None => self.create_subnet(vim, &updated, subnet).await?,
            };
            if let Some(ext_id) = &applied.ext_id {
                desired_ext_ids.insert(ext_id.clone());
            }
            desired.push(applied);
        }
        updated.subnets = desired;

        let network_ext_id = updated.ext_id.clone().ok_or_else(|| {
            VimError::new(format!(
                "Network {} has no external id on VimInstance {}",
                updated.name, vim.name
            ))
        })?;
        let existing = Self::driver_failure(
            vim,
            format!("Listing subnets of network {}", updated.name),
            self.driver.subnet_ext_ids(vim, &network_ext_id).await,
        )?;

        let stale: Vec<String> = existing
            .into_iter()
            .filter(|ext_id| !desired_ext_ids.contains(ext_id))
            .collect();
        for ext_id in &stale {
            Self::driver_failure(
                vim,
                format!("Deleting subnet {ext_id}"),
                self.driver.delete_subnet(vim, ext_id).await,
            )?;
        }

        info!(
            vim = %vim.name,
            network = %updated.name,
            subnets = updated.subnets.len(),
            removed = stale.len(),
            "🌐 NETWORK: Reconciled subnets"
        );
        Ok(updated)
    }

    async fn create_subnet(
        &self,
        vim: &InfrastructureInstance,
        network: &Network,
        subnet: &Subnet,
    ) -> VimResult<Subnet> {
        let mut created = Self::driver_failure(
            vim,
            format!("Creating subnet {} on network {}", subnet.name, network.name),
            self.driver.create_subnet(vim, network, subnet).await,
        )?;
        created.network_id = Some(network.id.clone());
        Ok(created)
    }

    async fn update_subnet(
        &self,
        vim: &InfrastructureInstance,
        network: &Network,
        subnet: &Subnet,
    ) -> VimResult<Subnet> {
        let mut updated = Self::driver_failure(
            vim,
            format!("Updating subnet {} on network {}", subnet.name, network.name),
            self.driver.update_subnet(vim, network, subnet).await,
        )?;
        updated.network_id = Some(network.id.clone());
        Ok(updated)
    }
}
