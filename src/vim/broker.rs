use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::Vim;
use crate::error::{NfvoError, NfvoResult};
use crate::models::InfrastructureInstance;

/// Closed table of [`Vim`] implementations keyed by VIM type.
#[derive(Clone, Default)]
pub struct VimBroker {
    vims: HashMap<String, Arc<dyn Vim>>,
}

impl VimBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vim(mut self, vim_type: impl Into<String>, vim: Arc<dyn Vim>) -> Self {
        let vim_type = vim_type.into();
        info!(vim_type = %vim_type, "☁️ VIM BROKER: Registered VIM implementation");
        self.vims.insert(vim_type, vim);
        self
    }

    pub fn get(&self, vim_type: &str) -> NfvoResult<Arc<dyn Vim>> {
        self.vims
            .get(vim_type)
            .cloned()
            .ok_or_else(|| NfvoError::not_found(format!("No VIM implementation for type '{vim_type}'")))
    }

    /// The implementation responsible for `instance`.
    pub fn for_instance(&self, instance: &InfrastructureInstance) -> NfvoResult<Arc<dyn Vim>> {
        self.get(&instance.vim_type)
    }

    pub fn vim_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.vims.keys().cloned().collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for VimBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VimBroker")
            .field("vim_types", &self.vim_types())
            .finish()
    }
}
