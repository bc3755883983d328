use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle action tag carried by every message exchanged with agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    GrantOperation,
    AllocateResources,
    ScaleIn,
    ScaleOut,
    Scaling,
    Error,
    ReleaseResources,
    Instantiate,
    Modify,
    Heal,
    #[serde(rename = "UPDATEVNFR")]
    UpdateVnfr,
    InstantiateFinish,
    Scaled,
    ReleaseResourcesFinish,
    Start,
    Stop,
    Configure,
}

impl Action {
    pub const ALL: [Action; 17] = [
        Self::GrantOperation,
        Self::AllocateResources,
        Self::ScaleIn,
        Self::ScaleOut,
        Self::Scaling,
        Self::Error,
        Self::ReleaseResources,
        Self::Instantiate,
        Self::Modify,
        Self::Heal,
        Self::UpdateVnfr,
        Self::InstantiateFinish,
        Self::Scaled,
        Self::ReleaseResourcesFinish,
        Self::Start,
        Self::Stop,
        Self::Configure,
    ];

    /// Actions whose dispatch waits for the task and returns its reply.
    pub fn is_returning(self) -> bool {
        matches!(
            self,
            Self::AllocateResources | Self::GrantOperation | Self::Scaling | Self::UpdateVnfr
        )
    }

    /// Actions after which the owning service record is not reconciled.
    pub fn skips_reconciliation(self) -> bool {
        matches!(self, Self::AllocateResources | Self::GrantOperation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GrantOperation => "GRANT_OPERATION",
            Self::AllocateResources => "ALLOCATE_RESOURCES",
            Self::ScaleIn => "SCALE_IN",
            Self::ScaleOut => "SCALE_OUT",
            Self::Scaling => "SCALING",
            Self::Error => "ERROR",
            Self::ReleaseResources => "RELEASE_RESOURCES",
            Self::Instantiate => "INSTANTIATE",
            Self::Modify => "MODIFY",
            Self::Heal => "HEAL",
            Self::UpdateVnfr => "UPDATEVNFR",
            Self::InstantiateFinish => "INSTANTIATE_FINISH",
            Self::Scaled => "SCALED",
            Self::ReleaseResourcesFinish => "RELEASE_RESOURCES_FINISH",
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Configure => "CONFIGURE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
