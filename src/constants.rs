//! # System Constants
//!
//! Channel names, extension keys and sentinel values shared by the
//! orchestration core and the remote agents it talks to.

/// Default exchange carrying every orchestrator channel
pub const DEFAULT_EXCHANGE: &str = "openbaton-exchange";

/// Logical channels of the agent protocol
pub mod channels {
    /// Inbound lifecycle actions from agents; fire-and-forget
    pub const VNFM_ACTIONS: &str = "vnfm.nfvo.actions";
    /// Inbound lifecycle actions that expect a reply
    pub const VNFM_ACTIONS_REPLY: &str = "vnfm.nfvo.actions.reply";
    /// Agent registration and unregistration
    pub const MANAGER_HANDLING: &str = "nfvo.manager.handling";
    pub const EVENT_REGISTER: &str = "nfvo.event.register";
    pub const EVENT_UNREGISTER: &str = "nfvo.event.unregister";

    pub const ALL: [&str; 5] = [
        VNFM_ACTIONS,
        VNFM_ACTIONS_REPLY,
        MANAGER_HANDLING,
        EVENT_REGISTER,
        EVENT_UNREGISTER,
    ];
}

/// Keys of the extension map sent with every instantiate request
pub mod extension {
    pub const BROKER_IP: &str = "brokerIp";
    pub const MONITORING_IP: &str = "monitoringIp";
    pub const TIMEZONE: &str = "timezone";
    pub const EMS_VERSION: &str = "emsVersion";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const EXCHANGE_NAME: &str = "exchangeName";
    pub const EMS_HEARTBEAT: &str = "emsHeartbeat";
    pub const EMS_AUTODELETE: &str = "emsAutodelete";
    pub const NSR_ID: &str = "nsr-id";
}

/// Placeholder in instance user data replaced with the generated hostname
pub const HOSTNAME_PLACEHOLDER: &str = "#Hostname=";

/// External id of an instance whose allocation could not be confirmed
pub const UNKNOWN_EXT_ID: &str = "unknown";

/// Instance state of an allocation whose outcome could not be confirmed
pub const ERROR_STATE: &str = "ERROR";

/// Upper bound (exclusive) of the random hostname suffix
pub const HOSTNAME_SUFFIX_RANGE: u32 = 10_000_000;

/// Metadata key selecting the availability zone of a deployment unit
pub const AVAILABILITY_ZONE_KEY: &str = "az";

/// VIM type whose flavors are resolved to external ids
pub const OPENSTACK_VIM_TYPE: &str = "openstack";

/// Event names published by the orchestration core
pub mod events {
    pub const INSTANTIATE_FINISH: &str = "INSTANTIATE_FINISH";
    pub const RELEASE_RESOURCES_FINISH: &str = "RELEASE_RESOURCES_FINISH";
}
