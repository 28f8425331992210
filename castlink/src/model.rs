use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilityFilter;
use crate::device::ConnectableDevice;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        DeviceId(String::new())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection lifecycle of a [`ConnectableDevice`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingLevel {
    On,
    #[default]
    Off,
}

/// Pairing mechanism a device demands before accepting commands. The actual
/// prompt/PIN exchange happens inside the protocol transport; this crate only
/// carries the configuration through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingType {
    #[default]
    None,
    FirstScreen,
    PinCode,
    Mixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirPlayServiceMode {
    WebApp,
    #[default]
    Media,
}

/// Raw device sighting reported by a protocol transport.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub friendly_name: String,
    pub ip_address: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub model_number: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub pairing_type: PairingType,
}

/// Options recognized by `DiscoveryManager::start_discovery`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub pairing_level: PairingLevel,
    #[serde(default)]
    pub airplay_service_mode: AirPlayServiceMode,
    #[serde(default)]
    pub capability_filters: Vec<CapabilityFilter>,
}

impl DiscoveryConfig {
    /// Load a discovery configuration from its YAML form.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Device lifecycle events fanned out by the discovery manager.
#[derive(Clone, Debug)]
pub enum DiscoveryEvent {
    DeviceFound(ConnectableDevice),
    DeviceLost(ConnectableDevice),
    DeviceUpdated(ConnectableDevice),
    DeviceListChanged(Vec<ConnectableDevice>),
}

impl DiscoveryEvent {
    /// Event name used for listener registration.
    pub fn name(&self) -> &'static str {
        match self {
            DiscoveryEvent::DeviceFound(_) => "devicefound",
            DiscoveryEvent::DeviceLost(_) => "devicelost",
            DiscoveryEvent::DeviceUpdated(_) => "deviceupdated",
            DiscoveryEvent::DeviceListChanged(_) => "devicelistchanged",
        }
    }
}

/// Per-device events emitted on connection transitions and capability churn.
#[derive(Clone, Debug)]
pub enum DeviceEvent {
    Ready,
    Disconnected,
    CapabilitiesChanged(Vec<String>),
    PairingRequired(PairingType),
}

impl DeviceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceEvent::Ready => "ready",
            DeviceEvent::Disconnected => "disconnect",
            DeviceEvent::CapabilitiesChanged(_) => "capabilitieschanged",
            DeviceEvent::PairingRequired(_) => "pairingrequired",
        }
    }
}
