//! Protocol transport contract.
//!
//! Each supported protocol (Chromecast, DIAL, DLNA, AirPlay, proprietary TV
//! protocols) plugs in as a [`DeviceService`]. The transport owns all wire
//! logic, sockets, pairing prompts, timeouts and retries; this crate only
//! routes sightings into the registry and commands back out. Transports call
//! back through a [`DiscoverySink`] for discovery traffic and a
//! [`DeviceHandle`] for per-device connection transitions.

use std::sync::{Arc, Weak};

use anyhow::Result;
use tracing::debug;

use crate::command::{CommandResponder, Payload};
use crate::device::DeviceInner;
use crate::discovery::ManagerInner;
use crate::model::{AirPlayServiceMode, DeviceDescriptor, DeviceId, PairingLevel, PairingType};

/// One protocol transport. Implementations must be cheap to share; every
/// method is expected to return promptly and report results through the
/// provided handles.
pub trait DeviceService: Send + Sync {
    /// Stable service name ("Chromecast", "DIAL", "DLNA", ...); also the key
    /// for `ConnectableDevice::get_service`.
    fn service_name(&self) -> &str;

    /// Begin network probing. Sightings and losses are reported through
    /// `sink` until `stop_discovery` is called.
    fn start_discovery(&self, sink: DiscoverySink) -> Result<()>;

    fn stop_discovery(&self);

    /// Open a session to the device. Completion is reported via
    /// `handle.mark_ready()` / `handle.pairing_required(..)`.
    fn connect(&self, device: &DeviceDescriptor, handle: DeviceHandle);

    /// Tear down the session; report via `handle.mark_disconnected()` given
    /// at connect time.
    fn disconnect(&self, id: &DeviceId);

    /// Low-level command dispatch primitive every control operation calls.
    /// The transport settles `responder` exactly once.
    fn execute(&self, id: &DeviceId, action: &str, args: Payload, responder: CommandResponder);

    /// Open a change feed for `topic`. The transport resolves `responder`
    /// once per state change until `unsubscribe` (then `responder.finish()`)
    /// or a terminal error.
    fn subscribe(&self, id: &DeviceId, topic: &str, responder: CommandResponder);

    fn unsubscribe(&self, id: &DeviceId, topic: &str);

    /// Pairing policy pushed down before discovery starts.
    fn set_pairing_level(&self, _level: PairingLevel) {}

    /// AirPlay transports only: whether the device is surfaced as a web-app
    /// host or a plain media receiver.
    fn set_airplay_mode(&self, _mode: AirPlayServiceMode) {}
}

/// Callback handle a transport uses to report discovery traffic.
#[derive(Clone)]
pub struct DiscoverySink {
    manager: Weak<ManagerInner>,
    service: Arc<dyn DeviceService>,
}

impl DiscoverySink {
    pub(crate) fn new(manager: Weak<ManagerInner>, service: Arc<dyn DeviceService>) -> Self {
        Self { manager, service }
    }

    /// Report a discovered (or re-announced) device descriptor.
    pub fn device_sighted(&self, descriptor: DeviceDescriptor) {
        match self.manager.upgrade() {
            Some(manager) => manager.handle_sighting(descriptor, Arc::clone(&self.service)),
            None => debug!("sighting dropped, discovery manager is gone"),
        }
    }

    /// Report that a device is no longer reachable.
    pub fn device_lost(&self, id: &DeviceId) {
        if let Some(manager) = self.manager.upgrade() {
            manager.handle_loss(id);
        }
    }
}

/// Per-device handle a transport uses to surface connection transitions.
#[derive(Clone)]
pub struct DeviceHandle {
    device: Weak<DeviceInner>,
}

impl DeviceHandle {
    pub(crate) fn new(device: Weak<DeviceInner>) -> Self {
        Self { device }
    }

    /// The session is open; the device transitions to `Ready` and emits the
    /// `ready` event.
    pub fn mark_ready(&self) {
        if let Some(device) = self.device.upgrade() {
            device.mark_ready();
        }
    }

    /// The session is closed; the device transitions to `Disconnected` and
    /// emits the `disconnect` event.
    pub fn mark_disconnected(&self) {
        if let Some(device) = self.device.upgrade() {
            device.mark_disconnected();
        }
    }

    /// The device demands pairing before the session can open. The prompt or
    /// PIN exchange runs inside the transport; this only surfaces the
    /// `pairingrequired` event to the application.
    pub fn pairing_required(&self, pairing: PairingType) {
        if let Some(device) = self.device.upgrade() {
            device.pairing_required(pairing);
        }
    }
}
