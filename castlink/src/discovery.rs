//! Discovery manager.
//!
//! Process-wide orchestrator for protocol discovery: starts and stops the
//! registered transports, gates sightings through the active capability
//! filters, owns the canonical device registry and fans lifecycle events out
//! to listeners. Constructed once and retained for the process lifetime;
//! teardown is explicit via [`DiscoveryManager::shutdown`].

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::capability::{CapabilityFilter, any_filter_matches};
use crate::device::ConnectableDevice;
use crate::errors::CastLinkError;
use crate::events::{EventBus, ListenerId};
use crate::model::{
    AirPlayServiceMode, DeviceDescriptor, DeviceId, DiscoveryConfig, DiscoveryEvent, PairingLevel,
};
use crate::picker::{DevicePicker, PickerOptions};
use crate::registry::{DeviceRegistry, RegistryOutcome};
use crate::service::{DeviceService, DiscoverySink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscoveryState {
    Inactive,
    Discovering,
}

struct ManagerState {
    phase: DiscoveryState,
    services: Vec<Arc<dyn DeviceService>>,
    registry: DeviceRegistry,
    filters: Vec<CapabilityFilter>,
    pairing_level: PairingLevel,
    airplay_mode: AirPlayServiceMode,
    pickers: Vec<DevicePicker>,
}

pub(crate) struct ManagerInner {
    state: Mutex<ManagerState>,
    events: EventBus<DiscoveryEvent>,
}

static GLOBAL: Lazy<DiscoveryManager> = Lazy::new(DiscoveryManager::new);

/// Handle on the discovery orchestrator. Clones share state.
#[derive(Clone)]
pub struct DiscoveryManager {
    inner: Arc<ManagerInner>,
}

impl Default for DiscoveryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                state: Mutex::new(ManagerState {
                    phase: DiscoveryState::Inactive,
                    services: Vec::new(),
                    registry: DeviceRegistry::new(),
                    filters: Vec::new(),
                    pairing_level: PairingLevel::default(),
                    airplay_mode: AirPlayServiceMode::default(),
                    pickers: Vec::new(),
                }),
                events: EventBus::new(),
            }),
        }
    }

    /// Process-wide singleton instance.
    pub fn global() -> &'static DiscoveryManager {
        &GLOBAL
    }

    /// Plug in a protocol transport. Transports registered while discovery
    /// is running are picked up on the next start.
    pub fn register_service(&self, service: Arc<dyn DeviceService>) {
        let mut st = self.inner.state.lock().unwrap();
        debug!(service = service.service_name(), "transport registered");
        st.services.push(service);
    }

    pub fn state(&self) -> DiscoveryState {
        self.inner.state.lock().unwrap().phase
    }

    pub fn is_discovering(&self) -> bool {
        self.state() == DiscoveryState::Discovering
    }

    /// Begin discovery on every registered transport. Idempotent while
    /// already discovering: the call is a no-op and the registry is kept.
    pub fn start_discovery(&self, config: Option<DiscoveryConfig>) {
        let (services, pairing_level, airplay_mode) = {
            let mut st = self.inner.state.lock().unwrap();
            if st.phase == DiscoveryState::Discovering {
                debug!("start_discovery ignored, discovery already running");
                return;
            }
            if let Some(config) = config {
                st.filters = config.capability_filters;
                st.pairing_level = config.pairing_level;
                st.airplay_mode = config.airplay_service_mode;
            }
            st.phase = DiscoveryState::Discovering;
            (st.services.clone(), st.pairing_level, st.airplay_mode)
        };

        info!(transports = services.len(), "starting discovery");
        for service in services {
            service.set_pairing_level(pairing_level);
            service.set_airplay_mode(airplay_mode);
            let sink = DiscoverySink::new(Arc::downgrade(&self.inner), Arc::clone(&service));
            if let Err(err) = service.start_discovery(sink) {
                warn!(
                    service = service.service_name(),
                    "transport failed to start discovery: {err:#}"
                );
            }
        }
    }

    /// Halt every transport. The registry is not cleared: last-known devices
    /// stay queryable and are only removed on explicit loss events.
    pub fn stop_discovery(&self) {
        let services = {
            let mut st = self.inner.state.lock().unwrap();
            if st.phase == DiscoveryState::Inactive {
                return;
            }
            st.phase = DiscoveryState::Inactive;
            st.services.clone()
        };
        info!("stopping discovery");
        for service in services {
            service.stop_discovery();
        }
    }

    /// Replace the active filter set. Devices already in the registry are
    /// not re-filtered synchronously; re-evaluation happens on their next
    /// sighting or update.
    pub fn set_capability_filters(&self, filters: Vec<CapabilityFilter>) {
        let mut st = self.inner.state.lock().unwrap();
        debug!(filters = filters.len(), "capability filters replaced");
        st.filters = filters;
    }

    pub fn capability_filters(&self) -> Vec<CapabilityFilter> {
        self.inner.state.lock().unwrap().filters.clone()
    }

    /// Takes effect on the next discovery start; changing mid-discovery has
    /// undefined effect on already-open connections.
    pub fn set_pairing_level(&self, level: PairingLevel) {
        self.inner.state.lock().unwrap().pairing_level = level;
    }

    pub fn pairing_level(&self) -> PairingLevel {
        self.inner.state.lock().unwrap().pairing_level
    }

    /// Takes effect on the next discovery start.
    pub fn set_airplay_service_mode(&self, mode: AirPlayServiceMode) {
        self.inner.state.lock().unwrap().airplay_mode = mode;
    }

    pub fn airplay_service_mode(&self) -> AirPlayServiceMode {
        self.inner.state.lock().unwrap().airplay_mode
    }

    /// Snapshot of the registry in insertion order.
    pub fn device_list(&self) -> Vec<ConnectableDevice> {
        self.inner.state.lock().unwrap().registry.list()
    }

    pub fn get_device(&self, id: &DeviceId) -> Option<ConnectableDevice> {
        self.inner.state.lock().unwrap().registry.get(id)
    }

    /// Open a device picker seeded with the current registry. Implicitly
    /// starts discovery when inactive.
    pub fn pick_device(&self, options: PickerOptions) -> DevicePicker {
        let (picker, need_start) = {
            let mut st = self.inner.state.lock().unwrap();
            let picker = DevicePicker::new(options, st.registry.list());
            st.pickers.retain(|p| p.is_open());
            st.pickers.push(picker.clone());
            (picker, st.phase == DiscoveryState::Inactive)
        };
        if need_start {
            self.start_discovery(None);
        }
        picker
    }

    pub fn on<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&DiscoveryEvent) + Send + 'static,
    {
        self.inner.events.on(event, cb)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.off(event, id)
    }

    pub fn add_listener<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&DiscoveryEvent) + Send + 'static,
    {
        self.inner.events.on(event, cb)
    }

    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.off(event, id)
    }

    /// Channel mirror of the discovery event stream.
    pub fn subscribe(&self) -> crossbeam_channel::Receiver<DiscoveryEvent> {
        self.inner.events.subscribe()
    }

    /// Explicit teardown: stop discovery, cancel open pickers with
    /// `PickerCancelled` and drop every listener.
    pub fn shutdown(&self) {
        self.stop_discovery();
        let pickers = {
            let mut st = self.inner.state.lock().unwrap();
            std::mem::take(&mut st.pickers)
        };
        for picker in pickers {
            picker.fail(CastLinkError::PickerCancelled);
        }
        self.inner.events.clear();
    }
}

impl ManagerInner {
    /// Fold a transport sighting into the registry and emit the lifecycle
    /// events it causes. The per-device event always precedes the
    /// `devicelistchanged` it triggers; both fire synchronously relative to
    /// the transport callback.
    pub(crate) fn handle_sighting(
        &self,
        descriptor: DeviceDescriptor,
        service: Arc<dyn DeviceService>,
    ) {
        let mut events: Vec<DiscoveryEvent> = Vec::new();
        let mut capability_churn: Option<ConnectableDevice> = None;
        let mut offers: Option<(Vec<DevicePicker>, ConnectableDevice)> = None;

        {
            let mut st = self.state.lock().unwrap();
            if !any_filter_matches(&st.filters, &descriptor.capabilities) {
                // Registry entries are re-evaluated against the active
                // filters on their next sighting.
                if let Some(device) = st.registry.remove(&descriptor.id) {
                    debug!(device = %descriptor.id, "device no longer matches filters");
                    events.push(DiscoveryEvent::DeviceLost(device));
                    events.push(DiscoveryEvent::DeviceListChanged(st.registry.list()));
                }
            } else {
                let (device, outcome) = st.registry.upsert(&descriptor, &service);
                match outcome {
                    RegistryOutcome::Added => {
                        debug!(device = %descriptor.id, "device found");
                        st.pickers.retain(|p| p.is_open());
                        offers = Some((st.pickers.clone(), device.clone()));
                        events.push(DiscoveryEvent::DeviceFound(device));
                        events.push(DiscoveryEvent::DeviceListChanged(st.registry.list()));
                    }
                    RegistryOutcome::Updated {
                        capabilities_changed,
                    } => {
                        if capabilities_changed {
                            capability_churn = Some(device.clone());
                        }
                        events.push(DiscoveryEvent::DeviceUpdated(device));
                        events.push(DiscoveryEvent::DeviceListChanged(st.registry.list()));
                    }
                    RegistryOutcome::Unchanged => {}
                }
            }
        }

        if let Some(device) = capability_churn {
            device.emit_capabilities_changed();
        }
        if let Some((pickers, device)) = offers {
            for picker in pickers {
                picker.offer(&device);
            }
        }
        for event in events {
            self.events.emit(event.name(), &event);
        }
    }

    /// Remove a lost device and emit `devicelost` + `devicelistchanged`.
    pub(crate) fn handle_loss(&self, id: &DeviceId) {
        let events = {
            let mut st = self.state.lock().unwrap();
            match st.registry.remove(id) {
                Some(device) => {
                    debug!(device = %id, "device lost");
                    vec![
                        DiscoveryEvent::DeviceLost(device),
                        DiscoveryEvent::DeviceListChanged(st.registry.list()),
                    ]
                }
                None => Vec::new(),
            }
        };
        for event in events {
            self.events.emit(event.name(), &event);
        }
    }
}
