//! Connectable device aggregate.
//!
//! A [`ConnectableDevice`] bundles the connection state, the mutable
//! capability set and the lazily-resolved capability controls for one
//! discovered device. Handles are cheap clones over shared state; control
//! instances are cached per device and stay valid for the device's lifetime.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::command::{CommandKind, Payload, ServiceCommand};
use crate::controls::{
    ExternalInputControl, KeyControl, Launcher, MediaControl, MediaPlayer, MouseControl,
    PowerControl, TextInputControl, ToastControl, TvControl, VolumeControl, WebAppLauncher,
};
use crate::errors::CastLinkError;
use crate::events::{EventBus, ListenerId};
use crate::model::{ConnectionState, DeviceDescriptor, DeviceEvent, DeviceId, PairingType};
use crate::service::{DeviceHandle, DeviceService};

struct DeviceState {
    friendly_name: String,
    ip_address: String,
    model_name: String,
    model_number: String,
    capabilities: Vec<String>,
    connection: ConnectionState,
    pairing_type: PairingType,
    /// Transports that have sighted this device; the first one is the
    /// primary command path.
    services: Vec<Arc<dyn DeviceService>>,
}

#[derive(Default)]
struct ControlCache {
    tv: Option<TvControl>,
    volume: Option<VolumeControl>,
    external_input: Option<ExternalInputControl>,
    key: Option<KeyControl>,
    mouse: Option<MouseControl>,
    text_input: Option<TextInputControl>,
    power: Option<PowerControl>,
    toast: Option<ToastControl>,
    web_app_launcher: Option<WebAppLauncher>,
    launcher: Option<Launcher>,
    media_control: Option<MediaControl>,
    media_player: Option<MediaPlayer>,
}

pub(crate) struct DeviceInner {
    id: DeviceId,
    state: Mutex<DeviceState>,
    events: EventBus<DeviceEvent>,
    controls: Mutex<ControlCache>,
}

impl DeviceInner {
    pub(crate) fn mark_ready(&self) {
        {
            let mut st = self.state.lock().unwrap();
            st.connection = ConnectionState::Ready;
        }
        debug!(device = %self.id, "device ready");
        self.events.emit("ready", &DeviceEvent::Ready);
    }

    pub(crate) fn mark_disconnected(&self) {
        {
            let mut st = self.state.lock().unwrap();
            st.connection = ConnectionState::Disconnected;
        }
        debug!(device = %self.id, "device disconnected");
        self.events.emit("disconnect", &DeviceEvent::Disconnected);
    }

    pub(crate) fn pairing_required(&self, pairing: PairingType) {
        {
            let mut st = self.state.lock().unwrap();
            st.pairing_type = pairing;
        }
        self.events
            .emit("pairingrequired", &DeviceEvent::PairingRequired(pairing));
    }
}

/// Discovered device exposing the uniform capability-based control surface.
#[derive(Clone)]
pub struct ConnectableDevice {
    inner: Arc<DeviceInner>,
}

impl fmt::Debug for ConnectableDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.lock().unwrap();
        f.debug_struct("ConnectableDevice")
            .field("id", &self.inner.id)
            .field("friendly_name", &st.friendly_name)
            .field("connection", &st.connection)
            .finish()
    }
}

impl ConnectableDevice {
    pub(crate) fn new(descriptor: &DeviceDescriptor, service: Arc<dyn DeviceService>) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                id: descriptor.id.clone(),
                state: Mutex::new(DeviceState {
                    friendly_name: descriptor.friendly_name.clone(),
                    ip_address: descriptor.ip_address.clone(),
                    model_name: descriptor.model_name.clone(),
                    model_number: descriptor.model_number.clone(),
                    capabilities: descriptor.capabilities.clone(),
                    connection: ConnectionState::Disconnected,
                    pairing_type: descriptor.pairing_type,
                    services: vec![service],
                }),
                events: EventBus::new(),
                controls: Mutex::new(ControlCache::default()),
            }),
        }
    }

    /// Fold a re-sighting into the device. Returns `(changed,
    /// capabilities_changed)`; capability-change events are emitted by the
    /// caller once registry locks are released.
    pub(crate) fn apply_descriptor(
        &self,
        descriptor: &DeviceDescriptor,
        service: &Arc<dyn DeviceService>,
    ) -> (bool, bool) {
        let mut st = self.inner.state.lock().unwrap();
        let mut changed = false;

        if st.friendly_name != descriptor.friendly_name {
            st.friendly_name = descriptor.friendly_name.clone();
            changed = true;
        }
        if st.ip_address != descriptor.ip_address {
            st.ip_address = descriptor.ip_address.clone();
            changed = true;
        }
        if st.model_name != descriptor.model_name {
            st.model_name = descriptor.model_name.clone();
            changed = true;
        }
        if st.model_number != descriptor.model_number {
            st.model_number = descriptor.model_number.clone();
            changed = true;
        }

        let caps_changed = st.capabilities != descriptor.capabilities;
        if caps_changed {
            st.capabilities = descriptor.capabilities.clone();
            changed = true;
        }

        let name = service.service_name();
        if !st.services.iter().any(|s| s.service_name() == name) {
            st.services.push(Arc::clone(service));
            changed = true;
        }

        (changed, caps_changed)
    }

    pub(crate) fn emit_capabilities_changed(&self) {
        let caps = self.capabilities();
        self.inner
            .events
            .emit("capabilitieschanged", &DeviceEvent::CapabilitiesChanged(caps));
    }

    pub fn id(&self) -> &DeviceId {
        &self.inner.id
    }

    pub fn friendly_name(&self) -> String {
        self.inner.state.lock().unwrap().friendly_name.clone()
    }

    pub fn ip_address(&self) -> String {
        self.inner.state.lock().unwrap().ip_address.clone()
    }

    pub fn model_name(&self) -> String {
        self.inner.state.lock().unwrap().model_name.clone()
    }

    pub fn model_number(&self) -> String {
        self.inner.state.lock().unwrap().model_number.clone()
    }

    /// Current descriptor snapshot (identity + capability set).
    pub fn descriptor(&self) -> DeviceDescriptor {
        let st = self.inner.state.lock().unwrap();
        DeviceDescriptor {
            id: self.inner.id.clone(),
            friendly_name: st.friendly_name.clone(),
            ip_address: st.ip_address.clone(),
            model_name: st.model_name.clone(),
            model_number: st.model_number.clone(),
            capabilities: st.capabilities.clone(),
            pairing_type: st.pairing_type,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().unwrap().connection
    }

    pub fn is_ready(&self) -> bool {
        self.connection_state() == ConnectionState::Ready
    }

    /// Open a session through the primary transport. Fire and forget: the
    /// outcome is observable via the `ready` / `pairingrequired` events.
    pub fn connect(&self) {
        let (descriptor, service) = {
            let mut st = self.inner.state.lock().unwrap();
            if st.connection != ConnectionState::Disconnected {
                return;
            }
            st.connection = ConnectionState::Connecting;
            (
                DeviceDescriptor {
                    id: self.inner.id.clone(),
                    friendly_name: st.friendly_name.clone(),
                    ip_address: st.ip_address.clone(),
                    model_name: st.model_name.clone(),
                    model_number: st.model_number.clone(),
                    capabilities: st.capabilities.clone(),
                    pairing_type: st.pairing_type,
                },
                Arc::clone(&st.services[0]),
            )
        };
        debug!(device = %self.inner.id, "connecting");
        service.connect(&descriptor, DeviceHandle::new(Arc::downgrade(&self.inner)));
    }

    /// Close the session. Fire and forget: the transition is observable via
    /// the `disconnect` event.
    pub fn disconnect(&self) {
        let service = {
            let st = self.inner.state.lock().unwrap();
            if st.connection == ConnectionState::Disconnected {
                return;
            }
            Arc::clone(&st.services[0])
        };
        service.disconnect(&self.inner.id);
    }

    pub fn set_pairing_type(&self, pairing: PairingType) {
        self.inner.state.lock().unwrap().pairing_type = pairing;
    }

    pub fn pairing_type(&self) -> PairingType {
        self.inner.state.lock().unwrap().pairing_type
    }

    /// Snapshot of the current capability set. The set may change between
    /// calls as the protocol re-announces the device.
    pub fn capabilities(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().capabilities.clone()
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.inner
            .state
            .lock()
            .unwrap()
            .capabilities
            .iter()
            .any(|c| c == capability)
    }

    /// AND over the given capabilities.
    pub fn supports(&self, capabilities: &[&str]) -> bool {
        let st = self.inner.state.lock().unwrap();
        capabilities
            .iter()
            .all(|required| st.capabilities.iter().any(|c| c == required))
    }

    /// OR over the given capabilities.
    pub fn supports_any(&self, capabilities: &[&str]) -> bool {
        let st = self.inner.state.lock().unwrap();
        capabilities
            .iter()
            .any(|required| st.capabilities.iter().any(|c| c == required))
    }

    pub fn has_service(&self, service_name: &str) -> bool {
        self.get_service(service_name).is_some()
    }

    /// Escape hatch for vendor-specific operations: the raw protocol service
    /// handle, or `None` when the device was not sighted by that transport.
    pub fn get_service(&self, service_name: &str) -> Option<Arc<dyn DeviceService>> {
        let st = self.inner.state.lock().unwrap();
        st.services
            .iter()
            .find(|s| s.service_name() == service_name)
            .cloned()
    }

    /// Raw command dispatch for advanced callers bypassing the typed
    /// controls. No capability gate is applied.
    pub fn execute(&self, action: &str, args: Payload) -> ServiceCommand {
        let service = {
            let st = self.inner.state.lock().unwrap();
            Arc::clone(&st.services[0])
        };
        let (command, responder) = ServiceCommand::new(CommandKind::OneShot);
        service.execute(&self.inner.id, action, args, responder);
        command
    }

    pub fn on<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&DeviceEvent) + Send + 'static,
    {
        self.inner.events.on(event, cb)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.off(event, id)
    }

    pub fn add_listener<F>(&self, event: &str, cb: F) -> ListenerId
    where
        F: FnMut(&DeviceEvent) + Send + 'static,
    {
        self.inner.events.on(event, cb)
    }

    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.off(event, id)
    }

    /// Channel mirror of the device event stream.
    pub fn subscribe(&self) -> crossbeam_channel::Receiver<DeviceEvent> {
        self.inner.events.subscribe()
    }

    fn binding(&self) -> ControlBinding {
        ControlBinding {
            device: Arc::downgrade(&self.inner),
        }
    }

    pub fn tv_control(&self) -> TvControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .tv
            .get_or_insert_with(|| TvControl::new(self.binding()))
            .clone()
    }

    pub fn volume_control(&self) -> VolumeControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .volume
            .get_or_insert_with(|| VolumeControl::new(self.binding()))
            .clone()
    }

    pub fn external_input_control(&self) -> ExternalInputControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .external_input
            .get_or_insert_with(|| ExternalInputControl::new(self.binding()))
            .clone()
    }

    pub fn key_control(&self) -> KeyControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .key
            .get_or_insert_with(|| KeyControl::new(self.binding()))
            .clone()
    }

    pub fn mouse_control(&self) -> MouseControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .mouse
            .get_or_insert_with(|| MouseControl::new(self.binding()))
            .clone()
    }

    pub fn text_input_control(&self) -> TextInputControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .text_input
            .get_or_insert_with(|| TextInputControl::new(self.binding()))
            .clone()
    }

    pub fn power_control(&self) -> PowerControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .power
            .get_or_insert_with(|| PowerControl::new(self.binding()))
            .clone()
    }

    pub fn toast_control(&self) -> ToastControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .toast
            .get_or_insert_with(|| ToastControl::new(self.binding()))
            .clone()
    }

    pub fn web_app_launcher(&self) -> WebAppLauncher {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .web_app_launcher
            .get_or_insert_with(|| WebAppLauncher::new(self.binding()))
            .clone()
    }

    pub fn launcher(&self) -> Launcher {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .launcher
            .get_or_insert_with(|| Launcher::new(self.binding()))
            .clone()
    }

    pub fn media_control(&self) -> MediaControl {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .media_control
            .get_or_insert_with(|| MediaControl::new(self.binding()))
            .clone()
    }

    pub fn media_player(&self) -> MediaPlayer {
        let mut cache = self.inner.controls.lock().unwrap();
        cache
            .media_player
            .get_or_insert_with(|| MediaPlayer::new(self.binding()))
            .clone()
    }
}

/// Device binding shared by every capability control. Controls hold a weak
/// reference so a cached control never keeps its device alive on its own.
#[derive(Clone)]
pub(crate) struct ControlBinding {
    device: Weak<DeviceInner>,
}

impl ControlBinding {
    /// One-shot dispatch with the invocation-time capability and readiness
    /// gates. Gate failures settle the returned command immediately; the
    /// error still flows through the normal callback path.
    pub(crate) fn dispatch(&self, capability: &str, action: &str, args: Payload) -> ServiceCommand {
        let (service, id) = match self.command_path(capability) {
            Ok(path) => path,
            Err(err) => return ServiceCommand::settled_error(err),
        };
        let (command, responder) = ServiceCommand::new(CommandKind::OneShot);
        service.execute(&id, action, args, responder);
        command
    }

    /// Subscription dispatch: same gates, but the command stays open and may
    /// deliver many successes before teardown.
    pub(crate) fn dispatch_subscription(&self, capability: &str, topic: &str) -> ServiceCommand {
        let (service, id) = match self.command_path(capability) {
            Ok(path) => path,
            Err(err) => return ServiceCommand::settled_error(err),
        };
        let (command, responder) = ServiceCommand::new(CommandKind::Subscription);
        service.subscribe(&id, topic, responder);
        command
    }

    pub(crate) fn unsubscribe(&self, topic: &str) {
        if let Some(inner) = self.device.upgrade() {
            let service = {
                let st = inner.state.lock().unwrap();
                Arc::clone(&st.services[0])
            };
            service.unsubscribe(&inner.id, topic);
        }
    }

    fn command_path(
        &self,
        capability: &str,
    ) -> Result<(Arc<dyn DeviceService>, DeviceId), CastLinkError> {
        let Some(inner) = self.device.upgrade() else {
            return Err(CastLinkError::transport("device handle released"));
        };
        let st = inner.state.lock().unwrap();
        if !st.capabilities.iter().any(|c| c == capability) {
            return Err(CastLinkError::capability_missing(capability));
        }
        if st.connection != ConnectionState::Ready {
            return Err(CastLinkError::device_not_ready(&st.friendly_name));
        }
        Ok((Arc::clone(&st.services[0]), inner.id.clone()))
    }
}
