//! Uniform capability-based control surface for networked media and display
//! devices (smart TVs, casting receivers, DLNA/DIAL endpoints).
//!
//! The crate unifies heterogeneous device protocols behind one object model:
//! the [`DiscoveryManager`] orchestrates protocol transports and owns the
//! device registry, every discovered endpoint becomes a
//! [`ConnectableDevice`], and typed capability controls issue
//! [`ServiceCommand`]s through whichever transport sighted the device. The
//! per-protocol wire implementations plug in as [`DeviceService`]
//! collaborators; no protocol logic lives here.

pub mod capability;
pub mod command;
pub mod controls;
pub mod device;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod model;
pub mod picker;
pub mod registry;
pub mod service;

pub use capability::{CapabilityFilter, any_filter_matches, caps};
pub use command::{CommandKind, CommandResponder, Payload, ServiceCommand};
pub use controls::{
    ChannelInfo, ExternalInputControl, ExternalInputInfo, KeyControl, Launcher, MediaControl,
    MediaPlayer, MouseControl, PowerControl, TextInputControl, ToastControl, TvControl,
    VolumeControl, WebAppLauncher, topics,
};
pub use device::ConnectableDevice;
pub use discovery::{DiscoveryManager, DiscoveryState};
pub use errors::CastLinkError;
pub use events::{EventBus, ListenerId};
pub use model::{
    AirPlayServiceMode, ConnectionState, DeviceDescriptor, DeviceEvent, DeviceId, DiscoveryConfig,
    DiscoveryEvent, PairingLevel, PairingType,
};
pub use picker::{DevicePicker, PickerOptions, PickerState};
pub use registry::{DeviceRegistry, RegistryOutcome};
pub use service::{DeviceHandle, DeviceService, DiscoverySink};
