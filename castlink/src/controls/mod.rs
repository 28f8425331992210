//! Capability controls.
//!
//! Each control is a stateless command factory bound to one device: every
//! operation issues a fresh [`ServiceCommand`](crate::command::ServiceCommand)
//! through the device's primary transport, gated at invocation time on the
//! device's *current* capability set. Callers are expected to guard with
//! `has_capability` first; the control itself is the safety net and settles
//! the command with `CapabilityMissing` when the gate fails.

mod input;
mod launcher;
mod media;
mod system;
mod tv;
mod volume;

pub use input::{KeyControl, MouseControl, TextInputControl};
pub use launcher::{Launcher, WebAppLauncher};
pub use media::{MediaControl, MediaPlayer};
pub use system::{ExternalInputControl, ExternalInputInfo, PowerControl, ToastControl};
pub use tv::{ChannelInfo, TvControl};
pub use volume::VolumeControl;

/// Subscription topic names shared between controls and transports.
pub mod topics {
    pub const VOLUME: &str = "volume";
    pub const MUTE: &str = "mute";
    pub const PLAY_STATE: &str = "playState";
    pub const CURRENT_CHANNEL: &str = "currentChannel";
    pub const TEXT_INPUT_STATUS: &str = "textInputStatus";

    pub fn web_app_pinned(web_app_id: &str) -> String {
        format!("webAppPinned:{web_app_id}")
    }
}
