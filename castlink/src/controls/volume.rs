use serde_json::{Value, json};

use super::topics;
use crate::capability::caps;
use crate::command::ServiceCommand;
use crate::device::ControlBinding;

/// Volume and mute operations, plus change subscriptions.
#[derive(Clone)]
pub struct VolumeControl {
    binding: ControlBinding,
}

impl VolumeControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn get_volume(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "volume.get", Value::Null)
    }

    pub fn set_volume(&self, volume: u16) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "volume.set", json!({ "volume": volume }))
    }

    pub fn volume_up(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "volume.up", Value::Null)
    }

    pub fn volume_down(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "volume.down", Value::Null)
    }

    pub fn get_mute(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "mute.get", Value::Null)
    }

    pub fn set_mute(&self, mute: bool) -> ServiceCommand {
        self.binding
            .dispatch(caps::VOLUME_CONTROL, "mute.set", json!({ "mute": mute }))
    }

    /// Success fires once per volume change until torn down via
    /// [`VolumeControl::unsubscribe_volume`].
    pub fn subscribe_volume(&self) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::VOLUME_CONTROL, topics::VOLUME)
    }

    pub fn subscribe_mute(&self) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::VOLUME_CONTROL, topics::MUTE)
    }

    pub fn unsubscribe_volume(&self) {
        self.binding.unsubscribe(topics::VOLUME);
    }

    pub fn unsubscribe_mute(&self) {
        self.binding.unsubscribe(topics::MUTE);
    }
}
