use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::topics;
use crate::capability::caps;
use crate::command::ServiceCommand;
use crate::device::ControlBinding;

/// Broadcast channel as reported by the device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub number: String,
    pub major_number: u32,
    pub minor_number: u32,
}

/// Tuner operations for TV-class devices.
#[derive(Clone)]
pub struct TvControl {
    binding: ControlBinding,
}

impl TvControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn channel_up(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TV_CONTROL, "tv.channelUp", Value::Null)
    }

    pub fn channel_down(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TV_CONTROL, "tv.channelDown", Value::Null)
    }

    pub fn set_channel(&self, channel: &ChannelInfo) -> ServiceCommand {
        let args = serde_json::to_value(channel).unwrap_or(Value::Null);
        self.binding.dispatch(caps::TV_CONTROL, "tv.setChannel", args)
    }

    pub fn get_channel_list(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TV_CONTROL, "tv.getChannelList", Value::Null)
    }

    pub fn get_current_channel(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TV_CONTROL, "tv.getCurrentChannel", Value::Null)
    }

    /// Success fires on every channel change until torn down via
    /// [`TvControl::unsubscribe_current_channel`].
    pub fn subscribe_current_channel(&self) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::TV_CONTROL, topics::CURRENT_CHANNEL)
    }

    pub fn unsubscribe_current_channel(&self) {
        self.binding.unsubscribe(topics::CURRENT_CHANNEL);
    }
}
