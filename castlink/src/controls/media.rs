use serde_json::{Value, json};

use super::topics;
use crate::capability::caps;
use crate::command::{Payload, ServiceCommand};
use crate::device::ControlBinding;

/// Transport operations against whatever the device is currently playing.
#[derive(Clone)]
pub struct MediaControl {
    binding: ControlBinding,
}

impl MediaControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn play(&self) -> ServiceCommand {
        self.binding.dispatch(caps::MEDIA_CONTROL, "media.play", Value::Null)
    }

    pub fn pause(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MEDIA_CONTROL, "media.pause", Value::Null)
    }

    pub fn stop(&self) -> ServiceCommand {
        self.binding.dispatch(caps::MEDIA_CONTROL, "media.stop", Value::Null)
    }

    pub fn rewind(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MEDIA_CONTROL, "media.rewind", Value::Null)
    }

    pub fn fast_forward(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MEDIA_CONTROL, "media.fastForward", Value::Null)
    }

    /// Seek to an absolute position, in seconds.
    pub fn seek(&self, position: f64) -> ServiceCommand {
        self.binding.dispatch(
            caps::MEDIA_CONTROL,
            "media.seek",
            json!({ "position": position }),
        )
    }

    pub fn get_duration(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MEDIA_CONTROL, "media.getDuration", Value::Null)
    }

    pub fn get_position(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MEDIA_CONTROL, "media.getPosition", Value::Null)
    }

    /// Success fires on every play-state transition until torn down via
    /// [`MediaControl::unsubscribe_play_state`].
    pub fn subscribe_play_state(&self) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::MEDIA_CONTROL, topics::PLAY_STATE)
    }

    pub fn unsubscribe_play_state(&self) {
        self.binding.unsubscribe(topics::PLAY_STATE);
    }
}

/// Pushes new media onto the device.
#[derive(Clone)]
pub struct MediaPlayer {
    binding: ControlBinding,
}

impl MediaPlayer {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn display_image(&self, url: &str, mime_type: &str, options: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::MEDIA_PLAYER,
            "media.displayImage",
            json!({
                "url": url,
                "mimeType": mime_type,
                "options": options.unwrap_or(Value::Null),
            }),
        )
    }

    pub fn play_media(&self, url: &str, mime_type: &str, options: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::MEDIA_PLAYER,
            "media.playMedia",
            json!({
                "url": url,
                "mimeType": mime_type,
                "options": options.unwrap_or(Value::Null),
            }),
        )
    }
}
