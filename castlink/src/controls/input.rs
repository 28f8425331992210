use serde_json::{Value, json};

use super::topics;
use crate::capability::caps;
use crate::command::ServiceCommand;
use crate::device::ControlBinding;

/// Remote-control key pad.
#[derive(Clone)]
pub struct KeyControl {
    binding: ControlBinding,
}

impl KeyControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn up(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.up", Value::Null)
    }

    pub fn down(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.down", Value::Null)
    }

    pub fn left(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.left", Value::Null)
    }

    pub fn right(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.right", Value::Null)
    }

    pub fn ok(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.ok", Value::Null)
    }

    pub fn back(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.back", Value::Null)
    }

    pub fn home(&self) -> ServiceCommand {
        self.binding.dispatch(caps::KEY_CONTROL, "key.home", Value::Null)
    }

    pub fn send_key_code(&self, key_code: u32) -> ServiceCommand {
        self.binding.dispatch(
            caps::KEY_CONTROL,
            "key.sendKeyCode",
            json!({ "keyCode": key_code }),
        )
    }
}

/// Pointer emulation for devices exposing a virtual mouse.
#[derive(Clone)]
pub struct MouseControl {
    binding: ControlBinding,
}

impl MouseControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn connect_mouse(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MOUSE_CONTROL, "mouse.connect", Value::Null)
    }

    pub fn disconnect_mouse(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MOUSE_CONTROL, "mouse.disconnect", Value::Null)
    }

    pub fn move_cursor(&self, dx: f64, dy: f64) -> ServiceCommand {
        self.binding
            .dispatch(caps::MOUSE_CONTROL, "mouse.move", json!({ "dx": dx, "dy": dy }))
    }

    pub fn scroll(&self, dx: f64, dy: f64) -> ServiceCommand {
        self.binding
            .dispatch(caps::MOUSE_CONTROL, "mouse.scroll", json!({ "dx": dx, "dy": dy }))
    }

    pub fn click(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::MOUSE_CONTROL, "mouse.click", Value::Null)
    }
}

/// On-screen keyboard input.
#[derive(Clone)]
pub struct TextInputControl {
    binding: ControlBinding,
}

impl TextInputControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn send_text(&self, input: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::TEXT_INPUT_CONTROL,
            "text.send",
            json!({ "input": input }),
        )
    }

    pub fn send_enter(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TEXT_INPUT_CONTROL, "text.sendEnter", Value::Null)
    }

    pub fn send_delete(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::TEXT_INPUT_CONTROL, "text.sendDelete", Value::Null)
    }

    /// Success fires whenever the device's text-entry focus state changes
    /// until torn down via [`TextInputControl::unsubscribe_text_input_status`].
    pub fn subscribe_text_input_status(&self) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::TEXT_INPUT_CONTROL, topics::TEXT_INPUT_STATUS)
    }

    pub fn unsubscribe_text_input_status(&self) {
        self.binding.unsubscribe(topics::TEXT_INPUT_STATUS);
    }
}
