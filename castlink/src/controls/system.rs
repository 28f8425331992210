use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::capability::caps;
use crate::command::{Payload, ServiceCommand};
use crate::device::ControlBinding;

/// External input (HDMI port, tuner, composite, ...) reported by the device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalInputInfo {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
pub struct ExternalInputControl {
    binding: ControlBinding,
}

impl ExternalInputControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn get_external_input_list(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::EXTERNAL_INPUT_CONTROL, "input.getList", Value::Null)
    }

    pub fn set_external_input(&self, input: &ExternalInputInfo) -> ServiceCommand {
        let args = serde_json::to_value(input).unwrap_or(Value::Null);
        self.binding
            .dispatch(caps::EXTERNAL_INPUT_CONTROL, "input.set", args)
    }

    /// Ask the device to render its own input picker UI.
    pub fn show_external_input_picker(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::EXTERNAL_INPUT_CONTROL, "input.showPicker", Value::Null)
    }
}

#[derive(Clone)]
pub struct PowerControl {
    binding: ControlBinding,
}

impl PowerControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn power_off(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::POWER_CONTROL, "power.off", Value::Null)
    }
}

#[derive(Clone)]
pub struct ToastControl {
    binding: ControlBinding,
}

impl ToastControl {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn show_toast(&self, message: &str, options: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::TOAST_CONTROL,
            "toast.show",
            json!({ "message": message, "options": options.unwrap_or(Value::Null) }),
        )
    }

    pub fn show_clickable_toast(&self, message: &str, options: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::TOAST_CONTROL,
            "toast.showClickable",
            json!({ "message": message, "options": options.unwrap_or(Value::Null) }),
        )
    }
}
