use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastLinkError {
    // Raised by control operations invoked on a device whose current
    // capability set lacks the backing capability.
    #[error("device does not support capability '{0}'")]
    CapabilityMissing(String),
    #[error("device '{0}' is not ready")]
    DeviceNotReady(String),
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        code: Option<i64>,
    },
    #[error("device picker was closed before a device was selected")]
    PickerCancelled,
    #[error("transport error: {0}")]
    Transport(String),
}

impl CastLinkError {
    pub fn capability_missing(capability: &str) -> Self {
        CastLinkError::CapabilityMissing(capability.to_string())
    }

    pub fn device_not_ready(name: &str) -> Self {
        CastLinkError::DeviceNotReady(name.to_string())
    }

    pub fn protocol(message: &str) -> Self {
        CastLinkError::Protocol {
            message: message.to_string(),
            code: None,
        }
    }

    pub fn protocol_with_code(message: &str, code: i64) -> Self {
        CastLinkError::Protocol {
            message: message.to_string(),
            code: Some(code),
        }
    }

    pub fn transport(message: &str) -> Self {
        CastLinkError::Transport(message.to_string())
    }
}
