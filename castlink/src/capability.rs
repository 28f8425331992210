//! Capability vocabulary and discovery filters.
//!
//! A device announces its abilities as a flat set of capability strings.
//! A [`CapabilityFilter`] names the capabilities a caller requires: within a
//! filter every entry must be present (AND); across a sequence of filters a
//! device matches as soon as one filter is satisfied (OR).

use serde::{Deserialize, Serialize};

/// Capability names for every control surface modeled by this crate.
pub mod caps {
    pub const TV_CONTROL: &str = "TVControl";
    pub const VOLUME_CONTROL: &str = "VolumeControl";
    pub const EXTERNAL_INPUT_CONTROL: &str = "ExternalInputControl";
    pub const KEY_CONTROL: &str = "KeyControl";
    pub const MOUSE_CONTROL: &str = "MouseControl";
    pub const TEXT_INPUT_CONTROL: &str = "TextInputControl";
    pub const POWER_CONTROL: &str = "PowerControl";
    pub const TOAST_CONTROL: &str = "ToastControl";
    pub const WEB_APP_LAUNCHER: &str = "WebAppLauncher";
    pub const LAUNCHER: &str = "Launcher";
    pub const MEDIA_CONTROL: &str = "MediaControl";
    pub const MEDIA_PLAYER: &str = "MediaPlayer";
}

/// Required set of capability strings, AND-combined.
///
/// Redundant entries are harmless no-ops. A non-empty filter carries at least
/// one capability string; an empty filter matches every device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFilter {
    pub capabilities: Vec<String>,
}

impl CapabilityFilter {
    pub fn new<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// True when the device holds every capability named by this filter.
    pub fn matches(&self, device_capabilities: &[String]) -> bool {
        self.capabilities
            .iter()
            .all(|required| device_capabilities.iter().any(|c| c == required))
    }
}

/// OR across filters: the device matches when at least one filter is
/// satisfied. An empty filter sequence admits every device.
pub fn any_filter_matches(filters: &[CapabilityFilter], device_capabilities: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    filters.iter().any(|f| f.matches(device_capabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps_of(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_is_and_combined() {
        let filter = CapabilityFilter::new(["VolumeControl", "TVControl"]);
        assert!(filter.matches(&caps_of(&["VolumeControl", "TVControl", "KeyControl"])));
        assert!(!filter.matches(&caps_of(&["VolumeControl"])));
    }

    #[test]
    fn filters_are_or_combined() {
        let filters = vec![
            CapabilityFilter::new(["MediaPlayer"]),
            CapabilityFilter::new(["VolumeControl", "TVControl"]),
        ];
        assert!(any_filter_matches(&filters, &caps_of(&["MediaPlayer"])));
        assert!(any_filter_matches(
            &filters,
            &caps_of(&["VolumeControl", "TVControl"])
        ));
        assert!(!any_filter_matches(&filters, &caps_of(&["VolumeControl"])));
    }

    #[test]
    fn empty_filter_sequence_admits_everything() {
        assert!(any_filter_matches(&[], &caps_of(&["KeyControl"])));
        assert!(any_filter_matches(&[], &[]));
    }

    #[test]
    fn redundant_entries_are_noops() {
        let filter = CapabilityFilter::new(["KeyControl", "KeyControl"]);
        assert!(filter.matches(&caps_of(&["KeyControl"])));
    }
}
