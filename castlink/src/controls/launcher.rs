use serde_json::{Value, json};

use super::topics;
use crate::capability::caps;
use crate::command::{Payload, ServiceCommand};
use crate::device::ControlBinding;

/// Launches native apps and well-known streaming targets on the device.
#[derive(Clone)]
pub struct Launcher {
    binding: ControlBinding,
}

impl Launcher {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn launch_app(&self, app_id: &str, params: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchApp",
            json!({ "appId": app_id, "params": params.unwrap_or(Value::Null) }),
        )
    }

    pub fn close_app(&self, app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.closeApp",
            json!({ "appId": app_id }),
        )
    }

    pub fn launch_app_store(&self, app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchAppStore",
            json!({ "appId": app_id }),
        )
    }

    pub fn launch_browser(&self, url: Option<&str>) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchBrowser",
            json!({ "url": url }),
        )
    }

    pub fn launch_hulu(&self, content_id: Option<&str>) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchHulu",
            json!({ "contentId": content_id }),
        )
    }

    pub fn launch_netflix(&self, content_id: Option<&str>) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchNetflix",
            json!({ "contentId": content_id }),
        )
    }

    pub fn launch_youtube(&self, content_id: Option<&str>) -> ServiceCommand {
        self.binding.dispatch(
            caps::LAUNCHER,
            "launcher.launchYouTube",
            json!({ "contentId": content_id }),
        )
    }

    pub fn get_app_list(&self) -> ServiceCommand {
        self.binding
            .dispatch(caps::LAUNCHER, "launcher.getAppList", Value::Null)
    }
}

/// Launches, joins and pins web applications on casting receivers.
#[derive(Clone)]
pub struct WebAppLauncher {
    binding: ControlBinding,
}

impl WebAppLauncher {
    pub(crate) fn new(binding: ControlBinding) -> Self {
        Self { binding }
    }

    pub fn launch_web_app(&self, web_app_id: &str, params: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.launch",
            json!({ "webAppId": web_app_id, "params": params.unwrap_or(Value::Null) }),
        )
    }

    /// Join a web app session already running on the device.
    pub fn join_web_app(&self, web_app_id: &str, params: Option<Payload>) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.join",
            json!({ "webAppId": web_app_id, "params": params.unwrap_or(Value::Null) }),
        )
    }

    pub fn close_web_app(&self, web_app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.close",
            json!({ "webAppId": web_app_id }),
        )
    }

    pub fn pin_web_app(&self, web_app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.pin",
            json!({ "webAppId": web_app_id }),
        )
    }

    pub fn unpin_web_app(&self, web_app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.unpin",
            json!({ "webAppId": web_app_id }),
        )
    }

    pub fn is_web_app_pinned(&self, web_app_id: &str) -> ServiceCommand {
        self.binding.dispatch(
            caps::WEB_APP_LAUNCHER,
            "webapp.isPinned",
            json!({ "webAppId": web_app_id }),
        )
    }

    /// Success fires whenever the pinned state of `web_app_id` changes until
    /// torn down via [`WebAppLauncher::unsubscribe_is_web_app_pinned`].
    pub fn subscribe_is_web_app_pinned(&self, web_app_id: &str) -> ServiceCommand {
        self.binding
            .dispatch_subscription(caps::WEB_APP_LAUNCHER, &topics::web_app_pinned(web_app_id))
    }

    pub fn unsubscribe_is_web_app_pinned(&self, web_app_id: &str) {
        self.binding.unsubscribe(&topics::web_app_pinned(web_app_id));
    }
}
