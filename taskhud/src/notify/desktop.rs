//! Desktop notifications through the platform notification service.

use notify_rust::Notification;
#[cfg(all(unix, not(target_os = "macos")))]
use notify_rust::Urgency;

use super::Notifier;

/// Raises an OS notification for every call.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    /// Creates a notifier that tags notifications with `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("taskhud")
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        let mut notification = Notification::new();
        notification
            .summary(title)
            .body(body)
            .appname(&self.app_name)
            .icon("alarm-clock");
        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(Urgency::Critical);
        if let Err(e) = notification.show() {
            tracing::warn!(error = %e, title, "desktop notification failed");
        }
    }
}
