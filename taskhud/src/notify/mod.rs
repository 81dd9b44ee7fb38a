//! Notification delivery seam.
//!
//! The controller only ever calls [`Notifier::notify`] with a title and a
//! body and never looks at the outcome. Implementations:
//! - [`LogNotifier`] writes the notification to the tracing log
//! - [`recording::RecordingNotifier`] keeps every notification for tests
//! - `desktop::DesktopNotifier` raises an OS notification (`desktop` feature)

#[cfg(feature = "desktop")]
pub mod desktop;
pub mod recording;

pub use recording::RecordingNotifier;

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Displays a notification. Delivery failures are the implementation's
    /// concern and are never reported back.
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
    }
}
