use sinkhole_application::ports::NotificationSink;
use sinkhole_domain::NotificationSeverity;
use tracing::{error, info, warn};

/// Surfaces notifications in the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, severity: NotificationSeverity, source: &str, message: &str) {
        match severity {
            NotificationSeverity::Info => info!(source, notification = message, "Notification"),
            NotificationSeverity::Warning => warn!(source, notification = message, "Notification"),
            NotificationSeverity::Error => error!(source, notification = message, "Notification"),
        }
    }
}
