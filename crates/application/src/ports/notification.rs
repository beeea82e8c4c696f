use sinkhole_domain::NotificationSeverity;

/// Best-effort operator notifications. Delivery failures are swallowed by
/// implementations; callers never wait on them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: NotificationSeverity, source: &str, message: &str);
}
