use super::ClientActivity;
use sinkhole_domain::RequestLogEntry;
use tokio::sync::broadcast;

/// Broadcast senders for the query and activity feeds.
///
/// `Clone` is cheap: both senders are reference counted.
#[derive(Clone, Default)]
pub struct LiveFeed {
    queries: Option<broadcast::Sender<RequestLogEntry>>,
    activity: Option<broadcast::Sender<ClientActivity>>,
}

impl LiveFeed {
    pub fn new_disabled() -> Self {
        Self::default()
    }

    /// Enabled feeds; slow subscribers lag after `capacity` messages.
    pub fn new_enabled(capacity: usize) -> Self {
        let (queries, _) = broadcast::channel(capacity.max(1));
        let (activity, _) = broadcast::channel(capacity.max(1));
        Self {
            queries: Some(queries),
            activity: Some(activity),
        }
    }

    pub fn emit_query(&self, entry: &RequestLogEntry) {
        if let Some(ref tx) = self.queries {
            let _ = tx.send(entry.clone());
        }
    }

    pub fn emit_activity(&self, activity: ClientActivity) {
        if let Some(ref tx) = self.activity {
            let _ = tx.send(activity);
        }
    }

    pub fn subscribe_queries(&self) -> Option<broadcast::Receiver<RequestLogEntry>> {
        self.queries.as_ref().map(|tx| tx.subscribe())
    }

    pub fn subscribe_activity(&self) -> Option<broadcast::Receiver<ClientActivity>> {
        self.activity.as_ref().map(|tx| tx.subscribe())
    }

    pub fn is_enabled(&self) -> bool {
        self.queries.is_some()
    }
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
