//! Configuration for the metadata monitor
//!
//! Controls how the monitor drains its queue, what it logs, and how the
//! manager names its worker thread.

/// Configuration for a [`MetadataMonitor`](crate::MetadataMonitor)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Run a full dispatch right after a subscriber registers
    /// Default: false
    pub dispatch_on_subscribe: bool,

    /// Maximum number of queued messages handled by one `process_pending` call
    /// Default: 0 (unlimited)
    pub max_events_per_drain: usize,

    /// Include metadata keys and description in debug logs
    /// Default: true
    pub log_metadata_details: bool,

    /// Name of the manager's worker thread
    /// Default: "media-session-monitor"
    pub worker_thread_name: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            dispatch_on_subscribe: false,
            max_events_per_drain: 0,
            log_metadata_details: true,
            worker_thread_name: "media-session-monitor".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Create a new MonitorConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Every new subscriber immediately receives the current snapshot
    pub fn snapshot_on_subscribe() -> Self {
        Self {
            dispatch_on_subscribe: true,
            ..Default::default()
        }
    }

    /// Minimal diagnostics
    pub fn quiet() -> Self {
        Self {
            log_metadata_details: false,
            ..Default::default()
        }
    }

    pub fn with_dispatch_on_subscribe(mut self, enabled: bool) -> Self {
        self.dispatch_on_subscribe = enabled;
        self
    }

    pub fn with_max_events_per_drain(mut self, max: usize) -> Self {
        self.max_events_per_drain = max;
        self
    }

    pub fn with_log_metadata_details(mut self, enabled: bool) -> Self {
        self.log_metadata_details = enabled;
        self
    }

    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Drain bound as an Option, `None` meaning unlimited
    pub fn drain_limit(&self) -> Option<usize> {
        (self.max_events_per_drain > 0).then_some(self.max_events_per_drain)
    }
}
