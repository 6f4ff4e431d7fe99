//! Background worker thread owning the monitor
//!
//! The monitor is created on the caller's thread so construction errors
//! surface synchronously, then moved onto a named worker thread which drains
//! its queue until it is released or told to shut down.

use std::io;
use std::thread::{self, JoinHandle};

use media_session_state::{EventSource, MetadataMonitor};

/// Spawns the worker thread that drives `monitor`
///
/// The worker releases the monitor before exiting, so every watch is
/// unregistered whichever way the loop stopped.
pub fn spawn_monitor_worker<S>(
    monitor: MetadataMonitor<S>,
    thread_name: &str,
) -> io::Result<JoinHandle<()>>
where
    S: EventSource + Send + 'static,
    S::Controller: Send + 'static,
{
    thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            let mut monitor = monitor;
            tracing::info!(sessions = monitor.session_count(), "Monitor worker started");

            monitor.run();
            monitor.release();

            tracing::info!("Monitor worker shut down");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_session_state::memory::InMemorySource;
    use media_session_state::{Control, MonitorConfig};

    #[test]
    fn test_worker_stops_on_shutdown_and_releases() {
        let source = InMemorySource::new();
        let monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();
        let control = monitor.control_sender();

        let worker = spawn_monitor_worker(monitor, "test-monitor-worker").unwrap();
        assert_eq!(worker.thread().name(), Some("test-monitor-worker"));

        assert!(control.send(Control::Shutdown));
        worker.join().unwrap();

        assert_eq!(source.list_watch_count(), 0);
    }
}
