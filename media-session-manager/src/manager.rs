//! Sync-first session monitor manager
//!
//! Owns a `MetadataMonitor` on a background worker thread and exposes a
//! thread-safe handle. Every call enqueues a command behind the source
//! events already queued, so requests are applied in arrival order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use media_session_state::{
    Control, ControlChannel, EventSource, MetadataMonitor, MonitorCallback, MonitorConfig,
    MonitorError, SubscriberId,
};

use crate::error::{ManagerError, Result};
use crate::iter::UpdateIterator;
use crate::update::{BroadcastBridge, MonitorUpdate, NowPlaying};
use crate::worker::spawn_monitor_worker;

/// Capacity of the update broadcast channel
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Cloneable command handle to a running monitor
///
/// Safe to use from inside a subscriber callback: commands are queued and
/// run after the current notification cycle.
#[derive(Clone)]
pub struct MonitorHandle {
    control: Arc<dyn ControlChannel>,
    released: Arc<AtomicBool>,
}

impl MonitorHandle {
    /// Queue a full recompute-and-notify cycle
    ///
    /// Does nothing once the monitor is released.
    pub fn dispatch_state(&self) -> Result<()> {
        if self.is_released() {
            return Ok(());
        }
        self.send(Control::DispatchState)
    }

    /// Queue removal of a subscriber
    pub fn unsubscribe(&self, id: SubscriberId) -> Result<()> {
        if self.is_released() {
            return Ok(());
        }
        self.send(Control::Unsubscribe(id))
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn send(&self, control: Control) -> Result<()> {
        if self.control.send(control) {
            Ok(())
        } else {
            Err(ManagerError::WorkerDisconnected)
        }
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Sync-first manager running a metadata monitor on its own thread
///
/// # Example
///
/// ```rust,ignore
/// use media_session_manager::SessionMonitorManager;
///
/// let manager = SessionMonitorManager::new(host_source)?;
/// manager.subscribe(NowPlayingWidget::default())?;
/// let mut updates = manager.iter();
/// manager.dispatch_state()?;
///
/// // Drain whatever has arrived without blocking
/// for update in updates.try_iter() {
///     println!("Update: {:?}", update);
/// }
///
/// manager.shutdown()?;
/// ```
pub struct SessionMonitorManager {
    handle: MonitorHandle,

    /// Sender half kept for creating new receivers
    updates: broadcast::Sender<MonitorUpdate>,

    /// Latest pair delivered to the bridge subscriber
    now_playing: Arc<RwLock<NowPlaying>>,

    bridge_id: SubscriberId,

    worker: Option<JoinHandle<()>>,
}

impl SessionMonitorManager {
    /// Create a manager with default configuration
    pub fn new<S>(source: S) -> Result<Self>
    where
        S: EventSource + Send + 'static,
        S::Controller: Send + 'static,
    {
        Self::with_config(source, MonitorConfig::default())
    }

    /// Create a manager with custom configuration
    ///
    /// The monitor is built on the calling thread, so an unreachable source
    /// is reported here rather than on the worker.
    pub fn with_config<S>(source: S, config: MonitorConfig) -> Result<Self>
    where
        S: EventSource + Send + 'static,
        S::Controller: Send + 'static,
    {
        let thread_name = config.worker_thread_name.clone();
        let mut monitor = MetadataMonitor::new(source, config)?;

        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let now_playing = Arc::new(RwLock::new(NowPlaying::default()));
        let bridge = BroadcastBridge::new(updates.clone(), Arc::clone(&now_playing));
        let bridge_id = monitor.subscribe(Box::new(bridge))?;

        let handle = MonitorHandle {
            control: Arc::new(monitor.control_sender()),
            released: Arc::new(AtomicBool::new(false)),
        };

        let worker = spawn_monitor_worker(monitor, &thread_name)?;
        tracing::debug!(thread = %thread_name, "Session monitor manager created");

        Ok(Self {
            handle,
            updates,
            now_playing,
            bridge_id,
            worker: Some(worker),
        })
    }

    /// Register a subscriber (sync)
    ///
    /// The callback runs on the worker thread, after every subscriber
    /// registered before it.
    pub fn subscribe(&self, callback: impl MonitorCallback + 'static) -> Result<SubscriberId> {
        if self.handle.is_released() {
            return Err(ManagerError::Monitor(MonitorError::Released));
        }

        let id = SubscriberId::next();
        self.handle.send(Control::Subscribe {
            id,
            callback: Box::new(callback),
        })?;
        Ok(id)
    }

    /// Remove a subscriber (sync)
    pub fn unsubscribe(&self, id: SubscriberId) -> Result<()> {
        self.handle.unsubscribe(id)
    }

    /// Queue a full recompute-and-notify cycle (sync)
    pub fn dispatch_state(&self) -> Result<()> {
        self.handle.dispatch_state()
    }

    /// Release the monitor
    ///
    /// The worker unregisters every watch and stops; later notifications
    /// are never delivered. Calling it again does nothing.
    pub fn release(&self) -> Result<()> {
        if self.handle.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!("Releasing session monitor");
        // A stopped worker has already released the monitor
        let _ = self.handle.control.send(Control::Release);
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }

    /// Cloneable command handle, usable from subscriber callbacks
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Receiver of every update delivered after this call
    pub fn subscribe_updates(&self) -> broadcast::Receiver<MonitorUpdate> {
        self.updates.subscribe()
    }

    /// Blocking iterator over updates delivered after this call
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut updates = manager.iter();
    ///
    /// // Non-blocking check
    /// if let Some(update) = updates.try_recv() {
    ///     println!("Got update: {:?}", update);
    /// }
    /// ```
    pub fn iter(&self) -> UpdateIterator {
        UpdateIterator::new(self.updates.subscribe())
    }

    /// Latest metadata and playback state delivered to subscribers
    pub fn snapshot(&self) -> NowPlaying {
        self.now_playing.read().clone()
    }

    /// Id of the internal subscriber feeding `subscribe_updates`
    pub fn bridge_id(&self) -> SubscriberId {
        self.bridge_id
    }

    /// Stop the worker and wait for it to exit
    ///
    /// The monitor is released before the worker exits.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.handle.control.send(Control::Shutdown);
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ManagerError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for SessionMonitorManager {
    fn drop(&mut self) {
        if self.worker.is_some() {
            tracing::debug!("SessionMonitorManager dropping, stopping worker");
            let _ = self.handle.control.send(Control::Shutdown);
        }
    }
}

impl std::fmt::Debug for SessionMonitorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMonitorManager")
            .field("released", &self.is_released())
            .field("update_receivers", &self.updates.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_session_state::memory::InMemorySource;

    #[test]
    fn test_release_is_idempotent() {
        let source = InMemorySource::new();
        let manager = SessionMonitorManager::new(source.clone()).unwrap();

        assert!(manager.release().is_ok());
        assert!(manager.release().is_ok());
        assert!(manager.is_released());
        assert!(manager.dispatch_state().is_ok());

        manager.shutdown().unwrap();
        assert_eq!(source.list_watch_count(), 0);
        assert_eq!(source.unwatch_calls(), 1);
    }

    #[test]
    fn test_handle_shares_release_state() {
        let manager = SessionMonitorManager::new(InMemorySource::new()).unwrap();
        let handle = manager.handle();

        assert!(!handle.is_released());
        manager.release().unwrap();
        assert!(handle.is_released());
    }
}
