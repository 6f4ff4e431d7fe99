//! Sync iterator for consuming updates from SessionMonitorManager
//!
//! Provides a blocking iterator over the broadcast channel for callers that
//! do not run an async runtime.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::update::MonitorUpdate;

/// Blocking iterator over monitor updates
///
/// `next()` blocks until an update is available or the manager is gone.
/// Updates this receiver fell behind on are skipped. Must not be used from
/// inside an async runtime; use [`SessionMonitorManager::subscribe_updates`]
/// there instead.
///
/// [`SessionMonitorManager::subscribe_updates`]: crate::SessionMonitorManager::subscribe_updates
pub struct UpdateIterator {
    rx: broadcast::Receiver<MonitorUpdate>,
}

impl UpdateIterator {
    pub(crate) fn new(rx: broadcast::Receiver<MonitorUpdate>) -> Self {
        Self { rx }
    }

    /// Block until an update is available
    ///
    /// Returns `None` once the channel is closed.
    pub fn recv(&mut self) -> Option<MonitorUpdate> {
        loop {
            match self.rx.blocking_recv() {
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Update iterator fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an update without blocking
    ///
    /// Returns `None` if no update is currently available or the channel is closed.
    pub fn try_recv(&mut self) -> Option<MonitorUpdate> {
        loop {
            match self.rx.try_recv() {
                Ok(update) => return Some(update),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Update iterator fell behind");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking iterator over currently available updates
    pub fn try_iter(&mut self) -> TryIterator<'_> {
        TryIterator { inner: self }
    }
}

impl Iterator for UpdateIterator {
    type Item = MonitorUpdate;

    /// Block until the next update is available
    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking iterator over currently available updates
pub struct TryIterator<'a> {
    inner: &'a mut UpdateIterator,
}

impl<'a> Iterator for TryIterator<'a> {
    type Item = MonitorUpdate;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}
