//! The monitor's single FIFO queue
//!
//! Source events and control commands share one channel so that everything
//! a monitor does happens in arrival order on one executor.

use std::fmt;
use std::sync::mpsc;

use crate::dispatcher::{MonitorCallback, SubscriberId};
use crate::source::SourceEvent;

/// Commands accepted from outside the executor
pub enum Control {
    /// Register a callback under a pre-allocated id
    Subscribe {
        id: SubscriberId,
        callback: Box<dyn MonitorCallback>,
    },
    /// Remove a callback
    Unsubscribe(SubscriberId),
    /// Force a full recompute-and-notify cycle
    DispatchState,
    /// Release the monitor and stop its run loop
    Release,
    /// Stop the run loop without releasing
    Shutdown,
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Subscribe { id, .. } => f.debug_struct("Subscribe").field("id", id).finish(),
            Control::Unsubscribe(id) => f.debug_tuple("Unsubscribe").field(id).finish(),
            Control::DispatchState => f.write_str("DispatchState"),
            Control::Release => f.write_str("Release"),
            Control::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Item travelling through the queue
#[derive(Debug)]
pub enum Message<C> {
    Source(SourceEvent<C>),
    Control(Control),
}

/// Anything that can hand a [`Control`] to a monitor's queue
///
/// Lets callers hold a sender without naming the source's controller type.
pub trait ControlChannel: Send + Sync {
    /// Returns `false` if the monitor is gone
    fn send(&self, control: Control) -> bool;
}

/// Sending half of a monitor's queue restricted to control commands
pub struct ControlSender<C> {
    tx: mpsc::Sender<Message<C>>,
}

impl<C> ControlSender<C> {
    pub(crate) fn new(tx: mpsc::Sender<Message<C>>) -> Self {
        Self { tx }
    }

    pub fn send(&self, control: Control) -> bool {
        self.tx.send(Message::Control(control)).is_ok()
    }
}

impl<C> Clone for ControlSender<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C: Send> ControlChannel for ControlSender<C> {
    fn send(&self, control: Control) -> bool {
        ControlSender::send(self, control)
    }
}
