//! MetadataMonitor - main entry point for media-session-state
//!
//! The monitor owns the session registry, the arbitration engine and the
//! dispatcher, and reacts to everything arriving on its queue.
//!
//! # Usage
//!
//! ```rust,ignore
//! use media_session_state::{MetadataMonitor, MonitorConfig};
//!
//! let mut monitor = MetadataMonitor::new(source, MonitorConfig::default())?;
//! monitor.subscribe(Box::new(now_playing_widget))?;
//! monitor.dispatch_state();
//!
//! // Drive it from the owning thread
//! monitor.run();
//! ```
//!
//! Every mutating method takes `&mut self`: a monitor is driven from one
//! executor and a subscriber callback cannot reach the monitor that is
//! notifying it. Use `media-session-manager` to run a monitor on its own
//! worker thread.

use std::sync::mpsc;

use crate::arbitration::{ActiveSelection, ArbitrationEngine};
use crate::config::MonitorConfig;
use crate::dispatcher::{Dispatcher, MonitorCallback, SubscriberId};
use crate::error::{MonitorError, Result};
use crate::model::{PlaybackState, SessionToken, TrackMetadata};
use crate::queue::{Control, ControlSender, Message};
use crate::registry::{SessionRegistry, SessionSeed};
use crate::session::SessionState;
use crate::source::{EventSink, EventSource, LiveSession, SourceEvent, WatchId};

/// Whether the run loop should keep going after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Tracks live media sessions and reports the active one to subscribers
pub struct MetadataMonitor<S: EventSource> {
    source: S,
    config: MonitorConfig,
    registry: SessionRegistry<S::Controller>,
    engine: ArbitrationEngine,
    dispatcher: Dispatcher,
    /// Sending half handed to the source for every watch
    sink: EventSink<S::Controller>,
    tx: mpsc::Sender<Message<S::Controller>>,
    rx: mpsc::Receiver<Message<S::Controller>>,
    /// Registration for live-list replacements
    source_watch: Option<WatchId>,
    released: bool,
}

impl<S: EventSource> MetadataMonitor<S> {
    /// Create a monitor and track the sessions that are live right now
    ///
    /// Fails with [`MonitorError::SourceUnavailable`] if the source cannot
    /// be reached. The active session is selected from the initial sessions
    /// right away; since nobody is subscribed yet, subscribers get the
    /// current state through `dispatch_state()` or
    /// [`MonitorConfig::snapshot_on_subscribe`].
    pub fn new(mut source: S, config: MonitorConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let sink = EventSink::new(tx.clone());

        let source_watch = source
            .watch_active_sessions(sink.clone())
            .map_err(MonitorError::SourceUnavailable)?;

        let live = match source.live_sessions() {
            Ok(live) => live,
            Err(err) => {
                source.unwatch(source_watch);
                return Err(MonitorError::SourceUnavailable(err));
            }
        };

        let mut monitor = Self {
            source,
            config,
            registry: SessionRegistry::new(),
            engine: ArbitrationEngine::new(),
            dispatcher: Dispatcher::new(),
            sink,
            tx,
            rx,
            source_watch: Some(source_watch),
            released: false,
        };
        monitor.update_sessions(live);
        monitor.update_state(false);

        tracing::debug!(
            session_count = monitor.registry.len(),
            active = ?monitor.engine.active_token(),
            "Metadata monitor created"
        );
        Ok(monitor)
    }

    /// Register a subscriber at the end of the notification order
    pub fn subscribe(&mut self, callback: Box<dyn MonitorCallback>) -> Result<SubscriberId> {
        let id = SubscriberId::next();
        self.subscribe_with_id(id, callback)?;
        Ok(id)
    }

    /// Register a subscriber under an id allocated by the caller
    pub fn subscribe_with_id(
        &mut self,
        id: SubscriberId,
        callback: Box<dyn MonitorCallback>,
    ) -> Result<()> {
        if self.released {
            return Err(MonitorError::Released);
        }
        self.dispatcher.insert(id, callback);
        tracing::debug!(subscriber = %id, "Subscriber registered");

        if self.config.dispatch_on_subscribe {
            self.dispatch_state();
        }
        Ok(())
    }

    /// Remove a subscriber, returning whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let removed = self.dispatcher.unsubscribe(id);
        if removed {
            tracing::debug!(subscriber = %id, "Subscriber removed");
        }
        removed
    }

    /// Force a full recompute-and-notify cycle
    ///
    /// Does nothing after `release()`.
    pub fn dispatch_state(&mut self) {
        if self.released {
            return;
        }
        self.update_state(true);
    }

    /// Replace the tracked set with `live` and recompute
    pub fn on_active_sessions_changed(&mut self, live: Vec<LiveSession<S::Controller>>) {
        if self.released {
            return;
        }
        self.update_sessions(live);
        self.update_state(false);
    }

    /// Store a session's new playback state and recompute
    ///
    /// Events for sessions that are no longer tracked are ignored.
    pub fn on_playback_state_changed(&mut self, token: &SessionToken, state: PlaybackState) {
        if self.released {
            return;
        }
        let Some(session) = self.registry.get_mut(token) else {
            tracing::debug!(token = %token, "Playback state for untracked session ignored");
            return;
        };

        tracing::debug!(token = %token, status = ?state.status, "New playback state");
        session.set_playback_state(state);
        self.update_state(false);
    }

    /// Store a session's new metadata, mark it unseen, and recompute
    ///
    /// Events for sessions that are no longer tracked are ignored.
    pub fn on_metadata_changed(&mut self, token: &SessionToken, metadata: Option<TrackMetadata>) {
        if self.released {
            return;
        }
        let Some(session) = self.registry.get_mut(token) else {
            tracing::debug!(token = %token, "Metadata for untracked session ignored");
            return;
        };

        match &metadata {
            None => tracing::debug!(token = %token, "New metadata: none"),
            Some(metadata) if self.config.log_metadata_details => tracing::debug!(
                token = %token,
                keys = %metadata.populated_keys().join(","),
                uri = ?metadata.media_uri,
                "New metadata: {}",
                metadata.description()
            ),
            Some(_) => tracing::debug!(token = %token, "New metadata"),
        }

        session.set_metadata(metadata);
        self.update_state(false);
    }

    /// Apply one queued message
    pub fn handle_message(&mut self, message: Message<S::Controller>) -> Flow {
        match message {
            Message::Source(event) => {
                self.handle_event(event);
                if self.released {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }
            Message::Control(control) => self.handle_control(control),
        }
    }

    /// Apply one source event
    pub fn handle_event(&mut self, event: SourceEvent<S::Controller>) {
        match event {
            SourceEvent::ActiveSessionsChanged(live) => self.on_active_sessions_changed(live),
            SourceEvent::PlaybackStateChanged { token, state } => {
                self.on_playback_state_changed(&token, state)
            }
            SourceEvent::MetadataChanged { token, metadata } => {
                self.on_metadata_changed(&token, metadata)
            }
        }
    }

    fn handle_control(&mut self, control: Control) -> Flow {
        match control {
            Control::Subscribe { id, callback } => {
                if let Err(err) = self.subscribe_with_id(id, callback) {
                    tracing::warn!(subscriber = %id, "Subscription rejected: {}", err);
                }
            }
            Control::Unsubscribe(id) => {
                self.unsubscribe(id);
            }
            Control::DispatchState => self.dispatch_state(),
            Control::Release => {
                self.release();
                return Flow::Stop;
            }
            Control::Shutdown => return Flow::Stop,
        }

        if self.released {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Handle queued messages without blocking
    ///
    /// Stops early at the configured drain limit or when a message stops the
    /// monitor. Returns the number of messages handled.
    pub fn process_pending(&mut self) -> usize {
        let limit = self.config.drain_limit();
        let mut handled = 0;

        while limit.map_or(true, |limit| handled < limit) {
            let Ok(message) = self.rx.try_recv() else {
                break;
            };
            handled += 1;
            if self.handle_message(message) == Flow::Stop {
                break;
            }
        }

        handled
    }

    /// Block on the queue, handling messages until released or shut down
    ///
    /// The monitor holds a sender of its own queue, so only a
    /// `Control::Release` or `Control::Shutdown` ends the loop.
    pub fn run(&mut self) {
        if self.released {
            return;
        }
        tracing::debug!("Metadata monitor loop started");

        while let Ok(message) = self.rx.recv() {
            if self.handle_message(message) == Flow::Stop {
                break;
            }
        }

        tracing::debug!(released = self.released, "Metadata monitor loop stopped");
    }

    /// Stop watching the source and drop every subscriber
    ///
    /// Afterwards no notification is delivered. Calling it again does
    /// nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(watch) = self.source_watch.take() {
            self.source.unwatch(watch);
        }
        for mut session in self.registry.drain() {
            if let Some(watch) = session.take_watch() {
                self.source.unwatch(watch);
            }
        }
        self.engine.reset();
        self.dispatcher.clear();

        tracing::info!("Metadata monitor released");
    }

    /// Sink for delivering source events to this monitor's queue
    pub fn event_sink(&self) -> EventSink<S::Controller> {
        self.sink.clone()
    }

    /// Sender for control commands to this monitor's queue
    pub fn control_sender(&self) -> ControlSender<S::Controller> {
        ControlSender::new(self.tx.clone())
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The session currently presented to subscribers
    pub fn active_session(&self) -> Option<&SessionState<S::Controller>> {
        self.engine
            .active_token()
            .and_then(|token| self.registry.get(token))
    }

    pub fn active_token(&self) -> Option<&SessionToken> {
        self.engine.active_token()
    }

    /// Token and record generation of the active session
    pub fn active_selection(&self) -> Option<&ActiveSelection> {
        self.engine.active()
    }

    pub fn session(&self, token: &SessionToken) -> Option<&SessionState<S::Controller>> {
        self.registry.get(token)
    }

    /// Tracked sessions in unspecified order
    pub fn sessions(&self) -> impl Iterator<Item = &SessionState<S::Controller>> {
        self.registry.values()
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.dispatcher.len()
    }

    /// Number of subscriber notifications that failed
    pub fn fault_count(&self) -> u64 {
        self.dispatcher.fault_count()
    }

    /// Reconcile the registry, pulling and watching new sessions
    fn update_sessions(&mut self, live: Vec<LiveSession<S::Controller>>) {
        let source = &mut self.source;
        let sink = &self.sink;

        let report = self.registry.reconcile(live, |session| {
            let initial = source.initial_state(&session.controller);
            let watch = match source.watch_session(&session.controller, &session.token, sink.clone()) {
                Ok(watch) => Some(watch),
                Err(err) => {
                    tracing::warn!(
                        token = %session.token,
                        "Could not watch session, it will not report changes: {}",
                        err
                    );
                    None
                }
            };
            SessionSeed { initial, watch }
        });

        for mut session in report.removed {
            if let Some(watch) = session.take_watch() {
                self.source.unwatch(watch);
            }
        }
    }

    /// Recompute the active session and notify subscribers
    fn update_state(&mut self, force_full_update: bool) {
        let cycle = self.engine.recompute(&mut self.registry, force_full_update);

        if let Some(update) = &cycle.full_update {
            self.dispatcher
                .notify_metadata_changed(update.package.as_ref(), update.metadata.as_ref());
        }
        self.dispatcher
            .notify_playback_state_changed(cycle.playback_state.as_ref());
    }
}

impl<S: EventSource> Drop for MetadataMonitor<S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<S> std::fmt::Debug for MetadataMonitor<S>
where
    S: EventSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataMonitor")
            .field("session_count", &self.registry.len())
            .field("active", &self.engine.active_token())
            .field("subscriber_count", &self.dispatcher.len())
            .field("released", &self.released)
            .finish()
    }
}
