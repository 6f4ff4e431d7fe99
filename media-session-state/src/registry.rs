//! Tracked session set, reconciled against the host's live list
//!
//! The registry is owned by one monitor and mutated only on its executor,
//! so it needs no locking.

use std::collections::{HashMap, HashSet};

use crate::model::SessionToken;
use crate::session::SessionState;
use crate::source::{InitialState, LiveSession, WatchId};

/// What the caller provides for a session seen for the first time
#[derive(Debug, Clone, Default)]
pub struct SessionSeed {
    /// Eagerly pulled state
    pub initial: InitialState,
    /// Registration delivering the session's pushes; `None` if watching failed
    pub watch: Option<WatchId>,
}

/// Outcome of one [`SessionRegistry::reconcile`] call
#[derive(Debug)]
pub struct ReconcileReport<C> {
    /// Tokens that started being tracked
    pub added: Vec<SessionToken>,
    /// Records that stopped being tracked
    pub removed: Vec<SessionState<C>>,
}

impl<C> ReconcileReport<C> {
    /// True if membership did not change
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Map of session token to session record
#[derive(Debug)]
pub struct SessionRegistry<C> {
    sessions: HashMap<SessionToken, SessionState<C>>,
    next_generation: u64,
}

impl<C> SessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Make the tracked set match `live`
    ///
    /// `on_new` runs once per token that is not tracked yet and returns the
    /// eagerly pulled state plus the watch registration for that session.
    /// Tokens absent from `live` are removed unconditionally. Reconciling
    /// with an unchanged list does nothing.
    pub fn reconcile<F>(&mut self, live: Vec<LiveSession<C>>, mut on_new: F) -> ReconcileReport<C>
    where
        F: FnMut(&LiveSession<C>) -> SessionSeed,
    {
        let mut live_tokens = HashSet::with_capacity(live.len());
        let mut added = Vec::new();

        for session in live {
            if !live_tokens.insert(session.token.clone()) {
                continue;
            }
            if self.sessions.contains_key(&session.token) {
                continue;
            }

            tracing::debug!(token = %session.token, package = %session.package, "New media controller");
            let seed = on_new(&session);
            let generation = self.next_generation;
            self.next_generation += 1;

            let LiveSession {
                token,
                package,
                controller,
            } = session;
            added.push(token.clone());
            self.sessions.insert(
                token.clone(),
                SessionState::new(token, package, controller, generation, seed.initial, seed.watch),
            );
        }

        let stale: Vec<SessionToken> = self
            .sessions
            .keys()
            .filter(|token| !live_tokens.contains(*token))
            .cloned()
            .collect();

        let mut removed = Vec::with_capacity(stale.len());
        for token in stale {
            if let Some(state) = self.sessions.remove(&token) {
                tracing::debug!(token = %token, "Removed media controller");
                removed.push(state);
            }
        }

        ReconcileReport { added, removed }
    }

    pub fn get(&self, token: &SessionToken) -> Option<&SessionState<C>> {
        self.sessions.get(token)
    }

    pub fn get_mut(&mut self, token: &SessionToken) -> Option<&mut SessionState<C>> {
        self.sessions.get_mut(token)
    }

    pub fn contains(&self, token: &SessionToken) -> bool {
        self.sessions.contains_key(token)
    }

    /// True if this exact record (token and generation) is still tracked
    pub fn contains_record(&self, token: &SessionToken, generation: u64) -> bool {
        self.sessions
            .get(token)
            .is_some_and(|state| state.generation() == generation)
    }

    /// Tracked sessions in unspecified order
    pub fn values(&self) -> impl Iterator<Item = &SessionState<C>> {
        self.sessions.values()
    }

    pub fn tokens(&self) -> Vec<SessionToken> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove every record, returning them
    pub fn drain(&mut self) -> Vec<SessionState<C>> {
        self.sessions.drain().map(|(_, state)| state).collect()
    }
}

impl<C> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
