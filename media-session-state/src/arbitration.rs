//! Active session selection
//!
//! On every recompute the engine decides which tracked session is the one
//! consumers should see, and whether this cycle must carry a full update
//! (metadata) in addition to the playback state that every cycle carries.
//!
//! Selection rule, applied in one pass over the registry:
//!
//! 1. An active selection whose record left the registry is cleared.
//! 2. The first other session that is `Playing` takes over. If none is
//!    playing and nothing is active, the first session in any state other
//!    than `None` fills the slot instead. Sessions without a playback state
//!    never qualify.
//! 3. Unseen metadata on the active session forces a full update.
//!
//! Ties between sessions that qualify at the same time follow registry
//! iteration order, which is unspecified.

use crate::model::{PackageName, PlaybackState, SessionToken, TrackMetadata};
use crate::registry::SessionRegistry;
use crate::session::SessionState;

/// The currently selected session record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    pub token: SessionToken,
    pub generation: u64,
}

impl ActiveSelection {
    fn of<C>(state: &SessionState<C>) -> Self {
        Self {
            token: state.token().clone(),
            generation: state.generation(),
        }
    }

    fn is<C>(&self, state: &SessionState<C>) -> bool {
        self.generation == state.generation() && &self.token == state.token()
    }
}

/// Payload of a full update
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataUpdate {
    pub package: Option<PackageName>,
    pub metadata: Option<TrackMetadata>,
}

/// What one recompute decided
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle {
    /// Present when subscribers must receive a metadata notification
    pub full_update: Option<MetadataUpdate>,
    /// Playback state of the active session, delivered every cycle
    pub playback_state: Option<PlaybackState>,
    /// Session promoted to active during this cycle
    pub promoted: Option<SessionToken>,
    /// The previous selection was dropped because its session disappeared
    pub cleared: bool,
}

impl Cycle {
    pub fn is_full_update(&self) -> bool {
        self.full_update.is_some()
    }
}

/// Holds the active selection and recomputes it
#[derive(Debug, Default)]
pub struct ArbitrationEngine {
    active: Option<ActiveSelection>,
}

impl ArbitrationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveSelection> {
        self.active.as_ref()
    }

    /// Token of the active session
    pub fn active_token(&self) -> Option<&SessionToken> {
        self.active.as_ref().map(|active| &active.token)
    }

    /// Forget the selection without notifying anyone
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Run one selection pass and decide what to notify
    ///
    /// Clears the unseen-metadata flag of the active session when the cycle
    /// is a full update.
    pub fn recompute<C>(&mut self, registry: &mut SessionRegistry<C>, force_full_update: bool) -> Cycle {
        let mut full_update = force_full_update;
        let mut cleared = false;

        if let Some(active) = &self.active {
            if !registry.contains_record(&active.token, active.generation) {
                tracing::debug!(token = %active.token, "Active session is gone");
                self.active = None;
                full_update = true;
                cleared = true;
            }
        }

        let sessions: &SessionRegistry<C> = registry;
        let current = self.active.as_ref();
        let candidate = first_other(sessions, current, |state| state.is_playing())
            .or_else(|| match current {
                Some(_) => None,
                None => first_other(sessions, current, |state| state.is_engaged()),
            })
            .map(ActiveSelection::of);

        let mut promoted = None;
        if let Some(candidate) = candidate {
            tracing::info!(
                token = %candidate.token,
                previous = ?self.active.as_ref().map(|active| &active.token),
                "Active session changed"
            );
            promoted = Some(candidate.token.clone());
            self.active = Some(candidate);
            full_update = true;
        }

        let active_state = match &self.active {
            Some(active) => registry.get_mut(&active.token),
            None => None,
        };

        if active_state
            .as_ref()
            .is_some_and(|state| state.has_unseen_metadata())
        {
            full_update = true;
        }

        let (full_update, playback_state) = match active_state {
            Some(state) => {
                let update = full_update.then(|| {
                    state.mark_metadata_seen();
                    MetadataUpdate {
                        package: Some(state.package().clone()),
                        metadata: state.metadata().cloned(),
                    }
                });
                (update, state.playback_state().cloned())
            }
            None => {
                let update = full_update.then_some(MetadataUpdate {
                    package: None,
                    metadata: None,
                });
                (update, None)
            }
        };

        Cycle {
            full_update,
            playback_state,
            promoted,
            cleared,
        }
    }
}

/// First session other than `active` that satisfies `qualifies`
fn first_other<'a, C>(
    registry: &'a SessionRegistry<C>,
    active: Option<&ActiveSelection>,
    qualifies: impl Fn(&SessionState<C>) -> bool,
) -> Option<&'a SessionState<C>> {
    registry
        .values()
        .filter(|state| !active.is_some_and(|active| active.is(*state)))
        .find(|state| qualifies(*state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaybackStatus;
    use crate::registry::SessionSeed;
    use crate::source::{InitialState, LiveSession};

    type Live = Vec<(&'static str, Option<PlaybackStatus>)>;

    fn reconcile(registry: &mut SessionRegistry<()>, sessions: Live) {
        let states: std::collections::HashMap<_, _> = sessions.iter().cloned().collect();
        let live = sessions
            .iter()
            .map(|(token, _)| LiveSession::new(*token, format!("pkg.{}", token), ()))
            .collect();
        registry.reconcile(live, |session| SessionSeed {
            initial: InitialState::new(
                states[session.token.as_str()].map(PlaybackState::new),
                Some(TrackMetadata::with_title(format!("{} song", session.token))),
            ),
            watch: None,
        });
    }

    fn set_status(registry: &mut SessionRegistry<()>, token: &str, status: PlaybackStatus) {
        registry
            .get_mut(&SessionToken::new(token))
            .unwrap()
            .set_playback_state(PlaybackState::new(status));
    }

    fn active(engine: &ArbitrationEngine) -> Option<&str> {
        engine.active_token().map(SessionToken::as_str)
    }

    #[test]
    fn test_empty_registry_has_no_active() {
        let mut registry = SessionRegistry::<()>::new();
        let mut engine = ArbitrationEngine::new();

        let cycle = engine.recompute(&mut registry, false);
        assert!(!cycle.is_full_update());
        assert_eq!(cycle.playback_state, None);
        assert_eq!(active(&engine), None);
    }

    #[test]
    fn test_forced_cycle_without_active_sends_empty_update() {
        let mut registry = SessionRegistry::<()>::new();
        let mut engine = ArbitrationEngine::new();

        let cycle = engine.recompute(&mut registry, true);
        assert_eq!(
            cycle.full_update,
            Some(MetadataUpdate {
                package: None,
                metadata: None
            })
        );
    }

    #[test]
    fn test_paused_session_fills_empty_slot() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Paused))]);

        let cycle = engine.recompute(&mut registry, false);
        assert_eq!(active(&engine), Some("a"));
        assert_eq!(cycle.promoted, Some(SessionToken::new("a")));
        let update = cycle.full_update.unwrap();
        assert_eq!(update.package, Some(PackageName::new("pkg.a")));
        assert_eq!(update.metadata, Some(TrackMetadata::with_title("a song")));
        assert_eq!(cycle.playback_state, Some(PlaybackState::paused()));
    }

    #[test]
    fn test_playing_session_wins_empty_slot_over_paused() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Paused)),
                ("b", Some(PlaybackStatus::Playing)),
                ("c", Some(PlaybackStatus::Stopped)),
            ],
        );

        let cycle = engine.recompute(&mut registry, false);
        assert_eq!(active(&engine), Some("b"));
        assert_eq!(cycle.playback_state, Some(PlaybackState::playing()));
    }

    #[test]
    fn test_idle_and_stateless_sessions_never_qualify() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(
            &mut registry,
            vec![("a", Some(PlaybackStatus::None)), ("b", None)],
        );

        let cycle = engine.recompute(&mut registry, false);
        assert_eq!(active(&engine), None);
        assert!(!cycle.is_full_update());
    }

    #[test]
    fn test_playing_preempts_paused_incumbent() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Paused))]);
        engine.recompute(&mut registry, false);

        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Paused)),
                ("b", Some(PlaybackStatus::Playing)),
            ],
        );
        let cycle = engine.recompute(&mut registry, false);

        assert_eq!(active(&engine), Some("b"));
        assert!(cycle.is_full_update());
        assert_eq!(cycle.playback_state, Some(PlaybackState::playing()));
    }

    #[test]
    fn test_paused_newcomer_does_not_preempt() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Paused))]);
        engine.recompute(&mut registry, false);

        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Paused)),
                ("b", Some(PlaybackStatus::Paused)),
            ],
        );
        let cycle = engine.recompute(&mut registry, false);

        assert_eq!(active(&engine), Some("a"));
        assert!(cycle.promoted.is_none());
    }

    #[test]
    fn test_pausing_active_keeps_it() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Playing)),
                ("b", Some(PlaybackStatus::Stopped)),
            ],
        );
        engine.recompute(&mut registry, false);
        assert_eq!(active(&engine), Some("a"));

        set_status(&mut registry, "a", PlaybackStatus::Paused);
        let cycle = engine.recompute(&mut registry, false);

        assert_eq!(active(&engine), Some("a"));
        assert!(!cycle.is_full_update());
        assert_eq!(cycle.playback_state, Some(PlaybackState::paused()));
    }

    #[test]
    fn test_state_change_does_not_resend_metadata() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Playing))]);
        assert!(engine.recompute(&mut registry, false).is_full_update());

        set_status(&mut registry, "a", PlaybackStatus::Buffering);
        let cycle = engine.recompute(&mut registry, false);
        assert!(!cycle.is_full_update());
        assert_eq!(
            cycle.playback_state.map(|state| state.status),
            Some(PlaybackStatus::Buffering)
        );
    }

    #[test]
    fn test_unseen_metadata_forces_full_update() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Playing))]);
        engine.recompute(&mut registry, false);

        registry
            .get_mut(&SessionToken::new("a"))
            .unwrap()
            .set_metadata(None);
        let cycle = engine.recompute(&mut registry, false);

        assert_eq!(
            cycle.full_update,
            Some(MetadataUpdate {
                package: Some(PackageName::new("pkg.a")),
                metadata: None
            })
        );
        assert!(!registry
            .get(&SessionToken::new("a"))
            .unwrap()
            .has_unseen_metadata());
    }

    #[test]
    fn test_unseen_metadata_on_inactive_session_is_kept() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Playing)),
                ("b", Some(PlaybackStatus::None)),
            ],
        );
        engine.recompute(&mut registry, false);

        let b = registry.get(&SessionToken::new("b")).unwrap();
        assert!(b.has_unseen_metadata());
    }

    #[test]
    fn test_removed_active_is_replaced_in_same_cycle() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(
            &mut registry,
            vec![
                ("a", Some(PlaybackStatus::Playing)),
                ("b", Some(PlaybackStatus::Paused)),
            ],
        );
        engine.recompute(&mut registry, false);
        assert_eq!(active(&engine), Some("a"));

        reconcile(&mut registry, vec![("b", Some(PlaybackStatus::Paused))]);
        let cycle = engine.recompute(&mut registry, false);

        assert!(cycle.cleared);
        assert_eq!(active(&engine), Some("b"));
        assert_eq!(
            cycle.full_update.and_then(|update| update.package),
            Some(PackageName::new("pkg.b"))
        );
    }

    #[test]
    fn test_removed_active_without_replacement_sends_empty_update() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Playing))]);
        engine.recompute(&mut registry, false);

        reconcile(&mut registry, Vec::new());
        let cycle = engine.recompute(&mut registry, false);

        assert_eq!(active(&engine), None);
        assert_eq!(
            cycle.full_update,
            Some(MetadataUpdate {
                package: None,
                metadata: None
            })
        );
        assert_eq!(cycle.playback_state, None);
    }

    #[test]
    fn test_recreated_record_under_same_token_is_new_session() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Playing))]);
        engine.recompute(&mut registry, false);

        // Removed and re-added without a recompute in between
        reconcile(&mut registry, Vec::new());
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Paused))]);
        let cycle = engine.recompute(&mut registry, false);

        assert!(cycle.cleared);
        assert_eq!(active(&engine), Some("a"));
        assert!(cycle.is_full_update());
    }

    #[test]
    fn test_forced_cycle_resends_current_metadata() {
        let mut registry = SessionRegistry::new();
        let mut engine = ArbitrationEngine::new();
        reconcile(&mut registry, vec![("a", Some(PlaybackStatus::Playing))]);
        engine.recompute(&mut registry, false);

        let cycle = engine.recompute(&mut registry, true);
        assert_eq!(
            cycle.full_update.and_then(|update| update.metadata),
            Some(TrackMetadata::with_title("a song"))
        );
        assert!(cycle.promoted.is_none());
    }
}
