//! Property-based tests for active session arbitration
//!
//! Random sequences of host-side changes are applied to an in-memory source
//! and the monitor is drained after every step.

mod helpers;

use proptest::prelude::*;

use helpers::{take, Note, Recorder};
use media_session_state::memory::InMemorySource;
use media_session_state::{
    MetadataMonitor, MonitorConfig, PlaybackState, PlaybackStatus, SessionToken, TrackMetadata,
};

const TOKENS: usize = 4;

// ============================================================================
// Test Helpers
// ============================================================================

/// One host-side change
#[derive(Debug, Clone)]
enum Op {
    Add(usize, Option<PlaybackStatus>),
    Remove(usize),
    SetState(usize, PlaybackStatus),
    SetMetadata(usize, u8),
    Dispatch,
}

fn token(index: usize) -> SessionToken {
    SessionToken::new(format!("t{}", index))
}

fn status_strategy() -> impl Strategy<Value = PlaybackStatus> {
    prop_oneof![
        Just(PlaybackStatus::Playing),
        Just(PlaybackStatus::Paused),
        Just(PlaybackStatus::Stopped),
        Just(PlaybackStatus::Buffering),
        Just(PlaybackStatus::None),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..TOKENS, proptest::option::of(status_strategy())).prop_map(|(i, s)| Op::Add(i, s)),
        (0..TOKENS).prop_map(Op::Remove),
        (0..TOKENS, status_strategy()).prop_map(|(i, s)| Op::SetState(i, s)),
        (0..TOKENS, any::<u8>()).prop_map(|(i, n)| Op::SetMetadata(i, n)),
        Just(Op::Dispatch),
    ]
}

fn apply(op: &Op, source: &InMemorySource, monitor: &mut MetadataMonitor<InMemorySource>) {
    match op {
        Op::Add(i, status) => source.add_session(
            token(*i),
            format!("pkg.t{}", i),
            status.map(PlaybackState::new),
            Some(TrackMetadata::with_title(format!("t{} song", i))),
        ),
        Op::Remove(i) => {
            source.remove_session(&token(*i));
        }
        Op::SetState(i, status) => source.set_playback_state(&token(*i), PlaybackState::new(*status)),
        Op::SetMetadata(i, n) => source.set_metadata(
            &token(*i),
            Some(TrackMetadata::with_title(format!("t{} take {}", i, n))),
        ),
        Op::Dispatch => monitor.dispatch_state(),
    }
    monitor.process_pending();
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The active session, when present, is always a tracked session
    #[test]
    fn prop_active_session_is_tracked(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let source = InMemorySource::new();
        let mut monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();

        for op in &ops {
            apply(op, &source, &mut monitor);
            if let Some(active) = monitor.active_token() {
                prop_assert!(monitor.session(active).is_some());
            }
        }
    }

    /// A session that starts playing is never left behind a non-playing one
    #[test]
    fn prop_playing_session_preempts(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let source = InMemorySource::new();
        let mut monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();

        for op in &ops {
            let tracked = match op {
                Op::SetState(i, _) => monitor.session(&token(*i)).is_some(),
                _ => false,
            };
            apply(op, &source, &mut monitor);

            if let (Op::SetState(_, PlaybackStatus::Playing), true) = (op, tracked) {
                let active = monitor.active_session();
                prop_assert!(active.is_some_and(|session| session.is_playing()));
            }
        }
    }

    /// Whenever an engaged session exists, some session is active, and a
    /// playing session anywhere means the active one is playing
    #[test]
    fn prop_engaged_session_fills_slot(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let source = InMemorySource::new();
        let mut monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();

        for op in &ops {
            apply(op, &source, &mut monitor);
            if monitor.sessions().any(|session| session.is_engaged()) {
                prop_assert!(monitor.active_token().is_some());
            }
            if monitor.sessions().any(|session| session.is_playing()) {
                prop_assert!(monitor.active_session().is_some_and(|session| session.is_playing()));
            }
        }
    }

    /// Sessions live at construction are arbitrated before any event
    #[test]
    fn prop_construction_selects_from_initial_sessions(
        statuses in prop::collection::vec(proptest::option::of(status_strategy()), 0..6)
    ) {
        let source = InMemorySource::new();
        for (i, status) in statuses.iter().enumerate() {
            source.add_session(token(i), format!("pkg.t{}", i), status.map(PlaybackState::new), None);
        }

        let monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();

        if monitor.sessions().any(|session| session.is_playing()) {
            prop_assert!(monitor.active_session().is_some_and(|session| session.is_playing()));
        }
        prop_assert_eq!(
            monitor.active_token().is_some(),
            monitor.sessions().any(|session| session.is_engaged())
        );
    }

    /// Every change of active session is announced with its metadata, and the
    /// last playback notification always matches the active session
    #[test]
    fn prop_notifications_follow_active_session(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let source = InMemorySource::new();
        let mut monitor = MetadataMonitor::new(source.clone(), MonitorConfig::default()).unwrap();
        let (recorder, notes) = Recorder::new();
        monitor.subscribe(recorder).unwrap();

        for op in &ops {
            let before = monitor.active_selection().cloned();
            apply(op, &source, &mut monitor);
            let step = take(&notes);
            let after = monitor.active_selection().cloned();

            if before != after {
                let expected = monitor
                    .active_session()
                    .map(|session| session.package().to_string());
                let announced = step.iter().any(|note| match note {
                    Note::Metadata(package, _) => *package == expected,
                    Note::Playback(_) => false,
                });
                prop_assert!(announced, "active change without metadata: {:?}", step);
            }

            if let Some(Note::Playback(status)) = step.iter().rev().find(|note| !note.is_metadata()) {
                let current = monitor
                    .active_session()
                    .and_then(|session| session.playback_state())
                    .map(|state| state.status);
                prop_assert_eq!(*status, current);
            }
        }
    }
}
