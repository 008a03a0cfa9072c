// File: ./src/lifecycle.rs
//! Host lifecycle as a pure state machine.
//!
//! `transition` maps (state, event) to the next state and the side effects
//! the router must run, in order. It performs no I/O itself.
use serde::{Deserialize, Serialize};
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
pub enum LifecycleState {
    #[default]
    Idle,
    Created,
    Paused,
    Destroyed,
}

/// Callbacks delivered by the host (mirrors the Android lifecycle events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Load the last snapshot into the store.
    RestoreSession,
    Subscribe,
    /// Apply the pending activation intent.
    Activate,
    PersistSnapshot,
    Unsubscribe,
}

impl LifecycleState {
    /// True between Created and Destroyed, i.e. while notifications flow.
    pub fn is_active(self) -> bool {
        matches!(self, LifecycleState::Created | LifecycleState::Paused)
    }
}

pub fn transition(state: LifecycleState, event: LifecycleEvent) -> (LifecycleState, Vec<Effect>) {
    use LifecycleEvent as E;
    use LifecycleState as S;

    match (state, event) {
        (S::Idle | S::Destroyed, E::Create) => (
            S::Created,
            vec![Effect::RestoreSession, Effect::Subscribe, Effect::Activate],
        ),
        (S::Created | S::Paused, E::Pause) => (S::Paused, vec![Effect::PersistSnapshot]),
        (S::Paused, E::Resume) => (S::Created, vec![]),
        // Persisted again even if a Pause already did so; the write is idempotent.
        (S::Created | S::Paused, E::Destroy) => (
            S::Destroyed,
            vec![Effect::PersistSnapshot, Effect::Unsubscribe],
        ),
        (state, _) => (state, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use LifecycleEvent as E;
    use LifecycleState as S;

    #[test]
    fn test_create_from_idle_and_destroyed() {
        for from in [S::Idle, S::Destroyed] {
            let (to, effects) = transition(from, E::Create);
            assert_eq!(to, S::Created);
            assert_eq!(
                effects,
                vec![Effect::RestoreSession, Effect::Subscribe, Effect::Activate]
            );
        }
    }

    #[test]
    fn test_pause_and_destroy_persist() {
        assert_eq!(
            transition(S::Created, E::Pause),
            (S::Paused, vec![Effect::PersistSnapshot])
        );
        assert_eq!(
            transition(S::Paused, E::Pause),
            (S::Paused, vec![Effect::PersistSnapshot])
        );
        for from in [S::Created, S::Paused] {
            assert_eq!(
                transition(from, E::Destroy),
                (S::Destroyed, vec![Effect::PersistSnapshot, Effect::Unsubscribe])
            );
        }
    }

    #[test]
    fn test_resume_returns_to_created() {
        assert_eq!(transition(S::Paused, E::Resume), (S::Created, vec![]));
        assert_eq!(transition(S::Created, E::Resume), (S::Created, vec![]));
    }

    #[test]
    fn test_no_double_subscribe_or_unsubscribe() {
        assert_eq!(transition(S::Created, E::Create), (S::Created, vec![]));
        assert_eq!(transition(S::Paused, E::Create), (S::Paused, vec![]));
        assert_eq!(transition(S::Idle, E::Destroy), (S::Idle, vec![]));
        assert_eq!(transition(S::Destroyed, E::Destroy), (S::Destroyed, vec![]));
        assert_eq!(transition(S::Idle, E::Pause), (S::Idle, vec![]));
    }

    #[test]
    fn test_reserved_events_are_noops() {
        for state in S::iter() {
            for event in [E::Start, E::Stop, E::Any] {
                assert_eq!(transition(state, event), (state, vec![]), "{state:?} {event:?}");
            }
        }
    }

    #[test]
    fn test_subscribe_and_unsubscribe_balance() {
        // Any event sequence keeps subscribes - unsubscribes in {0, 1}.
        for first in E::iter() {
            for second in E::iter() {
                for third in E::iter() {
                    let mut state = S::Idle;
                    let mut live: i32 = 0;
                    for event in [E::Create, first, second, third, E::Destroy] {
                        let (next, effects) = transition(state, event);
                        for effect in effects {
                            match effect {
                                Effect::Subscribe => live += 1,
                                Effect::Unsubscribe => live -= 1,
                                _ => {}
                            }
                        }
                        assert!((0..=1).contains(&live));
                        assert_eq!(live == 1, next.is_active());
                        state = next;
                    }
                }
            }
        }
    }
}
