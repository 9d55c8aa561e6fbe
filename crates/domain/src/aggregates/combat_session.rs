//! CombatSession aggregate - the single active encounter as a state machine
//!
//! The machine is pure: it never talks to the authority. Authoritative
//! transitions (`start`, `exit`, `acknowledge`) are applied by the caller only
//! after the authority has confirmed them; the `ensure_can_*` checks let the
//! caller refuse an action before issuing the request.
//!
//! ```text
//!  NoSession --start--> Active --blocked--> Blocked
//!      ^                  |  ^                 |
//!      |                  |  +----tick---------+
//!      |               completed            completed
//!      |                  v                    |
//!      +--acknowledge-- Completed <------------+
//!
//!  Active/Blocked --exit--> NoSession
//!  any --fail--> Error --reconcile--> Active | NoSession
//! ```

use crate::error::DomainError;
use crate::events::{BlockOutcome, CompletionOutcome, RecoveryOutcome, TickOutcome};
use crate::ids::DungeonId;
use crate::value_objects::CompletionRewards;

/// Current state with the data each state carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NoSession,
    Active {
        dungeon_id: DungeonId,
        level: u32,
    },
    Blocked {
        dungeon_id: DungeonId,
        level: u32,
        reason: String,
    },
    Completed {
        dungeon_id: DungeonId,
        rewards: CompletionRewards,
    },
    Error {
        detail: String,
    },
}

/// Data-free tag of `SessionState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    NoSession,
    Active,
    Blocked,
    Completed,
    Error,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::NoSession => SessionPhase::NoSession,
            Self::Active { .. } => SessionPhase::Active,
            Self::Blocked { .. } => SessionPhase::Blocked,
            Self::Completed { .. } => SessionPhase::Completed,
            Self::Error { .. } => SessionPhase::Error,
        }
    }

    pub fn dungeon_id(&self) -> Option<DungeonId> {
        match self {
            Self::Active { dungeon_id, .. }
            | Self::Blocked { dungeon_id, .. }
            | Self::Completed { dungeon_id, .. } => Some(*dungeon_id),
            Self::NoSession | Self::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CombatSession {
    state: SessionState,
}

impl CombatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    // =========================================================================
    // Authoritative transitions
    // =========================================================================

    pub fn ensure_can_start(&self) -> Result<(), DomainError> {
        match self.state {
            SessionState::NoSession => Ok(()),
            _ => Err(self.invalid("start")),
        }
    }

    /// Record a start the authority has accepted.
    pub fn start(&mut self, dungeon_id: DungeonId, level: u32) -> Result<(), DomainError> {
        self.ensure_can_start()?;
        self.state = SessionState::Active { dungeon_id, level };
        Ok(())
    }

    pub fn ensure_can_exit(&self) -> Result<(), DomainError> {
        match self.state {
            SessionState::Active { .. } | SessionState::Blocked { .. } => Ok(()),
            _ => Err(self.invalid("exit")),
        }
    }

    /// Record an exit the authority has processed.
    pub fn exit(&mut self) -> Result<(), DomainError> {
        self.ensure_can_exit()?;
        self.state = SessionState::NoSession;
        Ok(())
    }

    pub fn ensure_can_acknowledge(&self) -> Result<(), DomainError> {
        match self.state {
            SessionState::Completed { .. } => Ok(()),
            _ => Err(self.invalid("acknowledge")),
        }
    }

    /// Dismiss the completion screen, handing back the rewards shown on it.
    pub fn acknowledge(&mut self) -> Result<CompletionRewards, DomainError> {
        self.ensure_can_acknowledge()?;
        match std::mem::take(&mut self.state) {
            SessionState::Completed { rewards, .. } => Ok(rewards),
            other => {
                self.state = other;
                Err(self.invalid("acknowledge"))
            }
        }
    }

    // =========================================================================
    // Notification-driven transitions
    // =========================================================================

    pub fn on_tick(&mut self) -> TickOutcome {
        match self.state {
            SessionState::Active { .. } => TickOutcome::RefreshNeeded,
            SessionState::Blocked {
                dungeon_id, level, ..
            } => {
                self.state = SessionState::Active { dungeon_id, level };
                TickOutcome::Unblocked
            }
            SessionState::Completed { .. } => TickOutcome::Frozen,
            SessionState::NoSession | SessionState::Error { .. } => TickOutcome::Ignored,
        }
    }

    pub fn on_blocked(&mut self, reason: impl Into<String>) -> BlockOutcome {
        let reason = reason.into();
        match self.state {
            SessionState::Active { dungeon_id, level } => {
                self.state = SessionState::Blocked {
                    dungeon_id,
                    level,
                    reason: reason.clone(),
                };
                BlockOutcome::Blocked { reason }
            }
            SessionState::Blocked {
                dungeon_id, level, ..
            } => {
                self.state = SessionState::Blocked {
                    dungeon_id,
                    level,
                    reason: reason.clone(),
                };
                BlockOutcome::StillBlocked { reason }
            }
            _ => BlockOutcome::Ignored,
        }
    }

    pub fn on_completed(&mut self, rewards: CompletionRewards) -> CompletionOutcome {
        match self.state {
            SessionState::Active { dungeon_id, .. } | SessionState::Blocked { dungeon_id, .. } => {
                self.state = SessionState::Completed {
                    dungeon_id,
                    rewards: rewards.clone(),
                };
                CompletionOutcome::Completed { rewards }
            }
            SessionState::Completed { .. } => CompletionOutcome::AlreadyCompleted,
            SessionState::NoSession | SessionState::Error { .. } => CompletionOutcome::Ignored,
        }
    }

    // =========================================================================
    // Failure and recovery
    // =========================================================================

    /// Any fetch or transport failure lands here; no automatic retry.
    pub fn fail(&mut self, detail: impl Into<String>) {
        self.state = SessionState::Error {
            detail: detail.into(),
        };
    }

    /// Align with the encounter the authority reports (`None` when there is none).
    ///
    /// Pending rewards are never discarded by a refresh.
    pub fn reconcile(&mut self, found: Option<(DungeonId, u32)>) -> RecoveryOutcome {
        let phase = self.phase();
        let current = match &self.state {
            SessionState::Active { dungeon_id, level } => Some((*dungeon_id, *level)),
            _ => None,
        };

        match (found, phase) {
            (_, SessionPhase::Completed) => RecoveryOutcome::Unchanged,
            (Some((dungeon_id, level)), SessionPhase::NoSession | SessionPhase::Error) => {
                self.state = SessionState::Active { dungeon_id, level };
                RecoveryOutcome::Resumed { dungeon_id, level }
            }
            (Some(reported), SessionPhase::Active) if current != Some(reported) => {
                let (dungeon_id, level) = reported;
                self.state = SessionState::Active { dungeon_id, level };
                RecoveryOutcome::Resumed { dungeon_id, level }
            }
            (Some(_), _) => RecoveryOutcome::Unchanged,
            (None, SessionPhase::Active | SessionPhase::Blocked | SessionPhase::Error) => {
                self.state = SessionState::NoSession;
                RecoveryOutcome::Cleared
            }
            (None, SessionPhase::NoSession) => RecoveryOutcome::Unchanged,
        }
    }

    fn invalid(&self, action: &str) -> DomainError {
        DomainError::invalid_state_transition(format!(
            "cannot {} from {:?}",
            action,
            self.phase()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(dungeon: i64, level: u32) -> CombatSession {
        let mut session = CombatSession::new();
        session.start(DungeonId::new(dungeon), level).unwrap();
        session
    }

    fn rewards() -> CompletionRewards {
        CompletionRewards {
            experience: 50,
            gold: 12,
            ..Default::default()
        }
    }

    mod authoritative {
        use super::*;

        #[test]
        fn start_from_no_session() {
            let session = active(7, 0);
            assert_eq!(
                session.state(),
                &SessionState::Active {
                    dungeon_id: DungeonId::new(7),
                    level: 0
                }
            );
        }

        #[test]
        fn start_while_active_is_rejected() {
            let mut session = active(7, 0);
            assert!(matches!(
                session.start(DungeonId::new(8), 0),
                Err(DomainError::InvalidStateTransition(_))
            ));
            assert_eq!(session.state().dungeon_id(), Some(DungeonId::new(7)));
        }

        #[test]
        fn start_from_error_requires_refresh_first() {
            let mut session = CombatSession::new();
            session.fail("timeout");
            assert!(session.ensure_can_start().is_err());
        }

        #[test]
        fn exit_from_active_and_blocked() {
            let mut session = active(7, 0);
            session.exit().unwrap();
            assert_eq!(session.phase(), SessionPhase::NoSession);

            let mut session = active(7, 0);
            session.on_blocked("spam_detected");
            session.exit().unwrap();
            assert_eq!(session.phase(), SessionPhase::NoSession);
        }

        #[test]
        fn exit_without_session_is_rejected() {
            let mut session = CombatSession::new();
            assert!(session.exit().is_err());
        }

        #[test]
        fn acknowledge_returns_rewards_and_clears() {
            let mut session = active(7, 0);
            session.on_completed(rewards());
            assert_eq!(session.acknowledge().unwrap(), rewards());
            assert_eq!(session.phase(), SessionPhase::NoSession);
        }

        #[test]
        fn acknowledge_requires_completion() {
            let mut session = active(7, 0);
            assert!(session.acknowledge().is_err());
            assert_eq!(session.phase(), SessionPhase::Active);
        }
    }

    mod notifications {
        use super::*;

        #[test]
        fn blocked_is_sticky_until_a_normal_tick() {
            let mut session = active(7, 0);
            assert!(matches!(
                session.on_blocked("spam_detected"),
                BlockOutcome::Blocked { .. }
            ));
            for _ in 0..3 {
                assert!(matches!(
                    session.on_blocked("spam_detected"),
                    BlockOutcome::StillBlocked { .. }
                ));
                assert_eq!(session.phase(), SessionPhase::Blocked);
            }

            assert_eq!(session.on_tick(), TickOutcome::Unblocked);
            assert_eq!(session.phase(), SessionPhase::Active);
        }

        #[test]
        fn completion_freezes_ticks() {
            let mut session = active(7, 0);
            session.on_completed(rewards());
            assert_eq!(session.on_tick(), TickOutcome::Frozen);
            assert_eq!(
                session.on_completed(CompletionRewards::default()),
                CompletionOutcome::AlreadyCompleted
            );
            match session.state() {
                SessionState::Completed { rewards: kept, .. } => assert_eq!(kept, &rewards()),
                other => panic!("expected Completed, got {:?}", other),
            }
        }

        #[test]
        fn blocked_can_complete() {
            let mut session = active(7, 0);
            session.on_blocked("spam_detected");
            assert!(matches!(
                session.on_completed(rewards()),
                CompletionOutcome::Completed { .. }
            ));
        }

        #[test]
        fn messages_without_session_are_ignored() {
            let mut session = CombatSession::new();
            assert_eq!(session.on_tick(), TickOutcome::Ignored);
            assert_eq!(session.on_blocked("x"), BlockOutcome::Ignored);
            assert_eq!(session.on_completed(rewards()), CompletionOutcome::Ignored);
            assert_eq!(session.phase(), SessionPhase::NoSession);
        }
    }

    mod recovery {
        use super::*;

        #[test]
        fn found_encounter_resumes_after_error() {
            let mut session = CombatSession::new();
            session.fail("connection reset");
            assert_eq!(
                session.reconcile(Some((DungeonId::new(3), 1))),
                RecoveryOutcome::Resumed {
                    dungeon_id: DungeonId::new(3),
                    level: 1
                }
            );
            assert_eq!(session.phase(), SessionPhase::Active);
        }

        #[test]
        fn missing_encounter_clears_active_and_error() {
            let mut session = active(3, 0);
            assert_eq!(session.reconcile(None), RecoveryOutcome::Cleared);

            let mut session = CombatSession::new();
            session.fail("boom");
            assert_eq!(session.reconcile(None), RecoveryOutcome::Cleared);
            assert_eq!(session.phase(), SessionPhase::NoSession);
        }

        #[test]
        fn pending_rewards_survive_refresh() {
            let mut session = active(3, 0);
            session.on_completed(rewards());
            assert_eq!(session.reconcile(None), RecoveryOutcome::Unchanged);
            assert_eq!(session.phase(), SessionPhase::Completed);
        }

        #[test]
        fn same_encounter_is_unchanged() {
            let mut session = active(3, 0);
            assert_eq!(
                session.reconcile(Some((DungeonId::new(3), 0))),
                RecoveryOutcome::Unchanged
            );
        }
    }
}
