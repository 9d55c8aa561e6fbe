//! Combat session controller
//!
//! Async orchestration around the `CombatSession` state machine. Start, exit
//! and acknowledge wait for the authority before the local state moves;
//! notification handlers only move the state and tell the caller whether the
//! encounter view needs a re-fetch.
//!
//! The session lock is never held across an authority call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use delver_domain::{
    ActiveEncounter, BlockOutcome, CombatSession, CompletionOutcome, CompletionRewards,
    DifficultyUnlocks, DungeonId, ProgressionGate, RecoveryOutcome, SessionPhase, SessionState,
    TickOutcome,
};
use delver_shared::{AuthorityFailure, DungeonRequest};

use crate::application::activity::ActivityLog;
use crate::application::error::{CombatAction, ControllerError};
use crate::application::fetcher::DomainFetcher;
use crate::application::store::StateDomain;
use crate::application::{ParseResponse, ServiceError};
use crate::ports::outbound::{AuthorityPort, ClockPort};

/// Domains whose contents change once rewards are acknowledged.
const AFTER_ACKNOWLEDGE: [StateDomain; 4] = [
    StateDomain::Profile,
    StateDomain::Inventory,
    StateDomain::Encounter,
    StateDomain::Difficulty,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The authority already had an encounter running and the session adopted it
    Resumed { dungeon_id: DungeonId, level: u32 },
}

/// Clears its flag when the action finishes, however it finishes.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct CombatSessionController {
    connection: Arc<dyn AuthorityPort>,
    fetcher: DomainFetcher,
    activity: Arc<ActivityLog>,
    clock: Arc<dyn ClockPort>,
    session: Mutex<CombatSession>,
    starting: AtomicBool,
    exiting: AtomicBool,
    acknowledging: AtomicBool,
}

impl CombatSessionController {
    pub fn new(
        connection: Arc<dyn AuthorityPort>,
        fetcher: DomainFetcher,
        activity: Arc<ActivityLog>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            connection,
            fetcher,
            activity,
            clock,
            session: Mutex::new(CombatSession::new()),
            starting: AtomicBool::new(false),
            exiting: AtomicBool::new(false),
            acknowledging: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state().clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    /// Last fetched encounter view, without fetching.
    pub async fn encounter(&self) -> Option<ActiveEncounter> {
        let lookup = self.fetcher.store().get(StateDomain::Encounter).await;
        lookup
            .snapshot()
            .and_then(|s| s.payload().as_encounter().flatten().map(|e| e.to_encounter()))
    }

    // =========================================================================
    // Authoritative actions
    // =========================================================================

    pub async fn start(
        &self,
        dungeon_id: DungeonId,
        level: u32,
    ) -> Result<StartOutcome, ControllerError> {
        let _guard = self.claim(CombatAction::Start)?;
        self.session.lock().await.ensure_can_start()?;

        if level > 0 {
            self.check_gate(dungeon_id, level).await?;
        }

        let sent = self
            .send(DungeonRequest::Start {
                dungeon_id: dungeon_id.get(),
                plus_level: level,
            })
            .await;

        match sent {
            Ok(()) => {
                self.session.lock().await.start(dungeon_id, level)?;
                tracing::info!(dungeon_id = %dungeon_id, level, "Encounter started");
                self.fetcher
                    .store()
                    .invalidate_all(&[StateDomain::Encounter, StateDomain::Profile])
                    .await;
                Ok(StartOutcome::Started)
            }
            Err(e) => self.start_refused(e).await,
        }
    }

    pub async fn exit(&self) -> Result<(), ControllerError> {
        let _guard = self.claim(CombatAction::Exit)?;
        self.session.lock().await.ensure_can_exit()?;

        match self.send(DungeonRequest::Exit).await {
            Ok(()) => {
                self.session.lock().await.exit()?;
                tracing::info!("Encounter exited");
                self.fetcher
                    .store()
                    .invalidate_all(&[StateDomain::Encounter, StateDomain::Profile])
                    .await;
                Ok(())
            }
            // any authority answer ends the run locally
            Err(e) => match e.failure() {
                Some(failure) => {
                    self.session.lock().await.exit()?;
                    tracing::info!(failure = ?failure, "Encounter exit refused; session cleared");
                    self.fetcher
                        .store()
                        .invalidate_all(&[StateDomain::Encounter, StateDomain::Profile])
                        .await;
                    Err(self.refused("exit", failure))
                }
                None => Err(self.fail(e).await),
            },
        }
    }

    /// Dismiss the completion rewards, then re-fetch profile, inventory,
    /// encounter and difficulty. A failed re-fetch is logged; the domains stay
    /// stale and the acknowledgement stands.
    pub async fn acknowledge(&self) -> Result<CompletionRewards, ControllerError> {
        let _guard = self.claim(CombatAction::Acknowledge)?;
        self.session.lock().await.ensure_can_acknowledge()?;

        match self.send(DungeonRequest::Acknowledge).await {
            Ok(()) => {}
            // nothing left to acknowledge on the authority
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                tracing::warn!(error = %e, "Acknowledge failed; rewards kept");
                return Err(match e.failure() {
                    Some(failure) => self.refused("acknowledge", failure),
                    None => ControllerError::Service(e),
                });
            }
        }

        let rewards = self.session.lock().await.acknowledge()?;
        self.fetcher.store().invalidate_all(&AFTER_ACKNOWLEDGE).await;
        if let Err(e) = self.fetcher.fetch_all(&AFTER_ACKNOWLEDGE).await {
            tracing::warn!(error = %e, "Re-fetch after acknowledge failed");
        }
        self.activity.push(
            self.clock.now(),
            "rewards",
            format!(
                "Collected {} experience and {} gold",
                rewards.experience, rewards.gold
            ),
        );
        Ok(rewards)
    }

    /// Re-fetch the encounter and align the session with it.
    ///
    /// The only way out of `Error`. Pending rewards are kept.
    pub async fn refresh(&self) -> Result<RecoveryOutcome, ControllerError> {
        let payload = match self.fetcher.fetch(StateDomain::Encounter).await {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e).await),
        };
        let found = payload
            .as_encounter()
            .flatten()
            .map(|e| (DungeonId::new(e.dungeon_id), e.plus_level));

        let outcome = self.session.lock().await.reconcile(found);
        match &outcome {
            RecoveryOutcome::Resumed { dungeon_id, level } => {
                tracing::info!(dungeon_id = %dungeon_id, level, "Resumed running encounter");
            }
            RecoveryOutcome::Cleared => tracing::info!("No encounter on the authority; session cleared"),
            RecoveryOutcome::Unchanged => {}
        }
        Ok(outcome)
    }

    /// Tick-driven re-fetch of the encounter view. Does not reconcile the
    /// session; skipped while there is nothing to show.
    pub async fn refresh_encounter_view(&self) -> Result<Option<ActiveEncounter>, ControllerError> {
        match self.phase().await {
            SessionPhase::Active | SessionPhase::Blocked => {}
            _ => return Ok(None),
        }
        match self.fetcher.fetch(StateDomain::Encounter).await {
            Ok(payload) => Ok(payload.as_encounter().flatten().map(|e| e.to_encounter())),
            Err(e) => Err(self.fail(e).await),
        }
    }

    // =========================================================================
    // Notification handlers
    // =========================================================================

    pub async fn on_tick(&self) -> TickOutcome {
        let outcome = self.session.lock().await.on_tick();
        match outcome {
            TickOutcome::Unblocked => tracing::info!("Encounter unblocked"),
            TickOutcome::Frozen => tracing::debug!("Tick ignored while rewards are pending"),
            _ => {}
        }
        outcome
    }

    pub async fn on_blocked(&self, reason: &str) -> BlockOutcome {
        let outcome = self.session.lock().await.on_blocked(reason);
        if let BlockOutcome::Blocked { reason } = &outcome {
            tracing::info!(reason = %reason, "Encounter blocked");
            self.activity
                .push(self.clock.now(), "encounter", format!("Encounter paused: {}", reason));
        }
        outcome
    }

    pub async fn on_completed(&self, rewards: CompletionRewards) -> CompletionOutcome {
        let outcome = self.session.lock().await.on_completed(rewards);
        if let CompletionOutcome::Completed { rewards } = &outcome {
            tracing::info!(
                experience = rewards.experience,
                gold = rewards.gold,
                "Encounter completed"
            );
            self.activity.push(
                self.clock.now(),
                "encounter",
                "Dungeon cleared; rewards are waiting",
            );
        }
        outcome
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn claim(&self, action: CombatAction) -> Result<InFlight<'_>, ControllerError> {
        let flag = match action {
            CombatAction::Start => &self.starting,
            CombatAction::Exit => &self.exiting,
            CombatAction::Acknowledge => &self.acknowledging,
        };
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ControllerError::Busy(action))?;
        Ok(InFlight { flag })
    }

    async fn send(&self, request: DungeonRequest) -> Result<(), ServiceError> {
        self.connection
            .request_with_timeout(request.into(), self.fetcher.timeout_ms())
            .await?
            .parse_empty()
    }

    async fn check_gate(&self, dungeon_id: DungeonId, level: u32) -> Result<(), ControllerError> {
        let payload = match self.fetcher.ensure(StateDomain::Difficulty).await {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e).await),
        };
        let unlocks = payload
            .as_difficulty()
            .map(|d| d.to_unlocks())
            .unwrap_or_else(DifficultyUnlocks::default);

        ProgressionGate::new(&unlocks)
            .can_enter(dungeon_id, level)
            .map_err(|rejection| {
                tracing::info!(dungeon_id = %dungeon_id, level, "Start rejected by difficulty gate");
                self.activity
                    .push(self.clock.now(), "start", rejection.to_string());
                ControllerError::Rejected(rejection)
            })
    }

    async fn start_refused(&self, error: ServiceError) -> Result<StartOutcome, ControllerError> {
        let Some(failure) = error.failure() else {
            return Err(self.fail(error).await);
        };

        match failure {
            AuthorityFailure::AlreadyActive => {
                tracing::info!("Authority reports an encounter already running; re-fetching");
                match self.refresh().await? {
                    RecoveryOutcome::Resumed { dungeon_id, level } => {
                        Ok(StartOutcome::Resumed { dungeon_id, level })
                    }
                    _ => Err(self.refused("start", failure)),
                }
            }
            AuthorityFailure::LevelLocked | AuthorityFailure::LadderLocked => {
                self.fetcher.store().invalidate(StateDomain::Difficulty).await;
                Err(self.refused("start", failure))
            }
            other => Err(self.refused("start", other)),
        }
    }

    fn refused(&self, action: &str, failure: AuthorityFailure) -> ControllerError {
        tracing::info!(action, failure = ?failure, "Authority refused action");
        self.activity
            .push(self.clock.now(), action, failure.advisory());
        ControllerError::Authority(failure)
    }

    /// Move to `Error` unless rewards are pending.
    async fn fail(&self, error: ServiceError) -> ControllerError {
        let mut session = self.session.lock().await;
        if session.phase() != SessionPhase::Completed {
            session.fail(error.to_string());
        }
        tracing::warn!(error = %error, "Combat session call failed");
        ControllerError::Service(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::{DomainPayload, Lookup, SessionStateStore};
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::testing::RecordingAuthority;
    use delver_domain::EntryRejection;
    use delver_shared::dto::{DifficultyStatusData, DungeonPlusData, ProfileData};
    use delver_shared::{AuthorityRequest, ErrorCode, RequestError, ResponseResult};
    use serde_json::json;

    struct Harness {
        authority: Arc<RecordingAuthority>,
        store: Arc<SessionStateStore>,
        activity: Arc<ActivityLog>,
        controller: Arc<CombatSessionController>,
    }

    fn harness() -> Harness {
        let authority = Arc::new(RecordingAuthority::new());
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let store = Arc::new(SessionStateStore::new(clock.clone()));
        let fetcher = DomainFetcher::new(authority.clone(), store.clone(), 1);
        let activity = Arc::new(ActivityLog::default());
        let controller = Arc::new(CombatSessionController::new(
            authority.clone(),
            fetcher,
            activity.clone(),
            clock,
        ));
        Harness {
            authority,
            store,
            activity,
            controller,
        }
    }

    fn unlocked(dungeon: i64, level: u32) -> DomainPayload {
        DomainPayload::Difficulty(DifficultyStatusData {
            plus_unlocked: true,
            dungeons: vec![DungeonPlusData {
                dungeon_id: dungeon,
                unlocked_plus_level: level,
                best_completed_plus_level: None,
            }],
        })
    }

    fn rewards() -> CompletionRewards {
        CompletionRewards {
            experience: 120,
            gold: 35,
            ..Default::default()
        }
    }

    fn start_calls(authority: &RecordingAuthority) -> Vec<AuthorityRequest> {
        authority
            .calls()
            .into_iter()
            .filter(|r| matches!(r, AuthorityRequest::Dungeon(DungeonRequest::Start { .. })))
            .collect()
    }

    mod start {
        use super::*;

        #[tokio::test]
        async fn base_level_needs_no_difficulty_status() {
            let h = harness();
            let outcome = h.controller.start(DungeonId::new(7), 0).await.unwrap();

            assert_eq!(outcome, StartOutcome::Started);
            assert_eq!(
                h.controller.state().await,
                SessionState::Active {
                    dungeon_id: DungeonId::new(7),
                    level: 0
                }
            );
            assert_eq!(h.authority.call_count("/dungeons/plus/status"), 0);
            assert_eq!(
                start_calls(&h.authority),
                vec![AuthorityRequest::from(DungeonRequest::Start {
                    dungeon_id: 7,
                    plus_level: 0
                })]
            );
        }

        #[tokio::test]
        async fn locked_level_is_rejected_before_any_authority_call() {
            let h = harness();
            h.store.update(unlocked(7, 1)).await;

            let err = h.controller.start(DungeonId::new(7), 2).await.unwrap_err();

            assert!(matches!(
                err,
                ControllerError::Rejected(EntryRejection::LevelLocked {
                    requested: 2,
                    unlocked: 1
                })
            ));
            assert!(h.authority.calls().is_empty());
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }

        #[tokio::test]
        async fn authority_level_locked_keeps_no_session() {
            let h = harness();
            h.store.update(unlocked(7, 1)).await;
            h.authority.respond(
                "/dungeons/7/start",
                ResponseResult::error(ErrorCode::Forbidden, "plus_level_locked"),
            );

            let err = h.controller.start(DungeonId::new(7), 1).await.unwrap_err();

            assert!(matches!(
                err,
                ControllerError::Authority(AuthorityFailure::LevelLocked)
            ));
            assert_eq!(err.advisory(), AuthorityFailure::LevelLocked.advisory());
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
            assert!(matches!(
                h.store.get(StateDomain::Difficulty).await,
                Lookup::Stale(_)
            ));
            assert!(h
                .activity
                .entries()
                .iter()
                .any(|e| e.text == AuthorityFailure::LevelLocked.advisory()));
        }

        #[tokio::test]
        async fn missing_status_is_fetched_for_ladder_levels() {
            let h = harness();
            h.authority.respond(
                "/dungeons/plus/status",
                ResponseResult::success(json!({
                    "plus_unlocked": true,
                    "dungeons": [{ "dungeon_id": 7, "unlocked_plus_level": 3 }]
                })),
            );

            h.controller.start(DungeonId::new(7), 3).await.unwrap();
            assert_eq!(h.authority.call_count("/dungeons/plus/status"), 1);
            assert_eq!(h.controller.phase().await, SessionPhase::Active);
        }

        #[tokio::test]
        async fn hidden_ladder_rejects_any_plus_level() {
            let h = harness();
            h.store
                .update(DomainPayload::Difficulty(DifficultyStatusData::default()))
                .await;

            let err = h.controller.start(DungeonId::new(7), 1).await.unwrap_err();
            assert!(matches!(
                err,
                ControllerError::Rejected(EntryRejection::LadderLocked)
            ));
        }

        #[tokio::test]
        async fn already_active_resumes_the_running_encounter() {
            let h = harness();
            h.authority
                .respond(
                    "/dungeons/7/start",
                    ResponseResult::error(ErrorCode::Rejected, "dungeon_already_active"),
                )
                .respond(
                    "/dungeons/active",
                    ResponseResult::success(json!({
                        "dungeon_id": 3,
                        "plus_level": 1,
                        "dungeon_name": "Crypt",
                        "current_monster": "Ghoul"
                    })),
                );

            let outcome = h.controller.start(DungeonId::new(7), 0).await.unwrap();

            assert_eq!(
                outcome,
                StartOutcome::Resumed {
                    dungeon_id: DungeonId::new(3),
                    level: 1
                }
            );
            assert_eq!(h.controller.phase().await, SessionPhase::Active);
            assert_eq!(
                h.controller.encounter().await.map(|e| e.opponent_name().to_string()),
                Some("Ghoul".to_string())
            );
        }

        #[tokio::test]
        async fn other_refusals_keep_no_session() {
            let h = harness();
            h.authority.respond(
                "/dungeons/7/start",
                ResponseResult::error(ErrorCode::Rejected, "no_waifu"),
            );

            let err = h.controller.start(DungeonId::new(7), 0).await.unwrap_err();
            assert!(matches!(
                err,
                ControllerError::Authority(AuthorityFailure::NoEligibleCharacter)
            ));
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }

        #[tokio::test]
        async fn transport_failure_moves_to_error_until_refresh() {
            let h = harness();
            h.authority
                .fail("/dungeons/7/start", RequestError::Timeout);

            let err = h.controller.start(DungeonId::new(7), 0).await.unwrap_err();
            assert!(matches!(err, ControllerError::Service(_)));
            assert_eq!(h.controller.phase().await, SessionPhase::Error);

            let again = h.controller.start(DungeonId::new(8), 0).await.unwrap_err();
            assert!(matches!(again, ControllerError::InvalidTransition(_)));

            assert_eq!(h.controller.refresh().await.unwrap(), RecoveryOutcome::Cleared);
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }

        #[tokio::test]
        async fn duplicate_start_is_busy() {
            let h = harness();
            let gate = Arc::new(tokio::sync::Notify::new());

            struct Gated {
                inner: Arc<RecordingAuthority>,
                gate: Arc<tokio::sync::Notify>,
            }

            #[async_trait::async_trait]
            impl AuthorityPort for Gated {
                async fn request(
                    &self,
                    request: AuthorityRequest,
                ) -> Result<ResponseResult, RequestError> {
                    self.gate.notified().await;
                    self.inner.request(request).await
                }

                async fn request_with_timeout(
                    &self,
                    request: AuthorityRequest,
                    _timeout_ms: u64,
                ) -> Result<ResponseResult, RequestError> {
                    self.request(request).await
                }
            }

            let gated: Arc<dyn AuthorityPort> = Arc::new(Gated {
                inner: h.authority.clone(),
                gate: gate.clone(),
            });
            let controller = Arc::new(CombatSessionController::new(
                gated.clone(),
                DomainFetcher::new(gated, h.store.clone(), 1),
                h.activity.clone(),
                Arc::new(SystemClock::new()),
            ));

            let first = tokio::spawn({
                let controller = controller.clone();
                async move { controller.start(DungeonId::new(7), 0).await }
            });
            tokio::task::yield_now().await;

            let second = controller.start(DungeonId::new(7), 0).await.unwrap_err();
            assert!(matches!(second, ControllerError::Busy(CombatAction::Start)));

            gate.notify_one();
            assert_eq!(first.await.unwrap().unwrap(), StartOutcome::Started);
            assert_eq!(start_calls(&h.authority).len(), 1);
        }
    }

    mod notifications {
        use super::*;

        #[tokio::test]
        async fn ticks_without_session_are_ignored() {
            let h = harness();
            assert_eq!(h.controller.on_tick().await, TickOutcome::Ignored);
            assert_eq!(
                h.controller.on_completed(rewards()).await,
                CompletionOutcome::Ignored
            );
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }

        #[tokio::test]
        async fn blocked_is_sticky_until_a_normal_tick() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();

            assert!(matches!(
                h.controller.on_blocked("spam_detected").await,
                BlockOutcome::Blocked { .. }
            ));
            for _ in 0..3 {
                assert!(matches!(
                    h.controller.on_blocked("spam_detected").await,
                    BlockOutcome::StillBlocked { .. }
                ));
                assert_eq!(h.controller.phase().await, SessionPhase::Blocked);
            }

            assert_eq!(h.controller.on_tick().await, TickOutcome::Unblocked);
            assert_eq!(h.controller.phase().await, SessionPhase::Active);
        }

        #[tokio::test]
        async fn view_refresh_is_skipped_without_a_session() {
            let h = harness();
            assert_eq!(h.controller.refresh_encounter_view().await.unwrap(), None);
            assert!(h.authority.calls().is_empty());
        }
    }

    mod completion {
        use super::*;

        async fn seed_views(store: &SessionStateStore) {
            store
                .update(DomainPayload::Profile(ProfileData {
                    act: 1,
                    gold: 10,
                    main_waifu: None,
                }))
                .await;
            store
                .update(DomainPayload::Inventory(Default::default()))
                .await;
            store.update(DomainPayload::Encounter(None)).await;
        }

        #[tokio::test]
        async fn completion_freezes_ticks_until_acknowledged() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            seed_views(&h.store).await;

            assert_eq!(h.controller.on_tick().await, TickOutcome::RefreshNeeded);
            assert!(matches!(
                h.controller.on_completed(rewards()).await,
                CompletionOutcome::Completed { .. }
            ));
            assert_eq!(h.controller.on_tick().await, TickOutcome::Frozen);
            assert_eq!(
                h.controller.on_completed(CompletionRewards::default()).await,
                CompletionOutcome::AlreadyCompleted
            );

            let collected = h.controller.acknowledge().await.unwrap();
            assert_eq!(collected, rewards());
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }

        #[tokio::test]
        async fn acknowledge_refetches_rewarded_domains() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            seed_views(&h.store).await;
            h.controller.on_completed(rewards()).await;
            h.authority
                .respond("/profile", ResponseResult::success(json!({ "act": 1, "gold": 45 })))
                .respond("/inventory", ResponseResult::success(json!({ "items": [], "count": 0 })));

            h.controller.acknowledge().await.unwrap();

            assert_eq!(h.authority.call_count("/profile"), 1);
            assert_eq!(h.authority.call_count("/inventory"), 1);
            assert_eq!(h.authority.call_count("/dungeons/active"), 1);
            let profile = h.store.get(StateDomain::Profile).await;
            assert!(matches!(profile, Lookup::Fresh(_)));
            assert_eq!(
                profile.snapshot().and_then(|s| s.payload().as_profile()).map(|p| p.gold),
                Some(45)
            );
        }

        #[tokio::test]
        async fn failed_refetch_leaves_domains_stale_but_acknowledged() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            seed_views(&h.store).await;
            h.controller.on_completed(rewards()).await;
            h.authority
                .fail("/profile", RequestError::Timeout)
                .fail("/inventory", RequestError::Timeout);

            assert_eq!(h.controller.acknowledge().await.unwrap(), rewards());
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
            for domain in [StateDomain::Profile, StateDomain::Inventory] {
                assert!(matches!(h.store.get(domain).await, Lookup::Stale(_)), "{:?}", domain);
            }
        }

        #[tokio::test]
        async fn refresh_keeps_pending_rewards() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            h.controller.on_completed(rewards()).await;

            assert_eq!(h.controller.refresh().await.unwrap(), RecoveryOutcome::Unchanged);
            assert_eq!(h.controller.phase().await, SessionPhase::Completed);
        }

        #[tokio::test]
        async fn failed_acknowledge_keeps_rewards() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            h.controller.on_completed(rewards()).await;
            h.authority
                .fail("/dungeons/active/ack", RequestError::SendFailed("offline".into()));

            let err = h.controller.acknowledge().await.unwrap_err();
            assert!(matches!(err, ControllerError::Service(_)));
            assert_eq!(
                h.controller.state().await,
                SessionState::Completed {
                    dungeon_id: DungeonId::new(7),
                    rewards: rewards()
                }
            );
        }

        #[tokio::test]
        async fn acknowledge_outside_completion_is_invalid() {
            let h = harness();
            let err = h.controller.acknowledge().await.unwrap_err();
            assert!(matches!(err, ControllerError::InvalidTransition(_)));
            assert!(h.authority.calls().is_empty());
        }
    }

    mod exit {
        use super::*;

        #[tokio::test]
        async fn exit_clears_after_round_trip() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            h.controller.on_blocked("no_energy").await;

            h.controller.exit().await.unwrap();
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
            assert_eq!(h.authority.call_count("/dungeons/active/exit"), 1);
        }

        #[tokio::test]
        async fn exit_without_session_never_calls_authority() {
            let h = harness();
            assert!(matches!(
                h.controller.exit().await,
                Err(ControllerError::InvalidTransition(_))
            ));
            assert!(h.authority.calls().is_empty());
        }

        #[tokio::test]
        async fn refused_exit_still_clears_session() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            h.authority.respond(
                "/dungeons/active/exit",
                ResponseResult::error(ErrorCode::NotFound, "no_active_dungeon"),
            );

            assert!(matches!(
                h.controller.exit().await,
                Err(ControllerError::Authority(_))
            ));
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
            assert!(h.controller.start(DungeonId::new(8), 0).await.is_ok());
        }

        #[tokio::test]
        async fn exit_transport_failure_moves_to_error() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            h.authority
                .fail("/dungeons/active/exit", RequestError::SendFailed("offline".into()));

            assert!(matches!(
                h.controller.exit().await,
                Err(ControllerError::Service(_))
            ));
            assert_eq!(h.controller.phase().await, SessionPhase::Error);
        }
    }
}
