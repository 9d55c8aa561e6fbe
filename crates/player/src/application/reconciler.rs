//! Event reconciler - the push-channel subscription loop
//!
//! Holds at most one subscription at a time. Frames are classified into
//! `Notification`s; only encounter messages touch the combat session, and
//! even those never write a payload into the store. Normal ticks are
//! debounced into a single encounter re-fetch; blocked and completed
//! messages are applied immediately.
//!
//! When the stream fails, ends, or stays silent past the idle timeout, the
//! reconciler waits a fixed delay and subscribes again, until the
//! cancellation token fires. The server heartbeats every 15 seconds, so a
//! silent stream is a dead one.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use delver_shared::Notification;

use crate::application::activity::ActivityLog;
use crate::application::combat::CombatSessionController;
use crate::ports::outbound::{ChannelError, ClockPort, FrameStream, NotificationChannelPort};

pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;
/// Three missed heartbeats
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 45_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub debounce: Duration,
    pub reconnect_delay: Duration,
    /// Longest gap between frames before the stream counts as dead
    pub idle_timeout: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
        }
    }
}

/// Reset-on-message debounce window.
#[derive(Debug, Clone)]
pub struct Coalescer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Coalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Record a qualifying message; the window restarts from `now`.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Drop the pending refresh. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending refresh if its window has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Reconnect bookkeeping. The delay is fixed and attempts are unbounded.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectState {
    attempts: u32,
    delay: Duration,
}

impl ReconnectState {
    pub fn new(delay: Duration) -> Self {
        Self { attempts: 0, delay }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Count the next attempt and return the delay to wait before it.
    pub fn next_delay_and_advance(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.delay
    }
}

enum StreamEnd {
    Cancelled,
    Closed,
    Failed(ChannelError),
}

pub struct EventReconciler {
    channel: Arc<dyn NotificationChannelPort>,
    controller: Arc<CombatSessionController>,
    activity: Arc<ActivityLog>,
    clock: Arc<dyn ClockPort>,
    settings: ReconcilerSettings,
}

impl EventReconciler {
    pub fn new(
        channel: Arc<dyn NotificationChannelPort>,
        controller: Arc<CombatSessionController>,
        activity: Arc<ActivityLog>,
        clock: Arc<dyn ClockPort>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            channel,
            controller,
            activity,
            clock,
            settings,
        }
    }

    /// Subscribe and reconcile until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Starting event reconciler");
        let mut reconnect = ReconnectState::new(self.settings.reconnect_delay);
        let mut coalescer = Coalescer::new(self.settings.debounce);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let end = match self.channel.subscribe().await {
                Ok(stream) => {
                    tracing::info!("Notification stream open");
                    reconnect.reset();
                    self.pump(stream, &mut coalescer, &cancel).await
                }
                Err(e) => StreamEnd::Failed(e),
            };

            match end {
                StreamEnd::Cancelled => break,
                StreamEnd::Closed => tracing::info!("Notification stream closed by server"),
                StreamEnd::Failed(e) => tracing::warn!(error = %e, "Notification stream failed"),
            }

            // A refresh that was waiting on the window would be lost with the stream
            if coalescer.cancel() {
                self.refresh_view().await;
            }

            let delay = reconnect.next_delay_and_advance();
            tracing::info!(
                attempt = reconnect.attempts(),
                delay_ms = delay.as_millis() as u64,
                "Resubscribing to notification stream"
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!("Event reconciler shutting down");
    }

    async fn pump(
        &self,
        mut stream: FrameStream,
        coalescer: &mut Coalescer,
        cancel: &CancellationToken,
    ) -> StreamEnd {
        let idle = self.settings.idle_timeout;
        let mut silent_until = Instant::now() + idle;
        loop {
            let deadline = coalescer.deadline();
            tokio::select! {
                _ = cancel.cancelled() => return StreamEnd::Cancelled,
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if coalescer.fire(Instant::now()) {
                        self.refresh_view().await;
                    }
                }
                _ = tokio::time::sleep_until(silent_until) => {
                    return StreamEnd::Failed(ChannelError::Idle(idle.as_millis() as u64));
                }
                frame = stream.next() => {
                    silent_until = Instant::now() + idle;
                    match frame {
                        Some(Ok(raw)) => self.handle_frame(&raw, coalescer).await,
                        Some(Err(e)) => return StreamEnd::Failed(e),
                        None => return StreamEnd::Closed,
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, raw: &str, coalescer: &mut Coalescer) {
        let notification = match Notification::parse(raw) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping unparseable notification");
                return;
            }
        };

        match notification {
            Notification::Ping => {}
            Notification::EncounterTick => {
                if self.controller.on_tick().await.wants_refresh() {
                    coalescer.touch(Instant::now());
                }
            }
            Notification::EncounterBlocked { reason } => {
                self.controller.on_blocked(&reason).await;
            }
            Notification::EncounterCompleted { rewards } => {
                if coalescer.cancel() {
                    tracing::debug!("Pending encounter refresh dropped on completion");
                }
                self.controller.on_completed(rewards).await;
            }
            Notification::Advisory { kind, text } => {
                tracing::debug!(kind = %kind, "Advisory notification");
                self.activity.push(self.clock.now(), kind, text);
            }
        }
    }

    async fn refresh_view(&self) {
        if let Err(e) = self.controller.refresh_encounter_view().await {
            tracing::warn!(error = %e, "Encounter refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod coalescer {
        use super::*;

        #[test]
        fn window_restarts_on_each_message() {
            let start = Instant::now();
            let mut c = Coalescer::new(Duration::from_millis(250));

            for offset in [0u64, 20, 40, 60, 80] {
                c.touch(start + Duration::from_millis(offset));
            }

            assert_eq!(c.deadline(), Some(start + Duration::from_millis(330)));
            assert!(!c.fire(start + Duration::from_millis(329)));
            assert!(c.fire(start + Duration::from_millis(330)));
            assert!(!c.fire(start + Duration::from_millis(400)));
        }

        #[test]
        fn cancel_reports_pending() {
            let mut c = Coalescer::new(Duration::from_millis(250));
            assert!(!c.cancel());
            c.touch(Instant::now());
            assert!(c.is_pending());
            assert!(c.cancel());
            assert!(!c.is_pending());
        }
    }

    mod reconnect {
        use super::*;

        #[test]
        fn delay_is_fixed_and_attempts_unbounded() {
            let mut state = ReconnectState::new(Duration::from_millis(3_000));
            for attempt in 1..=100 {
                assert_eq!(state.next_delay_and_advance(), Duration::from_millis(3_000));
                assert_eq!(state.attempts(), attempt);
            }
            state.reset();
            assert_eq!(state.attempts(), 0);
        }
    }

    mod subscription {
        use super::*;
        use crate::application::fetcher::DomainFetcher;
        use crate::application::store::{SessionStateStore, StateDomain};
        use crate::infrastructure::clock::SystemClock;
        use crate::infrastructure::testing::{frame, RecordingAuthority, ScriptedChannel};
        use delver_domain::{DungeonId, SessionPhase, SessionState};
        use serde_json::json;

        struct Harness {
            authority: Arc<RecordingAuthority>,
            channel: Arc<ScriptedChannel>,
            store: Arc<SessionStateStore>,
            activity: Arc<ActivityLog>,
            controller: Arc<CombatSessionController>,
            reconciler: Arc<EventReconciler>,
        }

        fn harness() -> Harness {
            let authority = Arc::new(RecordingAuthority::new());
            let channel = Arc::new(ScriptedChannel::new());
            let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
            let store = Arc::new(SessionStateStore::new(clock.clone()));
            let activity = Arc::new(ActivityLog::default());
            let controller = Arc::new(CombatSessionController::new(
                authority.clone(),
                DomainFetcher::new(authority.clone(), store.clone(), 1),
                activity.clone(),
                clock.clone(),
            ));
            let reconciler = Arc::new(EventReconciler::new(
                channel.clone(),
                controller.clone(),
                activity.clone(),
                clock,
                ReconcilerSettings::default(),
            ));
            Harness {
                authority,
                channel,
                store,
                activity,
                controller,
                reconciler,
            }
        }

        fn spawn(h: &Harness) -> (CancellationToken, tokio::task::JoinHandle<()>) {
            let cancel = CancellationToken::new();
            let reconciler = h.reconciler.clone();
            let token = cancel.clone();
            let task = tokio::spawn(async move { reconciler.run(token).await });
            (cancel, task)
        }

        fn tick() -> Result<String, ChannelError> {
            Ok(frame("battle", json!({ "damage": 4, "monster_hp": 30 })))
        }

        async fn sleep_ms(ms: u64) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        fn encounter_fetches(h: &Harness) -> usize {
            h.authority.call_count("/dungeons/active")
        }

        #[tokio::test(start_paused = true)]
        async fn five_ticks_produce_one_refresh_after_the_last() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            // ticks at 0, 40, 80, 120, 160
            for _ in 0..5 {
                tx.send(tick()).unwrap();
                sleep_ms(40).await;
            }
            sleep_ms(100).await;
            assert_eq!(encounter_fetches(&h), 0);

            // the window closes at 410
            sleep_ms(150).await;
            assert_eq!(encounter_fetches(&h), 1);

            sleep_ms(1_000).await;
            assert_eq!(encounter_fetches(&h), 1);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn start_ticks_complete_acknowledge() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            assert_eq!(h.controller.phase().await, SessionPhase::Active);

            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            for _ in 0..3 {
                tx.send(tick()).unwrap();
                sleep_ms(40).await;
            }
            // last tick at 80, refresh due at 330
            sleep_ms(200).await;
            assert_eq!(encounter_fetches(&h), 0);
            sleep_ms(100).await;
            assert_eq!(encounter_fetches(&h), 1);

            tx.send(Ok(frame(
                "battle",
                json!({
                    "dungeon_completed": true,
                    "experience_gained": 90,
                    "gold_gained": 14,
                    "item_dropped": {
                        "inventory_item_id": 501,
                        "name": "Bone Ring",
                        "rarity": 3,
                        "level": 12,
                        "slot_type": "ring"
                    }
                }),
            )))
            .unwrap();
            sleep_ms(10).await;

            match h.controller.state().await {
                SessionState::Completed { rewards, .. } => {
                    assert_eq!(rewards.experience, 90);
                    assert_eq!(rewards.gold, 14);
                    assert_eq!(rewards.item.map(|i| i.name), Some("Bone Ring".to_string()));
                }
                other => panic!("expected completion, got {:?}", other),
            }

            // frozen: further ticks schedule nothing
            tx.send(tick()).unwrap();
            sleep_ms(1_000).await;
            assert_eq!(encounter_fetches(&h), 1);

            let rewards = h.controller.acknowledge().await.unwrap();
            assert_eq!(rewards.gold, 14);
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
            assert_eq!(encounter_fetches(&h), 2);
            assert_eq!(
                h.store
                    .get(StateDomain::Encounter)
                    .await
                    .snapshot()
                    .and_then(|s| s.payload().as_encounter()),
                Some(None)
            );
            assert_eq!(h.authority.call_count("/profile"), 1);
            assert_eq!(h.authority.call_count("/inventory"), 1);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn completion_cancels_pending_refresh() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            tx.send(tick()).unwrap();
            sleep_ms(50).await;
            tx.send(Ok(frame("encounter_completed", json!({ "gold_gained": 3 }))))
                .unwrap();
            sleep_ms(1_000).await;

            assert_eq!(encounter_fetches(&h), 0);
            assert_eq!(h.controller.phase().await, SessionPhase::Completed);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn blocked_frames_stay_blocked_until_a_normal_tick() {
            let h = harness();
            h.controller.start(DungeonId::new(7), 0).await.unwrap();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            for _ in 0..4 {
                tx.send(Ok(frame("battle", json!({ "error": "spam_detected" }))))
                    .unwrap();
                sleep_ms(500).await;
            }
            assert_eq!(h.controller.phase().await, SessionPhase::Blocked);
            assert_eq!(encounter_fetches(&h), 0);

            tx.send(tick()).unwrap();
            sleep_ms(10).await;
            assert_eq!(h.controller.phase().await, SessionPhase::Active);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn advisories_are_logged_and_never_fetch() {
            let h = harness();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            tx.send(Ok(frame("expedition_complete", json!({ "message": "Squad returned" }))))
                .unwrap();
            tx.send(Ok(frame("weather", json!({ "text": "Fog rolls in" })))).unwrap();
            tx.send(Ok(frame("ping", json!({})))).unwrap();
            tx.send(Ok("garbage".to_string())).unwrap();
            sleep_ms(10).await;

            let entries = h.activity.entries();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].kind, "expedition_complete");
            assert_eq!(entries[0].text, "Squad returned");
            assert_eq!(entries[1].kind, "weather");
            assert_eq!(entries[1].text, "Fog rolls in");
            assert!(h.authority.calls().is_empty());
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn ticks_without_session_are_ignored() {
            let h = harness();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            tx.send(tick()).unwrap();
            sleep_ms(1_000).await;
            assert_eq!(encounter_fetches(&h), 0);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn resubscribes_after_fixed_delay_when_stream_ends() {
            let h = harness();
            let first = h.channel.script();
            let _second = h.channel.script();
            let (cancel, task) = spawn(&h);

            sleep_ms(10).await;
            assert_eq!(h.channel.subscriptions(), 1);

            drop(first);
            sleep_ms(2_980).await;
            assert_eq!(h.channel.subscriptions(), 1);
            sleep_ms(40).await;
            assert_eq!(h.channel.subscriptions(), 2);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn silent_stream_is_dropped_and_resubscribed() {
            let h = harness();
            let _silent = h.channel.script();
            let _second = h.channel.script();
            let (cancel, task) = spawn(&h);

            sleep_ms(10).await;
            assert_eq!(h.channel.subscriptions(), 1);

            // idle at 45 s, resubscribe 3 s later
            sleep_ms(47_900).await;
            assert_eq!(h.channel.subscriptions(), 1);
            sleep_ms(200).await;
            assert_eq!(h.channel.subscriptions(), 2);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn heartbeats_keep_the_stream_open() {
            let h = harness();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            for _ in 0..8 {
                sleep_ms(15_000).await;
                tx.send(Ok(frame("ping", json!({})))).unwrap();
            }
            sleep_ms(10).await;
            assert_eq!(h.channel.subscriptions(), 1);

            cancel.cancel();
            task.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn transport_errors_are_retried_until_cancelled() {
            let h = harness();
            let tx = h.channel.script();
            let (cancel, task) = spawn(&h);

            tx.send(Err(ChannelError::Transport("reset by peer".into())))
                .unwrap();
            // no further scripts: every resubscribe fails and waits again
            sleep_ms(6_500).await;
            assert_eq!(h.channel.subscriptions(), 3);

            cancel.cancel();
            task.await.unwrap();
            assert_eq!(h.controller.phase().await, SessionPhase::NoSession);
        }
    }
}
