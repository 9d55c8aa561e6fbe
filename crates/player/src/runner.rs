//! Composition root for the headless player
//!
//! Wires the authority, push channel, store, controller and services, warms
//! the cache, then keeps the reconciler running until cancelled.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::application::activity::ActivityLog;
use crate::application::combat::CombatSessionController;
use crate::application::fetcher::DomainFetcher;
use crate::application::reconciler::EventReconciler;
use crate::application::services::{
    DifficultyService, ExpeditionService, LoadoutService, ProfileService, RosterService,
    ShopService,
};
use crate::application::store::{SessionStateStore, StateDomain};
use crate::infrastructure::{HttpAuthority, PlayerConfig, SseNotificationChannel, SystemClock};
use crate::ports::outbound::{AuthorityPort, ClockPort, NotificationChannelPort};

/// Domains loaded before the push channel is opened.
const WARM_DOMAINS: [StateDomain; 3] = [
    StateDomain::Profile,
    StateDomain::Inventory,
    StateDomain::Difficulty,
];

pub struct RunnerDeps {
    pub authority: Arc<dyn AuthorityPort>,
    pub channel: Arc<dyn NotificationChannelPort>,
    pub clock: Arc<dyn ClockPort>,
    pub config: PlayerConfig,
}

impl RunnerDeps {
    /// Production adapters for `config`.
    pub fn from_config(config: PlayerConfig) -> Self {
        let authority = HttpAuthority::new(&config.api_base, config.init_data.clone())
            .with_default_timeout(config.request_timeout_ms);
        let channel = SseNotificationChannel::new(&config.api_base, config.init_data.clone());
        Self {
            authority: Arc::new(authority),
            channel: Arc::new(channel),
            clock: Arc::new(SystemClock::new()),
            config,
        }
    }
}

/// Everything a front end needs, built once.
pub struct Player {
    pub store: Arc<SessionStateStore>,
    pub activity: Arc<ActivityLog>,
    pub combat: Arc<CombatSessionController>,
    pub loadout: LoadoutService,
    pub shop: ShopService,
    pub roster: RosterService,
    pub expeditions: ExpeditionService,
    pub difficulty: DifficultyService,
    pub profile: ProfileService,
    fetcher: DomainFetcher,
    reconciler: Arc<EventReconciler>,
}

impl Player {
    pub fn wire(deps: RunnerDeps) -> Self {
        let RunnerDeps {
            authority,
            channel,
            clock,
            config,
        } = deps;

        let store = Arc::new(SessionStateStore::new(clock.clone()));
        let activity = Arc::new(ActivityLog::new(config.activity_log_capacity));
        let fetcher = DomainFetcher::new(authority.clone(), store.clone(), config.act)
            .with_timeout(config.request_timeout_ms);

        let combat = Arc::new(CombatSessionController::new(
            authority.clone(),
            fetcher.clone(),
            activity.clone(),
            clock.clone(),
        ));
        let reconciler = Arc::new(EventReconciler::new(
            channel,
            combat.clone(),
            activity.clone(),
            clock,
            config.reconciler_settings(),
        ));

        Self {
            loadout: LoadoutService::new(authority.clone(), fetcher.clone()),
            shop: ShopService::new(authority.clone(), fetcher.clone()),
            roster: RosterService::new(authority.clone(), fetcher.clone()),
            expeditions: ExpeditionService::new(authority, fetcher.clone()),
            difficulty: DifficultyService::new(fetcher.clone()),
            profile: ProfileService::new(fetcher.clone()),
            fetcher,
            store,
            activity,
            combat,
            reconciler,
        }
    }

    /// Load the common domains and adopt any encounter already running.
    ///
    /// Failures are logged, not returned; the reconciler can still recover.
    pub async fn warm_up(&self) {
        if let Err(e) = self.fetcher.fetch_all(&WARM_DOMAINS).await {
            if e.is_unauthorized() {
                tracing::warn!("Authority rejected the player credential");
            } else {
                tracing::warn!(error = %e, "Initial load failed");
            }
        }

        match self.combat.refresh().await {
            Ok(outcome) => tracing::info!(outcome = ?outcome, "Encounter state reconciled"),
            Err(e) => tracing::warn!(error = %e, "Initial encounter load failed"),
        }
    }
}

/// Run until `cancel` fires.
pub async fn run(deps: RunnerDeps, cancel: CancellationToken) -> Result<Player> {
    let player = Player::wire(deps);
    player.warm_up().await;

    let reconciler = player.reconciler.clone();
    let worker_cancel = cancel.clone();
    let worker = tokio::spawn(async move { reconciler.run(worker_cancel).await });

    cancel.cancelled().await;
    tracing::info!("Shutting down player");
    worker.await.context("reconciler task failed")?;

    for entry in player.activity.entries() {
        tracing::debug!(kind = %entry.kind, at = %entry.at, "{}", entry.text);
    }
    Ok(player)
}

/// Cancel `cancel` on Ctrl+C or SIGTERM.
pub fn setup_shutdown_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel.cancel();
    });
}
