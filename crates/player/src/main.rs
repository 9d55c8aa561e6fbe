//! Delver Player - headless client binary.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delver_player::infrastructure::PlayerConfig;
use delver_player::runner::{self, RunnerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delver_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlayerConfig::from_env();
    tracing::info!(
        api_base = %config.api_base,
        authenticated = config.init_data.is_some(),
        act = config.act,
        "Starting Delver player"
    );

    let cancel = CancellationToken::new();
    runner::setup_shutdown_signal(cancel.clone());

    let player = runner::run(RunnerDeps::from_config(config), cancel).await?;
    tracing::info!(
        activity = player.activity.len(),
        phase = ?player.combat.phase().await,
        "Player stopped"
    );
    Ok(())
}
