use anyhow::{Context, Result};
use icalbot_core::Poller;
use icalbot_core::config::BotConfig;
use icalbot_core::render::format_duration;
use icalbot_core::store::RedbStore;
use tracing::info;

use crate::shutdown;
use crate::webcal::HttpCalendarSource;

pub async fn run(config: BotConfig) -> Result<()> {
    let http = super::http_client()?;
    let (discord, guild_id) = super::connect(&config, &http).await?;

    let db_path = config.db_path();
    let store = RedbStore::open(&db_path)
        .with_context(|| format!("Failed to open snapshot database {}", db_path.display()))?;

    let settings = config.poller_settings(guild_id)?;
    let reminders: Vec<String> = settings
        .schedule
        .offsets()
        .iter()
        .map(|offset| format_duration(offset.num_seconds()))
        .collect();
    info!(
        "Watching {} calendars every {}, reminders at [{}]",
        settings.endpoints.len(),
        format_duration(config.check_interval.as_secs() as i64),
        reminders.join(", ")
    );

    let poller = Poller::new(
        HttpCalendarSource::new(http),
        discord,
        store,
        super::renderer(&config)?,
        settings,
    );

    poller.run(config.check_interval, shutdown::signal()).await;

    info!("Stopped");
    Ok(())
}
