use anyhow::{Context, Result};
use chrono::Utc;
use icalbot_core::config::BotConfig;
use icalbot_core::store::{MemoryStore, RedbStore, SnapshotStore};
use icalbot_core::{CycleReport, Poller};

use crate::render::Render;
use crate::webcal::HttpCalendarSource;

pub async fn run(config: BotConfig, memory: bool) -> Result<()> {
    let report = if memory {
        cycle(&config, MemoryStore::new()).await?
    } else {
        let db_path = config.db_path();
        let store = RedbStore::open(&db_path)
            .with_context(|| format!("Failed to open snapshot database {}", db_path.display()))?;
        cycle(&config, store).await?
    };

    println!("{}", report.render());
    Ok(())
}

async fn cycle<St: SnapshotStore>(config: &BotConfig, store: St) -> Result<CycleReport> {
    let http = super::http_client()?;
    let (discord, guild_id) = super::connect(config, &http).await?;

    let poller = Poller::new(
        HttpCalendarSource::new(http),
        discord,
        store,
        super::renderer(config)?,
        config.poller_settings(guild_id)?,
    );

    let report = poller.run_cycle(Utc::now()).await?;
    Ok(report)
}
