pub mod match_channel;
pub mod once;
pub mod run;

use std::time::Duration;

use anyhow::{Context, Result};
use icalbot_core::config::BotConfig;
use icalbot_core::render::Renderer;
use tracing::info;

use crate::discord::DiscordClient;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One HTTP client for the whole process, shared by feeds and Discord.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("icalbot/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Discord client plus the guild to post in.
pub async fn connect(
    config: &BotConfig,
    http: &reqwest::Client,
) -> Result<(DiscordClient, String)> {
    let discord = DiscordClient::new(http.clone(), config.discord.token.trim());

    let guild_id = match config.discord.guild_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = discord
                .first_guild()
                .await
                .context("No discord.guild_id configured and guild discovery failed")?;
            info!("Using guild {id}");
            id
        }
    };

    Ok((discord, guild_id))
}

pub fn renderer(config: &BotConfig) -> Result<Renderer> {
    Renderer::new(&config.notification.templates).context("Invalid notification template")
}
