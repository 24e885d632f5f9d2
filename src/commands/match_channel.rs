use anyhow::Result;
use icalbot_core::ChatPlatform;
use icalbot_core::config::BotConfig;
use icalbot_core::matcher::{default_channel, ranked};
use owo_colors::OwoColorize;

use crate::render::render_candidate;

pub async fn run(config: BotConfig, category: &str, parent: Option<&str>) -> Result<()> {
    let http = super::http_client()?;
    let (discord, guild_id) = super::connect(&config, &http).await?;

    let channels = discord.list_channels(&guild_id).await?;
    if !channels.iter().any(|c| c.accepts_messages) {
        anyhow::bail!("Guild {guild_id} has no text channels");
    }

    let parent = parent.or(config.discord.parent.as_deref());
    let scores = ranked(category, &channels, parent);

    println!("Channels for category '{}'", category.bold());

    if scores.is_empty() {
        let fallback = default_channel(&channels, config.discord.default_channel.as_deref());
        println!(
            "   {}",
            format!("No channel under '{}'", parent.unwrap_or_default()).yellow()
        );
        if let Some(fallback) = fallback {
            println!("   Falling back to #{} ({})", fallback.name, fallback.id);
        }
        return Ok(());
    }

    for (i, (score, candidate)) in scores.iter().enumerate() {
        println!("{}", render_candidate(*score, candidate, i == 0));
    }

    Ok(())
}
