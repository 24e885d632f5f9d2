//! Discord REST API as a chat platform.

use async_trait::async_trait;
use icalbot_core::{BotError, BotResult, ChannelCandidate, ChatPlatform};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Channel types that take plain messages: guild text and announcement.
const MESSAGE_CHANNEL_TYPES: [u8; 2] = [0, 5];

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<u8>,
}

impl From<RawChannel> for ChannelCandidate {
    fn from(raw: RawChannel) -> Self {
        ChannelCandidate {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            parent_id: raw.parent_id,
            accepts_messages: raw
                .kind
                .is_none_or(|kind| MESSAGE_CHANNEL_TYPES.contains(&kind)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGuild {
    id: String,
}

pub struct DiscordClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordClient {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        DiscordClient {
            client,
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// The first guild the bot is a member of.
    pub async fn first_guild(&self) -> BotResult<String> {
        let response = self
            .client
            .get(self.url("/users/@me/guilds"))
            .query(&[("limit", "1")])
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .map_err(|e| BotError::Platform(format!("Listing guilds failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Platform(format!("Discord {status}: {text}")));
        }

        let guilds: Vec<RawGuild> = response
            .json()
            .await
            .map_err(|e| BotError::Platform(format!("Invalid guild list: {e}")))?;

        guilds
            .into_iter()
            .next()
            .map(|g| g.id)
            .ok_or_else(|| BotError::Platform("The bot is not a member of any guild".into()))
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn list_channels(&self, guild_id: &str) -> BotResult<Vec<ChannelCandidate>> {
        let response = self
            .client
            .get(self.url(&format!("/guilds/{guild_id}/channels")))
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .map_err(|e| BotError::Platform(format!("Listing channels failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Platform(format!("Discord {status}: {text}")));
        }

        let channels: Vec<RawChannel> = response
            .json()
            .await
            .map_err(|e| BotError::Platform(format!("Invalid channel list: {e}")))?;

        Ok(channels.into_iter().map(ChannelCandidate::from).collect())
    }

    async fn send(&self, channel_id: &str, text: &str) -> BotResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .header(AUTHORIZATION, self.auth())
            .json(&json!({ "content": text }))
            .send()
            .await
            .map_err(|e| BotError::delivery(channel_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::delivery(channel_id, format!("{status}: {body}")));
        }

        Ok(())
    }
}
