//! Where notifications go.

use async_trait::async_trait;

use crate::error::BotResult;
use crate::matcher::ChannelCandidate;

/// A chat service with named channels grouped under a guild.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Channels of `guild_id`, in the platform's own order.
    async fn list_channels(&self, guild_id: &str) -> BotResult<Vec<ChannelCandidate>>;

    async fn send(&self, channel_id: &str, text: &str) -> BotResult<()>;
}
