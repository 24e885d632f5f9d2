//! Where calendar events come from.

use async_trait::async_trait;

use crate::error::BotResult;
use crate::event::Event;

/// Fetches and parses one calendar feed.
///
/// Implementations own whatever client they need; failures are reported per
/// endpoint and never abort a poll cycle.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch(&self, endpoint: &str) -> BotResult<Vec<Event>>;
}
