//! Calendar feeds fetched over HTTP(S) or webcal.

use async_trait::async_trait;
use icalbot_core::ics::parse_calendar;
use icalbot_core::{BotError, BotResult, CalendarSource, Event};

pub struct HttpCalendarSource {
    client: reqwest::Client,
}

impl HttpCalendarSource {
    pub fn new(client: reqwest::Client) -> Self {
        HttpCalendarSource { client }
    }
}

/// `webcal://` is plain HTTPS with a different scheme.
pub fn normalize_endpoint(endpoint: &str) -> String {
    match endpoint.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webcal") => {
            format!("https://{rest}")
        }
        _ => endpoint.to_string(),
    }
}

#[async_trait]
impl CalendarSource for HttpCalendarSource {
    async fn fetch(&self, endpoint: &str) -> BotResult<Vec<Event>> {
        let url = normalize_endpoint(endpoint);

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BotError::fetch(endpoint, e))?
            .text()
            .await
            .map_err(|e| BotError::fetch(endpoint, e))?;

        parse_calendar(&body).map_err(|e| BotError::fetch(endpoint, e))
    }
}
