//! Error types for icalbot.

use thiserror::Error;

/// Errors that can occur while polling calendars and delivering notifications.
///
/// None of these are fatal to the poll loop: each one is scoped to a source,
/// a cycle's snapshot batch, or a single delivery.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Failed to fetch calendar {endpoint}: {reason}")]
    Fetch { endpoint: String, reason: String },

    #[error("Snapshot store error: {0}")]
    Store(String),

    #[error("No channel matches category '{0}'")]
    NoMatchingChannel(String),

    #[error("Chat platform error: {0}")]
    Platform(String),

    #[error("Failed to deliver to channel {channel}: {reason}")]
    Delivery { channel: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BotError {
    pub fn fetch(endpoint: &str, reason: impl ToString) -> Self {
        BotError::Fetch {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn delivery(channel: &str, reason: impl ToString) -> Self {
        BotError::Delivery {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for icalbot operations.
pub type BotResult<T> = Result<T, BotError>;
