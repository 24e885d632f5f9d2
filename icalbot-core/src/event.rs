//! Calendar event types.
//!
//! Feeds are parsed into [`Event`]s, and the last-seen state of each event is
//! kept as an [`EventSnapshot`] so the next poll can tell what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event, keyed by its UID.
///
/// Events from different feeds that share a UID are treated as the same
/// logical event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uid: String,
    /// First CATEGORIES entry, used to pick a destination channel
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub start: Option<DateTime<Utc>>,
    /// Reminders are scheduled relative to the end of the event
    pub end: Option<DateTime<Utc>>,
    /// LAST-MODIFIED as reported by the feed. Informational only.
    pub last_modified: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(uid: impl Into<String>) -> Self {
        Event {
            uid: uid.into(),
            category: String::new(),
            summary: String::new(),
            description: String::new(),
            start: None,
            end: None,
            last_modified: None,
        }
    }

    /// Whether the user-visible content differs from `other`.
    ///
    /// `last_modified` is not compared: feeds bump it without changing
    /// anything, and some never set it at all.
    pub fn content_differs(&self, other: &Event) -> bool {
        self.category != other.category
            || self.summary != other.summary
            || self.description != other.description
            || self.start != other.start
            || self.end != other.end
    }
}

/// The last recorded state of an event and the poll time it was recorded at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event: Event,
    pub last_checked: DateTime<Utc>,
}

impl EventSnapshot {
    pub fn new(event: Event, last_checked: DateTime<Utc>) -> Self {
        EventSnapshot {
            event,
            last_checked,
        }
    }
}
