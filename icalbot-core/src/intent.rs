//! Notification intents produced by a poll cycle.

use std::fmt;

use chrono::TimeDelta;
use serde::{Serialize, Serializer};

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    /// First time the event was seen
    Add,
    /// Event content changed since the last poll
    Update,
    /// A reminder lead time was reached
    Notify,
}

impl NotificationKind {
    /// Key of the message template used for this kind.
    pub fn template_name(&self) -> &'static str {
        match self {
            NotificationKind::Add => "add",
            NotificationKind::Update => "update",
            NotificationKind::Notify => "notify",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Add => write!(f, "ADD"),
            NotificationKind::Update => write!(f, "UPDATE"),
            NotificationKind::Notify => write!(f, "NOTIFY"),
        }
    }
}

/// Something worth telling the channel about. Produced fresh every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationIntent {
    pub kind: NotificationKind,
    /// Lead time that triggered a `Notify`; `None` for the other kinds
    #[serde(rename = "offset_secs", serialize_with = "serialize_offset")]
    pub offset: Option<TimeDelta>,
    pub event: Event,
}

impl NotificationIntent {
    pub fn added(event: Event) -> Self {
        NotificationIntent {
            kind: NotificationKind::Add,
            offset: None,
            event,
        }
    }

    pub fn updated(event: Event) -> Self {
        NotificationIntent {
            kind: NotificationKind::Update,
            offset: None,
            event,
        }
    }

    pub fn reminder(event: Event, offset: TimeDelta) -> Self {
        NotificationIntent {
            kind: NotificationKind::Notify,
            offset: Some(offset),
            event,
        }
    }

    /// Raw JSON form, sent when no template can render the intent.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self}"))
    }
}

impl fmt::Display for NotificationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(
                f,
                "{} {} ({}s): {}",
                self.kind,
                self.event.uid,
                offset.num_seconds(),
                self.event.summary
            ),
            None => write!(
                f,
                "{} {}: {}",
                self.kind, self.event.uid, self.event.summary
            ),
        }
    }
}

fn serialize_offset<S: Serializer>(offset: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
    match offset {
        Some(offset) => s.serialize_some(&offset.num_seconds()),
        None => s.serialize_none(),
    }
}

/// An intent paired with the channel it will be sent to.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub intent: NotificationIntent,
    pub channel_id: String,
    pub channel_name: String,
}
