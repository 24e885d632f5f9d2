//! Reminder lead times and the edge-triggered firing rule.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{BotError, BotResult};

/// Lead-time offsets before an event's end at which a reminder is due.
///
/// Offsets are kept sorted ascending so the tightest threshold is found
/// first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    offsets: Vec<TimeDelta>,
}

impl Schedule {
    pub fn new(mut offsets: Vec<TimeDelta>) -> BotResult<Self> {
        if let Some(negative) = offsets.iter().find(|o| **o < TimeDelta::zero()) {
            return Err(BotError::Config(format!(
                "Notification offset must not be negative: {}s",
                negative.num_seconds()
            )));
        }

        offsets.sort();
        offsets.dedup();

        Ok(Schedule { offsets })
    }

    pub fn from_std(offsets: &[std::time::Duration]) -> BotResult<Self> {
        let offsets = offsets
            .iter()
            .map(|d| {
                TimeDelta::from_std(*d).map_err(|_| {
                    BotError::Config(format!("Notification offset out of range: {d:?}"))
                })
            })
            .collect::<BotResult<Vec<_>>>()?;

        Self::new(offsets)
    }

    pub fn offsets(&self) -> &[TimeDelta] {
        &self.offsets
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The offset whose threshold was crossed between the previous poll and
    /// this one, if any.
    ///
    /// An offset fires when the time remaining until `end` was above it at
    /// `last_checked` and is now at or below it, and the event has not ended.
    /// Only the smallest crossed offset is returned. When a long gap between
    /// polls crosses several thresholds at once, the larger ones are dropped.
    pub fn crossed(
        &self,
        end: DateTime<Utc>,
        last_checked: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<TimeDelta> {
        let previous_remaining = end - last_checked;
        let remaining = end - now;

        if remaining < TimeDelta::zero() {
            return None;
        }

        self.offsets
            .iter()
            .find(|&&offset| previous_remaining > offset && remaining <= offset)
            .copied()
    }
}
