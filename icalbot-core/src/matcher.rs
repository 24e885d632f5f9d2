//! Picking the destination channel for a notification.
//!
//! Channels are matched to an event's category by fuzzy name similarity, so
//! an event in category "Sports" lands in `#sports` without any mapping
//! table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BotError, BotResult};
use crate::intent::{Dispatch, NotificationIntent};

/// A channel the chat platform offers as a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCandidate {
    pub id: String,
    pub name: String,
    /// Grouping channel (e.g. a Discord category) this channel sits under
    pub parent_id: Option<String>,
    /// False for categories, voice channels and the like. These still
    /// count as parents but are never a destination.
    #[serde(default = "accepts_messages_default")]
    pub accepts_messages: bool,
}

fn accepts_messages_default() -> bool {
    true
}

impl ChannelCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        ChannelCandidate {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            accepts_messages: true,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn without_messages(mut self) -> Self {
        self.accepts_messages = false;
        self
    }
}

const INSERT_DELETE_COST: usize = 1;
const SUBSTITUTE_COST: usize = 2;

/// Case-insensitive edit distance normalized by the longer input.
///
/// Insertions and deletions cost 1 and substitutions cost 2, so the result
/// lies in `[0, 2]`. Identical names (ignoring case) score 0. Case folding
/// is per character, so `ß` stays one character.
pub fn edit_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().map(upper).collect();
    let b: Vec<char> = b.chars().map(upper).collect();

    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }

    let mut previous: Vec<usize> = (0..=b.len()).map(|j| j * INSERT_DELETE_COST).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = (i + 1) * INSERT_DELETE_COST;

        for (j, cb) in b.iter().enumerate() {
            let substitute = if ca == cb { 0 } else { SUBSTITUTE_COST };

            current[j + 1] = (previous[j] + substitute)
                .min(previous[j + 1] + INSERT_DELETE_COST)
                .min(current[j] + INSERT_DELETE_COST);
        }

        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()] as f64 / longest as f64
}

/// Uppercase of `c` when it is a single character, else `c` itself.
fn upper(c: char) -> char {
    let mut mapped = c.to_uppercase();
    match (mapped.next(), mapped.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Candidates allowed under `parent`, scored against `category`, best first.
///
/// Only channels that accept messages are scored. With a parent constraint,
/// a candidate is kept only if its `parent_id` names a channel in the same
/// list whose name is exactly `parent`. Equal scores keep the platform's
/// channel order.
pub fn ranked<'a>(
    category: &str,
    candidates: &'a [ChannelCandidate],
    parent: Option<&str>,
) -> Vec<(f64, &'a ChannelCandidate)> {
    let parent = parent.filter(|p| !p.is_empty());
    let by_id: HashMap<&str, &ChannelCandidate> =
        candidates.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut scored: Vec<(f64, &ChannelCandidate)> = candidates
        .iter()
        .filter(|candidate| candidate.accepts_messages)
        .filter(|candidate| match parent {
            None => true,
            Some(parent) => candidate
                .parent_id
                .as_deref()
                .and_then(|id| by_id.get(id))
                .is_some_and(|p| p.name == parent),
        })
        .map(|candidate| (edit_distance(&candidate.name, category), candidate))
        .collect();

    // Stable sort keeps candidate order on ties
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored
}

/// The candidate whose name is closest to `category`.
pub fn best_match<'a>(
    category: &str,
    candidates: &'a [ChannelCandidate],
    parent: Option<&str>,
) -> BotResult<&'a ChannelCandidate> {
    ranked(category, candidates, parent)
        .into_iter()
        .next()
        .map(|(_, candidate)| candidate)
        .ok_or_else(|| BotError::NoMatchingChannel(category.to_string()))
}

/// Fallback destination among channels that accept messages: the first one
/// named exactly `name`, else the first one.
pub fn default_channel<'a>(
    candidates: &'a [ChannelCandidate],
    name: Option<&str>,
) -> Option<&'a ChannelCandidate> {
    let mut writable = candidates.iter().filter(|c| c.accepts_messages);

    name.and_then(|name| writable.clone().find(|c| c.name == name))
        .or_else(|| writable.next())
}

/// Pair each intent with its destination channel, keeping intent order.
///
/// Intents with no matching channel go to the default channel. If there is
/// no channel at all, nothing can be dispatched.
pub fn resolve_destinations(
    intents: Vec<NotificationIntent>,
    candidates: &[ChannelCandidate],
    parent: Option<&str>,
    default_name: Option<&str>,
) -> Vec<Dispatch> {
    let Some(fallback) = default_channel(candidates, default_name) else {
        return Vec::new();
    };

    intents
        .into_iter()
        .map(|intent| {
            let channel = match best_match(&intent.event.category, candidates, parent) {
                Ok(channel) => channel,
                Err(e) => {
                    debug!("{e}, using #{}", fallback.name);
                    fallback
                }
            };

            Dispatch {
                channel_id: channel.id.clone(),
                channel_name: channel.name.clone(),
                intent,
            }
        })
        .collect()
}
