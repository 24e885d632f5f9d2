//! Core of icalbot: calendar change detection and reminder scheduling.
//!
//! This crate turns parsed calendar events into notifications:
//! - `merge` deduplicates events from several feeds
//! - `classify` and `schedule` decide between ADD, UPDATE and NOTIFY
//! - `store` keeps the last-seen snapshot of every event
//! - `matcher` picks the destination channel by fuzzy name match
//! - `poller` ties it together into a timed poll loop
//!
//! Fetching feeds and talking to the chat platform happen behind the
//! [`CalendarSource`] and [`ChatPlatform`] traits.

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod intent;
pub mod matcher;
pub mod merge;
pub mod platform;
pub mod poller;
pub mod render;
pub mod schedule;
pub mod source;
pub mod store;

pub use error::{BotError, BotResult};
pub use event::{Event, EventSnapshot};
pub use intent::{Dispatch, NotificationIntent, NotificationKind};
pub use matcher::ChannelCandidate;
pub use platform::ChatPlatform;
pub use poller::{CycleReport, Poller, PollerSettings};
pub use source::CalendarSource;
