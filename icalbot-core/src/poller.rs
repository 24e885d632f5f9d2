//! The poll cycle and the timer loop that drives it.
//!
//! One cycle: fetch every feed, merge by UID, classify each event against
//! its snapshot inside a single store batch, commit, then deliver. Delivery
//! only happens after the commit succeeds, so a notification is never sent
//! for state that was not recorded.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::classify::classify;
use crate::error::BotResult;
use crate::event::{Event, EventSnapshot};
use crate::intent::{NotificationIntent, NotificationKind};
use crate::matcher::resolve_destinations;
use crate::merge::merge_sources;
use crate::platform::ChatPlatform;
use crate::render::Renderer;
use crate::schedule::Schedule;
use crate::source::CalendarSource;
use crate::store::{SnapshotBatch, SnapshotStore};

/// What to poll and where to deliver.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Feeds in precedence order: later feeds win on UID collisions
    pub endpoints: Vec<String>,
    pub schedule: Schedule,
    pub guild_id: String,
    /// Only channels under the channel with this name are candidates
    pub parent: Option<String>,
    /// Channel used when no candidate matches
    pub default_channel: Option<String>,
}

/// Outcome of one poll cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub events: usize,
    pub intents: Vec<NotificationKind>,
    pub delivered: usize,
    pub failed_deliveries: usize,
}

impl CycleReport {
    /// (added, updated, reminded)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut added = 0;
        let mut updated = 0;
        let mut reminded = 0;

        for kind in &self.intents {
            match kind {
                NotificationKind::Add => added += 1,
                NotificationKind::Update => updated += 1,
                NotificationKind::Notify => reminded += 1,
            }
        }

        (added, updated, reminded)
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (added, updated, reminded) = self.counts();
        write!(
            f,
            "{}/{} feeds, {} events: {} added, {} updated, {} reminders; {} sent, {} failed",
            self.sources_ok,
            self.sources_ok + self.sources_failed,
            self.events,
            added,
            updated,
            reminded,
            self.delivered,
            self.failed_deliveries
        )
    }
}

pub struct Poller<S, P, St> {
    source: S,
    platform: P,
    store: St,
    renderer: Renderer,
    settings: PollerSettings,
}

impl<S, P, St> Poller<S, P, St>
where
    S: CalendarSource,
    P: ChatPlatform,
    St: SnapshotStore,
{
    pub fn new(
        source: S,
        platform: P,
        store: St,
        renderer: Renderer,
        settings: PollerSettings,
    ) -> Self {
        Poller {
            source,
            platform,
            store,
            renderer,
            settings,
        }
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }

    /// Poll every `interval` until `shutdown` completes.
    ///
    /// The first cycle runs immediately. Shutdown is only observed between
    /// cycles, so a running cycle always gets to commit its batch.
    pub async fn run<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutting down poll loop");
                    return;
                }
                _ = ticker.tick() => {}
            }

            match self.run_cycle(Utc::now()).await {
                Ok(report) => info!("Poll cycle done: {report}"),
                Err(e) => error!("Poll cycle failed, will retry next tick: {e}"),
            }
        }
    }

    /// Run one full cycle as of `now`.
    ///
    /// Fails only if the snapshot batch cannot be read, written or
    /// committed; in that case nothing is delivered.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> BotResult<CycleReport> {
        let mut report = CycleReport::default();

        let mut sources = Vec::with_capacity(self.settings.endpoints.len());
        for endpoint in &self.settings.endpoints {
            match self.source.fetch(endpoint).await {
                Ok(events) => {
                    debug!("Fetched {} events from {endpoint}", events.len());
                    report.sources_ok += 1;
                    sources.push(events);
                }
                Err(e) => {
                    warn!("{e}");
                    report.sources_failed += 1;
                }
            }
        }

        let events = merge_sources(sources);
        report.events = events.len();

        let intents = self.record(&events, now)?;
        report.intents = intents.iter().map(|i| i.kind).collect();

        self.deliver(intents, &mut report).await;

        Ok(report)
    }

    /// Classify `events` and store their new snapshots in one batch.
    pub fn record(
        &self,
        events: &[Event],
        now: DateTime<Utc>,
    ) -> BotResult<Vec<NotificationIntent>> {
        let mut batch = self.store.begin()?;

        match evaluate(batch.as_mut(), events, now, &self.settings.schedule) {
            Ok(intents) => {
                batch.commit()?;
                Ok(intents)
            }
            Err(e) => {
                if let Err(abort_error) = batch.abort() {
                    warn!("Failed to abort snapshot batch: {abort_error}");
                }
                Err(e)
            }
        }
    }

    async fn deliver(&self, intents: Vec<NotificationIntent>, report: &mut CycleReport) {
        if intents.is_empty() {
            return;
        }

        let channels = match self.platform.list_channels(&self.settings.guild_id).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!("{e}");
                Vec::new()
            }
        };

        if !channels.iter().any(|c| c.accepts_messages) {
            warn!(
                "No text channels available in guild {}, dropping {} notifications",
                self.settings.guild_id,
                intents.len()
            );
            report.failed_deliveries += intents.len();
            return;
        }

        let dispatches = resolve_destinations(
            intents,
            &channels,
            self.settings.parent.as_deref(),
            self.settings.default_channel.as_deref(),
        );

        for dispatch in dispatches {
            let text = self.renderer.render(&dispatch.intent);

            match self.platform.send(&dispatch.channel_id, &text).await {
                Ok(()) => {
                    debug!("Sent {} to #{}", dispatch.intent, dispatch.channel_name);
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!("{e}");
                    report.failed_deliveries += 1;
                }
            }
        }
    }
}

/// Classify each event against `batch` and overwrite its snapshot with
/// `(event, now)`, whether or not an intent came out of it.
pub fn evaluate(
    batch: &mut (dyn SnapshotBatch + '_),
    events: &[Event],
    now: DateTime<Utc>,
    schedule: &Schedule,
) -> BotResult<Vec<NotificationIntent>> {
    let mut intents = Vec::new();

    for event in events {
        let snapshot = batch.get(&event.uid)?;

        if let Some(intent) = classify(event, snapshot.as_ref(), now, schedule) {
            debug!("{intent}");
            intents.push(intent);
        }

        batch.put(&event.uid, &EventSnapshot::new(event.clone(), now))?;
    }

    Ok(intents)
}
