use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use icalbot_core::render::Renderer;
use icalbot_core::schedule::Schedule;
use icalbot_core::store::{MemoryStore, SnapshotBatch, SnapshotStore};
use icalbot_core::{
    BotError, BotResult, CalendarSource, ChannelCandidate, ChatPlatform, Event, EventSnapshot,
    NotificationKind, Poller, PollerSettings,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

#[derive(Default)]
struct FakeSource {
    feeds: HashMap<String, Result<Vec<Event>, String>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    fn with_feed(mut self, endpoint: &str, events: Vec<Event>) -> Self {
        self.feeds.insert(endpoint.to_string(), Ok(events));
        self
    }

    fn with_broken_feed(mut self, endpoint: &str) -> Self {
        self.feeds
            .insert(endpoint.to_string(), Err("connection refused".to_string()));
        self
    }
}

#[async_trait]
impl CalendarSource for FakeSource {
    async fn fetch(&self, endpoint: &str) -> BotResult<Vec<Event>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.feeds.get(endpoint) {
            Some(Ok(events)) => Ok(events.clone()),
            Some(Err(reason)) => Err(BotError::fetch(endpoint, reason)),
            None => Err(BotError::fetch(endpoint, "not found")),
        }
    }
}

#[derive(Default)]
struct FakePlatform {
    channels: Vec<ChannelCandidate>,
    broken_channels: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakePlatform {
    fn with_channels(names: &[(&str, &str)]) -> Self {
        FakePlatform {
            channels: names
                .iter()
                .map(|(id, name)| ChannelCandidate::new(*id, *name))
                .collect(),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn list_channels(&self, _guild_id: &str) -> BotResult<Vec<ChannelCandidate>> {
        Ok(self.channels.clone())
    }

    async fn send(&self, channel_id: &str, text: &str) -> BotResult<()> {
        if self.broken_channels.contains(channel_id) {
            return Err(BotError::delivery(channel_id, "403 Forbidden"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Accepts every read and write, then refuses to commit.
struct UncommittableStore;

struct UncommittableBatch;

impl SnapshotStore for UncommittableStore {
    fn begin(&self) -> BotResult<Box<dyn SnapshotBatch + '_>> {
        Ok(Box::new(UncommittableBatch))
    }
}

impl SnapshotBatch for UncommittableBatch {
    fn get(&self, _uid: &str) -> BotResult<Option<EventSnapshot>> {
        Ok(None)
    }

    fn put(&mut self, _uid: &str, _snapshot: &EventSnapshot) -> BotResult<()> {
        Ok(())
    }

    fn commit(self: Box<Self>) -> BotResult<()> {
        Err(BotError::Store("disk full".to_string()))
    }

    fn abort(self: Box<Self>) -> BotResult<()> {
        Ok(())
    }
}

fn event(uid: &str, category: &str, end_in_minutes: i64) -> Event {
    let mut event = Event::new(uid);
    event.category = category.to_string();
    event.summary = format!("{category} event {uid}");
    event.start = Some(now() + TimeDelta::minutes(end_in_minutes - 60));
    event.end = Some(now() + TimeDelta::minutes(end_in_minutes));
    event
}

fn settings(endpoints: &[&str]) -> PollerSettings {
    PollerSettings {
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        schedule: Schedule::new(vec![TimeDelta::hours(1)]).unwrap(),
        guild_id: "guild".to_string(),
        parent: None,
        default_channel: Some("general".to_string()),
    }
}

fn renderer() -> Renderer {
    let templates = [
        ("add", "added {{event.uid}}"),
        ("update", "updated {{event.uid}}"),
        ("notify", "{{event.summary}} in {{encode_duration offset_secs}}"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    Renderer::new(&templates).unwrap()
}

fn seed(store: &MemoryStore, event: &Event, last_checked: DateTime<Utc>) {
    let mut batch = store.begin().unwrap();
    batch
        .put(&event.uid, &EventSnapshot::new(event.clone(), last_checked))
        .unwrap();
    batch.commit().unwrap();
}

fn channels() -> FakePlatform {
    FakePlatform::with_channels(&[("1", "general"), ("2", "sports"), ("3", "music")])
}

#[tokio::test]
async fn test_new_event_and_due_reminder() {
    let e1 = event("a1", "Sports", 600);
    let e2 = event("a2", "Music", 55);

    let store = MemoryStore::new();
    // Previous poll saw a2 with 70 minutes to go
    seed(&store, &e2, now() - TimeDelta::minutes(15));

    let source = FakeSource::default().with_feed("feed", vec![e1.clone(), e2.clone()]);
    let poller = Poller::new(source, channels(), store, renderer(), settings(&["feed"]));

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(
        report.intents,
        [NotificationKind::Add, NotificationKind::Notify]
    );
    assert_eq!(report.delivered, 2);
    assert_eq!(
        poller.platform().sent(),
        [
            ("2".to_string(), "added a1".to_string()),
            ("3".to_string(), "Music event a2 in 1h".to_string()),
        ]
    );

    let snapshot = poller.store().snapshot("a1").unwrap();
    assert_eq!(snapshot.event, e1);
    assert_eq!(snapshot.last_checked, now());
}

#[tokio::test]
async fn test_reminder_does_not_refire_next_cycle() {
    let e2 = event("a2", "Music", 55);
    let store = MemoryStore::new();
    seed(&store, &e2, now() - TimeDelta::minutes(15));

    let source = FakeSource::default().with_feed("feed", vec![e2]);
    let poller = Poller::new(source, channels(), store, renderer(), settings(&["feed"]));

    let first = poller.run_cycle(now()).await.unwrap();
    let second = poller
        .run_cycle(now() + TimeDelta::minutes(5))
        .await
        .unwrap();

    assert_eq!(first.intents, [NotificationKind::Notify]);
    assert!(second.intents.is_empty());
    assert_eq!(poller.platform().sent().len(), 1);
}

#[tokio::test]
async fn test_changed_event_is_announced_as_update() {
    let old = event("a2", "Music", 55);
    let store = MemoryStore::new();
    seed(&store, &old, now() - TimeDelta::minutes(15));

    let mut new = old.clone();
    new.description = "Moved to the big hall".to_string();

    let source = FakeSource::default().with_feed("feed", vec![new]);
    let poller = Poller::new(source, channels(), store, renderer(), settings(&["feed"]));

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(report.intents, [NotificationKind::Update]);
    assert_eq!(poller.platform().sent()[0].1, "updated a2");
}

#[tokio::test]
async fn test_broken_feed_does_not_stop_the_others() {
    let source = FakeSource::default()
        .with_broken_feed("broken")
        .with_feed("good", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        channels(),
        MemoryStore::new(),
        renderer(),
        settings(&["broken", "good"]),
    );

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(report.sources_ok, 1);
    assert_eq!(report.sources_failed, 1);
    assert_eq!(report.intents, [NotificationKind::Add]);
}

#[tokio::test]
async fn test_later_feed_wins_on_shared_uid() {
    let mut first = event("shared", "Sports", 600);
    first.summary = "from first".to_string();
    let mut second = first.clone();
    second.summary = "from second".to_string();

    let source = FakeSource::default()
        .with_feed("one", vec![first])
        .with_feed("two", vec![second]);
    let poller = Poller::new(
        source,
        channels(),
        MemoryStore::new(),
        renderer(),
        settings(&["one", "two"]),
    );

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(report.events, 1);
    assert_eq!(
        poller.store().snapshot("shared").unwrap().event.summary,
        "from second"
    );
}

#[tokio::test]
async fn test_failed_commit_delivers_nothing() {
    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        channels(),
        UncommittableStore,
        renderer(),
        settings(&["feed"]),
    );

    let result = poller.run_cycle(now()).await;

    assert!(matches!(result, Err(BotError::Store(_))));
    assert!(poller.platform().sent().is_empty());
}

#[tokio::test]
async fn test_failed_send_does_not_stop_later_sends() {
    let mut platform = channels();
    platform.broken_channels.insert("2".to_string());

    let source = FakeSource::default().with_feed(
        "feed",
        vec![event("a1", "Sports", 600), event("a2", "Music", 600)],
    );
    let poller = Poller::new(
        source,
        platform,
        MemoryStore::new(),
        renderer(),
        settings(&["feed"]),
    );

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed_deliveries, 1);
    assert_eq!(poller.platform().sent()[0].0, "3");
}

#[tokio::test]
async fn test_no_channels_drops_notifications_but_keeps_snapshots() {
    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        FakePlatform::default(),
        MemoryStore::new(),
        renderer(),
        settings(&["feed"]),
    );

    let report = poller.run_cycle(now()).await.unwrap();

    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed_deliveries, 1);
    assert!(poller.store().snapshot("a1").is_some());
}

#[tokio::test]
async fn test_only_category_channels_drops_notifications() {
    let platform = FakePlatform {
        channels: vec![
            ChannelCandidate::new("10", "sports").without_messages(),
            ChannelCandidate::new("11", "general").without_messages(),
        ],
        ..Default::default()
    };
    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        platform,
        MemoryStore::new(),
        renderer(),
        settings(&["feed"]),
    );

    let report = poller.run_cycle(now()).await.unwrap();

    assert!(poller.platform().sent().is_empty());
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed_deliveries, 1);
}

#[tokio::test]
async fn test_unmatched_parent_falls_back_to_default_channel() {
    let mut settings = settings(&["feed"]);
    settings.parent = Some("no-such-category".to_string());

    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(source, channels(), MemoryStore::new(), renderer(), settings);

    poller.run_cycle(now()).await.unwrap();

    assert_eq!(poller.platform().sent()[0].0, "1");
}

#[tokio::test]
async fn test_run_polls_immediately_then_stops_on_shutdown() {
    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        channels(),
        MemoryStore::new(),
        renderer(),
        settings(&["feed"]),
    );

    poller
        .run(
            Duration::from_secs(3600),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

    assert_eq!(poller.platform().sent().len(), 1);
    assert_eq!(poller.store().len(), 1);
}

#[tokio::test]
async fn test_run_with_pending_shutdown_polls_nothing() {
    let source = FakeSource::default().with_feed("feed", vec![event("a1", "Sports", 600)]);
    let poller = Poller::new(
        source,
        channels(),
        MemoryStore::new(),
        renderer(),
        settings(&["feed"]),
    );

    poller.run(Duration::from_secs(3600), async {}).await;

    assert!(poller.store().is_empty());
}
