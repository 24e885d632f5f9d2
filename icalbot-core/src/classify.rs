//! Deciding what, if anything, to announce about an event.

use chrono::{DateTime, Utc};

use crate::event::{Event, EventSnapshot};
use crate::intent::NotificationIntent;
use crate::schedule::Schedule;

/// Compare a freshly fetched event against its last snapshot.
///
/// Rules, first match wins:
/// 1. never seen before: `Add`
/// 2. content changed: `Update` (even if a reminder would also be due)
/// 3. a lead time was crossed since the last check: `Notify`
///
/// The caller is responsible for replacing the snapshot with
/// `(event, now)` afterwards, whatever this returns.
pub fn classify(
    event: &Event,
    snapshot: Option<&EventSnapshot>,
    now: DateTime<Utc>,
    schedule: &Schedule,
) -> Option<NotificationIntent> {
    let Some(snapshot) = snapshot else {
        return Some(NotificationIntent::added(event.clone()));
    };

    if event.content_differs(&snapshot.event) {
        return Some(NotificationIntent::updated(event.clone()));
    }

    let end = event.end?;
    schedule
        .crossed(end, snapshot.last_checked, now)
        .map(|offset| NotificationIntent::reminder(event.clone(), offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::NotificationKind;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn schedule() -> Schedule {
        Schedule::new(vec![TimeDelta::hours(1), TimeDelta::days(1)]).unwrap()
    }

    fn event_ending_in(minutes: i64) -> Event {
        let mut event = Event::new("a1");
        event.category = "Sports".to_string();
        event.summary = "Match".to_string();
        event.start = Some(now() + TimeDelta::minutes(minutes - 90));
        event.end = Some(now() + TimeDelta::minutes(minutes));
        event
    }

    #[test]
    fn test_unseen_event_is_added() {
        let event = event_ending_in(50);
        let intent = classify(&event, None, now(), &schedule()).unwrap();

        assert_eq!(intent.kind, NotificationKind::Add);
        assert_eq!(intent.offset, None);
        assert_eq!(intent.event, event);
    }

    #[test]
    fn test_unseen_event_without_times_is_added() {
        let intent = classify(&Event::new("bare"), None, now(), &schedule()).unwrap();
        assert_eq!(intent.kind, NotificationKind::Add);
    }

    #[test]
    fn test_changed_event_is_update_even_when_reminder_due() {
        let old = event_ending_in(50);
        let snapshot = EventSnapshot::new(old.clone(), now() - TimeDelta::minutes(20));
        let mut new = old;
        new.summary = "Match (moved)".to_string();

        let intent = classify(&new, Some(&snapshot), now(), &schedule()).unwrap();

        assert_eq!(intent.kind, NotificationKind::Update);
        assert_eq!(intent.offset, None);
    }

    #[test]
    fn test_crossed_lead_time_fires_once() {
        let event = event_ending_in(50);
        let snapshot = EventSnapshot::new(event.clone(), now() - TimeDelta::minutes(20));

        let intent = classify(&event, Some(&snapshot), now(), &schedule()).unwrap();
        assert_eq!(intent.kind, NotificationKind::Notify);
        assert_eq!(intent.offset, Some(TimeDelta::hours(1)));

        // Next cycle sees the snapshot written by this one
        let later = now() + TimeDelta::minutes(5);
        let snapshot = EventSnapshot::new(event.clone(), now());
        assert_eq!(classify(&event, Some(&snapshot), later, &schedule()), None);
    }

    #[test]
    fn test_unchanged_event_without_crossing_is_quiet() {
        let event = event_ending_in(300);
        let snapshot = EventSnapshot::new(event.clone(), now() - TimeDelta::minutes(5));

        assert_eq!(classify(&event, Some(&snapshot), now(), &schedule()), None);
    }

    #[test]
    fn test_unchanged_event_without_end_never_notifies() {
        let mut event = event_ending_in(50);
        event.end = None;
        let snapshot = EventSnapshot::new(event.clone(), now() - TimeDelta::days(3));

        assert_eq!(classify(&event, Some(&snapshot), now(), &schedule()), None);
    }

    #[test]
    fn test_last_modified_bump_alone_is_quiet() {
        let old = event_ending_in(300);
        let snapshot = EventSnapshot::new(old.clone(), now() - TimeDelta::minutes(5));
        let mut new = old;
        new.last_modified = Some(now());

        assert_eq!(classify(&new, Some(&snapshot), now(), &schedule()), None);
    }
}
