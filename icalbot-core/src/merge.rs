//! Merging events fetched from several calendar feeds.

use std::collections::BTreeMap;

use crate::event::Event;

/// Collapse per-source event lists into one list unique by UID.
///
/// Sources are applied in the order given and a later copy of a UID replaces
/// an earlier one, so the last source wins. The result is ordered by UID.
pub fn merge_sources<I>(sources: I) -> Vec<Event>
where
    I: IntoIterator<Item = Vec<Event>>,
{
    let mut by_uid: BTreeMap<String, Event> = BTreeMap::new();

    for events in sources {
        for event in events {
            by_uid.insert(event.uid.clone(), event);
        }
    }

    by_uid.into_values().collect()
}
