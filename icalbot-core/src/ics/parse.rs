//! ICS feed parsing using the icalendar crate's parser.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, ParseString, read_calendar, unfold},
};
use tracing::debug;

use crate::event::Event;

/// Parse every VEVENT of a feed.
///
/// Events without a UID cannot be tracked between polls and are skipped.
/// Fails only if the text is not an iCalendar document at all.
pub fn parse_calendar(content: &str) -> Result<Vec<Event>, String> {
    let unfolded = unfold(content);
    let body = unfolded.trim_start_matches('\u{feff}').trim_start();
    if !body
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err("Not an iCalendar document".to_string());
    }

    let calendar = read_calendar(body)?;
    let categories = raw_categories(body);

    let vevents = calendar.components.iter().filter(|c| c.name == "VEVENT");

    let mut events = Vec::new();
    let mut skipped = 0;

    for (index, vevent) in vevents.enumerate() {
        let category = categories.get(index).cloned().flatten();
        match parse_vevent(vevent, category) {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} events without a UID");
    }

    Ok(events)
}

fn parse_vevent(vevent: &Component<'_>, category: Option<String>) -> Option<Event> {
    let uid = vevent.find_prop("UID")?.val.to_string();
    if uid.is_empty() {
        return None;
    }

    // The parser has already unescaped TEXT values
    let text = |name: &str| {
        vevent
            .find_prop(name)
            .map(|p| p.val.to_string())
            .unwrap_or_default()
    };

    let time = |name: &str| {
        vevent
            .find_prop(name)
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .and_then(to_utc)
    };

    Some(Event {
        uid,
        category: category.unwrap_or_default(),
        summary: text("SUMMARY"),
        description: text("DESCRIPTION"),
        start: time("DTSTART"),
        end: time("DTEND"),
        last_modified: time("LAST-MODIFIED"),
    })
}

/// First category of every top-level VEVENT, in document order.
///
/// Read from the unfolded text rather than the parsed property: the parser
/// unescapes `\,`, after which a comma inside a category can no longer be
/// told apart from the list separator.
fn raw_categories(unfolded: &str) -> Vec<Option<String>> {
    let mut categories = Vec::new();
    let mut depth = 0usize;
    let mut in_vevent = false;

    for line in unfolded.lines() {
        let Some((name, value)) = split_content_line(line) else {
            continue;
        };

        if name.eq_ignore_ascii_case("BEGIN") {
            depth += 1;
            if depth == 2 && value.trim().eq_ignore_ascii_case("VEVENT") {
                in_vevent = true;
                categories.push(None);
            }
        } else if name.eq_ignore_ascii_case("END") {
            if depth == 2 {
                in_vevent = false;
            }
            depth = depth.saturating_sub(1);
        } else if in_vevent && depth == 2 && name.eq_ignore_ascii_case("CATEGORIES") {
            if let Some(slot) = categories.last_mut().filter(|slot| slot.is_none()) {
                *slot = Some(first_list_item(value));
            }
        }
    }

    categories
}

/// Property name and raw value of a content line, skipping over parameters.
fn split_content_line(line: &str) -> Option<(&str, &str)> {
    let name_end = line.find([';', ':'])?;
    let mut in_quotes = false;

    for (i, c) in line.char_indices().skip(name_end) {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => return Some((&line[..name_end], &line[i + 1..])),
            _ => {}
        }
    }

    None
}

/// First entry of a comma-separated TEXT list, unescaped.
fn first_list_item(value: &str) -> String {
    let mut end = value.len();
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    ParseString::from(value[..end].trim())
        .unescape_text()
        .to_string()
}

/// Resolve an ICS date or date-time to an instant.
///
/// Floating times and all-day dates are read in the local zone, as a
/// calendar client would display them.
fn to_utc(dpt: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match dpt {
        DatePerhapsTime::Date(date) => local_to_utc(date.and_hms_opt(0, 0, 0)?),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(dt),
            CalendarDateTime::Floating(naive) => local_to_utc(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => match tzid.parse::<Tz>() {
                Ok(tz) => tz
                    .from_local_datetime(&date_time)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc)),
                Err(_) => {
                    debug!("Unknown TZID '{tzid}', reading time as local");
                    local_to_utc(date_time)
                }
            },
        },
    }
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
