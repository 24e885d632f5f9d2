//! iCalendar feed parsing.
//!
//! Turns the text of an .ics feed (RFC 5545) into [`Event`](crate::event::Event)s.

mod parse;

pub use parse::parse_calendar;
