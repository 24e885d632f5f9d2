//! Rendering notification intents into message text.
//!
//! Templates are handlebars, one per intent kind (`add`, `update`,
//! `notify`). The template context is the intent itself:
//!
//! ```text
//! {{kind}} {{offset_secs}} {{event.uid}} {{event.category}} {{event.summary}}
//! {{event.description}} {{event.start}} {{event.end}} {{event.last_modified}}
//! ```
//!
//! Two helpers are available: `encode_timestamp` formats an instant in the
//! local time zone, `encode_duration` formats a number of seconds such as
//! `offset_secs` as `1d2h30m`.

use std::collections::HashMap;

use chrono::{DateTime, Local, SecondsFormat};
use handlebars::{Handlebars, handlebars_helper};
use tracing::{debug, warn};

use crate::error::{BotError, BotResult};
use crate::intent::{NotificationIntent, NotificationKind};

handlebars_helper!(encode_timestamp: |value: Json| {
    value.as_str().map(format_timestamp).unwrap_or_default()
});

handlebars_helper!(encode_duration: |value: Json| {
    value.as_i64().map(format_duration).unwrap_or_default()
});

pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    /// Compile templates keyed by intent kind (case-insensitive).
    pub fn new(templates: &HashMap<String, String>) -> BotResult<Self> {
        let mut registry = Handlebars::new();
        // Output goes to a chat, not a web page
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("encode_timestamp", Box::new(encode_timestamp));
        registry.register_helper("encode_duration", Box::new(encode_duration));

        for (name, source) in templates {
            registry
                .register_template_string(&name.to_lowercase(), source)
                .map_err(|e| BotError::Template(format!("{name}: {e}")))?;
        }

        Ok(Renderer { registry })
    }

    pub fn has_template(&self, kind: NotificationKind) -> bool {
        self.registry.has_template(kind.template_name())
    }

    /// Message text for `intent`.
    ///
    /// Falls back to the intent's JSON encoding when there is no template
    /// for its kind or the template fails to render.
    pub fn render(&self, intent: &NotificationIntent) -> String {
        let name = intent.kind.template_name();

        if !self.registry.has_template(name) {
            debug!("No template for {}, sending raw intent", intent.kind);
            return intent.to_json();
        }

        match self.registry.render(name, intent) {
            Ok(text) => text,
            Err(e) => {
                warn!("Template for {} failed: {e}", intent.kind);
                intent.to_json()
            }
        }
    }
}

/// RFC 3339 in the local time zone. Unparseable input is returned as-is.
pub fn format_timestamp(value: &str) -> String {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt
            .with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        Err(_) => value.to_string(),
    }
}

const UNITS: [(i64, &str); 5] = [
    (7 * 24 * 60 * 60, "w"),
    (24 * 60 * 60, "d"),
    (60 * 60, "h"),
    (60, "m"),
    (1, "s"),
];

/// Compact duration such as `1w2d3h4m5s`; zero units are left out.
pub fn format_duration(seconds: i64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if seconds < 0 {
        out.push('-');
    }

    let mut rest = seconds.unsigned_abs();
    for (size, name) in UNITS {
        let size = size as u64;
        let count = rest / size;
        if count > 0 {
            out.push_str(&format!("{count}{name}"));
            rest %= size;
        }
    }

    out
}
