//! Colored terminal output for the one-shot commands.

use icalbot_core::{ChannelCandidate, CycleReport, NotificationKind};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for NotificationKind {
    fn render(&self) -> String {
        let label = self.to_string();
        match self {
            NotificationKind::Add => label.green().to_string(),
            NotificationKind::Update => label.yellow().to_string(),
            NotificationKind::Notify => label.cyan().to_string(),
        }
    }
}

impl Render for CycleReport {
    fn render(&self) -> String {
        let (added, updated, reminded) = self.counts();
        let mut lines = Vec::new();

        let feeds = format!(
            "{}/{} feeds",
            self.sources_ok,
            self.sources_ok + self.sources_failed
        );
        if self.sources_failed > 0 {
            lines.push(format!("📅 {} {} events", feeds.red(), self.events));
        } else {
            lines.push(format!("📅 {} {} events", feeds, self.events));
        }

        for (kind, count) in [
            (NotificationKind::Add, added),
            (NotificationKind::Update, updated),
            (NotificationKind::Notify, reminded),
        ] {
            if count > 0 {
                lines.push(format!("   {} {}", kind.render(), count));
            }
        }

        if self.intents.is_empty() {
            lines.push(format!("   {}", "Nothing to announce".dimmed()));
        } else {
            let mut sent = format!("   {} sent", self.delivered);
            if self.failed_deliveries > 0 {
                sent.push_str(&format!(", {}", format!("{} failed", self.failed_deliveries).red()));
            }
            lines.push(sent);
        }

        lines.join("\n")
    }
}

/// One row of the `match` listing.
pub fn render_candidate(score: f64, candidate: &ChannelCandidate, chosen: bool) -> String {
    let row = format!("{score:>6.3}  #{} ({})", candidate.name, candidate.id);
    if chosen {
        format!("{} {}", "→".green(), row.green())
    } else {
        format!("  {}", row.dimmed())
    }
}
