//! Colored terminal rendering for orgcal-core types.

use orgcal_core::destination::{DestinationEvent, EventDateTime};
use orgcal_core::remote::ApplyStats;
use orgcal_core::{ChangeKind, ChangeSet, SourceEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        colorize(*self, &self.to_string())
    }
}

fn colorize(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Create => text.green().to_string(),
        ChangeKind::Update => text.yellow().to_string(),
        ChangeKind::Delete => text.red().to_string(),
    }
}

fn render_time(time: &EventDateTime) -> String {
    match time {
        EventDateTime::DateTime { date_time, .. } => {
            date_time.format("%Y-%m-%d %H:%M").to_string()
        }
        EventDateTime::Date { date } => date.format("%Y-%m-%d").to_string(),
    }
}

fn render_change(kind: ChangeKind, event: &DestinationEvent) -> String {
    let mut line = format!(
        "{} {} {}",
        kind.render(),
        colorize(kind, &event.summary),
        render_time(&event.start).dimmed()
    );
    if !event.recurrence.is_empty() {
        line.push_str(&format!(" {}", "(repeats)".dimmed()));
    }
    line
}

impl Render for ChangeSet {
    fn render(&self) -> String {
        if self.is_empty() {
            return "No changes".dimmed().to_string();
        }

        let mut lines = Vec::new();
        for event in &self.create {
            lines.push(render_change(ChangeKind::Create, event));
        }
        for (_, event) in &self.update {
            lines.push(render_change(ChangeKind::Update, event));
        }
        for (_, summary) in &self.delete {
            let kind = ChangeKind::Delete;
            lines.push(format!("{} {}", kind.render(), colorize(kind, summary)));
        }

        let (created, updated, deleted) = self.counts();
        lines.push(
            format!("{created} to create, {updated} to update, {deleted} to delete")
                .dimmed()
                .to_string(),
        );

        lines.join("\n")
    }
}

impl Render for ApplyStats {
    fn render(&self) -> String {
        let mut summary = format!(
            "Created {}, updated {}, deleted {}",
            self.created, self.updated, self.deleted
        );
        if self.failed > 0 {
            summary.push_str(&format!(", {}", format!("{} failed", self.failed).red()));
        }
        summary
    }
}

impl Render for SourceEvent {
    fn render(&self) -> String {
        let mut line = String::new();
        if let Some(state) = &self.state {
            line.push_str(&format!("{} ", state.bold()));
        }
        line.push_str(self.summary());
        line.push_str(&format!(" {}", self.start.to_string().dimmed()));
        if let Some(end) = &self.end {
            line.push_str(&format!("{}", format!(" - {end}").dimmed()));
        }
        if self.repeat.is_some() {
            line.push_str(&format!(" {}", "(repeats)".dimmed()));
        }
        if !self.own_tags.is_empty() {
            let tags: Vec<&str> = self.own_tags.iter().map(String::as_str).collect();
            line.push_str(&format!(" {}", format!(":{}:", tags.join(":")).cyan()));
        }
        line
    }
}
