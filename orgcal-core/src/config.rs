//! Sync configuration at ~/.config/orgcal/config.toml

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{OrgCalError, OrgCalResult};
use crate::reconcile::ReconcileOptions;
use crate::remote::Remote;

fn default_todo_keywords() -> Vec<String> {
    ["TODO", "WAIT", "STRT", "PROJ"].map(String::from).to_vec()
}

fn default_done_keywords() -> Vec<String> {
    ["DONE", "KILL"].map(String::from).to_vec()
}

/// Everything a sync run needs besides the org data itself.
///
/// Every field has a default, so an empty file is valid apart from the
/// `[remote]` table, which is checked when the remote is first needed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Path or http(s) URL of the org file
    pub org_file: Option<String>,
    /// Slash-separated headline titles leading to the events parent
    pub org_events_path: String,
    pub todo_keywords: Vec<String>,
    pub done_keywords: Vec<String>,
    /// Take every descendant of the events parent, not just its children
    pub flatten: bool,
    pub include_tags: BTreeSet<String>,
    pub include_own_tags: BTreeSet<String>,
    pub ignore_tags: BTreeSet<String>,
    pub ignore_own_tags: BTreeSet<String>,
    pub ignore_todos: bool,
    pub ignore_done: bool,
    pub create_events_marked_as_done: bool,
    /// Hours
    pub delete_grace_period: i64,
    pub time_zone: Option<String>,
    /// `"tag1 tag2" = color id`
    pub color_map: BTreeMap<String, u32>,
    pub attendee_nicknames: BTreeMap<String, String>,
    pub fetch_past_months: u32,
    pub fetch_future_months: u32,
    pub remote: Option<Remote>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            org_file: None,
            org_events_path: String::new(),
            todo_keywords: default_todo_keywords(),
            done_keywords: default_done_keywords(),
            flatten: false,
            include_tags: BTreeSet::new(),
            include_own_tags: BTreeSet::new(),
            ignore_tags: BTreeSet::new(),
            ignore_own_tags: BTreeSet::new(),
            ignore_todos: false,
            ignore_done: false,
            create_events_marked_as_done: false,
            delete_grace_period: 24,
            time_zone: None,
            color_map: BTreeMap::new(),
            attendee_nicknames: BTreeMap::new(),
            fetch_past_months: 1,
            fetch_future_months: 6,
            remote: None,
        }
    }
}

impl SyncConfig {
    pub fn default_path() -> OrgCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| OrgCalError::Config("Could not determine config directory".into()))?
            .join("orgcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (tilde-expanded) and apply environment overrides.
    pub fn load(path: &Path) -> OrgCalResult<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let content = std::fs::read_to_string(&expanded).map_err(|e| {
            OrgCalError::Config(format!("Could not read config file {}: {e}", expanded))
        })?;

        let mut config = Self::parse(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> OrgCalResult<Self> {
        toml::from_str(content).map_err(|e| OrgCalError::Config(e.to_string()))
    }

    /// `ORG_FILE` replaces `org_file`; `CALENDAR_ID` sets the remote's `calendar_id`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(org_file) = non_blank("ORG_FILE") {
            self.org_file = Some(org_file);
        }

        if let (Some(calendar_id), Some(remote)) = (non_blank("CALENDAR_ID"), self.remote.as_mut())
        {
            remote.set_param("calendar_id", calendar_id);
        }
    }

    pub fn remote(&self) -> OrgCalResult<&Remote> {
        self.remote
            .as_ref()
            .ok_or_else(|| OrgCalError::Config("No [remote] section configured".into()))
    }

    /// The org file location: URLs as-is, paths tilde-expanded.
    pub fn org_file(&self) -> OrgCalResult<String> {
        let org_file = self
            .org_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| OrgCalError::Config("No org file supplied".into()))?;

        if is_url(org_file) {
            Ok(org_file.to_string())
        } else {
            Ok(shellexpand::tilde(org_file).into_owned())
        }
    }

    /// The configured zone, else the system zone, else UTC.
    pub fn time_zone(&self) -> OrgCalResult<Tz> {
        match &self.time_zone {
            Some(name) => {
                let zone = name
                    .parse::<Tz>()
                    .map_err(|_| OrgCalError::Config(format!("Unknown time zone '{name}'")))?;
                tracing::debug!("Found time zone '{}'", zone);
                Ok(zone)
            }
            None => {
                let zone = iana_time_zone::get_timezone()
                    .ok()
                    .and_then(|name| name.parse::<Tz>().ok())
                    .unwrap_or(Tz::UTC);
                tracing::debug!("Using system default time zone '{}'", zone);
                Ok(zone)
            }
        }
    }

    pub fn reconcile_options(&self) -> OrgCalResult<ReconcileOptions> {
        Ok(ReconcileOptions {
            done_keywords: self.done_keywords.iter().cloned().collect(),
            create_events_marked_as_done: self.create_events_marked_as_done,
            delete_grace_period_hours: self.delete_grace_period,
            time_zone: self.time_zone()?,
        })
    }

    /// Every todo and done keyword, as recognized at the start of a headline.
    pub fn keywords(&self) -> Vec<String> {
        self.todo_keywords
            .iter()
            .chain(&self.done_keywords)
            .cloned()
            .collect()
    }

    /// Color of the first `color_map` entry whose tags are all in `own_tags`.
    pub fn color_for(&self, own_tags: &BTreeSet<String>) -> Option<String> {
        self.color_map
            .iter()
            .find(|(tags, _)| tags.split_whitespace().all(|tag| own_tags.contains(tag)))
            .map(|(_, color)| color.to_string())
    }

    pub fn resolve_nickname<'a>(&'a self, name: &'a str) -> &'a str {
        self.attendee_nicknames
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
