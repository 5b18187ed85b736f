//! Core of orgcal: one-way sync from an org-mode outline to a calendar.
//!
//! - `outline` / `extract` turn org text into `SourceEvent`s
//! - `reconcile` compares them with fetched `DestinationEvent`s and yields a `ChangeSet`
//! - `remote` talks to provider binaries to fetch events and apply changes

pub mod compare;
pub mod config;
pub mod date_range;
pub mod destination;
pub mod error;
pub mod event;
pub mod extract;
pub mod matcher;
pub mod outline;
pub mod payload;
pub mod recurrence;
pub mod reconcile;
pub mod remote;
pub mod timestamp;

pub use config::SyncConfig;
pub use destination::DestinationEvent;
pub use error::{OrgCalError, OrgCalResult};
pub use event::{EventDate, SourceEvent};
pub use reconcile::{ChangeKind, ChangeSet, ReconcileOptions};
