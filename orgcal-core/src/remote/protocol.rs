//! Defines the JSON protocol used for communication between orgcal
//! and provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::destination::DestinationEvent;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Request sent from orgcal to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider back to orgcal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

/// List events within a time range.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    /// Provider-specific params (e.g. calendar_id)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<DestinationEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event: DestinationEvent,
}

impl ProviderCommand for CreateEvent {
    type Response = DestinationEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Replace an existing event's fields with `event`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
    pub event: DestinationEvent,
}

impl ProviderCommand for UpdateEvent {
    type Response = DestinationEvent;
    fn command() -> Command {
        Command::UpdateEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::EventDateTime;
    use chrono::NaiveDate;

    #[test]
    fn test_request_shape() {
        let mut remote_config = serde_json::Map::new();
        remote_config.insert("calendar_id".into(), "primary".into());

        let params = serde_json::to_value(ListEvents {
            remote_config,
            from: "2024-01-01T00:00:00+00:00".into(),
            to: "2024-07-01T00:00:00+00:00".into(),
        })
        .unwrap();
        let request = Request {
            command: ListEvents::command(),
            params,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "list_events");
        assert_eq!(json["params"]["calendar_id"], "primary");
        assert_eq!(json["params"]["from"], "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_update_carries_id_and_event() {
        let date = EventDateTime::date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        let params = serde_json::to_value(UpdateEvent {
            remote_config: serde_json::Map::new(),
            event_id: "abc".into(),
            event: DestinationEvent::new("Standup", date.clone(), date),
        })
        .unwrap();

        assert_eq!(params["event_id"], "abc");
        assert_eq!(params["event"]["summary"], "Standup");
    }

    #[test]
    fn test_parse_responses() {
        let ok: Response<Vec<DestinationEvent>> =
            serde_json::from_str(r#"{"status": "success", "data": []}"#).unwrap();
        assert!(matches!(ok, Response::Success { data } if data.is_empty()));

        let err: Response<()> =
            serde_json::from_str(r#"{"status": "error", "error": "Not authenticated"}"#).unwrap();
        assert!(matches!(err, Response::Error { error } if error == "Not authenticated"));

        let unit: Response<()> =
            serde_json::from_str(r#"{"status": "success", "data": null}"#).unwrap();
        assert!(matches!(unit, Response::Success { .. }));
    }
}
