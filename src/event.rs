//! Room events as seen by the push rule engine.
//!
//! Events are produced upstream (sync, storage) and are read-only here.
//! Conditions address event data through dot-separated field paths such as
//! `content.body` or `room_id`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a single event, e.g. `$143273582443PhrSn:example.org`.
    EventId
);
string_id!(
    /// Identifier of a room, e.g. `!636q39766251:example.com`.
    RoomId
);
string_id!(
    /// Fully qualified user identifier, e.g. `@alice:example.org`.
    UserId
);

/// A single occurrence in a room.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub sender: UserId,
    pub room_id: RoomId,
    pub origin_server_ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    #[serde(default)]
    pub content: JsonValue,
}

impl Event {
    /// Creates an event with the current timestamp and empty content.
    #[must_use]
    pub fn new(
        event_id: impl Into<EventId>,
        event_type: impl Into<String>,
        sender: impl Into<UserId>,
        room_id: impl Into<RoomId>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            sender: sender.into(),
            room_id: room_id.into(),
            origin_server_ts: Utc::now(),
            state_key: None,
            content: JsonValue::Object(serde_json::Map::new()),
        }
    }

    /// Replaces the content payload.
    #[must_use]
    pub fn with_content(mut self, content: JsonValue) -> Self {
        self.content = content;
        self
    }

    /// Sets the state key, turning this into a state event.
    #[must_use]
    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = Some(state_key.into());
        self
    }

    /// Convenience constructor for an `m.room.message` text event.
    #[must_use]
    pub fn text_message(
        event_id: impl Into<EventId>,
        sender: impl Into<UserId>,
        room_id: impl Into<RoomId>,
        body: &str,
    ) -> Self {
        Self::new(event_id, "m.room.message", sender, room_id).with_content(serde_json::json!({
            "msgtype": "m.text",
            "body": body,
        }))
    }

    /// Checks that the event can be evaluated at all.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_id.is_blank() {
            return Err(ValidationError::EmptyEventId);
        }
        Ok(())
    }

    /// The textual body of the event, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.content.get("body").and_then(JsonValue::as_str)
    }

    /// Resolves a dot-separated field path to a string value.
    ///
    /// Top-level keys (`type`, `sender`, `room_id`, `event_id`, `state_key`)
    /// map to the envelope; `content.*` walks the JSON payload. A flat key
    /// containing dots takes precedence over nested traversal. Non-string
    /// leaves resolve to `None`.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&str> {
        match path {
            "type" => return Some(self.event_type.as_str()),
            "sender" => return Some(self.sender.as_str()),
            "room_id" => return Some(self.room_id.as_str()),
            "event_id" => return Some(self.event_id.as_str()),
            "state_key" => return self.state_key.as_deref(),
            _ => {}
        }

        let rest = path.strip_prefix("content.")?;
        if let Some(v) = self.content.as_object().and_then(|o| o.get(rest)) {
            return v.as_str();
        }

        let mut current = &self.content;
        for part in rest.split('.') {
            current = current.as_object()?.get(part)?;
        }
        current.as_str()
    }
}
