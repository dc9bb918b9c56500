//! Wire representation of events.
//!
//! The backend speaks epoch seconds; everything inside the engine is epoch
//! milliseconds. This module is the only place the two meet. Any new
//! endpoint payload must convert here, never inline.

use serde::{Deserialize, Serialize};

use crate::models::event::ShiftEvent;

const MS_PER_SECOND: i64 = 1000;

fn to_ms(seconds: i64) -> i64 {
    seconds * MS_PER_SECOND
}

fn to_seconds(ms: i64) -> i64 {
    ms / MS_PER_SECOND
}

/// An event as the backend sends and receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Epoch seconds.
    pub start: i64,
    /// Epoch seconds.
    pub end: i64,
    pub role: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl WireEvent {
    /// Cross into engine time. Fails on structurally invalid events
    /// (start >= end), which callers drop with a warning.
    pub fn into_event(self) -> Result<ShiftEvent, String> {
        let mut builder = ShiftEvent::builder()
            .role(self.role)
            .user(self.user)
            .start(to_ms(self.start))
            .end(to_ms(self.end));
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        if let Some(full_name) = self.full_name {
            builder = builder.full_name(full_name);
        }
        if let Some(team) = self.team {
            builder = builder.team(team);
        }
        if let Some(link_id) = self.link_id {
            builder = builder.link_id(link_id);
        }
        if let Some(parent_id) = self.parent_id {
            builder = builder.parent_id(parent_id);
        }
        if let Some(schedule_id) = self.schedule_id {
            builder = builder.schedule_id(schedule_id);
        }
        if let Some(note) = self.note {
            builder = builder.note(note);
        }
        builder.build()
    }

    pub fn from_event(event: &ShiftEvent) -> Self {
        Self {
            id: event.id,
            start: to_seconds(event.orig_start),
            end: to_seconds(event.orig_end),
            role: event.role.clone(),
            user: event.user.clone(),
            full_name: event.full_name.clone(),
            team: event.team.clone(),
            link_id: event.link_id.clone(),
            parent_id: event.parent_id,
            schedule_id: event.schedule_id,
            note: event.note.clone(),
        }
    }
}

/// Create/edit payload. Times are engine milliseconds on construction and
/// wire seconds in the serialized body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWrite {
    pub start: i64,
    pub end: i64,
    pub role: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EventWrite {
    /// Local event mirroring what this write will create, used to update
    /// the collection without a refetch.
    pub fn to_event(&self) -> Result<ShiftEvent, String> {
        let mut event = ShiftEvent::new(
            self.role.clone(),
            self.user.clone(),
            to_ms(self.start),
            to_ms(self.end),
        )?;
        event.team = self.team.clone();
        event.note = self.note.clone();
        Ok(event)
    }

    pub fn new(
        role: impl Into<String>,
        user: impl Into<String>,
        start_ms: i64,
        end_ms: i64,
    ) -> Self {
        Self {
            start: to_seconds(start_ms),
            end: to_seconds(end_ms),
            role: role.into(),
            user: user.into(),
            team: None,
            note: None,
        }
    }
}

/// Partial update body for PUT; absent fields are left untouched by the
/// backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl EventPatch {
    pub fn start_ms(mut self, ms: i64) -> Self {
        self.start = Some(to_seconds(ms));
        self
    }

    pub fn end_ms(mut self, ms: i64) -> Self {
        self.end = Some(to_seconds(ms));
        self
    }
}

/// Range query parameters, converted from the grid's instant window.
pub fn range_query(start_ms: i64, end_ms: i64) -> [(&'static str, i64); 2] {
    // fetch everything overlapping the window: ends at-or-after the window
    // start and starts before the window end
    [("end__ge", to_seconds(start_ms)), ("start__lt", to_seconds(end_ms))]
}

pub fn since_query(start_ms: i64) -> [(&'static str, i64); 1] {
    [("start__ge", to_seconds(start_ms))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::MS_PER_HOUR;

    #[test]
    fn test_seconds_to_ms_round_trip_is_exact() {
        let wire = WireEvent {
            id: Some(7),
            start: 1_755_000_000,
            end: 1_755_043_200,
            role: "primary".to_string(),
            user: "jdoe".to_string(),
            full_name: Some("Jane Doe".to_string()),
            team: Some("sre".to_string()),
            link_id: None,
            parent_id: None,
            schedule_id: Some(3),
            note: None,
        };
        let event = wire.clone().into_event().unwrap();
        assert_eq!(event.orig_start, 1_755_000_000_000);
        assert_eq!(event.orig_end, 1_755_043_200_000);
        assert_eq!(WireEvent::from_event(&event), wire);
    }

    #[test]
    fn test_invalid_wire_event_rejected() {
        let wire = WireEvent {
            id: None,
            start: 100,
            end: 100,
            role: "primary".to_string(),
            user: "jdoe".to_string(),
            full_name: None,
            team: None,
            link_id: None,
            parent_id: None,
            schedule_id: None,
            note: None,
        };
        assert!(wire.into_event().is_err());
    }

    #[test]
    fn test_wire_event_deserializes_sparse_json() {
        let event: WireEvent = serde_json::from_str(
            r#"{"id": 1, "start": 10, "end": 20, "role": "primary", "user": "jdoe"}"#,
        )
        .unwrap();
        assert_eq!(event.full_name, None);
        assert_eq!(event.into_event().unwrap().orig_end, 20_000);
    }

    #[test]
    fn test_event_write_serializes_seconds() {
        let write = EventWrite::new("primary", "jdoe", 2 * MS_PER_HOUR, 4 * MS_PER_HOUR);
        let json = serde_json::to_value(&write).unwrap();
        assert_eq!(json["start"], 7200);
        assert_eq!(json["end"], 14400);
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_patch_omits_unset_fields() {
        let patch = EventPatch {
            user: Some("asmith".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"user":"asmith"}"#);
    }

    #[test]
    fn test_range_query_seconds() {
        let query = range_query(10_000, 20_000);
        assert_eq!(query, [("end__ge", 10), ("start__lt", 20)]);
    }
}
