//! REST client for the scheduling backend.
//!
//! One blocking client built up front with a timeout; every call returns
//! an [`ApiError`] whose display string is safe to surface inline in a
//! modal. Time conversion lives entirely in [`wire`].

pub mod wire;

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use thiserror::Error;

use crate::engine::EventRef;
use crate::models::event::ShiftEvent;

use wire::{range_query, since_query, EventPatch, EventWrite, WireEvent};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// User-presentable request failure. The backend's own `description` wins
/// when it sends one; everything else collapses to a generic message.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Backend(String),
    #[error("Request failed")]
    Request,
}

#[derive(Debug, Deserialize)]
struct BackendError {
    description: String,
}

/// POST `/link` response: the new group id plus backend ids in the same
/// order the events were submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkResponse {
    pub link_id: String,
    pub event_ids: Vec<i64>,
}

#[derive(Debug, serde::Serialize)]
struct SwapSide {
    id: i64,
    linked: bool,
}

impl From<EventRef> for SwapSide {
    fn from(value: EventRef) -> Self {
        Self {
            id: value.id,
            linked: value.linked,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct SwapRequest {
    events: [SwapSide; 2],
}

#[derive(Debug, serde::Serialize)]
struct OverrideRequest {
    #[serde(flatten)]
    event: EventWrite,
    event_ids: Vec<i64>,
}

pub struct ApiClient {
    client: Client,
    events_url: String,
}

impl ApiClient {
    pub fn new(events_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build calendar HTTP client")?;
        Ok(Self {
            client,
            events_url: events_url.into(),
        })
    }

    /// Events overlapping `[start_ms, end_ms)`. Structurally invalid
    /// events in the response are dropped with a warning rather than
    /// failing the whole fetch.
    pub fn fetch_events(&self, start_ms: i64, end_ms: i64) -> Result<Vec<ShiftEvent>, ApiError> {
        let response = self
            .client
            .get(&self.events_url)
            .query(&range_query(start_ms, end_ms))
            .send()
            .map_err(log_transport)?;
        parse_events(check(response)?)
    }

    /// Events starting at or after `start_ms`; the swap-candidate pool.
    pub fn fetch_swap_candidates(&self, start_ms: i64) -> Result<Vec<ShiftEvent>, ApiError> {
        let response = self
            .client
            .get(&self.events_url)
            .query(&since_query(start_ms))
            .send()
            .map_err(log_transport)?;
        parse_events(check(response)?)
    }

    /// Create one event, returning its backend id.
    pub fn create(&self, event: &EventWrite) -> Result<i64, ApiError> {
        let response = self
            .client
            .post(&self.events_url)
            .json(event)
            .send()
            .map_err(log_transport)?;
        check(response)?.json::<i64>().map_err(log_decode)
    }

    /// Create a linked batch (the 12-hour split) in one call.
    pub fn create_linked(&self, events: &[EventWrite]) -> Result<LinkResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/link", self.events_url))
            .json(&serde_json::json!({ "events": events }))
            .send()
            .map_err(log_transport)?;
        check(response)?.json().map_err(log_decode)
    }

    /// Substitute over existing events; returns the replacement events the
    /// backend carved out of the overridden ones.
    pub fn create_override(
        &self,
        event: EventWrite,
        overridden_ids: Vec<i64>,
    ) -> Result<Vec<ShiftEvent>, ApiError> {
        let body = OverrideRequest {
            event,
            event_ids: overridden_ids,
        };
        let response = self
            .client
            .post(format!("{}/override", self.events_url))
            .json(&body)
            .send()
            .map_err(log_transport)?;
        parse_events(check(response)?)
    }

    pub fn update(&self, id: i64, patch: &EventPatch) -> Result<(), ApiError> {
        self.put(format!("{}/{}", self.events_url, id), patch)
    }

    pub fn update_linked(&self, link_id: &str, patch: &EventPatch) -> Result<(), ApiError> {
        self.put(format!("{}/link/{}", self.events_url, link_id), patch)
    }

    pub fn delete(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.events_url, id))
            .send()
            .map_err(log_transport)?;
        check(response).map(drop)
    }

    pub fn delete_linked(&self, link_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!("{}/link/{}", self.events_url, link_id))
            .send()
            .map_err(log_transport)?;
        check(response).map(drop)
    }

    pub fn swap(&self, a: EventRef, b: EventRef) -> Result<(), ApiError> {
        let body = SwapRequest {
            events: [a.into(), b.into()],
        };
        let response = self
            .client
            .post(format!("{}/swap", self.events_url))
            .json(&body)
            .send()
            .map_err(log_transport)?;
        check(response).map(drop)
    }

    fn put(&self, url: String, patch: &EventPatch) -> Result<(), ApiError> {
        let response = self
            .client
            .put(url)
            .json(patch)
            .send()
            .map_err(log_transport)?;
        check(response).map(drop)
    }
}

/// Map a non-success response to the backend's description when it sent
/// one.
fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    log::warn!("Backend returned {status}: {body}");
    match serde_json::from_str::<BackendError>(&body) {
        Ok(err) => Err(ApiError::Backend(err.description)),
        Err(_) => Err(ApiError::Request),
    }
}

fn parse_events(response: Response) -> Result<Vec<ShiftEvent>, ApiError> {
    let wire: Vec<WireEvent> = response.json().map_err(log_decode)?;
    Ok(wire
        .into_iter()
        .filter_map(|w| match w.into_event() {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("Dropping malformed event from response: {err}");
                None
            }
        })
        .collect())
}

fn log_transport(err: reqwest::Error) -> ApiError {
    log::error!("Transport error: {err}");
    ApiError::Request
}

fn log_decode(err: reqwest::Error) -> ApiError {
    log::error!("Failed to decode response body: {err}");
    ApiError::Request
}
