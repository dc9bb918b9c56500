//! Event form handling: validation of modal input, the 12-hour shift
//! split, and swap-candidate grouping.

use std::collections::HashMap;

use chrono::Duration;

use crate::engine::EventRef;
use crate::models::event::ShiftEvent;
use crate::services::api::wire::EventWrite;
use crate::utils::date::{
    self, format_date_key, parse_date_time_input, TimeRef, MS_PER_DAY, MS_PER_HOUR,
};

/// State of the create/edit modal's input fields. Dates and times are the
/// raw text the user sees; validation happens on submit, before any
/// network call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventForm {
    pub role: String,
    pub user: String,
    pub note: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    /// Split the span into 12-hour shifts, submitted as one linked batch.
    pub twelve_hour: bool,
    /// Substitute over the selected conflicting events.
    pub substitute: bool,
    pub override_ids: Vec<i64>,
}

/// What the create modal submits, decided by the form's mode flags.
/// 12-hour mode and substitution are mutually exclusive; 12-hour wins.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateRequest {
    Single(EventWrite),
    Linked(Vec<EventWrite>),
    Override {
        event: EventWrite,
        overridden: Vec<i64>,
    },
}

impl EventForm {
    /// Seed the form from a drag-selection span.
    pub fn from_range(start_ms: i64, end_ms: i64, tz: TimeRef) -> Self {
        let (start_date, start_time) = field_texts(start_ms, tz, false);
        let (end_date, end_time) = field_texts(end_ms, tz, true);
        Self {
            start_date,
            start_time,
            end_date,
            end_time,
            ..Self::default()
        }
    }

    /// Seed the form from an existing event for editing.
    pub fn from_event(event: &ShiftEvent, tz: TimeRef) -> Self {
        let mut form = Self::from_range(event.orig_start, event.orig_end, tz);
        form.role = event.role.clone();
        form.user = event.user.clone();
        form.note = event.note.clone().unwrap_or_default();
        form
    }

    /// Validate the text fields into an instant range.
    pub fn validate(&self, tz: TimeRef) -> Result<(i64, i64), String> {
        if self.role.trim().is_empty() {
            return Err("Role is required".to_string());
        }
        if self.user.trim().is_empty() {
            return Err("User is required".to_string());
        }
        let start = parse_date_time_input(&self.start_date, &self.start_time, tz)
            .ok_or("Invalid start date/time")?;
        let end = parse_date_time_input(&self.end_date, &self.end_time, tz)
            .ok_or("Invalid end date/time")?;
        if start >= end {
            return Err("Start must be before end".to_string());
        }
        Ok((start, end))
    }

    /// Build the create submission for the current mode.
    pub fn create_request(&self, tz: TimeRef, team: Option<&str>) -> Result<CreateRequest, String> {
        let (start, end) = self.validate(tz)?;

        if self.twelve_hour {
            let writes = split_twelve_hour(start, end, tz)
                .into_iter()
                .map(|(s, e)| self.write(s, e, team))
                .collect();
            return Ok(CreateRequest::Linked(writes));
        }
        if self.substitute {
            if self.override_ids.is_empty() {
                return Err("Select at least one event to substitute over".to_string());
            }
            return Ok(CreateRequest::Override {
                event: self.write(start, end, team),
                overridden: self.override_ids.clone(),
            });
        }
        Ok(CreateRequest::Single(self.write(start, end, team)))
    }

    fn write(&self, start: i64, end: i64, team: Option<&str>) -> EventWrite {
        let mut write = EventWrite::new(self.role.trim(), self.user.trim(), start, end);
        write.team = team.map(str::to_string);
        let note = self.note.trim();
        if !note.is_empty() {
            write.note = Some(note.to_string());
        }
        write
    }
}

/// Render an instant as date/time field text. Range ends landing exactly
/// on midnight display as "24:00" of the previous day, matching how the
/// selection was made.
fn field_texts(ms: i64, tz: TimeRef, is_end: bool) -> (String, String) {
    use chrono::Timelike;
    let wall = tz.wall(ms);
    if is_end && wall.hour() == 0 && wall.minute() == 0 {
        let prev = wall.date() - Duration::days(1);
        return (format_date_key(prev), "24:00".to_string());
    }
    (
        format_date_key(wall.date()),
        format!("{:02}:{:02}", wall.hour(), wall.minute()),
    )
}

/// Split a span into 12-hour shifts.
///
/// Each step computes its end as "start + 1 day − 12 h" in wall-clock
/// terms, so shifts stay pinned to the same clock times across DST
/// transitions instead of drifting by an hour.
pub fn split_twelve_hour(start_ms: i64, end_ms: i64, tz: TimeRef) -> Vec<(i64, i64)> {
    let mut shifts = Vec::new();
    let mut cursor = start_ms;
    while cursor < end_ms {
        let next_day = tz
            .instant(tz.wall(cursor) + Duration::days(1))
            .unwrap_or(cursor + MS_PER_DAY);
        let shift_end = (next_day - 12 * MS_PER_HOUR).min(end_ms);
        if shift_end <= cursor {
            log::warn!("12-hour split made no progress at {cursor}, stopping");
            break;
        }
        shifts.push((cursor, shift_end));
        cursor = shift_end;
    }
    shifts
}

/// One selectable entry in the swap modal.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapCandidate {
    pub event_ref: EventRef,
    pub user: String,
    pub label: String,
}

/// Collapse the candidate pool for the swap picker: linked groups become
/// one entry covering the group's full span, standalone events keep their
/// own. Sorted by start time.
pub fn group_swap_candidates(events: &[ShiftEvent], tz: TimeRef) -> Vec<SwapCandidate> {
    let mut groups: HashMap<&str, Vec<&ShiftEvent>> = HashMap::new();
    let mut singles: Vec<&ShiftEvent> = Vec::new();
    for event in events {
        match event.link_id.as_deref() {
            Some(link_id) => groups.entry(link_id).or_default().push(event),
            None => singles.push(event),
        }
    }

    let mut candidates: Vec<(i64, SwapCandidate)> = Vec::new();

    for event in singles {
        let Some(id) = event.id else { continue };
        candidates.push((
            event.orig_start,
            SwapCandidate {
                event_ref: EventRef { id, linked: false },
                user: event.user.clone(),
                label: event.display_label(tz),
            },
        ));
    }

    for members in groups.values() {
        let Some(first) = members.iter().min_by_key(|e| e.orig_start) else {
            continue;
        };
        let Some(id) = first.id else { continue };
        let start = first.orig_start;
        let end = members.iter().map(|e| e.orig_end).max().unwrap_or(first.orig_end);
        candidates.push((
            start,
            SwapCandidate {
                event_ref: EventRef { id, linked: true },
                user: first.user.clone(),
                label: format!(
                    "{} {} to {} (linked)",
                    first.display_name(),
                    date::format_display(tz.wall(start)),
                    date::format_display(tz.wall(end)),
                ),
            },
        ));
    }

    candidates.sort_by_key(|(start, _)| *start);
    candidates.into_iter().map(|(_, c)| c).collect()
}
