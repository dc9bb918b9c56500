// Event module
// On-call shift event model with cached layout geometry

use crate::utils::date::{format_display, TimeRef};

/// One rendered strip of an event bar. Events wider than their starting
/// grid row wrap onto following rows as extra segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Grid row the segment is drawn in (0-based body row).
    pub grid_row: usize,
    /// Pixel offset from the left edge of the row.
    pub left: f32,
    pub width: f32,
}

/// Derived display fields, computed once per render pass and cached on the
/// event. Presence of this struct is the "formatted" gate: any change to
/// start/end/role must go through [`ShiftEvent::invalidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct EventLayout {
    /// 1-based stacking row within the conflict table.
    pub row_index: usize,
    /// Vertical pixel offset inside the grid row.
    pub top: f32,
    pub left: f32,
    pub width: f32,
    /// Width overflowing past the starting row, wrapped onto later rows.
    pub leftover: f32,
    pub segments: Vec<Segment>,
    /// DST correction applied to the working end, in hours.
    pub dst_hours: i64,
    pub label: String,
}

/// A scheduled on-call shift.
///
/// `start`/`end` are working values in epoch milliseconds; layout may trim
/// them to the visible grid and shift the end for DST. `orig_start`/
/// `orig_end` always hold the true scheduled instants and are what
/// conflict detection, editing, and the API see.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftEvent {
    /// Backend id; `None` until the event has been saved.
    pub id: Option<i64>,
    pub role: String,
    pub start: i64,
    pub end: i64,
    pub orig_start: i64,
    pub orig_end: i64,
    pub user: String,
    pub full_name: Option<String>,
    pub team: Option<String>,
    pub note: Option<String>,
    /// Events sharing a link id are edited/deleted/swapped as one unit.
    pub link_id: Option<String>,
    /// Generating schedule definition, for auto-generated events.
    pub parent_id: Option<i64>,
    pub schedule_id: Option<i64>,
    /// Outside the visible grid range entirely; excluded from layout.
    pub outside_scope: bool,
    /// Cached derived geometry; `None` means not yet formatted.
    pub layout: Option<EventLayout>,
}

impl ShiftEvent {
    /// Create a new event with required fields.
    ///
    /// Rejects `start >= end`; a zero-length or inverted shift is a
    /// programmer error, not something layout should paper over.
    pub fn new(
        role: impl Into<String>,
        user: impl Into<String>,
        start: i64,
        end: i64,
    ) -> Result<Self, String> {
        if start >= end {
            return Err("Event start must be before its end".to_string());
        }
        Ok(Self {
            id: None,
            role: role.into(),
            start,
            end,
            orig_start: start,
            orig_end: end,
            user: user.into(),
            full_name: None,
            team: None,
            note: None,
            link_id: None,
            parent_id: None,
            schedule_id: None,
            outside_scope: false,
            layout: None,
        })
    }

    pub fn builder() -> ShiftEventBuilder {
        ShiftEventBuilder::default()
    }

    /// Whether this event has cached display geometry.
    pub fn formatted(&self) -> bool {
        self.layout.is_some()
    }

    /// Drop cached geometry and restore working times from the originals.
    /// Must be called whenever start/end/role change.
    pub fn invalidate(&mut self) {
        self.layout = None;
        self.outside_scope = false;
        self.start = self.orig_start;
        self.end = self.orig_end;
    }

    /// Rewrite the scheduled times, keeping working and original values in
    /// step and invalidating cached geometry.
    pub fn reschedule(&mut self, start: i64, end: i64) {
        self.orig_start = start;
        self.orig_end = end;
        self.invalidate();
    }

    /// Open-interval overlap on the original (untrimmed) times. Touching
    /// endpoints do not conflict.
    pub fn overlaps(&self, other: &ShiftEvent) -> bool {
        self.orig_start < other.orig_end && self.orig_end > other.orig_start
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Preferred display subject: full name when known, else username.
    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(full_name) if !full_name.is_empty() => full_name,
            _ => &self.user,
        }
    }

    /// Label rendered on the event bar and in tooltips, always built from
    /// the original times.
    pub fn display_label(&self, tz: TimeRef) -> String {
        format!(
            "{} {} to {}",
            self.display_name(),
            format_display(tz.wall(self.orig_start)),
            format_display(tz.wall(self.orig_end))
        )
    }
}

/// Builder for events with optional fields.
#[derive(Debug, Default)]
pub struct ShiftEventBuilder {
    id: Option<i64>,
    role: Option<String>,
    user: Option<String>,
    start: Option<i64>,
    end: Option<i64>,
    full_name: Option<String>,
    team: Option<String>,
    note: Option<String>,
    link_id: Option<String>,
    parent_id: Option<i64>,
    schedule_id: Option<i64>,
}

impl ShiftEventBuilder {
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: i64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn link_id(mut self, link_id: impl Into<String>) -> Self {
        self.link_id = Some(link_id.into());
        self
    }

    pub fn parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn schedule_id(mut self, schedule_id: i64) -> Self {
        self.schedule_id = Some(schedule_id);
        self
    }

    pub fn build(self) -> Result<ShiftEvent, String> {
        let role = self.role.ok_or("Event role is required")?;
        let user = self.user.ok_or("Event user is required")?;
        let start = self.start.ok_or("Event start is required")?;
        let end = self.end.ok_or("Event end is required")?;

        let mut event = ShiftEvent::new(role, user, start, end)?;
        event.id = self.id;
        event.full_name = self.full_name;
        event.team = self.team;
        event.note = self.note;
        event.link_id = self.link_id;
        event.parent_id = self.parent_id;
        event.schedule_id = self.schedule_id;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::MS_PER_HOUR;

    fn event(start: i64, end: i64) -> ShiftEvent {
        ShiftEvent::new("primary", "jdoe", start, end).unwrap()
    }

    #[test]
    fn test_new_event() {
        let ev = event(0, MS_PER_HOUR);
        assert_eq!(ev.role, "primary");
        assert_eq!(ev.user, "jdoe");
        assert_eq!(ev.start, ev.orig_start);
        assert!(!ev.formatted());
    }

    #[test]
    fn test_rejects_inverted_times() {
        assert!(ShiftEvent::new("primary", "jdoe", 100, 100).is_err());
        assert!(ShiftEvent::new("primary", "jdoe", 100, 50).is_err());
    }

    #[test]
    fn test_invalidate_restores_working_times() {
        let mut ev = event(0, 10 * MS_PER_HOUR);
        ev.start = MS_PER_HOUR;
        ev.end = 9 * MS_PER_HOUR;
        ev.layout = Some(EventLayout {
            row_index: 1,
            top: 22.0,
            left: 0.0,
            width: 10.0,
            leftover: 0.0,
            segments: vec![],
            dst_hours: 0,
            label: String::new(),
        });

        ev.invalidate();
        assert_eq!(ev.start, 0);
        assert_eq!(ev.end, 10 * MS_PER_HOUR);
        assert!(!ev.formatted());
    }

    #[test]
    fn test_overlap_open_intervals() {
        let a = event(0, 10);
        let b = event(10, 20);
        let c = event(5, 15);
        // touching endpoints never conflict
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_overlap_uses_original_times() {
        let mut a = event(0, 10);
        let b = event(8, 20);
        // trim the working end below b's start; originals still conflict
        a.end = 5;
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let mut ev = event(0, 10);
        assert_eq!(ev.display_name(), "jdoe");
        ev.full_name = Some("Jane Doe".to_string());
        assert_eq!(ev.display_name(), "Jane Doe");
        ev.full_name = Some(String::new());
        assert_eq!(ev.display_name(), "jdoe");
    }

    #[test]
    fn test_builder_requires_core_fields() {
        let err = ShiftEvent::builder().role("primary").build();
        assert!(err.is_err());

        let ev = ShiftEvent::builder()
            .role("secondary")
            .user("asmith")
            .start(0)
            .end(MS_PER_HOUR)
            .link_id("L1")
            .build()
            .unwrap();
        assert_eq!(ev.link_id.as_deref(), Some("L1"));
    }
}
