// Test fixtures - reusable test data
// Shared event and calendar builders across the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;

use oncall_calendar::engine::Calendar;
use oncall_calendar::models::event::ShiftEvent;
use oncall_calendar::models::settings::{CalendarConfig, ConfigOverrides};
use oncall_calendar::utils::date::TimeRef;

pub fn utc() -> TimeRef {
    TimeRef::from_name(Some("UTC"))
}

/// Instant for a UTC wall-clock time in August 2025, the month most
/// tests render.
pub fn aug_ms(day: u32, hour: u32) -> i64 {
    utc()
        .instant(
            NaiveDate::from_ymd_opt(2025, 8, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
        )
        .unwrap()
}

/// A calendar pinned to August 2025 in UTC with default roles.
pub fn august_calendar() -> Calendar {
    let overrides = ConfigOverrides {
        reference_date: NaiveDate::from_ymd_opt(2025, 8, 15),
        timezone: Some("UTC".to_string()),
        ..Default::default()
    };
    Calendar::new(CalendarConfig::resolve(None, overrides))
}

pub fn shift(id: i64, role: &str, start: i64, end: i64) -> ShiftEvent {
    let mut event = ShiftEvent::new(role, "jdoe", start, end).unwrap();
    event.id = Some(id);
    event
}

/// Three consecutive events sharing one link id, the shape a 12-hour
/// split produces.
pub fn linked_trio(first_id: i64, link: &str, start: i64, shift_ms: i64) -> Vec<ShiftEvent> {
    (0..3)
        .map(|i| {
            let mut event = shift(
                first_id + i,
                "primary",
                start + i * shift_ms,
                start + (i + 1) * shift_ms,
            );
            event.link_id = Some(link.to_string());
            event
        })
        .collect()
}
