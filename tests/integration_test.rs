// Integration tests driving the library the way the app shell does:
// fetch -> layout -> navigate -> mutate, plus settings persistence and
// the wire boundary.

mod fixtures;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use fixtures::{aug_ms, august_calendar, linked_trio, shift, utc};
use oncall_calendar::engine::{EventRef, EventUpdate};
use oncall_calendar::models::settings::{PersistedSettings, ViewType};
use oncall_calendar::services::api::wire::WireEvent;
use oncall_calendar::services::event::{split_twelve_hour, CreateRequest, EventForm};
use oncall_calendar::services::settings::SettingsStore;
use oncall_calendar::utils::date::{MS_PER_DAY, MS_PER_HOUR};

#[test]
fn test_fetch_layout_navigate_cycle() {
    let mut cal = august_calendar();
    cal.apply_fetch(Ok(vec![
        shift(1, "primary", aug_ms(4, 0), aug_ms(11, 0)),
        shift(2, "secondary", aug_ms(4, 0), aug_ms(11, 0)),
    ]));

    assert!(cal.events().iter().all(|e| e.formatted()));
    assert_eq!(cal.report().rows_used, 2);

    // step into September; the window moves and a redraw restores the
    // events' original times for the next fetch cycle
    cal.step(true);
    use chrono::Datelike;
    let (start, _) = cal.fetch_window().unwrap();
    assert_eq!(
        utc().wall_date(start),
        cal.grid().cell(0).unwrap().date.unwrap()
    );
    assert_eq!(cal.state().cursor.month(), 9);
    for event in cal.events() {
        assert_eq!(event.start, event.orig_start);
    }
}

#[test]
fn test_create_flow_from_form_to_collection() {
    let mut cal = august_calendar();
    cal.apply_fetch(Ok(vec![]));

    let mut form = EventForm::from_range(aug_ms(4, 8), aug_ms(5, 20), utc());
    form.role = "primary".to_string();
    form.user = "jdoe".to_string();
    form.twelve_hour = true;

    let request = form.create_request(utc(), Some("sre")).unwrap();
    let CreateRequest::Linked(writes) = request else {
        panic!("12-hour mode must produce a linked batch");
    };
    assert_eq!(writes.len(), 3);

    let events = writes
        .iter()
        .map(|w| w.to_event().unwrap())
        .collect::<Vec<_>>();
    cal.apply_batch(events);
    assert_eq!(cal.events().len(), 3);
    assert!(cal.events().iter().all(|e| e.formatted()));
    // shifts are contiguous, so they share one stacking row
    assert_eq!(cal.report().rows_used, 1);
}

#[test]
fn test_linked_delete_empties_collection_and_slots() {
    let mut cal = august_calendar();
    cal.apply_fetch(Ok(linked_trio(1, "L1", aug_ms(4, 8), 12 * MS_PER_HOUR)));
    assert_eq!(cal.events().len(), 3);

    cal.apply_delete(EventRef { id: 1, linked: true }).unwrap();
    assert!(cal.events().is_empty());
    cal.render();
    assert_eq!(cal.report().rows_used, 0);
}

#[test]
fn test_edit_breaks_link_and_survives_relayout() {
    let mut cal = august_calendar();
    cal.apply_fetch(Ok(linked_trio(1, "L1", aug_ms(4, 8), 12 * MS_PER_HOUR)));

    cal.apply_update(
        2,
        EventUpdate {
            user: Some("asmith".to_string()),
            start: Some(aug_ms(10, 8)),
            end: Some(aug_ms(10, 20)),
            ..Default::default()
        },
        false,
    )
    .unwrap();

    let edited = cal.event(2).unwrap();
    assert_eq!(edited.link_id, None);
    assert_eq!(edited.user, "asmith");
    assert_eq!(edited.orig_start, aug_ms(10, 8));
    assert!(edited.formatted());
    assert_eq!(cal.event(1).unwrap().link_id.as_deref(), Some("L1"));
}

#[test]
fn test_swap_between_groups() {
    let mut cal = august_calendar();
    let mut events = linked_trio(1, "L1", aug_ms(4, 8), 12 * MS_PER_HOUR);
    let mut solo = shift(9, "primary", aug_ms(20, 8), aug_ms(21, 8));
    solo.user = "asmith".to_string();
    events.push(solo);
    cal.apply_fetch(Ok(events));

    cal.apply_swap(
        EventRef { id: 1, linked: true },
        EventRef { id: 9, linked: false },
    )
    .unwrap();

    for id in [1, 2, 3] {
        assert_eq!(cal.event(id).unwrap().user, "asmith");
        assert_eq!(cal.event(id).unwrap().link_id.as_deref(), Some("L1"));
    }
    assert_eq!(cal.event(9).unwrap().user, "jdoe");
}

#[test]
fn test_view_switch_and_template_layout() {
    let mut cal = august_calendar();
    cal.switch_view(ViewType::Template);
    assert_eq!(cal.fetch_window(), None);

    // a template event in week 2 folds onto the second grid row
    let start = 7 * MS_PER_DAY + 8 * MS_PER_HOUR;
    cal.apply_fetch(Ok(vec![shift(1, "primary", start, start + 8 * MS_PER_HOUR)]));
    let layout = cal.events()[0].layout.as_ref().unwrap();
    assert_eq!(layout.segments[0].grid_row, 1);
}

#[test]
fn test_wire_round_trip_is_exact_for_second_aligned_times() {
    let event = shift(5, "secondary", aug_ms(4, 0), aug_ms(4, 12));
    let wire = WireEvent::from_event(&event);
    let back = wire.into_event().unwrap();
    assert_eq!(back.orig_start, event.orig_start);
    assert_eq!(back.orig_end, event.orig_end);
    assert_eq!(back.role, event.role);
}

#[test]
fn test_twelve_hour_split_covers_span() {
    let shifts = split_twelve_hour(aug_ms(4, 8), aug_ms(7, 8), utc());
    assert_eq!(shifts.len(), 6);
    assert_eq!(shifts.first().unwrap().0, aug_ms(4, 8));
    assert_eq!(shifts.last().unwrap().1, aug_ms(7, 8));
    for window in shifts.windows(2) {
        assert_eq!(window[0].1, window[1].0);
    }
}

#[test]
fn test_settings_persistence_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SettingsStore::at_path(dir.path().join("settings.json"), "sre");

    store
        .save(&PersistedSettings {
            current_view: Some(ViewType::Week),
            visible_roles: Some(vec!["primary".to_string()]),
        })
        .unwrap();

    // a fresh store over the same file sees the same settings
    let reopened = SettingsStore::at_path(dir.path().join("settings.json"), "sre");
    let loaded = reopened.load();
    assert_eq!(loaded.current_view, Some(ViewType::Week));
    assert_eq!(loaded.visible_roles, Some(vec!["primary".to_string()]));
}

#[test]
fn test_dst_shortened_shift_keeps_wall_duration() {
    use oncall_calendar::models::settings::{CalendarConfig, ConfigOverrides};
    let overrides = ConfigOverrides {
        reference_date: NaiveDate::from_ymd_opt(2025, 3, 9),
        timezone: Some("America/Los_Angeles".to_string()),
        ..Default::default()
    };
    let mut cal = oncall_calendar::engine::Calendar::new(CalendarConfig::resolve(None, overrides));

    let tz = cal.tz();
    let start = tz
        .instant(
            NaiveDate::from_ymd_opt(2025, 3, 8)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
        )
        .unwrap();
    let end = tz
        .instant(
            NaiveDate::from_ymd_opt(2025, 3, 9)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
        .unwrap();
    // absolute duration is 11h across the spring-forward gap
    assert_eq!(end - start, 11 * MS_PER_HOUR);

    cal.apply_fetch(Ok(vec![shift(1, "primary", start, end)]));
    let event = &cal.events()[0];
    assert_eq!(event.layout.as_ref().unwrap().dst_hours, 1);
    // rendered duration matches the 12-hour wall-clock span
    assert_eq!(event.end - event.start, 12 * MS_PER_HOUR);
}
