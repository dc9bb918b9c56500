//! Event layout engine.
//!
//! Turns the event collection plus a rendered grid into per-event stacking
//! rows and pixel geometry. One pass runs strictly in order: sort, trim,
//! DST-correct, assign rows, compute geometry. Results are cached on each
//! event behind its `formatted` gate; a full redraw invalidates everything
//! and rebuilds the row-slot table.

use crate::engine::grid::{Grid, DAYS_PER_WEEK, HOURS_PER_DAY};
use crate::engine::slots::RowSlots;
use crate::models::event::{EventLayout, Segment, ShiftEvent};
use crate::models::role::RoleCatalog;
use crate::models::settings::ViewType;
use crate::utils::date::{TimeRef, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_WEEK};

/// Pixel parameters of the rendered grid.
#[derive(Debug, Clone, Copy)]
pub struct LayoutMetrics {
    /// Width of the day-cell area, excluding the week-view label column.
    pub grid_width: f32,
    /// Day-label column width; zero outside week view.
    pub label_width: f32,
    /// Height of one stacked event bar.
    pub event_height: f32,
    /// Unexpanded cell height; bounds how many rows fit before cells grow.
    pub base_cell_height: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            grid_width: 700.0,
            label_width: 0.0,
            event_height: 22.0,
            base_cell_height: 66.0,
        }
    }
}

impl LayoutMetrics {
    /// Pixels per hour for the given view: a month/template row spans a
    /// 168-hour week, a week-view row spans one 24-hour day.
    pub fn px_per_hour(&self, view: ViewType) -> f32 {
        match view {
            ViewType::Week => self.grid_width / HOURS_PER_DAY as f32,
            ViewType::Month | ViewType::Template => {
                self.grid_width / (DAYS_PER_WEEK * HOURS_PER_DAY) as f32
            }
        }
    }

    pub fn day_width(&self) -> f32 {
        self.grid_width / DAYS_PER_WEEK as f32
    }
}

/// Outcome of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutReport {
    /// Distinct stacking rows in use after the pass.
    pub rows_used: usize,
    /// Rows beyond what the base cell height can hold.
    pub extra_rows: usize,
    /// Uniform cell height needed so no event segment is clipped.
    pub cell_height: f32,
}

/// Lay out every unformatted event against the grid, mutating cached
/// geometry in place. Formatted events are untouched; their row-slot
/// entries are still live from the pass that placed them.
pub fn layout_events(
    events: &mut [ShiftEvent],
    grid: &mut Grid,
    slots: &mut RowSlots,
    catalog: &RoleCatalog,
    metrics: &LayoutMetrics,
    tz: TimeRef,
) -> LayoutReport {
    // Load-bearing ordering: row assignment scans greedily in this order,
    // and ties fall back to insertion order via the stable sort.
    events.sort_by(|a, b| {
        catalog
            .display_order(&a.role)
            .cmp(&catalog.display_order(&b.role))
            .then(a.orig_start.cmp(&b.orig_start))
    });

    match grid.view() {
        ViewType::Template => layout_template(events, grid, slots, metrics),
        _ => layout_dated(events, grid, slots, metrics, tz),
    }

    report(slots, metrics)
}

fn report(slots: &RowSlots, metrics: &LayoutMetrics) -> LayoutReport {
    let rows_used = slots.row_count();
    let capacity = ((metrics.base_cell_height / metrics.event_height) as usize).max(1);
    let extra_rows = rows_used.saturating_sub(capacity);
    LayoutReport {
        rows_used,
        extra_rows,
        cell_height: metrics.base_cell_height + extra_rows as f32 * metrics.event_height,
    }
}

fn layout_dated(
    events: &mut [ShiftEvent],
    grid: &Grid,
    slots: &mut RowSlots,
    metrics: &LayoutMetrics,
    tz: TimeRef,
) {
    let (Some(grid_start), Some(grid_end)) = (grid.start_instant(), grid.end_instant()) else {
        log::warn!("Dated grid without instants, skipping layout");
        return;
    };
    let pph = metrics.px_per_hour(grid.view());

    for event in events.iter_mut() {
        if event.formatted() || event.outside_scope {
            continue;
        }

        // Trim the working range to the visible grid; originals stay put.
        if event.end < grid_start || event.start > grid_end {
            event.outside_scope = true;
            continue;
        }
        event.start = event.start.max(grid_start);
        event.end = event.end.min(grid_end);

        // DST correction keeps the rendered duration on wall-clock terms.
        let dst_hours = tz.dst_correction_hours(event.start, event.end);
        event.end += dst_hours * MS_PER_HOUR;

        let row_index = slots.assign(event);

        let wall = tz.wall(event.start);
        let start_date = wall.date();
        let fractional_hour = chrono::Timelike::hour(&wall) as f32
            + chrono::Timelike::minute(&wall) as f32 / 60.0;

        // An event with no matching anchor cell degrades to the grid's
        // first cell rather than failing the render.
        let anchor = grid
            .cell_for_date(start_date)
            .or_else(|| grid.cell(0))
            .cloned();
        let Some(anchor) = anchor else {
            continue;
        };

        let anchor_left = match grid.view() {
            ViewType::Week => metrics.label_width,
            _ => anchor.col as f32 * metrics.day_width(),
        };
        let left = (anchor_left + fractional_hour * pph).floor();
        let width = (event.end - event.start) as f32 / MS_PER_HOUR as f32 * pph;
        let leftover = (width - (metrics.grid_width + metrics.label_width - left)).max(0.0);

        let wrap_left = match grid.view() {
            ViewType::Week => metrics.label_width,
            _ => 0.0,
        };
        let segments = build_segments(
            anchor.row,
            left,
            width,
            leftover,
            wrap_left,
            metrics.grid_width,
            grid.row_count(),
        );

        event.layout = Some(EventLayout {
            row_index,
            top: row_index as f32 * metrics.event_height,
            left,
            width,
            leftover,
            segments,
            dst_hours,
            label: event.display_label(tz),
        });
    }
}

/// Template layout: value-based offsets from a fixed week epoch. Events in
/// later weeks fold back onto their own grid row via modulo-week
/// arithmetic; rows are grown on demand.
fn layout_template(
    events: &mut [ShiftEvent],
    grid: &mut Grid,
    slots: &mut RowSlots,
    metrics: &LayoutMetrics,
) {
    let pph = metrics.px_per_hour(ViewType::Template);
    let mut max_row_needed = grid.row_count();

    for event in events.iter_mut() {
        if event.formatted() {
            continue;
        }

        let week_index = (event.orig_start.div_euclid(MS_PER_WEEK)).max(0) as usize;
        let fold = week_index as i64 * MS_PER_WEEK;
        let d_start = event.start - fold;
        let d_end = event.end - fold;

        let hours = (d_start / MS_PER_HOUR) as f32;
        let minutes = ((d_start % MS_PER_HOUR) / MS_PER_MINUTE) as f32;

        let row_index = slots.assign(event);
        let left = ((hours + minutes / 60.0) * pph).floor();
        let width = (d_end - d_start) as f32 / MS_PER_HOUR as f32 * pph;
        let leftover = (width - (metrics.grid_width - left)).max(0.0);
        let row_span = 1 + (leftover / metrics.grid_width).ceil() as usize;
        max_row_needed = max_row_needed.max(week_index + row_span);

        event.layout = Some(EventLayout {
            row_index,
            top: (row_index as f32 - 1.0) * metrics.event_height + 2.0,
            left,
            width,
            leftover,
            segments: build_segments(
                week_index,
                left,
                width,
                leftover,
                0.0,
                metrics.grid_width,
                usize::MAX,
            ),
            dst_hours: 0,
            label: event.display_name().to_string(),
        });
    }

    if max_row_needed > grid.row_count() {
        grid.add_rows(max_row_needed - grid.row_count());
    }
}

/// Split an event bar into its starting strip plus full-width wrapped
/// strips on the following rows, ending with the remainder.
fn build_segments(
    start_row: usize,
    left: f32,
    width: f32,
    leftover: f32,
    wrap_left: f32,
    row_width: f32,
    row_limit: usize,
) -> Vec<Segment> {
    let mut segments = vec![Segment {
        grid_row: start_row,
        left,
        width: width - leftover,
    }];

    let mut remaining = leftover;
    let mut row = start_row + 1;
    while remaining > 0.0 && row < row_limit {
        segments.push(Segment {
            grid_row: row,
            left: wrap_left,
            width: remaining.min(row_width),
        });
        remaining -= row_width;
        row += 1;
    }

    segments
}

/// Reset cached geometry ahead of a full redraw: every event reverts to
/// its original times and the row-slot table is rebuilt from scratch.
pub fn invalidate_all(events: &mut [ShiftEvent], slots: &mut RowSlots) {
    for event in events.iter_mut() {
        event.invalidate();
    }
    slots.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc() -> TimeRef {
        TimeRef::from_name(Some("UTC"))
    }

    fn metrics() -> LayoutMetrics {
        LayoutMetrics {
            grid_width: 672.0, // day width 96, month pph 4
            label_width: 0.0,
            event_height: 22.0,
            base_cell_height: 66.0,
        }
    }

    fn ms(y: i32, mo: u32, d: u32, h: u32) -> i64 {
        utc()
            .instant(
                NaiveDate::from_ymd_opt(y, mo, d)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap(),
            )
            .unwrap()
    }

    fn august_grid() -> Grid {
        Grid::month(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(), 0, utc())
    }

    fn event(role: &str, start: i64, end: i64) -> ShiftEvent {
        static NEXT: std::sync::atomic::AtomicI64 = std::sync::atomic::AtomicI64::new(1);
        let mut ev = ShiftEvent::new(role, "jdoe", start, end).unwrap();
        ev.id = Some(NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed));
        ev
    }

    fn run(events: &mut Vec<ShiftEvent>, grid: &mut Grid) -> (RowSlots, LayoutReport) {
        let mut slots = RowSlots::new();
        let catalog = RoleCatalog::default();
        let report = layout_events(
            events,
            grid,
            &mut slots,
            &catalog,
            &metrics(),
            utc(),
        );
        (slots, report)
    }

    #[test]
    fn test_sort_role_order_beats_start_time() {
        let mut events = vec![
            event("secondary", ms(2025, 8, 4, 0), ms(2025, 8, 5, 0)),
            event("primary", ms(2025, 8, 6, 0), ms(2025, 8, 7, 0)),
        ];
        let mut grid = august_grid();
        run(&mut events, &mut grid);
        assert_eq!(events[0].role, "primary");
        assert_eq!(events[1].role, "secondary");
    }

    #[test]
    fn test_single_day_event_geometry() {
        // Aug 1 2025 is a Friday: row 0, col 5
        let mut events = vec![event("primary", ms(2025, 8, 1, 0), ms(2025, 8, 2, 0))];
        let mut grid = august_grid();
        run(&mut events, &mut grid);

        let layout = events[0].layout.as_ref().unwrap();
        assert_eq!(layout.left, 480.0); // 5 * 96
        assert_eq!(layout.width, 96.0); // 24h * 4 px/h
        assert_eq!(layout.leftover, 0.0);
        assert_eq!(layout.segments.len(), 1);
        assert_eq!(layout.segments[0].grid_row, 0);
        assert_eq!(layout.row_index, 1);
        assert_eq!(layout.top, 22.0);
    }

    #[test]
    fn test_multi_row_event_wraps() {
        // Aug 1 .. Aug 4 crosses the Fri/Sat row boundary into week 2
        let mut events = vec![event("primary", ms(2025, 8, 1, 0), ms(2025, 8, 4, 0))];
        let mut grid = august_grid();
        run(&mut events, &mut grid);

        let layout = events[0].layout.as_ref().unwrap();
        assert_eq!(layout.width, 288.0);
        assert_eq!(layout.leftover, 96.0);
        assert_eq!(layout.segments.len(), 2);
        assert_eq!(layout.segments[0].width, 192.0);
        assert_eq!(layout.segments[1].grid_row, 1);
        assert_eq!(layout.segments[1].left, 0.0);
        assert_eq!(layout.segments[1].width, 96.0);
    }

    #[test]
    fn test_fractional_hour_offset() {
        let start = ms(2025, 8, 3, 6) + 30 * MS_PER_MINUTE; // Sunday 06:30
        let mut events = vec![event("primary", start, ms(2025, 8, 3, 12))];
        let mut grid = august_grid();
        run(&mut events, &mut grid);

        let layout = events[0].layout.as_ref().unwrap();
        // Sunday col 0 of row 1; 6.5h * 4 px/h = 26
        assert_eq!(layout.left, 26.0);
        assert_eq!(layout.segments[0].grid_row, 1);
    }

    #[test]
    fn test_trim_clamps_working_times_only() {
        let before_grid = ms(2025, 7, 20, 0);
        let inside = ms(2025, 8, 5, 0);
        let mut events = vec![event("primary", before_grid, inside)];
        let mut grid = august_grid();
        let grid_start = grid.start_instant().unwrap();
        run(&mut events, &mut grid);

        assert_eq!(events[0].start, grid_start);
        assert_eq!(events[0].orig_start, before_grid);
        assert!(!events[0].outside_scope);
    }

    #[test]
    fn test_trim_is_idempotent_for_inside_events() {
        let start = ms(2025, 8, 10, 0);
        let end = ms(2025, 8, 11, 0);
        let mut events = vec![event("primary", start, end)];
        let mut grid = august_grid();
        run(&mut events, &mut grid);
        assert_eq!(events[0].start, start);
        assert_eq!(events[0].end, end);
    }

    #[test]
    fn test_outside_scope_events_excluded() {
        let mut events = vec![event("primary", ms(2025, 10, 1, 0), ms(2025, 10, 2, 0))];
        let mut grid = august_grid();
        let (slots, _) = run(&mut events, &mut grid);

        assert!(events[0].outside_scope);
        assert!(!events[0].formatted());
        assert_eq!(slots.row_count(), 0);
        // originals untouched for display/edit purposes
        assert_eq!(events[0].orig_start, ms(2025, 10, 1, 0));
    }

    #[test]
    fn test_overlapping_same_role_events_stack() {
        let mut events = vec![
            event("primary", ms(2025, 8, 4, 0), ms(2025, 8, 6, 0)),
            event("primary", ms(2025, 8, 5, 0), ms(2025, 8, 7, 0)),
        ];
        let mut grid = august_grid();
        run(&mut events, &mut grid);

        let rows: Vec<usize> = events
            .iter()
            .map(|e| e.layout.as_ref().unwrap().row_index)
            .collect();
        assert_eq!(rows, vec![1, 2]);
    }

    #[test]
    fn test_row_growth_report() {
        // five mutually overlapping events exceed the 3-row base capacity
        let mut events: Vec<ShiftEvent> = (0..5)
            .map(|_| event("primary", ms(2025, 8, 4, 0), ms(2025, 8, 5, 0)))
            .collect();
        let mut grid = august_grid();
        let (_, report) = run(&mut events, &mut grid);

        assert_eq!(report.rows_used, 5);
        assert_eq!(report.extra_rows, 2);
        assert_eq!(report.cell_height, 66.0 + 2.0 * 22.0);
    }

    #[test]
    fn test_dst_correction_applied_to_working_end() {
        let tz = TimeRef::from_name(Some("America/Los_Angeles"));
        let mut grid = Grid::month(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(), 0, tz);
        // spans the 2025-03-09 02:00 spring-forward
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
        let mut events = vec![event("primary", start, end)];
        let mut slots = RowSlots::new();
        layout_events(
            &mut events,
            &mut grid,
            &mut slots,
            &RoleCatalog::default(),
            &metrics(),
            tz,
        );

        let layout = events[0].layout.as_ref().unwrap();
        assert_eq!(layout.dst_hours, 1);
        // raw delta is 11h; corrected working duration shows 12 wall hours
        assert_eq!(events[0].end - events[0].start, 12 * MS_PER_HOUR);
    }

    #[test]
    fn test_week_view_geometry() {
        let m = LayoutMetrics {
            grid_width: 480.0, // pph 20
            label_width: 50.0,
            event_height: 22.0,
            base_cell_height: 66.0,
        };
        let mut grid = Grid::week(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(), 0, utc());
        // Tuesday Aug 12, 06:00-12:00
        let mut events = vec![event("primary", ms(2025, 8, 12, 6), ms(2025, 8, 12, 12))];
        let mut slots = RowSlots::new();
        layout_events(
            &mut events,
            &mut grid,
            &mut slots,
            &RoleCatalog::default(),
            &m,
            utc(),
        );

        let layout = events[0].layout.as_ref().unwrap();
        assert_eq!(layout.left, 170.0); // 50 + 6 * 20
        assert_eq!(layout.width, 120.0);
        assert_eq!(layout.segments[0].grid_row, 2);
    }

    #[test]
    fn test_template_fold_onto_weekly_rows() {
        let mut grid = Grid::template(2, 0);
        // second week, Monday 08:00 for 8 hours
        let start = MS_PER_WEEK + 32 * MS_PER_HOUR;
        let mut events = vec![event("primary", start, start + 8 * MS_PER_HOUR)];
        let mut slots = RowSlots::new();
        layout_events(
            &mut events,
            &mut grid,
            &mut slots,
            &RoleCatalog::default(),
            &metrics(),
            TimeRef::Local,
        );

        let layout = events[0].layout.as_ref().unwrap();
        assert_eq!(layout.segments[0].grid_row, 1);
        // 32h * 4 px/h after folding one week away
        assert_eq!(layout.left, 128.0);
        assert_eq!(layout.width, 32.0);
        assert_eq!(layout.top, 2.0);
    }

    #[test]
    fn test_template_grows_rows_on_demand() {
        let mut grid = Grid::template(1, 0);
        let start = 3 * MS_PER_WEEK;
        let mut events = vec![event("primary", start, start + MS_PER_HOUR)];
        let mut slots = RowSlots::new();
        layout_events(
            &mut events,
            &mut grid,
            &mut slots,
            &RoleCatalog::default(),
            &metrics(),
            TimeRef::Local,
        );
        assert!(grid.row_count() >= 4);
    }

    #[test]
    fn test_incremental_pass_skips_formatted_events() {
        let mut events = vec![event("primary", ms(2025, 8, 4, 0), ms(2025, 8, 5, 0))];
        let mut grid = august_grid();
        let mut slots = RowSlots::new();
        let catalog = RoleCatalog::default();
        layout_events(&mut events, &mut grid, &mut slots, &catalog, &metrics(), utc());
        let first = events[0].layout.clone();

        // second pass adds an overlapping event; the first keeps its row
        events.push(event("primary", ms(2025, 8, 4, 12), ms(2025, 8, 5, 12)));
        layout_events(&mut events, &mut grid, &mut slots, &catalog, &metrics(), utc());

        assert!(events.iter().any(|e| e.layout == first));
        assert_eq!(slots.row_count(), 2);
    }

    #[test]
    fn test_invalidate_all_resets_everything() {
        let mut events = vec![event("primary", ms(2025, 7, 20, 0), ms(2025, 8, 5, 0))];
        let mut grid = august_grid();
        let (mut slots, _) = run(&mut events, &mut grid);

        invalidate_all(&mut events, &mut slots);
        assert!(slots.is_empty());
        assert!(!events[0].formatted());
        assert_eq!(events[0].start, ms(2025, 7, 20, 0));
    }
}
