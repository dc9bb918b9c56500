//! Grid construction for month, week and template views.
//!
//! A grid is the skeleton events are anchored to: an ordered list of cells,
//! each tagged with an absolute date (and hour in week view). Template
//! grids carry only weekday tags and no real dates.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::settings::ViewType;
use crate::utils::date::{
    self, days_in_month, first_weekday_offset, start_of_month, week_range, TimeRef, MS_PER_HOUR,
};

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// One drop target / anchor cell of the rendered grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    /// Absolute date; `None` for template cells.
    pub date: Option<NaiveDate>,
    /// Hour column in week view.
    pub hour: Option<u32>,
    /// Weekday tag, 0 = Sunday.
    pub weekday: u32,
    /// A leading/trailing day belonging to the previous/next month. Still
    /// a valid anchor and drop target.
    pub out_of_month: bool,
}

/// The rendered grid skeleton for one view.
#[derive(Debug, Clone)]
pub struct Grid {
    view: ViewType,
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
    tz: TimeRef,
}

impl Grid {
    /// Build the grid for the given view. A missing reference date falls
    /// back to "now" in the calendar's zone. `row_count_hint` only applies
    /// to template grids.
    pub fn build(
        view: ViewType,
        reference: Option<NaiveDate>,
        row_count_hint: usize,
        first_day_of_week: u32,
        tz: TimeRef,
    ) -> Self {
        let reference = reference.unwrap_or_else(|| tz.wall_date(tz.now_ms()));
        match view {
            ViewType::Month => Self::month(reference, first_day_of_week, tz),
            ViewType::Week => Self::week(reference, first_day_of_week, tz),
            ViewType::Template => Self::template(row_count_hint, first_day_of_week),
        }
    }

    /// Month grid: `ceil((offset + days) / 7)` rows of 7 day cells, padded
    /// with out-of-month days on both ends.
    pub fn month(reference: NaiveDate, first_day_of_week: u32, tz: TimeRef) -> Self {
        let offset = first_weekday_offset(reference, first_day_of_week);
        let days = days_in_month(reference);
        let rows = ((offset + days) as usize).div_ceil(DAYS_PER_WEEK);
        let grid_start = start_of_month(reference) - Duration::days(i64::from(offset));

        let mut cells = Vec::with_capacity(rows * DAYS_PER_WEEK);
        for index in 0..rows * DAYS_PER_WEEK {
            let date = grid_start + Duration::days(index as i64);
            cells.push(GridCell {
                index,
                row: index / DAYS_PER_WEEK,
                col: index % DAYS_PER_WEEK,
                date: Some(date),
                hour: None,
                weekday: date.weekday().num_days_from_sunday(),
                out_of_month: date.month() != reference.month() || date.year() != reference.year(),
            });
        }

        Self {
            view: ViewType::Month,
            rows,
            cols: DAYS_PER_WEEK,
            cells,
            tz,
        }
    }

    /// Week grid: one row per day of the week containing `reference`, each
    /// with 24 hour cells.
    pub fn week(reference: NaiveDate, first_day_of_week: u32, tz: TimeRef) -> Self {
        let (week_start, _) = week_range(reference, first_day_of_week);

        let mut cells = Vec::with_capacity(DAYS_PER_WEEK * HOURS_PER_DAY);
        for row in 0..DAYS_PER_WEEK {
            let date = week_start + Duration::days(row as i64);
            for hour in 0..HOURS_PER_DAY {
                cells.push(GridCell {
                    index: row * HOURS_PER_DAY + hour,
                    row,
                    col: hour,
                    date: Some(date),
                    hour: Some(hour as u32),
                    weekday: date.weekday().num_days_from_sunday(),
                    out_of_month: false,
                });
            }
        }

        Self {
            view: ViewType::Week,
            rows: DAYS_PER_WEEK,
            cols: HOURS_PER_DAY,
            cells,
            tz,
        }
    }

    /// Template grid: `row_count` recurring-week rows of weekday-tagged
    /// cells, detached from any calendar date.
    pub fn template(row_count: usize, first_day_of_week: u32) -> Self {
        let rows = row_count.max(1);
        let mut cells = Vec::with_capacity(rows * DAYS_PER_WEEK);
        for index in 0..rows * DAYS_PER_WEEK {
            let col = index % DAYS_PER_WEEK;
            cells.push(GridCell {
                index,
                row: index / DAYS_PER_WEEK,
                col,
                date: None,
                hour: None,
                weekday: (first_day_of_week + col as u32) % 7,
                out_of_month: false,
            });
        }

        Self {
            view: ViewType::Template,
            rows,
            cols: DAYS_PER_WEEK,
            cells,
            tz: TimeRef::Local,
        }
    }

    pub fn view(&self) -> ViewType {
        self.view
    }

    pub fn tz(&self) -> TimeRef {
        self.tz
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&GridCell> {
        self.cells.get(index)
    }

    /// Earliest instant represented: midnight of the first cell's date.
    /// Template grids have no instants.
    pub fn start_instant(&self) -> Option<i64> {
        let first = self.cells.first()?.date?;
        self.tz.day_start(first)
    }

    /// Latest instant represented: end of the last cell's day ("24:00").
    pub fn end_instant(&self) -> Option<i64> {
        let last = self.cells.last()?.date?;
        self.tz.day_start(last + Duration::days(1))
    }

    /// First cell carrying the given date; anchor for event placement.
    pub fn cell_for_date(&self, date: NaiveDate) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.date == Some(date))
    }

    pub fn is_today(&self, cell: &GridCell, now_ms: i64) -> bool {
        cell.date == Some(self.tz.wall_date(now_ms))
    }

    /// Week view: whether this hour cell contains "now".
    pub fn is_current_hour(&self, cell: &GridCell, now_ms: i64) -> bool {
        let Some(hour) = cell.hour else {
            return false;
        };
        let Some(date) = cell.date else {
            return false;
        };
        let Some(day_start) = self.tz.day_start(date) else {
            return false;
        };
        let hour_start = day_start + i64::from(hour) * MS_PER_HOUR;
        now_ms >= hour_start && now_ms < hour_start + MS_PER_HOUR
    }

    /// Append rows to a template grid without disturbing existing cell
    /// identities. No-op for dated views, whose row count is derived.
    pub fn add_rows(&mut self, count: usize) {
        if self.view != ViewType::Template {
            log::debug!("add_rows ignored for {:?} view", self.view);
            return;
        }
        let first_day = self
            .cells
            .first()
            .map(|c| c.weekday)
            .unwrap_or(0);
        for _ in 0..count {
            let row = self.rows;
            for col in 0..DAYS_PER_WEEK {
                self.cells.push(GridCell {
                    index: row * DAYS_PER_WEEK + col,
                    row,
                    col,
                    date: None,
                    hour: None,
                    weekday: (first_day + col as u32) % 7,
                    out_of_month: false,
                });
            }
            self.rows += 1;
        }
    }
}

/// Month/week toolbar titles, e.g. "August 2025" and
/// "Aug 17 - Aug 23, 2025".
pub fn month_title(reference: NaiveDate) -> String {
    format!("{} {}", date::month_name(reference.month()), reference.year())
}

pub fn week_title(reference: NaiveDate, first_day_of_week: u32) -> String {
    let (start, end) = week_range(reference, first_day_of_week);
    format!(
        "{} {} - {} {}, {}",
        date::month_name_short(start.month()),
        start.day(),
        date::month_name_short(end.month()),
        end.day(),
        reference.year()
    )
}
