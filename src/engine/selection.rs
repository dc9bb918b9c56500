//! Drag-to-select interaction over grid cells.
//!
//! Pure state machine: the presentation layer feeds it cell indices from
//! pointer events and reads back the highlighted span. A finished span is
//! converted into a create-event prefill range against the active grid.

use crate::models::settings::ViewType;
use crate::utils::date::{MS_PER_DAY, MS_PER_HOUR, MS_PER_WEEK};

use super::grid::{Grid, DAYS_PER_WEEK};

/// Inclusive, normalized cell-index span. `first <= last` always holds;
/// reverse drags are normalized on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub first: usize,
    pub last: usize,
}

impl CellSpan {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            first: a.min(b),
            last: a.max(b),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }
}

/// Drag-select state. Idle until a primary-button press lands on a cell;
/// while selecting, every pointer move recomputes the contiguous range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragSelect {
    #[default]
    Idle,
    Selecting {
        anchor: usize,
        current: usize,
    },
}

impl DragSelect {
    /// Press on a cell. Secondary-button presses are ignored and leave the
    /// machine idle. Returns whether a selection started.
    pub fn begin(&mut self, cell: usize, primary: bool) -> bool {
        if !primary {
            return false;
        }
        *self = DragSelect::Selecting {
            anchor: cell,
            current: cell,
        };
        true
    }

    /// Pointer moved over a cell while selecting. No-op when idle.
    pub fn update(&mut self, cell: usize) {
        if let DragSelect::Selecting { current, .. } = self {
            *current = cell;
        }
    }

    /// Release over the grid: finalize and return the normalized span.
    pub fn finish(&mut self) -> Option<CellSpan> {
        match *self {
            DragSelect::Selecting { anchor, current } => {
                *self = DragSelect::Idle;
                Some(CellSpan::new(anchor, current))
            }
            DragSelect::Idle => None,
        }
    }

    /// Release outside the grid (or over modal chrome): drop the selection
    /// silently.
    pub fn cancel(&mut self) {
        *self = DragSelect::Idle;
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, DragSelect::Selecting { .. })
    }

    /// Whether a cell should render highlighted.
    pub fn highlights(&self, cell: usize) -> bool {
        match *self {
            DragSelect::Selecting { anchor, current } => {
                CellSpan::new(anchor, current).contains(cell)
            }
            DragSelect::Idle => false,
        }
    }
}

/// Convert a finished span into the create-form prefill range.
///
/// Month: midnight of the first day through end-of-day ("24:00") of the
/// last. Week: start of the first hour cell through the end of the last.
/// Template: millisecond offsets from the recurring-week epoch, so a
/// second-row Monday prefills one week past the first-row Monday.
pub fn prefill_range(grid: &Grid, span: CellSpan) -> Option<(i64, i64)> {
    let first = grid.cell(span.first)?;
    let last = grid.cell(span.last)?;

    match grid.view() {
        ViewType::Month => {
            let start = grid.tz().day_start(first.date?)?;
            let end = grid
                .tz()
                .day_start(last.date? + chrono::Duration::days(1))?;
            Some((start, end))
        }
        ViewType::Week => {
            let start = grid.tz().day_start(first.date?)? + i64::from(first.hour?) * MS_PER_HOUR;
            let end = grid.tz().day_start(last.date?)? + i64::from(last.hour? + 1) * MS_PER_HOUR;
            Some((start, end))
        }
        ViewType::Template => {
            let offset = |row: usize, col: usize| {
                row as i64 * MS_PER_WEEK + col as i64 * MS_PER_DAY
            };
            let start = offset(span.first / DAYS_PER_WEEK, span.first % DAYS_PER_WEEK);
            let end = offset(span.last / DAYS_PER_WEEK, span.last % DAYS_PER_WEEK) + MS_PER_DAY;
            Some((start, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::TimeRef;
    use chrono::NaiveDate;

    fn utc() -> TimeRef {
        TimeRef::from_name(Some("UTC"))
    }

    #[test]
    fn test_right_click_does_not_start_selection() {
        let mut drag = DragSelect::default();
        assert!(!drag.begin(3, false));
        assert!(!drag.is_selecting());
        assert_eq!(drag.finish(), None);
    }

    #[test]
    fn test_forward_drag() {
        let mut drag = DragSelect::default();
        assert!(drag.begin(5, true));
        drag.update(8);
        assert!(drag.highlights(6));
        assert!(!drag.highlights(9));
        assert_eq!(drag.finish(), Some(CellSpan { first: 5, last: 8 }));
        assert!(!drag.is_selecting());
    }

    #[test]
    fn test_reverse_drag_normalizes() {
        let mut drag = DragSelect::default();
        drag.begin(10, true);
        drag.update(4);
        assert!(drag.highlights(7));
        assert_eq!(drag.finish(), Some(CellSpan { first: 4, last: 10 }));
    }

    #[test]
    fn test_cancel_discards_silently() {
        let mut drag = DragSelect::default();
        drag.begin(2, true);
        drag.update(6);
        drag.cancel();
        assert_eq!(drag.finish(), None);
    }

    #[test]
    fn test_update_while_idle_is_noop() {
        let mut drag = DragSelect::default();
        drag.update(12);
        assert!(!drag.is_selecting());
    }

    #[test]
    fn test_month_prefill_spans_full_days() {
        let grid = Grid::month(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(), 0, utc());
        // Aug 4 (index 8) .. Aug 6 (index 10)
        let (start, end) = prefill_range(&grid, CellSpan::new(8, 10)).unwrap();
        assert_eq!(utc().wall_date(start), NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        // end is midnight after the last selected day
        assert_eq!(utc().wall_date(end), NaiveDate::from_ymd_opt(2025, 8, 7).unwrap());
        assert_eq!(end - start, 3 * MS_PER_DAY);
    }

    #[test]
    fn test_week_prefill_includes_last_hour() {
        let grid = Grid::week(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(), 0, utc());
        // Monday Aug 11 (row 1): hours 9..=11
        let span = CellSpan::new(24 + 9, 24 + 11);
        let (start, end) = prefill_range(&grid, span).unwrap();
        assert_eq!(end - start, 3 * MS_PER_HOUR);
        let wall = utc().wall(start);
        assert_eq!(chrono::Timelike::hour(&wall), 9);
    }

    #[test]
    fn test_template_prefill_uses_week_offsets() {
        let grid = Grid::template(2, 0);
        // row 1 Tuesday (index 9) single-cell selection
        let (start, end) = prefill_range(&grid, CellSpan::new(9, 9)).unwrap();
        assert_eq!(start, MS_PER_WEEK + 2 * MS_PER_DAY);
        assert_eq!(end, start + MS_PER_DAY);
    }
}
