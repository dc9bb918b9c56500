//! Mutable view state: current view, cursor date, role visibility.
//!
//! Everything here is navigation state the toolbar mutates; the immutable
//! resolved configuration lives in `models::settings`.

use chrono::{Duration, NaiveDate};

use crate::models::settings::ViewType;
use crate::utils::date::{add_months, TimeRef};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub view: ViewType,
    /// Date the grid is built around. Meaningless in template view but
    /// preserved so switching back to a dated view returns to it.
    pub cursor: NaiveDate,
    /// Roles currently shown. A display toggle only: hidden roles stay in
    /// the collection and in the conflict table.
    pub visible_roles: Vec<String>,
}

impl ViewState {
    pub fn new(view: ViewType, cursor: Option<NaiveDate>, visible_roles: Vec<String>, tz: TimeRef) -> Self {
        Self {
            view,
            cursor: cursor.unwrap_or_else(|| tz.wall_date(tz.now_ms())),
            visible_roles,
        }
    }

    /// Step the cursor forward or backward by one unit of the current
    /// view: a month, a week, or nothing for the dateless template view.
    pub fn step(&mut self, forward: bool) {
        let sign = if forward { 1 } else { -1 };
        match self.view {
            ViewType::Month => self.cursor = add_months(self.cursor, sign),
            ViewType::Week => self.cursor += Duration::days(i64::from(sign) * 7),
            ViewType::Template => {}
        }
    }

    pub fn step_to_date(&mut self, date: NaiveDate) {
        self.cursor = date;
    }

    pub fn switch_view(&mut self, view: ViewType) {
        self.view = view;
    }

    pub fn is_role_visible(&self, role: &str) -> bool {
        self.visible_roles.iter().any(|r| r == role)
    }

    /// Toggle a role's visibility. Returns the new visibility.
    pub fn toggle_role(&mut self, role: &str) -> bool {
        if let Some(pos) = self.visible_roles.iter().position(|r| r == role) {
            self.visible_roles.remove(pos);
            false
        } else {
            self.visible_roles.push(role.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(view: ViewType) -> ViewState {
        ViewState::new(
            view,
            NaiveDate::from_ymd_opt(2025, 8, 15),
            vec!["primary".to_string(), "secondary".to_string()],
            TimeRef::Local,
        )
    }

    #[test]
    fn test_month_step() {
        let mut st = state(ViewType::Month);
        st.step(true);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        st.step(false);
        st.step(false);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
    }

    #[test]
    fn test_month_step_clamps_short_months() {
        let mut st = state(ViewType::Month);
        st.step_to_date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        st.step(true);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_week_step() {
        let mut st = state(ViewType::Week);
        st.step(true);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 8, 22).unwrap());
        st.step(false);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_template_step_is_noop() {
        let mut st = state(ViewType::Template);
        st.step(true);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_view_switch_preserves_cursor() {
        let mut st = state(ViewType::Month);
        st.switch_view(ViewType::Template);
        st.switch_view(ViewType::Week);
        assert_eq!(st.cursor, NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_role_toggle() {
        let mut st = state(ViewType::Month);
        assert!(st.is_role_visible("primary"));
        assert!(!st.toggle_role("primary"));
        assert!(!st.is_role_visible("primary"));
        assert!(st.toggle_role("primary"));
        assert!(st.is_role_visible("primary"));
    }
}
