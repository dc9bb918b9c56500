// Engine core: grid construction, event layout, interaction state.
// Pure computation; nothing in this tree depends on the presentation layer.

pub mod grid;
pub mod layout;
pub mod modal;
pub mod selection;
pub mod signal;
pub mod slots;
pub mod state;

use chrono::NaiveDate;

use crate::models::event::ShiftEvent;
use crate::models::settings::{CalendarConfig, ViewType};
use crate::utils::date::TimeRef;

use grid::Grid;
use layout::{invalidate_all, layout_events, LayoutMetrics, LayoutReport};
use signal::{CalendarObserver, CalendarSignal, SignalHub};
use slots::RowSlots;
use state::ViewState;

/// Reference to one side of a swap or cascade: the event id plus whether
/// the whole linked group participates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRef {
    pub id: i64,
    pub linked: bool,
}

/// Field changes applied by the edit modal. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub role: Option<String>,
    pub user: Option<String>,
    pub note: Option<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// The calendar engine: owns the event collection, the active grid, the
/// row-slot conflict table and the navigation state, and keeps them
/// consistent through every mutation.
pub struct Calendar {
    config: CalendarConfig,
    tz: TimeRef,
    state: ViewState,
    grid: Grid,
    slots: RowSlots,
    events: Vec<ShiftEvent>,
    metrics: LayoutMetrics,
    report: LayoutReport,
    hub: SignalHub,
    loading: bool,
}

impl Calendar {
    pub fn new(config: CalendarConfig) -> Self {
        let tz = TimeRef::from_name(config.timezone.as_deref());
        let state = ViewState::new(
            config.view,
            config.reference_date,
            config.visible_roles.clone(),
            tz,
        );
        let grid = Grid::build(
            state.view,
            Some(state.cursor),
            config.template_row_count,
            config.first_day_of_week,
            tz,
        );
        let metrics = LayoutMetrics {
            event_height: config.event_height,
            ..LayoutMetrics::default()
        };

        let mut calendar = Self {
            config,
            tz,
            state,
            grid,
            slots: RowSlots::new(),
            events: Vec::new(),
            metrics,
            report: LayoutReport {
                rows_used: 0,
                extra_rows: 0,
                cell_height: metrics.base_cell_height,
            },
            hub: SignalHub::new(),
            loading: false,
        };
        calendar.hub.emit(CalendarSignal::Init);
        calendar
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn tz(&self) -> TimeRef {
        self.tz
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn events(&self) -> &[ShiftEvent] {
        &self.events
    }

    pub fn report(&self) -> LayoutReport {
        self.report
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn observe(&mut self, observer: Box<dyn CalendarObserver>) {
        self.hub.register(observer);
    }

    pub fn emit(&mut self, signal: CalendarSignal) {
        self.hub.emit(signal);
    }

    /// Update pixel metrics from the measured viewport. A size change
    /// invalidates all cached geometry.
    pub fn set_metrics(&mut self, grid_width: f32, label_width: f32, base_cell_height: f32) {
        let next = LayoutMetrics {
            grid_width,
            label_width,
            base_cell_height,
            event_height: self.metrics.event_height,
        };
        if grid_width != self.metrics.grid_width
            || label_width != self.metrics.label_width
            || base_cell_height != self.metrics.base_cell_height
        {
            self.metrics = next;
            self.render();
        }
    }

    /// Full layout pass: rebuild the grid from navigation state, drop all
    /// cached geometry and lay out every event from scratch.
    pub fn render(&mut self) {
        self.grid = Grid::build(
            self.state.view,
            Some(self.state.cursor),
            self.config.template_row_count,
            self.config.first_day_of_week,
            self.tz,
        );
        invalidate_all(&mut self.events, &mut self.slots);
        self.layout_pass();
    }

    /// Incremental pass: lay out only events without cached geometry.
    pub fn refresh(&mut self) {
        self.layout_pass();
    }

    fn layout_pass(&mut self) {
        self.report = layout_events(
            &mut self.events,
            &mut self.grid,
            &mut self.slots,
            &self.config.roles,
            &self.metrics,
            self.tz,
        );
        self.hub.emit(CalendarSignal::Render);
    }

    /// Instant window covered by the current grid, for the fetch query.
    /// Template grids are dateless and fetch nothing.
    pub fn fetch_window(&self) -> Option<(i64, i64)> {
        Some((self.grid.start_instant()?, self.grid.end_instant()?))
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
    }

    /// Settle a fetch. Success replaces the whole collection; failure
    /// leaves it untouched. The loading flag clears either way.
    pub fn apply_fetch(&mut self, outcome: Result<Vec<ShiftEvent>, String>) {
        match outcome {
            Ok(events) => {
                let count = events.len();
                self.events = events;
                self.hub.emit(CalendarSignal::EventsFetched { count });
                self.loading = false;
                self.hub.emit(CalendarSignal::FetchSettled);
                self.render();
            }
            Err(error) => {
                log::error!("Event fetch failed: {error}");
                self.hub.emit(CalendarSignal::FetchFailed { error });
                self.loading = false;
                self.hub.emit(CalendarSignal::FetchSettled);
            }
        }
    }

    // --- navigation -----------------------------------------------------

    pub fn step(&mut self, forward: bool) {
        self.state.step(forward);
        self.render();
    }

    pub fn step_to_date(&mut self, date: NaiveDate) {
        self.state.step_to_date(date);
        self.render();
    }

    pub fn switch_view(&mut self, view: ViewType) {
        if self.state.view != view {
            self.state.switch_view(view);
            self.render();
        }
    }

    /// Toggle role visibility. Hidden roles stay in the collection and the
    /// conflict table; only painting skips them.
    pub fn toggle_role(&mut self, role: &str) -> bool {
        let visible = self.state.toggle_role(role);
        self.hub.emit(CalendarSignal::Render);
        visible
    }

    // --- queries --------------------------------------------------------

    pub fn event(&self, id: i64) -> Option<&ShiftEvent> {
        self.events.iter().find(|e| e.id == Some(id))
    }

    /// Events to paint: formatted, in scope, and of a visible role.
    pub fn visible_events(&self) -> impl Iterator<Item = &ShiftEvent> {
        self.events
            .iter()
            .filter(|e| e.formatted() && !e.outside_scope)
            .filter(|e| self.state.is_role_visible(&e.role))
    }

    /// Open-interval overlap query on original times, optionally filtered
    /// by role. Feeds the substitution candidate list.
    pub fn events_within_range(
        &self,
        start: i64,
        end: i64,
        role: Option<&str>,
    ) -> Vec<&ShiftEvent> {
        self.events
            .iter()
            .filter(|e| e.orig_start < end && e.orig_end > start)
            .filter(|e| role.map_or(true, |r| e.role == r))
            .collect()
    }

    /// Sorted distinct roles present in the collection.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.events.iter().map(|e| e.role.clone()).collect();
        types.sort();
        types.dedup();
        types
    }

    // --- collection mutations -------------------------------------------

    /// A freshly created event (already carrying its backend id).
    pub fn apply_created(&mut self, event: ShiftEvent) {
        self.events.push(event);
        self.hub.emit(CalendarSignal::EventsAdded { count: 1 });
        self.refresh();
    }

    /// A linked batch or 12-hour split returned by the backend.
    pub fn apply_batch(&mut self, events: Vec<ShiftEvent>) {
        let count = events.len();
        self.events.extend(events);
        self.hub.emit(CalendarSignal::EventsAdded { count });
        self.refresh();
    }

    /// Substitution: the overridden events leave the collection and the
    /// backend's replacement events take their place.
    pub fn apply_override(&mut self, removed_ids: &[i64], replacements: Vec<ShiftEvent>) {
        for &id in removed_ids {
            self.remove_event(id);
        }
        self.apply_batch(replacements);
    }

    /// Apply an accepted edit.
    ///
    /// Linked cascade propagates role/user/note across the whole group;
    /// start/end are not editable in that mode. An individual edit of a
    /// linked event breaks it out of its group.
    pub fn apply_update(
        &mut self,
        id: i64,
        update: EventUpdate,
        modify_linked: bool,
    ) -> Result<(), String> {
        let link_id = self
            .event(id)
            .ok_or_else(|| format!("Unknown event id {id}"))?
            .link_id
            .clone();

        if modify_linked && link_id.is_some() {
            let mut touched = Vec::new();
            for event in self
                .events
                .iter_mut()
                .filter(|e| e.link_id == link_id)
            {
                apply_fields(event, &update, false);
                event.invalidate();
                touched.extend(event.id);
            }
            for id in touched {
                self.slots.remove(id);
            }
        } else {
            let event = self
                .events
                .iter_mut()
                .find(|e| e.id == Some(id))
                .ok_or_else(|| format!("Unknown event id {id}"))?;
            apply_fields(event, &update, true);
            // editing one event out of a linked group breaks the link
            event.link_id = None;
            event.invalidate();
            self.slots.remove(id);
        }

        self.refresh();
        Ok(())
    }

    /// Exchange the on-call user between two events or linked groups.
    /// A linked event swapped individually falls out of its group.
    pub fn apply_swap(&mut self, a: EventRef, b: EventRef) -> Result<(), String> {
        let (user_a, name_a) = self.swap_identity(a)?;
        let (user_b, name_b) = self.swap_identity(b)?;

        self.assign_identity(a, user_b, name_b);
        self.assign_identity(b, user_a, name_a);
        self.refresh();
        Ok(())
    }

    fn swap_identity(&self, side: EventRef) -> Result<(String, Option<String>), String> {
        let event = self
            .event(side.id)
            .ok_or_else(|| format!("Unknown event id {}", side.id))?;
        Ok((event.user.clone(), event.full_name.clone()))
    }

    fn assign_identity(&mut self, side: EventRef, user: String, full_name: Option<String>) {
        let link_id = self.event(side.id).and_then(|e| e.link_id.clone());
        let group = side.linked && link_id.is_some();

        let mut touched = Vec::new();
        for event in self.events.iter_mut() {
            let selected = if group {
                event.link_id == link_id
            } else {
                event.id == Some(side.id)
            };
            if !selected {
                continue;
            }
            event.user = user.clone();
            event.full_name = full_name.clone();
            if !group {
                event.link_id = None;
            }
            event.invalidate();
            touched.extend(event.id);
        }
        for id in touched {
            self.slots.remove(id);
        }
    }

    /// Delete one event or a whole linked group.
    pub fn apply_delete(&mut self, target: EventRef) -> Result<(), String> {
        let link_id = self
            .event(target.id)
            .ok_or_else(|| format!("Unknown event id {}", target.id))?
            .link_id
            .clone();

        let ids: Vec<i64> = if target.linked && link_id.is_some() {
            self.events
                .iter()
                .filter(|e| e.link_id == link_id)
                .filter_map(|e| e.id)
                .collect()
        } else {
            vec![target.id]
        };

        for id in ids {
            self.remove_event(id);
        }
        self.refresh();
        Ok(())
    }

    fn remove_event(&mut self, id: i64) {
        if let Some(pos) = self.events.iter().position(|e| e.id == Some(id)) {
            self.events.remove(pos);
            self.slots.remove(id);
            self.hub.emit(CalendarSignal::EventRemoved);
        }
    }
}

fn apply_fields(event: &mut ShiftEvent, update: &EventUpdate, allow_times: bool) {
    if let Some(role) = &update.role {
        event.role = role.clone();
    }
    if let Some(user) = &update.user {
        if *user != event.user {
            // the new user's full name is unknown until the next fetch
            event.full_name = None;
        }
        event.user = user.clone();
    }
    if let Some(note) = &update.note {
        event.note = Some(note.clone());
    }
    if allow_times {
        let start = update.start.unwrap_or(event.orig_start);
        let end = update.end.unwrap_or(event.orig_end);
        event.reschedule(start, end);
    }
}
