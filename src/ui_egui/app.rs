//! The eframe application shell.
//!
//! Owns the engine, the REST client and the settings store, translates
//! pointer actions into engine mutations, and runs fetches on a worker
//! thread so the UI never blocks on the network. Responses carry a
//! generation counter; a stale response from a superseded fetch is
//! dropped (last write wins, no in-flight cancellation).

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use crate::engine::grid::{month_title, week_title};
use crate::engine::modal::{ActiveModal, ModalKind};
use crate::engine::selection::{prefill_range, DragSelect};
use crate::engine::signal::CalendarSignal;
use crate::engine::{Calendar, EventRef};
use crate::models::event::ShiftEvent;
use crate::models::settings::{CalendarConfig, ConfigOverrides, PersistedSettings, ViewType};
use crate::services::api::ApiClient;
use crate::services::event::{group_swap_candidates, EventForm};
use crate::services::settings::SettingsStore;
use crate::ui_egui::event_dialog::{
    render_event_dialog, DialogMode, DialogResult, EventDialog,
};
use crate::ui_egui::views::{render_grid, ViewAction};

/// Estimated modal size used for placement flipping.
const MODAL_SIZE: (f32, f32) = (400.0, 320.0);

struct FetchOutcome {
    generation: u64,
    result: Result<Vec<ShiftEvent>, String>,
}

pub struct CalendarApp {
    calendar: Calendar,
    api: Option<Arc<ApiClient>>,
    store: Option<SettingsStore>,
    drag: DragSelect,
    dialog: Option<EventDialog>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
    fetch_generation: u64,
}

impl CalendarApp {
    pub fn new(overrides: ConfigOverrides) -> Self {
        let persist = overrides.persist_settings.unwrap_or(true);
        let namespace = overrides.team.clone().unwrap_or_else(|| "default".to_string());

        let store = match SettingsStore::open(namespace) {
            Ok(store) => Some(store),
            Err(err) => {
                log::warn!("Settings store unavailable: {err:#}");
                None
            }
        };
        let persisted = if persist {
            store.as_ref().map(|s| s.load())
        } else {
            None
        };

        let config = CalendarConfig::resolve(persisted.as_ref(), overrides);
        let api = config.events_url.as_deref().and_then(|url| {
            match ApiClient::new(url) {
                Ok(client) => Some(Arc::new(client)),
                Err(err) => {
                    log::error!("Failed to build API client: {err:#}");
                    None
                }
            }
        });

        let calendar = Calendar::new(config);
        let (tx, rx) = channel();
        let mut app = Self {
            calendar,
            api,
            store,
            drag: DragSelect::default(),
            dialog: None,
            tx,
            rx,
            fetch_generation: 0,
        };
        app.spawn_fetch(None);
        app
    }

    /// Seed the collection directly instead of fetching, for callers that
    /// already have the events in hand.
    pub fn with_events(overrides: ConfigOverrides, events: Vec<ShiftEvent>) -> Self {
        let mut app = Self::new(overrides);
        app.calendar.apply_fetch(Ok(events));
        app
    }

    fn spawn_fetch(&mut self, ctx: Option<egui::Context>) {
        let Some(api) = self.api.clone() else { return };
        let Some((start, end)) = self.calendar.fetch_window() else {
            return;
        };

        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        self.calendar.begin_fetch();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let result = api.fetch_events(start, end).map_err(|e| e.to_string());
            if tx.send(FetchOutcome { generation, result }).is_err() {
                log::debug!("Fetch result dropped, app is gone");
            }
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });
    }

    fn drain_fetches(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.generation != self.fetch_generation {
                log::debug!("Discarding stale fetch generation {}", outcome.generation);
                continue;
            }
            self.calendar.apply_fetch(outcome.result);
        }
    }

    fn persist_settings(&self) {
        if !self.calendar.config().persist_settings {
            return;
        }
        let Some(store) = &self.store else { return };
        let settings = PersistedSettings {
            current_view: Some(self.calendar.state().view),
            visible_roles: Some(self.calendar.state().visible_roles.clone()),
        };
        if let Err(err) = store.save(&settings) {
            log::warn!("Failed to persist settings: {err:#}");
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            for view in [ViewType::Month, ViewType::Week, ViewType::Template] {
                let active = self.calendar.state().view == view;
                if ui.selectable_label(active, view.as_str()).clicked() && !active {
                    self.calendar.switch_view(view);
                    self.persist_settings();
                    self.spawn_fetch(Some(ctx.clone()));
                }
            }

            ui.separator();
            if ui.button("<").clicked() {
                self.calendar.step(false);
                self.spawn_fetch(Some(ctx.clone()));
            }
            if ui.button(">").clicked() {
                self.calendar.step(true);
                self.spawn_fetch(Some(ctx.clone()));
            }
            if ui.button("Today").clicked() {
                let tz = self.calendar.tz();
                self.calendar.step_to_date(tz.wall_date(tz.now_ms()));
                self.spawn_fetch(Some(ctx.clone()));
            }

            ui.separator();
            let cursor = self.calendar.state().cursor;
            let title = match self.calendar.state().view {
                ViewType::Month => month_title(cursor),
                ViewType::Week => {
                    week_title(cursor, self.calendar.config().first_day_of_week)
                }
                ViewType::Template => "Recurring Template".to_string(),
            };
            ui.heading(title);

            ui.separator();
            for role in self.calendar.config().roles.names() {
                let mut visible = self.calendar.state().is_role_visible(&role);
                if ui.checkbox(&mut visible, role.as_str()).changed() {
                    self.calendar.toggle_role(&role);
                    self.persist_settings();
                }
            }

            if self.calendar.is_loading() {
                ui.spinner();
            }
        });
    }

    fn open_dialog(&mut self, kind: ModalKind, mode: DialogMode, pointer: egui::Pos2, ctx: &egui::Context) {
        let viewport = ctx.screen_rect().size();
        self.dialog = Some(EventDialog {
            modal: ActiveModal::open(
                kind,
                (pointer.x, pointer.y),
                MODAL_SIZE,
                (viewport.x, viewport.y),
            ),
            mode,
        });
        self.calendar.emit(CalendarSignal::ModalOpened { kind });
    }

    fn handle_view_action(&mut self, action: ViewAction, ctx: &egui::Context) {
        match action {
            ViewAction::SelectionFinished(span, pos) => {
                if self.calendar.read_only() {
                    return;
                }
                let Some((start, end)) = prefill_range(self.calendar.grid(), span) else {
                    return;
                };
                let mut form = EventForm::from_range(start, end, self.calendar.tz());
                if let Some(first) = self.calendar.config().roles.names().first() {
                    form.role = first.clone();
                }
                if let Some(user) = &self.calendar.config().user {
                    form.user = user.clone();
                }
                self.open_dialog(
                    ModalKind::Create,
                    DialogMode::Create {
                        form,
                        candidates: Vec::new(),
                    },
                    pos,
                    ctx,
                );
            }
            ViewAction::EventClicked(id, pos) => {
                self.calendar
                    .emit(CalendarSignal::EventClicked { event_id: Some(id) });
                self.open_dialog(ModalKind::View, DialogMode::View { id }, pos, ctx);
            }
        }
    }

    /// View-dialog buttons switch modes in place, keeping the placement.
    fn switch_dialog(&mut self, kind: ModalKind) {
        let Some(dialog) = &self.dialog else { return };
        let DialogMode::View { id } = &dialog.mode else {
            return;
        };
        let id = *id;
        let Some(event) = self.calendar.event(id) else {
            self.close_dialog();
            return;
        };
        let has_link = event.link_id.is_some();

        let mode = match kind {
            ModalKind::Edit => DialogMode::Edit {
                id,
                form: EventForm::from_event(event, self.calendar.tz()),
                has_link,
                modify_linked: false,
            },
            ModalKind::Swap => {
                let candidates = match &self.api {
                    Some(api) => {
                        let now = self.calendar.tz().now_ms();
                        match api.fetch_swap_candidates(now) {
                            Ok(events) => group_swap_candidates(&events, self.calendar.tz()),
                            Err(err) => {
                                log::warn!("Swap candidate fetch failed: {err}");
                                Vec::new()
                            }
                        }
                    }
                    None => {
                        let now = self.calendar.tz().now_ms();
                        let upcoming: Vec<ShiftEvent> = self
                            .calendar
                            .events()
                            .iter()
                            .filter(|e| e.orig_start >= now)
                            .cloned()
                            .collect();
                        group_swap_candidates(&upcoming, self.calendar.tz())
                    }
                };
                DialogMode::Swap {
                    source: EventRef { id, linked: false },
                    has_link,
                    candidates,
                    selected: None,
                }
            }
            ModalKind::Delete => DialogMode::Delete {
                target: EventRef { id, linked: false },
                has_link,
                whole_group: false,
            },
            _ => return,
        };

        if let Some(dialog) = &mut self.dialog {
            dialog.modal.kind = kind;
            dialog.modal.error = None;
            dialog.mode = mode;
        }
        self.calendar.emit(CalendarSignal::ModalOpened { kind });
    }

    fn close_dialog(&mut self) {
        if let Some(dialog) = self.dialog.take() {
            self.calendar
                .emit(CalendarSignal::ModalClosed { kind: dialog.kind() });
        }
    }
}

impl eframe::App for CalendarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_fetches();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui, ctx);
        });

        let mut actions = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            // the grid ignores pointer input while a modal is up
            if self.dialog.is_none() {
                actions = render_grid(ui, &mut self.calendar, &mut self.drag);
            } else {
                let mut idle = DragSelect::default();
                render_grid(ui, &mut self.calendar, &mut idle);
            }
        });
        for action in actions {
            self.handle_view_action(action, ctx);
        }

        if let Some(dialog) = &mut self.dialog {
            let api = self.api.clone();
            match render_event_dialog(ctx, dialog, &mut self.calendar, api.as_deref()) {
                DialogResult::Open => {}
                DialogResult::Closed => self.close_dialog(),
                DialogResult::Switch(kind) => self.switch_dialog(kind),
            }
        }

        if self.calendar.is_loading() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
