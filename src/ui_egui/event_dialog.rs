//! Create / view / edit / swap / delete modal.
//!
//! One dialog window whose mode drives the fields shown. Every submit
//! validates locally first, then calls the backend, then mutates the
//! calendar's collection in place; failures surface as an inline error
//! and leave the dialog open.

use egui::{Color32, RichText};

use crate::engine::modal::{ActiveModal, ModalKind};
use crate::engine::{Calendar, EventRef, EventUpdate};
use crate::services::api::wire::EventPatch;
use crate::services::api::{ApiClient, ApiError};
use crate::services::event::{CreateRequest, EventForm, SwapCandidate};
use crate::utils::date::{format_date_key, parse_date_input};

/// The open dialog: placement/error state plus the mode-specific fields.
pub struct EventDialog {
    pub modal: ActiveModal,
    pub mode: DialogMode,
}

pub enum DialogMode {
    Create {
        form: EventForm,
        /// Substitution candidates: id, label, checked.
        candidates: Vec<(i64, String, bool)>,
    },
    View {
        id: i64,
    },
    Edit {
        id: i64,
        form: EventForm,
        has_link: bool,
        modify_linked: bool,
    },
    Swap {
        source: EventRef,
        has_link: bool,
        candidates: Vec<SwapCandidate>,
        selected: Option<usize>,
    },
    Delete {
        target: EventRef,
        has_link: bool,
        whole_group: bool,
    },
}

impl EventDialog {
    pub fn kind(&self) -> ModalKind {
        self.modal.kind
    }
}

/// Dialog outcome for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Open,
    Closed,
    /// Switch to another mode for the same event (view -> edit etc.).
    Switch(ModalKind),
}

pub fn render_event_dialog(
    ctx: &egui::Context,
    dialog: &mut EventDialog,
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
) -> DialogResult {
    let title = match dialog.modal.kind {
        ModalKind::Create => "New Shift",
        ModalKind::View => "Shift Details",
        ModalKind::Edit => "Edit Shift",
        ModalKind::Swap => "Swap Shift",
        ModalKind::Delete => "Delete Shift",
    };

    let mut result = DialogResult::Open;
    let mut open = true;

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .default_width(calendar.config().modal_width)
        .default_pos(dialog.modal.pos)
        .open(&mut open)
        .show(ctx, |ui| {
            if let Some(error) = &dialog.modal.error {
                ui.label(RichText::new(error).color(Color32::LIGHT_RED));
                ui.separator();
            }

            let outcome = match &mut dialog.mode {
                DialogMode::Create { form, candidates } => {
                    render_create(ui, calendar, api, form, candidates)
                }
                DialogMode::View { id } => render_view(ui, calendar, *id),
                DialogMode::Edit {
                    id,
                    form,
                    has_link,
                    modify_linked,
                } => render_edit(ui, calendar, api, *id, form, *has_link, modify_linked),
                DialogMode::Swap {
                    source,
                    has_link,
                    candidates,
                    selected,
                } => render_swap(ui, calendar, api, source, *has_link, candidates, selected),
                DialogMode::Delete {
                    target,
                    has_link,
                    whole_group,
                } => render_delete(ui, calendar, api, *target, *has_link, whole_group),
            };

            match outcome {
                Outcome::Stay => {}
                Outcome::Fail(error) => dialog.modal.error = Some(error),
                Outcome::Done => result = DialogResult::Closed,
                Outcome::Switch(kind) => result = DialogResult::Switch(kind),
            }
        });

    if !open {
        return DialogResult::Closed;
    }
    result
}

enum Outcome {
    Stay,
    Fail(String),
    Done,
    Switch(ModalKind),
}

fn time_fields(ui: &mut egui::Ui, form: &mut EventForm, enabled: bool) {
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            ui.label("Start");
            ui.add(egui::TextEdit::singleline(&mut form.start_date).desired_width(90.0));
            date_picker(ui, "start_picker", &mut form.start_date);
            ui.add(egui::TextEdit::singleline(&mut form.start_time).desired_width(50.0));
        });
        ui.horizontal(|ui| {
            ui.label("End");
            ui.add(egui::TextEdit::singleline(&mut form.end_date).desired_width(90.0));
            date_picker(ui, "end_picker", &mut form.end_date);
            ui.add(egui::TextEdit::singleline(&mut form.end_time).desired_width(50.0));
        });
    });
}

/// Calendar popup next to a date text field; a picked date rewrites the
/// field text.
fn date_picker(ui: &mut egui::Ui, id: &str, text: &mut String) {
    let mut date =
        parse_date_input(text).unwrap_or_else(|| chrono::Local::now().date_naive());
    let before = date;
    ui.add(
        egui_extras::DatePickerButton::new(&mut date)
            .id_source(id)
            .show_icon(true),
    );
    if date != before {
        *text = format_date_key(date);
    }
}

fn common_fields(ui: &mut egui::Ui, calendar: &Calendar, form: &mut EventForm) {
    ui.horizontal(|ui| {
        ui.label("Role");
        egui::ComboBox::from_id_source("role")
            .selected_text(form.role.clone())
            .show_ui(ui, |ui| {
                for role in calendar.config().roles.names() {
                    ui.selectable_value(&mut form.role, role.clone(), role.clone());
                }
            });
    });
    ui.horizontal(|ui| {
        ui.label("User");
        ui.text_edit_singleline(&mut form.user);
    });
    ui.horizontal(|ui| {
        ui.label("Note");
        ui.text_edit_singleline(&mut form.note);
    });
}

fn render_create(
    ui: &mut egui::Ui,
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
    form: &mut EventForm,
    candidates: &mut Vec<(i64, String, bool)>,
) -> Outcome {
    common_fields(ui, calendar, form);
    time_fields(ui, form, true);

    ui.checkbox(&mut form.twelve_hour, "Split into 12-hour shifts");
    let was_substitute = form.substitute;
    ui.checkbox(&mut form.substitute, "Substitute over existing events");

    if form.substitute && !was_substitute {
        // (re)build the candidate list from the currently entered range
        candidates.clear();
        if let Ok((start, end)) = form.validate(calendar.tz()) {
            let tz = calendar.tz();
            for event in calendar.events_within_range(start, end, None) {
                if let Some(id) = event.id {
                    candidates.push((id, event.display_label(tz), false));
                }
            }
        }
    }
    if form.substitute {
        if candidates.is_empty() {
            ui.label("No overlapping events in the entered range");
        }
        for (_, label, checked) in candidates.iter_mut() {
            ui.checkbox(checked, label.as_str());
        }
        form.override_ids = candidates
            .iter()
            .filter(|(_, _, checked)| *checked)
            .map(|(id, _, _)| *id)
            .collect();
    }

    ui.separator();
    if !ui.button("Create").clicked() {
        return Outcome::Stay;
    }

    let team = calendar.config().team.clone();
    let request = match form.create_request(calendar.tz(), team.as_deref()) {
        Ok(request) => request,
        Err(error) => return Outcome::Fail(error),
    };

    match submit_create(calendar, api, request) {
        Ok(()) => Outcome::Done,
        Err(error) => Outcome::Fail(error),
    }
}

fn submit_create(
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
    request: CreateRequest,
) -> Result<(), String> {
    match request {
        CreateRequest::Single(write) => {
            let id = match api {
                Some(api) => Some(api.create(&write).map_err(err_text)?),
                None => None,
            };
            let mut event = write.to_event()?;
            event.id = id;
            calendar.apply_created(event);
        }
        CreateRequest::Linked(writes) => {
            let link = match api {
                Some(api) => Some(api.create_linked(&writes).map_err(err_text)?),
                None => None,
            };
            let mut events = Vec::with_capacity(writes.len());
            for (i, write) in writes.iter().enumerate() {
                let mut event = write.to_event()?;
                if let Some(link) = &link {
                    event.id = link.event_ids.get(i).copied();
                    event.link_id = Some(link.link_id.clone());
                }
                events.push(event);
            }
            calendar.apply_batch(events);
        }
        CreateRequest::Override { event, overridden } => {
            let api = api.ok_or("Substitution requires a configured backend")?;
            let replacements = api
                .create_override(event, overridden.clone())
                .map_err(err_text)?;
            calendar.apply_override(&overridden, replacements);
        }
    }
    Ok(())
}

fn render_view(ui: &mut egui::Ui, calendar: &Calendar, id: i64) -> Outcome {
    let Some(event) = calendar.event(id) else {
        return Outcome::Done;
    };

    ui.label(RichText::new(event.display_name()).strong());
    ui.label(event.display_label(calendar.tz()));
    ui.label(format!("Role: {}", event.role));
    if let Some(team) = &event.team {
        ui.label(format!("Team: {team}"));
    }
    if let Some(note) = &event.note {
        ui.label(format!("Note: {note}"));
    }
    if event.link_id.is_some() {
        ui.label(RichText::new("Part of a linked group").italics());
    }

    if calendar.read_only() {
        return Outcome::Stay;
    }
    ui.separator();
    let mut outcome = Outcome::Stay;
    ui.horizontal(|ui| {
        if ui.button("Edit").clicked() {
            outcome = Outcome::Switch(ModalKind::Edit);
        }
        if ui.button("Swap").clicked() {
            outcome = Outcome::Switch(ModalKind::Swap);
        }
        if ui.button("Delete").clicked() {
            outcome = Outcome::Switch(ModalKind::Delete);
        }
    });
    outcome
}

fn render_edit(
    ui: &mut egui::Ui,
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
    id: i64,
    form: &mut EventForm,
    has_link: bool,
    modify_linked: &mut bool,
) -> Outcome {
    common_fields(ui, calendar, form);
    if has_link {
        ui.checkbox(modify_linked, "Modify whole linked group");
    }
    // linked cascade never reschedules; only role/user/note propagate
    time_fields(ui, form, !*modify_linked);

    ui.separator();
    if !ui.button("Save").clicked() {
        return Outcome::Stay;
    }

    let update = if *modify_linked {
        if form.role.trim().is_empty() || form.user.trim().is_empty() {
            return Outcome::Fail("Role and user are required".to_string());
        }
        EventUpdate {
            role: Some(form.role.trim().to_string()),
            user: Some(form.user.trim().to_string()),
            note: Some(form.note.trim().to_string()),
            ..Default::default()
        }
    } else {
        let (start, end) = match form.validate(calendar.tz()) {
            Ok(range) => range,
            Err(error) => return Outcome::Fail(error),
        };
        EventUpdate {
            role: Some(form.role.trim().to_string()),
            user: Some(form.user.trim().to_string()),
            note: Some(form.note.trim().to_string()),
            start: Some(start),
            end: Some(end),
        }
    };

    if let Some(api) = api {
        let mut patch = EventPatch {
            role: update.role.clone(),
            user: update.user.clone(),
            note: update.note.clone(),
            ..Default::default()
        };
        if let (Some(start), Some(end)) = (update.start, update.end) {
            patch = patch.start_ms(start).end_ms(end);
        }
        let call = if *modify_linked {
            let link_id = calendar
                .event(id)
                .and_then(|e| e.link_id.clone())
                .unwrap_or_default();
            api.update_linked(&link_id, &patch)
        } else {
            api.update(id, &patch)
        };
        if let Err(error) = call {
            return Outcome::Fail(err_text(error));
        }
    }

    match calendar.apply_update(id, update, *modify_linked) {
        Ok(()) => Outcome::Done,
        Err(error) => Outcome::Fail(error),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_swap(
    ui: &mut egui::Ui,
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
    source: &mut EventRef,
    has_link: bool,
    candidates: &[SwapCandidate],
    selected: &mut Option<usize>,
) -> Outcome {
    if has_link {
        ui.checkbox(&mut source.linked, "Swap the whole linked group");
    }
    ui.label("Swap with:");
    if candidates.is_empty() {
        ui.label(RichText::new("No upcoming shifts to swap with").italics());
    }
    egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
        for (i, candidate) in candidates.iter().enumerate() {
            // an event cannot swap with itself
            if candidate.event_ref.id == source.id {
                continue;
            }
            ui.radio_value(selected, Some(i), &candidate.label);
        }
    });

    ui.separator();
    if !ui.button("Swap").clicked() {
        return Outcome::Stay;
    }
    let Some(choice) = selected.and_then(|i| candidates.get(i)) else {
        return Outcome::Fail("Choose a shift to swap with".to_string());
    };

    if let Some(api) = api {
        if let Err(error) = api.swap(*source, choice.event_ref) {
            return Outcome::Fail(err_text(error));
        }
    }
    match calendar.apply_swap(*source, choice.event_ref) {
        Ok(()) => Outcome::Done,
        Err(error) => Outcome::Fail(error),
    }
}

fn render_delete(
    ui: &mut egui::Ui,
    calendar: &mut Calendar,
    api: Option<&ApiClient>,
    target: EventRef,
    has_link: bool,
    whole_group: &mut bool,
) -> Outcome {
    ui.label("Delete this shift?");
    if has_link {
        ui.checkbox(whole_group, "Delete the whole linked group");
    }

    ui.separator();
    if !ui.button(RichText::new("Delete").color(Color32::LIGHT_RED)).clicked() {
        return Outcome::Stay;
    }

    let target = EventRef {
        id: target.id,
        linked: *whole_group,
    };
    if let Some(api) = api {
        let call = if target.linked {
            let link_id = calendar
                .event(target.id)
                .and_then(|e| e.link_id.clone())
                .unwrap_or_default();
            api.delete_linked(&link_id)
        } else {
            api.delete(target.id)
        };
        if let Err(error) = call {
            return Outcome::Fail(err_text(error));
        }
    }
    match calendar.apply_delete(target) {
        Ok(()) => Outcome::Done,
        Err(error) => Outcome::Fail(error),
    }
}

fn err_text(error: ApiError) -> String {
    error.to_string()
}
