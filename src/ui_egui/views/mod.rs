//! Grid painting for the three calendar views.
//!
//! All geometry comes from the engine's cached layout; this module only
//! translates it into egui rects and reports pointer interactions back as
//! actions for the app to dispatch.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use crate::engine::grid::{GridCell, DAYS_PER_WEEK, HOURS_PER_DAY};
use crate::engine::selection::{CellSpan, DragSelect};
use crate::engine::Calendar;
use crate::models::settings::ViewType;
use crate::utils::date::{day_name_short, DAYS_SHORT};

const HEADER_HEIGHT: f32 = 22.0;
const WEEK_LABEL_WIDTH: f32 = 64.0;
const BASE_CELL_HEIGHT: f32 = 66.0;

/// Pointer interactions the app must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    /// A drag-selection finished over the grid.
    SelectionFinished(CellSpan, Pos2),
    /// An event bar was clicked.
    EventClicked(i64, Pos2),
}

/// Role-stable bar colors; unknown roles hash onto the palette.
fn role_color(role: &str) -> Color32 {
    const PALETTE: [Color32; 6] = [
        Color32::from_rgb(0x2e, 0x7d, 0x32),
        Color32::from_rgb(0x15, 0x65, 0xc0),
        Color32::from_rgb(0xef, 0x6c, 0x00),
        Color32::from_rgb(0x6a, 0x1b, 0x9a),
        Color32::from_rgb(0xc6, 0x28, 0x28),
        Color32::from_rgb(0x00, 0x83, 0x8f),
    ];
    match role {
        "primary" => PALETTE[0],
        "secondary" => PALETTE[1],
        "vacation" => PALETTE[2],
        other => {
            let hash: usize = other.bytes().map(usize::from).sum();
            PALETTE[3 + hash % 3]
        }
    }
}

/// Paint the active grid and its events, feeding pointer state into the
/// drag-select machine. Returns the actions this frame produced.
pub fn render_grid(
    ui: &mut egui::Ui,
    calendar: &mut Calendar,
    drag: &mut DragSelect,
) -> Vec<ViewAction> {
    let mut actions = Vec::new();
    let outer = ui.available_rect_before_wrap();

    let label_width = match calendar.grid().view() {
        ViewType::Week => WEEK_LABEL_WIDTH,
        _ => 0.0,
    };
    let grid_width = (outer.width() - label_width).max(1.0);
    calendar.set_metrics(grid_width, label_width, BASE_CELL_HEIGHT);

    let cell_height = calendar.report().cell_height;
    let rows = calendar.grid().row_count();
    let cols = calendar.grid().col_count();
    let cell_width = grid_width / cols as f32;
    let body = Rect::from_min_size(
        Pos2::new(outer.left() + label_width, outer.top() + HEADER_HEIGHT),
        Vec2::new(grid_width, rows as f32 * cell_height),
    );

    let response = ui.allocate_rect(
        Rect::from_min_max(outer.min, body.max),
        Sense::click_and_drag(),
    );
    let painter = ui.painter_at(response.rect);

    paint_header(&painter, calendar, outer, label_width, cell_width);
    if label_width > 0.0 {
        paint_week_labels(&painter, calendar, outer, cell_height);
    }
    paint_cells(&painter, calendar, drag, body, cell_width, cell_height);
    paint_events(
        ui,
        &painter,
        calendar,
        drag.is_selecting(),
        body,
        label_width,
        cell_height,
        &mut actions,
    );

    if !calendar.read_only() {
        handle_drag(ui, calendar, drag, &response, body, cell_width, cell_height, &mut actions);
    }

    actions
}

fn cell_at(
    calendar: &Calendar,
    body: Rect,
    cell_width: f32,
    cell_height: f32,
    pos: Pos2,
) -> Option<usize> {
    if !body.contains(pos) {
        return None;
    }
    let cols = calendar.grid().col_count();
    let col = (((pos.x - body.left()) / cell_width) as usize).min(cols - 1);
    let row = ((pos.y - body.top()) / cell_height) as usize;
    let index = row * cols + col;
    (index < calendar.grid().cells().len()).then_some(index)
}

fn cell_rect(cell: &GridCell, body: Rect, cell_width: f32, cell_height: f32) -> Rect {
    Rect::from_min_size(
        Pos2::new(
            body.left() + cell.col as f32 * cell_width,
            body.top() + cell.row as f32 * cell_height,
        ),
        Vec2::new(cell_width, cell_height),
    )
}

fn paint_header(
    painter: &egui::Painter,
    calendar: &Calendar,
    outer: Rect,
    label_width: f32,
    cell_width: f32,
) {
    let font = FontId::proportional(12.0);
    let color = Color32::GRAY;
    match calendar.grid().view() {
        ViewType::Week => {
            for hour in (0..HOURS_PER_DAY).step_by(3) {
                let x = outer.left() + label_width + hour as f32 * cell_width;
                painter.text(
                    Pos2::new(x + 2.0, outer.top() + 4.0),
                    Align2::LEFT_TOP,
                    format!("{hour:02}"),
                    font.clone(),
                    color,
                );
            }
        }
        _ => {
            let first_day = calendar.config().first_day_of_week;
            for col in 0..DAYS_PER_WEEK {
                let weekday = (first_day + col as u32) % 7;
                let x = outer.left() + label_width + col as f32 * cell_width;
                painter.text(
                    Pos2::new(x + 4.0, outer.top() + 4.0),
                    Align2::LEFT_TOP,
                    DAYS_SHORT[weekday as usize],
                    font.clone(),
                    color,
                );
            }
        }
    }
}

fn paint_week_labels(painter: &egui::Painter, calendar: &Calendar, outer: Rect, cell_height: f32) {
    let font = FontId::proportional(12.0);
    for row in 0..DAYS_PER_WEEK {
        let Some(cell) = calendar.grid().cell(row * HOURS_PER_DAY) else {
            continue;
        };
        let label = match cell.date {
            Some(date) => {
                use chrono::Datelike;
                format!("{} {}", day_name_short(cell.weekday), date.day())
            }
            None => day_name_short(cell.weekday).to_string(),
        };
        painter.text(
            Pos2::new(
                outer.left() + 4.0,
                outer.top() + HEADER_HEIGHT + row as f32 * cell_height + 4.0,
            ),
            Align2::LEFT_TOP,
            label,
            font.clone(),
            Color32::GRAY,
        );
    }
}

fn paint_cells(
    painter: &egui::Painter,
    calendar: &Calendar,
    drag: &DragSelect,
    body: Rect,
    cell_width: f32,
    cell_height: f32,
) {
    let now_ms = calendar.tz().now_ms();
    let grid_stroke = Stroke::new(0.5, Color32::from_gray(70));
    let month_view = calendar.grid().view() == ViewType::Month;

    for cell in calendar.grid().cells() {
        let rect = cell_rect(cell, body, cell_width, cell_height);

        if cell.out_of_month {
            painter.rect_filled(rect, 0.0, Color32::from_gray(28));
        }
        if calendar.grid().is_today(cell, now_ms) && cell.hour.is_none() {
            painter.rect_filled(rect, 0.0, Color32::from_rgb(0x26, 0x32, 0x38));
        }
        if calendar.grid().is_current_hour(cell, now_ms) {
            painter.rect_filled(rect, 0.0, Color32::from_rgb(0x26, 0x32, 0x38));
        }
        if drag.highlights(cell.index) {
            painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(100, 150, 255, 40));
        }
        painter.rect_stroke(rect, 0.0, grid_stroke);

        if month_view {
            if let Some(date) = cell.date {
                use chrono::Datelike;
                painter.text(
                    rect.left_top() + Vec2::new(4.0, 2.0),
                    Align2::LEFT_TOP,
                    date.day().to_string(),
                    FontId::proportional(11.0),
                    if cell.out_of_month {
                        Color32::from_gray(110)
                    } else {
                        Color32::LIGHT_GRAY
                    },
                );
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_events(
    ui: &egui::Ui,
    painter: &egui::Painter,
    calendar: &Calendar,
    selecting: bool,
    body: Rect,
    label_width: f32,
    cell_height: f32,
    actions: &mut Vec<ViewAction>,
) {
    let event_height = calendar.config().event_height;

    let mut clicked: Option<(i64, Pos2)> = None;
    let pointer = ui.input(|i| i.pointer.interact_pos());
    let primary_clicked = ui.input(|i| i.pointer.primary_clicked());

    for event in calendar.visible_events() {
        let Some(layout) = &event.layout else { continue };
        let color = role_color(&event.role);

        for (i, segment) in layout.segments.iter().enumerate() {
            // segment.left already counts the week label column, and
            // layout.top reserves the date band above the first row
            let rect = Rect::from_min_size(
                Pos2::new(
                    body.left() - label_width + segment.left,
                    body.top() + segment.grid_row as f32 * cell_height + layout.top,
                ),
                Vec2::new(segment.width.ceil().max(2.0), event_height - 2.0),
            );
            painter.rect_filled(rect, 2.0, color);
            if i == 0 {
                painter.text(
                    rect.left_center() + Vec2::new(4.0, 0.0),
                    Align2::LEFT_CENTER,
                    &layout.label,
                    FontId::proportional(11.0),
                    Color32::WHITE,
                );
            }

            // an event click beats starting a selection on the same press
            if !selecting && primary_clicked {
                if let (Some(pos), Some(id)) = (pointer, event.id) {
                    if rect.contains(pos) {
                        clicked = Some((id, pos));
                    }
                }
            }
        }
    }

    if let Some((id, pos)) = clicked {
        actions.push(ViewAction::EventClicked(id, pos));
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_drag(
    ui: &egui::Ui,
    calendar: &Calendar,
    drag: &mut DragSelect,
    response: &egui::Response,
    body: Rect,
    cell_width: f32,
    cell_height: f32,
    actions: &mut Vec<ViewAction>,
) {
    let pointer = ui.input(|i| i.pointer.interact_pos());
    let over_cell = pointer.and_then(|p| cell_at(calendar, body, cell_width, cell_height, p));

    if response.drag_started_by(egui::PointerButton::Primary) {
        if let Some(index) = over_cell {
            drag.begin(index, true);
        }
    }
    if response.dragged() {
        if let Some(index) = over_cell {
            drag.update(index);
        }
    }
    if response.drag_stopped() {
        match (over_cell, pointer) {
            (Some(_), Some(pos)) => {
                if let Some(span) = drag.finish() {
                    actions.push(ViewAction::SelectionFinished(span, pos));
                }
            }
            _ => drag.cancel(),
        }
    }
}
