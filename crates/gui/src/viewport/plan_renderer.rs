//! 2D plan-view painting via egui's painter.
//!
//! Everything is drawn through the shared [`CameraState`] transform and
//! the local coordinate frame — the same pipeline inputs as the 3D
//! view, so the two can never disagree about where a hole is.

use egui::{Align2, Color32, FontId, Rect, Stroke, Ui};
use glam::DVec2;
use shared::{Hole, KadEntity, KadGeometry};

use blastpad_gui_lib::state::AppState;
use blastpad_gui_lib::viewport::camera::CameraState;
use blastpad_gui_lib::viewport::frame::LocalFrame;

/// Hole IDs are labelled above this zoom level (pixels per metre)
const LABEL_MIN_SCALE: f64 = 3.0;

/// Paint the plan view
pub fn paint_plan(ui: &Ui, rect: Rect, state: &AppState) {
    let painter = ui.painter_at(rect);

    let bg = state.settings.viewport.background_color;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(bg[0], bg[1], bg[2]));

    if state.settings.grid.visible {
        draw_grid(&painter, rect, &state.camera, state);
    }

    let selected = state.selection.selected_hole_keys();
    let selected_kad = state.selection.selected_kad_name();

    for entity in state.drawing.drawing.kad.values() {
        let is_selected = selected_kad == Some(entity.name.as_str());
        draw_kad_entity(&painter, rect, &state.camera, &state.frame, entity, is_selected, state);
    }

    for hole in &state.drawing.drawing.holes {
        let is_selected = selected.contains(&hole.combined_key());
        draw_hole(&painter, rect, &state.camera, &state.frame, hole, is_selected, state);
    }

    draw_vertex_highlight(&painter, rect, state);
}

fn to_screen(
    camera: &CameraState,
    frame: &LocalFrame,
    rect: Rect,
    world: [f64; 3],
) -> egui::Pos2 {
    let local = frame.to_local(world[0], world[1]);
    camera.plan_to_screen(local, rect)
}

fn draw_grid(painter: &egui::Painter, rect: Rect, camera: &CameraState, state: &AppState) {
    let spacing = state.settings.grid.spacing;
    if spacing <= 0.0 {
        return;
    }
    // Skip the grid when cells would collapse below a few pixels
    if spacing * camera.scale < 6.0 {
        return;
    }
    let alpha = (state.settings.grid.opacity * 255.0) as u8;
    let stroke = Stroke::new(0.5, Color32::from_rgba_premultiplied(70, 70, 70, alpha));

    // Visible local bounds from the screen corners
    let corners = [
        camera.screen_to_plan(rect.min, rect),
        camera.screen_to_plan(egui::pos2(rect.max.x, rect.min.y), rect),
        camera.screen_to_plan(egui::pos2(rect.min.x, rect.max.y), rect),
        camera.screen_to_plan(rect.max, rect),
    ];
    let min_x = corners.iter().map(|c| c.x).fold(f64::MAX, f64::min);
    let max_x = corners.iter().map(|c| c.x).fold(f64::MIN, f64::max);
    let min_y = corners.iter().map(|c| c.y).fold(f64::MAX, f64::min);
    let max_y = corners.iter().map(|c| c.y).fold(f64::MIN, f64::max);

    let mut x = (min_x / spacing).floor() * spacing;
    while x <= max_x {
        let a = camera.plan_to_screen(DVec2::new(x, min_y), rect);
        let b = camera.plan_to_screen(DVec2::new(x, max_y), rect);
        painter.line_segment([a, b], stroke);
        x += spacing;
    }
    let mut y = (min_y / spacing).floor() * spacing;
    while y <= max_y {
        let a = camera.plan_to_screen(DVec2::new(min_x, y), rect);
        let b = camera.plan_to_screen(DVec2::new(max_x, y), rect);
        painter.line_segment([a, b], stroke);
        y += spacing;
    }
}

fn draw_hole(
    painter: &egui::Painter,
    rect: Rect,
    camera: &CameraState,
    frame: &LocalFrame,
    hole: &Hole,
    selected: bool,
    state: &AppState,
) {
    let collar = to_screen(camera, frame, rect, hole.collar);
    let toe = to_screen(camera, frame, rect, hole.toe);

    let rgb = if selected {
        state.settings.viewport.selection_color
    } else {
        state.settings.viewport.hole_color
    };
    let color = Color32::from_rgb(rgb[0], rgb[1], rgb[2]);
    let stroke = Stroke::new(if selected { 2.0 } else { 1.0 }, color);

    // Collar-to-toe track (visible for angled holes)
    if (toe - collar).length() > 0.5 {
        painter.line_segment([collar, toe], stroke);
        painter.circle_filled(toe, 2.0, color);
    }

    // Collar circle at true diameter once zoomed in, else a fixed dot
    let radius_px = ((hole.diameter / 1000.0) * 0.5 * camera.scale).max(3.0) as f32;
    painter.circle_stroke(collar, radius_px, stroke);
    if selected {
        painter.circle_stroke(collar, radius_px + 3.0, Stroke::new(1.0, color));
    }

    if camera.scale > LABEL_MIN_SCALE {
        painter.text(
            collar + egui::vec2(radius_px + 3.0, -radius_px - 3.0),
            Align2::LEFT_BOTTOM,
            &hole.hole_id,
            FontId::monospace(10.0),
            Color32::from_rgb(200, 200, 200),
        );
    }
}

fn draw_kad_entity(
    painter: &egui::Painter,
    rect: Rect,
    camera: &CameraState,
    frame: &LocalFrame,
    entity: &KadEntity,
    selected: bool,
    state: &AppState,
) {
    let rgb = if selected {
        state.settings.viewport.selection_color
    } else {
        entity.style.color
    };
    let alpha = (entity.style.opacity.clamp(0.0, 1.0) * 255.0) as u8;
    let color = Color32::from_rgba_unmultiplied(rgb[0], rgb[1], rgb[2], alpha);
    let width = if selected {
        entity.style.line_width + 1.0
    } else {
        entity.style.line_width
    };
    let stroke = Stroke::new(width, color);

    match &entity.geometry {
        KadGeometry::Point { vertex } => {
            let p = to_screen(camera, frame, rect, vertex.position);
            painter.line_segment([p - egui::vec2(4.0, 0.0), p + egui::vec2(4.0, 0.0)], stroke);
            painter.line_segment([p - egui::vec2(0.0, 4.0), p + egui::vec2(0.0, 4.0)], stroke);
        }
        KadGeometry::Line { vertices } => {
            for pair in vertices.windows(2) {
                let a = to_screen(camera, frame, rect, pair[0].position);
                let b = to_screen(camera, frame, rect, pair[1].position);
                painter.line_segment([a, b], stroke);
            }
        }
        KadGeometry::Polygon { vertices } => {
            for i in 0..vertices.len() {
                let a = to_screen(camera, frame, rect, vertices[i].position);
                let b = to_screen(
                    camera,
                    frame,
                    rect,
                    vertices[(i + 1) % vertices.len()].position,
                );
                painter.line_segment([a, b], stroke);
            }
        }
        KadGeometry::Circle { center, radius } => {
            let c = to_screen(camera, frame, rect, center.position);
            painter.circle_stroke(c, (*radius * camera.scale) as f32, stroke);
        }
        KadGeometry::Text { anchor, text } => {
            let p = to_screen(camera, frame, rect, anchor.position);
            painter.text(p, Align2::LEFT_CENTER, text, FontId::proportional(12.0), color);
        }
    }
}

/// Highlight the selected KAD vertex. Drawn only when both halves of
/// the (entity, pointID) pair still resolve; otherwise skipped.
fn draw_vertex_highlight(painter: &egui::Painter, rect: Rect, state: &AppState) {
    let Some((_, vertex)) = state.selection.resolve_vertex(&state.drawing.drawing) else {
        return;
    };
    let rgb = state.settings.viewport.selection_color;
    let color = Color32::from_rgb(rgb[0], rgb[1], rgb[2]);
    let p = to_screen(&state.camera, &state.frame, rect, vertex.position);
    painter.rect_stroke(
        Rect::from_center_size(p, egui::vec2(8.0, 8.0)),
        0.0,
        Stroke::new(2.0, color),
        egui::StrokeKind::Outside,
    );
}
