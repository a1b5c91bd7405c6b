//! Status bar: counts, selection summary, frame notices and edit errors.

use egui::{Color32, Ui};

use blastpad_gui_lib::state::{AppState, Selection};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        let drawing = &state.drawing.drawing;
        ui.weak(format!("Holes: {}", drawing.holes.len()));
        ui.separator();
        ui.weak(format!("Patterns: {}", drawing.pattern_names().len()));

        match state.selection.selection() {
            Selection::None => {}
            Selection::Holes(holes) => {
                ui.separator();
                ui.label(format!("{} hole(s) selected", holes.len()));
            }
            Selection::KadEntity(name) => {
                ui.separator();
                ui.label(format!("Entity: {name}"));
            }
            Selection::KadVertex { entity, point_id } => {
                ui.separator();
                ui.label(format!("Vertex {point_id} of {entity}"));
            }
            Selection::Multiple { holes, entities } => {
                ui.separator();
                ui.label(format!(
                    "{} hole(s), {} entities selected",
                    holes.len(),
                    entities.len()
                ));
            }
        }

        if state.frame.is_initialized() {
            ui.separator();
            let origin = state.frame.origin();
            ui.weak(format!("Origin: {:.0}E {:.0}N", origin.x, origin.y));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some(error) = &state.last_error {
                let error = error.clone();
                if ui.small_button("✕").clicked() {
                    state.last_error = None;
                }
                ui.colored_label(Color32::from_rgb(240, 100, 90), error);
            } else if let Some(notice) = &state.frame_notice {
                let notice = notice.clone();
                if ui.small_button("✕").clicked() {
                    state.frame_notice = None;
                }
                ui.colored_label(Color32::from_rgb(230, 200, 90), notice);
            }
        });
    });
}
