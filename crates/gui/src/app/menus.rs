//! Menu bar: file, view and settings menus

use eframe::egui;
use egui::Ui;
use shared::Drawing;

use crate::viewport::ViewportPanel;
use blastpad_gui_lib::state::AppState;

pub fn file_menu(ui: &mut Ui, state: &mut AppState) {
    ui.menu_button("File", |ui| {
        if ui.button("New drawing").clicked() {
            state.drawing.clear();
            state.selection.clear();
            ui.close_menu();
        }

        ui.separator();

        if ui.button("Open…").clicked() {
            open_drawing(state);
            ui.close_menu();
        }

        if ui.button("Save as…").clicked() {
            save_drawing(state);
            ui.close_menu();
        }
    });
}

pub fn view_menu(ui: &mut Ui, state: &mut AppState, viewport: &mut ViewportPanel) {
    ui.menu_button("View", |ui| {
        ui.checkbox(&mut state.panels.tree, "Tree panel");
        ui.checkbox(&mut state.panels.properties, "Properties panel");
        ui.checkbox(&mut state.settings.grid.visible, "Plan grid");

        ui.separator();

        if ui.button("Zoom to fit").clicked() {
            viewport.zoom_fit(state);
            ui.close_menu();
        }
        if ui.button("Reset view").clicked() {
            viewport.reset_view(state);
            ui.close_menu();
        }
    });
}

pub fn settings_menu(ui: &mut Ui, state: &mut AppState) {
    ui.menu_button("Settings", |ui| {
        ui.label("Font size");
        ui.add(egui::Slider::new(&mut state.settings.ui.font_size, 10.0..=20.0));

        ui.separator();

        ui.label("Drift threshold (m)");
        ui.add(
            egui::Slider::new(&mut state.settings.precision.drift_threshold, 1_000.0..=50_000.0)
                .logarithmic(true),
        );

        ui.label("Chunk ceiling (vertices)");
        ui.add(
            egui::Slider::new(&mut state.settings.precision.chunk_ceiling, 1_000..=60_000)
                .logarithmic(true),
        );
    });
}

fn open_drawing(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("Blastpad drawing", &["json"])
        .pick_file()
    else {
        return;
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => match serde_json::from_str::<Drawing>(&json) {
            Ok(drawing) => {
                tracing::info!(holes = drawing.holes.len(), "Opened {}", path.display());
                state.drawing.set_drawing(drawing);
                state.selection.clear();
            }
            Err(e) => {
                tracing::error!("Failed to parse drawing {}: {e}", path.display());
                state.last_error = Some(format!("Open failed: {e}"));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read {}: {e}", path.display());
            state.last_error = Some(format!("Open failed: {e}"));
        }
    }
}

fn save_drawing(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .add_filter("Blastpad drawing", &["json"])
        .set_file_name("drawing.json")
        .save_file()
    else {
        return;
    };
    match serde_json::to_string_pretty(&state.drawing.drawing) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::error!("Failed to save {}: {e}", path.display());
                state.last_error = Some(format!("Save failed: {e}"));
            }
        }
        Err(e) => {
            tracing::error!("Failed to serialize drawing: {e}");
            state.last_error = Some(format!("Save failed: {e}"));
        }
    }
}
