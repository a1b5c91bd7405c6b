//! Properties panel: attribute fields for the selected holes.
//!
//! Every field routes through the geometry engine — the panel never
//! writes hole coordinates directly, so grade and toe always stay on
//! the hole ray no matter which attribute was edited.

use egui::Ui;
use shared::Hole;

use blastpad_gui_lib::geometry::HoleEdit;
use blastpad_gui_lib::state::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Properties");
    ui.separator();

    let holes = state.selection.selection().holes().to_vec();
    if holes.is_empty() {
        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.weak("Select a hole to edit");
            ui.weak("its attributes");
        });
        return;
    }

    // Fields show the first selected hole; edits apply to all of them
    let Some(first) = state
        .drawing
        .drawing
        .hole(&holes[0].entity_name, &holes[0].hole_id)
        .cloned()
    else {
        ui.weak("Selection no longer exists");
        return;
    };

    ui.horizontal(|ui| {
        ui.strong(format!("{} / {}", first.entity_name, first.hole_id));
        if holes.len() > 1 {
            ui.weak(format!("(+{} more)", holes.len() - 1));
        }
    });
    ui.add_space(4.0);

    let mut pending: Option<HoleEdit> = None;

    egui::CollapsingHeader::new("Collar")
        .id_salt("prop_collar")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("collar_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    pending = pending
                        .or(drag_row(ui, "East", first.collar[0], 0.1, HoleEdit::CollarX));
                    pending = pending
                        .or(drag_row(ui, "North", first.collar[1], 0.1, HoleEdit::CollarY));
                    pending =
                        pending.or(drag_row(ui, "RL", first.collar[2], 0.1, HoleEdit::CollarZ));
                });
        });

    egui::CollapsingHeader::new("Geometry")
        .id_salt("prop_geometry")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("geometry_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    pending = pending.or(drag_row(ui, "Angle °", first.angle, 0.5, HoleEdit::Angle));
                    pending =
                        pending.or(drag_row(ui, "Bearing °", first.bearing, 1.0, HoleEdit::Bearing));
                    pending = pending.or(drag_row(ui, "Length", first.length, 0.1, HoleEdit::Length));
                    pending =
                        pending.or(drag_row(ui, "Subdrill", first.subdrill, 0.1, HoleEdit::Subdrill));
                    pending =
                        pending.or(drag_row(ui, "Grade RL", first.grade[2], 0.1, HoleEdit::GradeZ));
                    pending = pending
                        .or(drag_row(ui, "Diameter", first.diameter, 1.0, HoleEdit::Diameter));
                });
        });

    egui::CollapsingHeader::new("Derived")
        .id_salt("prop_derived")
        .default_open(false)
        .show(ui, |ui| {
            show_derived(ui, &first);
        });

    if let Some(edit) = pending {
        state.apply_hole_edit(edit);
    }
}

/// One editable attribute row. Returns the edit when the value changed.
fn drag_row(
    ui: &mut Ui,
    label: &str,
    value: f64,
    speed: f64,
    edit: fn(f64) -> HoleEdit,
) -> Option<HoleEdit> {
    ui.label(label);
    let mut v = value;
    let changed = ui
        .add(egui::DragValue::new(&mut v).speed(speed).max_decimals(3))
        .changed();
    ui.end_row();
    (changed && v != value).then(|| edit(v))
}

fn show_derived(ui: &mut Ui, hole: &Hole) {
    egui::Grid::new("derived_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Bench height:");
            ui.monospace(format!("{:.2}", hole.bench_height));
            ui.end_row();

            ui.label("Toe RL:");
            ui.monospace(format!("{:.2}", hole.toe[2]));
            ui.end_row();

            ui.label("Toe E/N:");
            ui.monospace(format!("{:.2} / {:.2}", hole.toe[0], hole.toe[1]));
            ui.end_row();

            ui.label("Times from:");
            if hole.is_timing_origin() {
                ui.monospace("(self)");
            } else {
                ui.monospace(&hole.from_hole);
            }
            ui.end_row();
        });
}
