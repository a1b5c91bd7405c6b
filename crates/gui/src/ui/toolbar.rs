//! Toolbar actions and UI

use egui::Ui;
use shared::{KadEntity, KadGeometry, KadVertex};

use blastpad_gui_lib::state::{AddHoleParams, AppState, PatternParams};

// ── Public actions (callable from menus too) ─────────────────

/// Add a single hole at the current view centre
pub fn action_add_hole(state: &mut AppState) {
    let collar = view_centre_world(state);
    let reference = state.drawing.add_hole(AddHoleParams {
        entity_name: active_pattern_name(state),
        collar,
        ..AddHoleParams::default()
    });
    state.selection.select_hole(reference);
}

/// Add a default grid pattern at the current view centre
pub fn action_add_pattern(state: &mut AppState) {
    let origin = view_centre_world(state);
    let name = next_pattern_name(state);
    let refs = state.drawing.add_pattern(PatternParams {
        name,
        origin,
        rows: 4,
        columns: 6,
        spacing: 5.0,
        burden: 4.5,
        hole: AddHoleParams::default(),
    });
    if let Some(first) = refs.first() {
        state.selection.select_hole(first.clone());
    }
}

/// Add a demo annotation circle around the view centre
pub fn action_add_kad_circle(state: &mut AppState) {
    let centre = view_centre_world(state);
    let name = unique_kad_name(state, "circle");
    state.drawing.add_kad(KadEntity::new(
        name.clone(),
        KadGeometry::Circle {
            center: KadVertex::new(1, centre),
            radius: 20.0,
        },
    ));
    state.selection.select_kad_entity(name);
}

pub fn action_delete_selected(state: &mut AppState) {
    state.delete_selected();
}

// ── Toolbar UI ───────────────────────────────────────────────

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("⊞ Pattern").on_hover_text("Add a grid pattern").clicked() {
            action_add_pattern(state);
        }
        if ui.button("● Hole").on_hover_text("Add a single hole").clicked() {
            action_add_hole(state);
        }
        if ui.button("◯ Circle").on_hover_text("Add an annotation circle").clicked() {
            action_add_kad_circle(state);
        }

        ui.separator();

        let has_selection = !state.selection.selection().is_none();
        if ui
            .add_enabled(has_selection, egui::Button::new("🗑 Delete"))
            .on_hover_text("Delete selection (timing references repoint)")
            .clicked()
        {
            action_delete_selected(state);
        }

        ui.separator();

        if ui.button("↶").on_hover_text("Undo").clicked() {
            state.drawing.undo();
            state.selection.prune(&state.drawing.drawing);
        }
        if ui.button("↷").on_hover_text("Redo").clicked() {
            state.drawing.redo();
            state.selection.prune(&state.drawing.drawing);
        }
    });
}

// ── Helpers ──────────────────────────────────────────────────

fn view_centre_world(state: &AppState) -> [f64; 3] {
    let world = state
        .frame
        .to_world(state.camera.centroid.x, state.camera.centroid.y);
    // New holes start at the bench RL of the working set, if any
    let z = state
        .drawing
        .drawing
        .holes
        .first()
        .map_or(0.0, |h| h.collar[2]);
    [world.x, world.y, z]
}

fn active_pattern_name(state: &AppState) -> String {
    match state.selection.selection().holes().first() {
        Some(reference) => reference.entity_name.clone(),
        None => state
            .drawing
            .drawing
            .pattern_names()
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "blast_1".into()),
    }
}

fn next_pattern_name(state: &AppState) -> String {
    let existing = state.drawing.drawing.pattern_names().len();
    let mut n = existing + 1;
    loop {
        let name = format!("blast_{n}");
        if !state
            .drawing
            .drawing
            .pattern_names()
            .contains(&name.as_str())
        {
            return name;
        }
        n += 1;
    }
}

fn unique_kad_name(state: &AppState, base: &str) -> String {
    if !state.drawing.drawing.kad.contains_key(base) {
        return base.to_string();
    }
    // Short random suffix keeps names unique without a counter scan
    format!("{base}_{}", &uuid::Uuid::new_v4().to_string()[..8])
}
