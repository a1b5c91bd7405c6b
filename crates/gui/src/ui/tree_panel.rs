//! Tree panel: patterns with their holes, KAD entities with their
//! vertices, and surfaces.
//!
//! The tree consumes selection notifications from the bridge and reads
//! the canonical selection for highlighting; it never keeps its own
//! copy. Rows are keyed by the `(entityName, holeID)` pair — a hole ID
//! alone is ambiguous across patterns.

use egui::Ui;
use shared::{HoleRef, KadGeometry};

use blastpad_gui_lib::state::{AppState, Selection};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    // Notifications keep the tree in sync with picks made in the
    // viewports; the latest one is scrolled into view.
    let notices = state.selection.drain_notifications();
    let scroll_target = notices.last().map(|n| (n.entity_name.clone(), n.id.clone()));

    ui.horizontal(|ui| {
        ui.heading("Drawing");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let count = state.drawing.drawing.holes.len();
            ui.weak(format!("({count})"));
        });
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .id_salt("tree_scroll")
        .show(ui, |ui| {
            show_patterns(ui, state, &scroll_target);
            show_kad(ui, state);
            show_surfaces(ui, state);
        });
}

fn show_patterns(ui: &mut Ui, state: &mut AppState, scroll_target: &Option<(String, String)>) {
    let patterns: Vec<String> = state
        .drawing
        .drawing
        .pattern_names()
        .into_iter()
        .map(String::from)
        .collect();

    for pattern in patterns {
        let holes: Vec<HoleRef> = state
            .drawing
            .drawing
            .pattern_holes(&pattern)
            .map(|h| h.reference())
            .collect();

        egui::CollapsingHeader::new(format!("⛏ {pattern}"))
            .id_salt(("pattern", &pattern))
            .default_open(true)
            .show(ui, |ui| {
                for reference in holes {
                    let selected = state
                        .selection
                        .selection()
                        .holes()
                        .contains(&reference);
                    let label = ui.selectable_label(selected, format!("● {}", reference.hole_id));
                    if label.clicked() {
                        if ui.input(|i| i.modifiers.ctrl) {
                            state.selection.toggle_hole(reference.clone());
                        } else {
                            state.selection.select_hole(reference.clone());
                        }
                    }
                    if let Some((entity, id)) = scroll_target {
                        if *entity == reference.entity_name && *id == reference.hole_id {
                            label.scroll_to_me(Some(egui::Align::Center));
                        }
                    }
                }
            });
    }
}

fn show_kad(ui: &mut Ui, state: &mut AppState) {
    let entities: Vec<(String, Vec<u64>)> = state
        .drawing
        .drawing
        .kad
        .values()
        .map(|e| {
            let vertex_ids = match &e.geometry {
                // Only multi-vertex entities expose per-vertex rows
                KadGeometry::Line { vertices } | KadGeometry::Polygon { vertices } => {
                    vertices.iter().map(|v| v.point_id).collect()
                }
                KadGeometry::Point { .. }
                | KadGeometry::Circle { .. }
                | KadGeometry::Text { .. } => Vec::new(),
            };
            (e.name.clone(), vertex_ids)
        })
        .collect();

    if entities.is_empty() {
        return;
    }

    egui::CollapsingHeader::new("✏ Annotations")
        .id_salt("kad_root")
        .default_open(true)
        .show(ui, |ui| {
            for (name, vertex_ids) in entities {
                let entity_selected =
                    matches!(state.selection.selection(), Selection::KadEntity(n) if *n == name);
                if vertex_ids.is_empty() {
                    if ui.selectable_label(entity_selected, &name).clicked() {
                        state.selection.select_kad_entity(name.clone());
                    }
                    continue;
                }
                egui::CollapsingHeader::new(&name)
                    .id_salt(("kad", &name))
                    .show(ui, |ui| {
                        if ui.selectable_label(entity_selected, "(entity)").clicked() {
                            state.selection.select_kad_entity(name.clone());
                        }
                        for point_id in vertex_ids {
                            let vertex_selected = matches!(
                                state.selection.selection(),
                                Selection::KadVertex { entity, point_id: p }
                                    if *entity == name && *p == point_id
                            );
                            let label = ui
                                .selectable_label(vertex_selected, format!("· {point_id}"));
                            if label.clicked() {
                                state.selection.select_kad_vertex(name.clone(), point_id);
                            }
                        }
                    });
            }
        });
}

fn show_surfaces(ui: &mut Ui, state: &mut AppState) {
    let names: Vec<String> = state.drawing.drawing.surfaces.keys().cloned().collect();
    if names.is_empty() {
        return;
    }
    egui::CollapsingHeader::new("▲ Surfaces")
        .id_salt("surfaces_root")
        .default_open(false)
        .show(ui, |ui| {
            for name in names {
                ui.label(name);
            }
        });
}
