//! Global keyboard shortcuts

use eframe::egui;

use blastpad_gui_lib::state::AppState;

pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState) {
    // Leave keys alone while a text field has focus
    if ctx.wants_keyboard_input() {
        return;
    }

    ctx.input(|i| {
        if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
            state.delete_selected();
        }

        if i.modifiers.command && i.key_pressed(egui::Key::Z) {
            if i.modifiers.shift {
                state.drawing.redo();
            } else {
                state.drawing.undo();
            }
            state.selection.prune(&state.drawing.drawing);
        }
        if i.modifiers.command && i.key_pressed(egui::Key::Y) {
            state.drawing.redo();
            state.selection.prune(&state.drawing.drawing);
        }
    });
}
