//! Main application module

mod keyboard;
mod menus;
mod styles;

use std::time::{Duration, Instant};

use eframe::egui;

use crate::ui::{properties, status_bar, toolbar, tree_panel};
use crate::viewport::ViewportPanel;
use blastpad_gui_lib::state::{AppState, SaveDebouncer};

/// Main application
pub struct BlastApp {
    state: AppState,
    viewport: ViewportPanel,
    debouncer: SaveDebouncer,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
}

impl BlastApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_drawing: Option<shared::Drawing>) -> Self {
        let mut state = AppState::load();

        // CLI argument takes priority over the autosave already loaded
        if let Some(drawing) = initial_drawing {
            state.drawing.set_drawing(drawing);
        }

        styles::configure_styles(&cc.egui_ctx, state.settings.ui.font_size);

        let mut viewport = ViewportPanel::new(state.settings.precision.chunk_ceiling);
        if let Some(gl) = cc.gl.as_ref() {
            viewport.init_gl(gl);
        }

        let last_font_size = state.settings.ui.font_size;

        Self {
            state,
            viewport,
            debouncer: SaveDebouncer::new(Duration::from_millis(1500)),
            last_font_size,
        }
    }
}

impl eframe::App for BlastApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply font size if changed
        if self.state.settings.ui.font_size != self.last_font_size {
            styles::apply_font_size(ctx, self.state.settings.ui.font_size);
            self.last_font_size = self.state.settings.ui.font_size;
        }

        // Debounced autosave after committed mutations
        let fingerprint = (self.state.drawing.version(), self.state.selection.version());
        if self.debouncer.tick(fingerprint, Instant::now()) {
            self.state.drawing.autosave();
            self.state.settings.save();
        }

        keyboard::handle_keyboard(ctx, &mut self.state);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state, &mut self.viewport);
                menus::settings_menu(ui, &mut self.state);
            });
        });

        // ── Toolbar ───────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(egui::Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                toolbar::show(ui, &mut self.state);
            });

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &mut self.state);
            });

        // ── Left panel: drawing tree ─────────────────────────
        if self.state.panels.tree {
            egui::SidePanel::left("tree_panel")
                .default_width(210.0)
                .width_range(140.0..=400.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    tree_panel::show(ui, &mut self.state);
                });
        }

        // ── Right panel: properties ──────────────────────────
        if self.state.panels.properties {
            egui::SidePanel::right("properties_panel")
                .default_width(230.0)
                .width_range(180.0..=400.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    properties::show(ui, &mut self.state);
                });
        }

        // ── Central panel: plan + 3D viewports ───────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        // Explicit GPU teardown; nothing is left to implicit cleanup
        if let Some(gl) = gl {
            self.viewport.destroy_gl(gl);
        }
        self.state.drawing.autosave();
        self.state.settings.save();
    }
}
