//! Split viewport: 2D plan on the left, 3D view on the right.
//!
//! Both halves read the same `CameraState` and `LocalFrame` from the
//! application state and share one render resource set.

mod gl_renderer;
mod plan_renderer;

pub use blastpad_gui_lib::viewport::{camera, frame, mesh, resources};

use std::sync::{Arc, Mutex};

use egui::Ui;
use glam::DVec2;
use shared::HoleRef;

use blastpad_gui_lib::state::AppState;
use camera::SceneOrbit;
use gl_renderer::GlRenderer;
use resources::{CancelFlag, RebuildParams, RenderSet, ResourceError};

/// Pick radius around a collar, in screen pixels
const PICK_RADIUS: f32 = 8.0;

/// Split viewport panel
pub struct ViewportPanel {
    orbit: SceneOrbit,
    gl_renderer: Option<Arc<Mutex<GlRenderer>>>,
    render_set: Arc<Mutex<RenderSet>>,
    cancel: CancelFlag,
    /// Plan rect from the last frame, for zoom-to-fit from the menu
    last_plan_rect: Option<egui::Rect>,
}

impl ViewportPanel {
    pub fn new(chunk_ceiling: usize) -> Self {
        Self {
            orbit: SceneOrbit::default(),
            gl_renderer: None,
            render_set: Arc::new(Mutex::new(RenderSet::new(chunk_ceiling))),
            cancel: CancelFlag::default(),
            last_plan_rect: None,
        }
    }

    /// Initialize GL renderer (must be called with a GL context)
    pub fn init_gl(&mut self, gl: &glow::Context) {
        let renderer = GlRenderer::new(gl);
        self.gl_renderer = Some(Arc::new(Mutex::new(renderer)));
    }

    /// Session teardown: dispose all GPU resources
    pub fn destroy_gl(&mut self, gl: &glow::Context) {
        if let Some(renderer) = &self.gl_renderer {
            if let Ok(mut r) = renderer.lock() {
                r.destroy(gl);
            }
        }
        self.gl_renderer = None;
    }

    /// Graphics-device loss entry point: stop drawing, drop logical
    /// handle references, flag the resource set for regeneration.
    /// Called by the host when the GL backend reports a lost device.
    #[allow(dead_code)]
    pub fn notify_context_lost(&mut self) {
        if let Some(renderer) = &self.gl_renderer {
            if let Ok(mut r) = renderer.lock() {
                r.notify_context_lost();
            }
        }
        if let Ok(mut set) = self.render_set.lock() {
            set.notify_context_lost();
        }
    }

    pub fn reset_view(&mut self, state: &mut AppState) {
        self.orbit = SceneOrbit::default();
        state.camera = camera::CameraState::default();
    }

    /// Frame the camera on the whole drawing
    pub fn zoom_fit(&self, state: &mut AppState) {
        let Some(rect) = self.last_plan_rect else {
            return;
        };
        let drawing = &state.drawing.drawing;
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        let mut any = false;
        let mut include = |world: [f64; 3]| {
            let local = state.frame.to_local(world[0], world[1]);
            min = min.min(local);
            max = max.max(local);
            any = true;
        };
        for hole in &drawing.holes {
            include(hole.collar);
            include(hole.toe);
        }
        for entity in drawing.kad.values() {
            for v in entity.geometry.vertices() {
                include(v.position);
            }
        }
        if any {
            state.camera.fit_bounds(min, max, rect);
        }
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        state.maintain_frame();

        let full = ui.available_rect_before_wrap();
        let plan_rect = egui::Rect::from_min_max(
            full.min,
            egui::pos2(full.min.x + full.width() * 0.5 - 1.0, full.max.y),
        );
        let scene_rect = egui::Rect::from_min_max(
            egui::pos2(full.min.x + full.width() * 0.5 + 1.0, full.min.y),
            full.max,
        );
        self.last_plan_rect = Some(plan_rect);

        self.handle_plan_input(ui, plan_rect, state);
        self.handle_scene_input(ui, scene_rect, state);

        // Esc cancels a long geometry rebuild between chunks
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.cancel.cancel();
        }

        self.rebuild_resources_if_stale(state);

        if !ui.is_rect_visible(full) {
            return;
        }

        plan_renderer::paint_plan(ui, plan_rect, state);
        self.render_scene(ui, scene_rect, state);
    }

    // ── Input handling ───────────────────────────────────────

    fn handle_plan_input(&mut self, ui: &mut Ui, rect: egui::Rect, state: &mut AppState) {
        let response = ui.interact(rect, ui.id().with("plan"), egui::Sense::click_and_drag());

        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            state.camera.pan_pixels(response.drag_delta());
        }

        if let Some(pos) = response.hover_pos() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let factor = (scroll as f64 * 0.005).exp();
                state.camera.zoom_about(factor, pos, rect);
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let toggle = ui.input(|i| i.modifiers.ctrl);
                self.pick_at(pos, rect, state, toggle);
            }
        }
    }

    fn handle_scene_input(&mut self, ui: &mut Ui, rect: egui::Rect, state: &mut AppState) {
        let response = ui.interact(rect, ui.id().with("scene"), egui::Sense::click_and_drag());

        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            self.orbit.rotate(delta.x * 0.4, delta.y * 0.4);
        }
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            state.camera.pan_pixels(response.drag_delta());
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.1 {
                // Same zoom scalar as the plan view; the 3D frustum
                // itself never changes with zoom
                let factor = (scroll as f64 * 0.005).exp();
                state.camera.scale = (state.camera.scale * factor).clamp(0.01, 10_000.0);
            }
        }
    }

    /// Select the hole nearest to `pos` within the pick radius
    fn pick_at(&self, pos: egui::Pos2, rect: egui::Rect, state: &mut AppState, toggle: bool) {
        let mut best: Option<(HoleRef, f32)> = None;
        for hole in &state.drawing.drawing.holes {
            let local = state.frame.to_local(hole.collar[0], hole.collar[1]);
            let screen = state.camera.plan_to_screen(local, rect);
            let dist = (screen - pos).length();
            if dist <= PICK_RADIUS && best.as_ref().is_none_or(|(_, d)| dist < *d) {
                best = Some((hole.reference(), dist));
            }
        }
        match best {
            Some((reference, _)) => {
                if toggle {
                    state.selection.toggle_hole(reference);
                } else {
                    state.selection.select_hole(reference);
                }
            }
            None if !toggle => state.selection.clear(),
            None => {}
        }
    }

    // ── Resource rebuild ─────────────────────────────────────

    fn rebuild_resources_if_stale(&mut self, state: &mut AppState) {
        let Ok(mut set) = self.render_set.lock() else {
            return;
        };
        set.set_chunk_ceiling(state.settings.precision.chunk_ceiling);
        if set.is_current(
            state.drawing.version(),
            state.selection.version(),
            state.frame.generation(),
        ) {
            return;
        }
        let selected_holes = state.selection.selected_hole_keys();
        let params = RebuildParams {
            drawing: &state.drawing.drawing,
            frame: &state.frame,
            selected_holes: &selected_holes,
            selected_kad: state.selection.selected_kad_name(),
            hole_color: state.settings.hole_rgba(),
            selection_color: state.settings.selection_rgba(),
            drawing_version: state.drawing.version(),
            selection_version: state.selection.version(),
        };
        match set.rebuild(&params, &self.cancel) {
            Ok(stats) => {
                tracing::debug!(
                    entities = stats.entities,
                    chunks = stats.line_chunks,
                    "render resources rebuilt"
                );
            }
            Err(ResourceError::Cancelled) => {
                // Retried next frame with a fresh flag
                self.cancel.clear();
                state.frame_notice = Some("Geometry rebuild cancelled".into());
            }
            Err(ResourceError::ContextLost) => {
                // Recoverable: acknowledge and regenerate next frame
                set.acknowledge_context_loss();
                if let Some(renderer) = &self.gl_renderer {
                    if let Ok(mut r) = renderer.lock() {
                        r.recover();
                    }
                }
                state.frame_notice =
                    Some("Graphics context lost; geometry regenerated".into());
            }
        }
    }

    // ── 3D rendering ─────────────────────────────────────────

    fn render_scene(&self, ui: &mut Ui, rect: egui::Rect, state: &AppState) {
        let Some(gl_renderer) = &self.gl_renderer else {
            // No GL context: leave the right pane blank with the bg color
            let bg = state.settings.viewport.background_color;
            ui.painter_at(rect)
                .rect_filled(rect, 0.0, egui::Color32::from_rgb(bg[0], bg[1], bg[2]));
            return;
        };

        let renderer = gl_renderer.clone();
        let render_set = self.render_set.clone();
        let camera = state.camera.clone();
        let orbit = self.orbit;
        let bg_color = state.settings.viewport.background_color;

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(eframe::egui_glow::CallbackFn::new(move |info, painter| {
                let gl = painter.gl();
                let clip = info.clip_rect_in_pixels();
                let viewport = [
                    clip.left_px as f32,
                    clip.from_bottom_px as f32,
                    clip.width_px as f32,
                    clip.height_px as f32,
                ];

                if let (Ok(mut r), Ok(set)) = (renderer.lock(), render_set.lock()) {
                    r.sync(gl, &set);
                    let params = gl_renderer::RenderParams { viewport, bg_color };
                    r.paint(gl, &camera, &orbit, &params);
                }
            })),
        };
        ui.painter().add(callback);
    }
}
