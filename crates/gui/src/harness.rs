//! Headless test harness for programmatic drawing manipulation.
//!
//! Mirrors the entry points the UI dialogs use (add/delete holes,
//! attribute recompute, selection) plus the resource rebuild path, so
//! integration tests can drive the whole core without a window.

use shared::{Drawing, Hole, HoleRef, KadEntity, Surface};

use crate::geometry::{GeometryError, HoleEdit};
use crate::state::{AddHoleParams, AppState, PatternParams, Selection, SelectionNotice};
use crate::viewport::resources::{
    CancelFlag, RebuildParams, RebuildStats, RenderSet, ResourceError,
};

/// Headless harness — application state plus a render resource set
pub struct TestHarness {
    pub state: AppState,
    render_set: RenderSet,
    cancel: CancelFlag,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Create a new empty harness
    pub fn new() -> Self {
        let state = AppState::default();
        let render_set = RenderSet::new(state.settings.precision.chunk_ceiling);
        Self {
            state,
            render_set,
            cancel: CancelFlag::default(),
        }
    }

    // ── Drawing manipulation ─────────────────────────────────

    /// Add a vertical hole with defaults at `collar`
    pub fn add_hole(&mut self, pattern: &str, hole_id: &str, collar: [f64; 3]) -> HoleRef {
        self.state.drawing.add_hole(AddHoleParams {
            entity_name: pattern.into(),
            hole_id: Some(hole_id.into()),
            collar,
            ..AddHoleParams::default()
        })
    }

    /// Add a hole with full parameters
    pub fn add_hole_with(&mut self, params: AddHoleParams) -> HoleRef {
        self.state.drawing.add_hole(params)
    }

    /// Add a grid pattern of holes
    pub fn add_pattern(&mut self, params: PatternParams) -> Vec<HoleRef> {
        self.state.drawing.add_pattern(params)
    }

    /// Delete a hole (with timing repoint) and prune the selection
    pub fn delete_hole(&mut self, pattern: &str, hole_id: &str) -> bool {
        let deleted = self.state.drawing.delete_hole(pattern, hole_id);
        if deleted {
            self.state.selection.prune(&self.state.drawing.drawing);
        }
        deleted
    }

    pub fn hole(&self, pattern: &str, hole_id: &str) -> Option<&Hole> {
        self.state.drawing.drawing.hole(pattern, hole_id)
    }

    pub fn hole_count(&self) -> usize {
        self.state.drawing.drawing.holes.len()
    }

    /// Apply an edit to one hole
    pub fn edit_hole(
        &mut self,
        reference: &HoleRef,
        edit: HoleEdit,
    ) -> Result<usize, GeometryError> {
        self.state.drawing.apply_edit(std::slice::from_ref(reference), edit)
    }

    /// Apply an edit to the current selection (UI path)
    pub fn recompute_selected(&mut self, edit: HoleEdit) -> bool {
        self.state.apply_hole_edit(edit)
    }

    pub fn add_kad(&mut self, entity: KadEntity) -> bool {
        self.state.drawing.add_kad(entity)
    }

    pub fn add_surface(&mut self, surface: Surface) -> bool {
        self.state.drawing.add_surface(surface)
    }

    pub fn undo(&mut self) -> bool {
        self.state.drawing.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.state.drawing.redo()
    }

    // ── Selection ────────────────────────────────────────────

    pub fn set_selection(&mut self, selection: Selection) {
        self.state.selection.set(selection);
    }

    pub fn selection(&self) -> &Selection {
        self.state.selection.selection()
    }

    pub fn drain_notifications(&mut self) -> Vec<SelectionNotice> {
        self.state.selection.drain_notifications()
    }

    // ── Rendering resources ──────────────────────────────────

    /// Maintain the local frame and rebuild the render resource set,
    /// exactly as the viewport does before painting a frame
    pub fn rebuild_resources(&mut self) -> Result<RebuildStats, ResourceError> {
        self.state.maintain_frame();
        let selected_holes = self.state.selection.selected_hole_keys();
        let params = RebuildParams {
            drawing: &self.state.drawing.drawing,
            frame: &self.state.frame,
            selected_holes: &selected_holes,
            selected_kad: self.state.selection.selected_kad_name(),
            hole_color: self.state.settings.hole_rgba(),
            selection_color: self.state.settings.selection_rgba(),
            drawing_version: self.state.drawing.version(),
            selection_version: self.state.selection.version(),
        };
        self.render_set.rebuild(&params, &self.cancel)
    }

    pub fn render_set(&self) -> &RenderSet {
        &self.render_set
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Simulate a graphics-device loss (the UI calls this from the GL
    /// layer's error path)
    pub fn notify_context_lost(&mut self) {
        self.render_set.notify_context_lost();
    }

    /// Acknowledge a device loss so the next rebuild regenerates
    pub fn acknowledge_context_loss(&mut self) {
        self.render_set.acknowledge_context_loss();
    }

    // ── Persistence ──────────────────────────────────────────

    /// Export the drawing as JSON
    pub fn export_drawing_json(&self) -> String {
        serde_json::to_string_pretty(&self.state.drawing.drawing).unwrap_or_default()
    }

    /// Load a drawing from JSON (replaces current)
    pub fn load_drawing_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let drawing: Drawing = serde_json::from_str(json)?;
        self.state.drawing.set_drawing(drawing);
        self.state.selection.clear();
        Ok(())
    }
}
