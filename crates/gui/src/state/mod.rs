//! Application state: drawing, selection, settings, camera and the
//! local coordinate frame.
//!
//! `CameraState` and `LocalFrame` are the per-session singletons of the
//! view stack; they live here with a single writer (the active input
//! handler) and everything else reads them.

pub mod drawing;
pub mod persistence;
pub mod selection;
pub mod settings;

use glam::DVec2;

pub use drawing::{AddHoleParams, DrawingState, PatternParams};
pub use persistence::SaveDebouncer;
pub use selection::{Selection, SelectionBridge, SelectionKind, SelectionNotice};
pub use settings::AppSettings;

use crate::geometry::HoleEdit;
use crate::viewport::camera::CameraState;
use crate::viewport::frame::LocalFrame;

/// Panel visibility flags
pub struct PanelVisibility {
    pub tree: bool,
    pub properties: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            tree: true,
            properties: true,
        }
    }
}

/// Combined application state
pub struct AppState {
    pub drawing: DrawingState,
    pub selection: SelectionBridge,
    pub settings: AppSettings,
    /// The single shared pan/zoom state both renderers derive from
    pub camera: CameraState,
    /// The single world-to-local frame both renderers convert through
    pub frame: LocalFrame,
    pub panels: PanelVisibility,
    /// Last rejected edit, shown in the status bar
    pub last_error: Option<String>,
    /// One-time notice after a forced frame re-anchor
    pub frame_notice: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            drawing: DrawingState::default(),
            selection: SelectionBridge::default(),
            settings: AppSettings::default(),
            camera: CameraState::default(),
            frame: LocalFrame::default(),
            panels: PanelVisibility::default(),
            last_error: None,
            frame_notice: None,
        }
    }
}

impl AppState {
    /// State for an interactive session: settings and autosave from disk
    pub fn load() -> Self {
        let mut state = Self {
            settings: AppSettings::load(),
            ..Self::default()
        };
        state.frame = LocalFrame::new(state.settings.precision.drift_threshold);
        if let Some(drawing) = DrawingState::load_autosave() {
            tracing::info!(holes = drawing.holes.len(), "Loaded autosave drawing");
            state.drawing.set_drawing(drawing);
        }
        state
    }

    /// Keep the local frame anchored near the working set. Called once
    /// per frame before any geometry is built; a reset bumps the frame
    /// generation, which forces a full renderer-resource regeneration,
    /// and shifts the camera pan so the view does not jump.
    pub fn maintain_frame(&mut self) {
        let Some((cx, cy)) = self.drawing.drawing.centroid_xy() else {
            return;
        };
        let centroid = DVec2::new(cx, cy);
        if !self.frame.is_initialized() {
            self.frame.reset(centroid);
            self.camera.centroid = DVec2::ZERO;
        } else if self.frame.drift_exceeded(centroid) {
            let old_origin = self.frame.origin();
            self.frame.reset(centroid);
            let delta = self.frame.origin() - old_origin;
            self.camera.centroid -= delta;
            self.frame_notice = Some(format!(
                "Local origin re-anchored after {:.0} m drift; geometry rebuilt",
                delta.length()
            ));
        }
    }

    /// Apply an attribute edit to every selected hole. Rejections leave
    /// the drawing untouched and surface in `last_error`.
    pub fn apply_hole_edit(&mut self, edit: HoleEdit) -> bool {
        let refs = self.selection.selection().holes().to_vec();
        if refs.is_empty() {
            return false;
        }
        match self.drawing.apply_edit(&refs, edit) {
            Ok(count) => {
                self.last_error = None;
                count > 0
            }
            Err(e) => {
                tracing::warn!("Edit rejected: {e}");
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Delete everything selected, repointing timing references and
    /// pruning the selection afterwards.
    pub fn delete_selected(&mut self) {
        let holes = self.selection.selection().holes().to_vec();
        let entities: Vec<String> = self
            .selection
            .selection()
            .kad_entities()
            .into_iter()
            .map(String::from)
            .collect();
        for reference in &holes {
            self.drawing.delete_hole(&reference.entity_name, &reference.hole_id);
        }
        for name in &entities {
            self.drawing.remove_kad(name);
        }
        self.selection.prune(&self.drawing.drawing);
    }
}
