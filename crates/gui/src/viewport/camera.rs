//! Shared camera state driving both the 2D plan and the 3D view.
//!
//! Exactly one [`CameraState`] exists per view session; the plan
//! transform and the 3D rig both derive from it every frame instead of
//! keeping copies that could drift apart. The 3D frustum half-extents
//! are a function of the viewport pixel size only — all user zoom goes
//! through the `scale` scalar, whether it came from a wheel event, a
//! pinch, or a window resize.

use glam::{DVec2, Mat4, Vec2, Vec3};

const MIN_SCALE: f64 = 0.01;
const MAX_SCALE: f64 = 10_000.0;

/// Eye offset for the orthographic view matrix, in projected pixels
const VIEW_DISTANCE: f32 = 1_000.0;
/// Half depth range of the fixed frustum
const HALF_DEPTH: f32 = 1_000_000.0;

/// The single pan/zoom/rotation state shared by both renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    /// View centre in local-frame coordinates
    pub centroid: DVec2,
    /// Zoom, screen pixels per metre
    pub scale: f64,
    /// Plan rotation in radians (counter-clockwise)
    pub rotation: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            centroid: DVec2::ZERO,
            scale: 10.0,
            rotation: 0.0,
        }
    }
}

impl CameraState {
    /// Local-frame point to plan screen position.
    /// `screen = (local − pan) · scale`, rotated, centred, y flipped.
    pub fn plan_to_screen(&self, local: DVec2, rect: egui::Rect) -> egui::Pos2 {
        let rel = (local - self.centroid) * self.scale;
        let (sin, cos) = self.rotation.sin_cos();
        let rx = rel.x * cos - rel.y * sin;
        let ry = rel.x * sin + rel.y * cos;
        egui::pos2(
            rect.center().x + rx as f32,
            rect.center().y - ry as f32,
        )
    }

    /// Plan screen position back to a local-frame point
    pub fn screen_to_plan(&self, pos: egui::Pos2, rect: egui::Rect) -> DVec2 {
        let rx = (pos.x - rect.center().x) as f64;
        let ry = -((pos.y - rect.center().y) as f64);
        let (sin, cos) = (-self.rotation).sin_cos();
        let x = rx * cos - ry * sin;
        let y = rx * sin + ry * cos;
        self.centroid + DVec2::new(x, y) / self.scale
    }

    /// Zoom by `factor`, keeping the point under `anchor` fixed on screen
    pub fn zoom_about(&mut self, factor: f64, anchor: egui::Pos2, rect: egui::Rect) {
        let before = self.screen_to_plan(anchor, rect);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let after = self.screen_to_plan(anchor, rect);
        self.centroid += before - after;
    }

    /// Pan by a screen-pixel delta
    pub fn pan_pixels(&mut self, delta: egui::Vec2) {
        let rel = DVec2::new(delta.x as f64, -(delta.y as f64)) / self.scale;
        let (sin, cos) = (-self.rotation).sin_cos();
        self.centroid -= DVec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos);
    }

    /// Frame the camera on a local-space bounding box
    pub fn fit_bounds(&mut self, min: DVec2, max: DVec2, rect: egui::Rect) {
        let size = max - min;
        self.centroid = (min + max) * 0.5;
        if size.x > 0.0 && size.y > 0.0 {
            let sx = rect.width() as f64 / size.x;
            let sy = rect.height() as f64 / size.y;
            self.scale = (sx.min(sy) * 0.85).clamp(MIN_SCALE, MAX_SCALE);
        }
    }
}

/// Orbit angles of the 3D view (view-local; pan/zoom stay in CameraState)
#[derive(Debug, Clone, Copy)]
pub struct SceneOrbit {
    /// Rotation around the vertical axis, radians
    pub yaw: f32,
    /// Elevation of the eye above the horizon, radians
    pub pitch: f32,
}

impl Default for SceneOrbit {
    fn default() -> Self {
        Self {
            yaw: 0.5,
            pitch: 1.0,
        }
    }
}

impl SceneOrbit {
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(0.05, 1.5);
    }

    /// Unit vector from the target towards the eye (z-up world)
    fn eye_dir(&self) -> Vec3 {
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();
        Vec3::new(cp * self.yaw.sin(), -cp * self.yaw.cos(), sp)
    }
}

/// Resolved 3D camera configuration: a fixed-size frustum plus a zoom
/// scalar. Every code path that sets up the 3D camera goes through this
/// decomposition; resizing must never touch `zoom` and zooming must
/// never touch the half-extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigConfig {
    /// Frustum half-extents — a pure function of viewport pixels
    pub half_extents: Vec2,
    /// All accumulated user zoom
    pub zoom: f32,
}

/// Build the rig for the current shared state and viewport pixel size
pub fn camera_rig(state: &CameraState, viewport_px: Vec2) -> RigConfig {
    RigConfig {
        half_extents: viewport_px * 0.5,
        zoom: state.scale as f32,
    }
}

/// Combined view-projection matrix for the 3D view.
///
/// Geometry is in local-frame metres; the zoom scalar maps metres to
/// frustum pixels so the orthographic bounds themselves never change
/// with zoom level.
pub fn view_projection(state: &CameraState, orbit: &SceneOrbit, viewport_px: Vec2) -> Mat4 {
    let rig = camera_rig(state, viewport_px);

    let proj = Mat4::orthographic_rh_gl(
        -rig.half_extents.x,
        rig.half_extents.x,
        -rig.half_extents.y,
        rig.half_extents.y,
        -HALF_DEPTH,
        HALF_DEPTH,
    );

    let eye = orbit.eye_dir() * VIEW_DISTANCE;
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Z)
        * Mat4::from_scale(Vec3::splat(rig.zoom))
        * Mat4::from_translation(Vec3::new(
            -state.centroid.x as f32,
            -state.centroid.y as f32,
            0.0,
        ));

    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn plan_round_trip() {
        let mut state = CameraState::default();
        state.centroid = DVec2::new(120.0, -45.0);
        state.scale = 4.0;
        state.rotation = 0.35;

        let p = DVec2::new(133.7, -12.25);
        let screen = state.plan_to_screen(p, rect());
        let back = state.screen_to_plan(screen, rect());
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn plan_scale_maps_metres_to_pixels() {
        let state = CameraState {
            centroid: DVec2::ZERO,
            scale: 8.0,
            rotation: 0.0,
        };
        let a = state.plan_to_screen(DVec2::new(0.0, 0.0), rect());
        let b = state.plan_to_screen(DVec2::new(1.0, 0.0), rect());
        assert!((b.x - a.x - 8.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let mut state = CameraState::default();
        state.centroid = DVec2::new(50.0, 80.0);
        let anchor = egui::pos2(600.0, 150.0);
        let before = state.screen_to_plan(anchor, rect());
        state.zoom_about(1.8, anchor, rect());
        let after = state.screen_to_plan(anchor, rect());
        assert!((after - before).length() < 1e-6);
    }

    #[test]
    fn resize_and_zoom_are_order_independent() {
        // Path A: resize first, then wheel zoom
        let mut a = CameraState::default();
        let viewport_a = Vec2::new(1280.0, 720.0); // resize event
        a.scale *= 1.5; // wheel event

        // Path B: wheel zoom first, then resize
        let mut b = CameraState::default();
        b.scale *= 1.5; // wheel event
        let viewport_b = Vec2::new(1280.0, 720.0); // resize event

        let orbit = SceneOrbit::default();
        assert_eq!(camera_rig(&a, viewport_a), camera_rig(&b, viewport_b));
        assert_eq!(
            view_projection(&a, &orbit, viewport_a),
            view_projection(&b, &orbit, viewport_b)
        );
    }

    #[test]
    fn frustum_ignores_zoom() {
        let mut state = CameraState::default();
        let viewport = Vec2::new(1024.0, 768.0);
        let before = camera_rig(&state, viewport).half_extents;
        state.scale *= 40.0;
        let after = camera_rig(&state, viewport).half_extents;
        assert_eq!(before, after);
        assert_eq!(after, Vec2::new(512.0, 384.0));
    }

    #[test]
    fn rig_zoom_tracks_shared_scale() {
        let mut state = CameraState::default();
        state.scale = 3.25;
        let rig = camera_rig(&state, Vec2::new(640.0, 480.0));
        assert_eq!(rig.zoom, 3.25);
    }

    #[test]
    fn pan_moves_centroid_in_plan_units() {
        let mut state = CameraState {
            centroid: DVec2::ZERO,
            scale: 10.0,
            rotation: 0.0,
        };
        state.pan_pixels(egui::vec2(-100.0, 0.0));
        // Dragging content 100px left pans the view 10m east
        assert!((state.centroid.x - 10.0).abs() < 1e-9);
        assert!(state.centroid.y.abs() < 1e-9);
    }
}
