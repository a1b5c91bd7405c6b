//! Precision-safe local coordinate frame.
//!
//! UTM eastings/northings run to 6-7 digits; pushed straight into f32
//! GPU buffers they exhaust the mantissa and the view jitters during
//! pan/zoom. Every renderer-facing vertex is therefore expressed
//! relative to a local origin near the working set. Elevation passes
//! through untouched (already small in magnitude).

use glam::DVec2;

/// Distance the working-set centroid may drift from the origin before
/// the frame is re-anchored and all GPU geometry regenerated.
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 10_000.0;

/// World-to-local translation state, one per view session.
#[derive(Debug, Clone)]
pub struct LocalFrame {
    origin: DVec2,
    drift_threshold: f64,
    generation: u64,
    initialized: bool,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_THRESHOLD)
    }
}

impl LocalFrame {
    pub fn new(drift_threshold: f64) -> Self {
        Self {
            origin: DVec2::ZERO,
            drift_threshold,
            generation: 0,
            initialized: false,
        }
    }

    /// Anchor the frame on first contact with real data. No-op once set.
    pub fn init_if_needed(&mut self, world: DVec2) {
        if !self.initialized {
            self.reset(world);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current local origin in world coordinates
    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    /// Bumped on every reset; resource sets holding geometry built
    /// against an older generation must fully rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn to_local(&self, world_x: f64, world_y: f64) -> DVec2 {
        DVec2::new(world_x - self.origin.x, world_y - self.origin.y)
    }

    pub fn to_world(&self, local_x: f64, local_y: f64) -> DVec2 {
        DVec2::new(local_x + self.origin.x, local_y + self.origin.y)
    }

    /// World position to a GPU-ready local f32 triple; z passes through.
    pub fn to_local_f32(&self, world: [f64; 3]) -> [f32; 3] {
        let local = self.to_local(world[0], world[1]);
        [local.x as f32, local.y as f32, world[2] as f32]
    }

    /// Has the working-set centroid drifted past the threshold?
    pub fn drift_exceeded(&self, centroid: DVec2) -> bool {
        self.initialized && (centroid - self.origin).length() > self.drift_threshold
    }

    /// Re-anchor the frame. Invalidates all geometry built against the
    /// previous origin.
    pub fn reset(&mut self, new_origin: DVec2) {
        self.origin = new_origin;
        self.generation += 1;
        self.initialized = true;
        tracing::debug!(
            x = new_origin.x,
            y = new_origin.y,
            generation = self.generation,
            "local frame re-anchored"
        );
    }
}
