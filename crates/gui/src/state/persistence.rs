//! Project autosave and the debounced save trigger.

use std::time::{Duration, Instant};

use shared::Drawing;

use super::drawing::DrawingState;

impl DrawingState {
    /// Autosave file path under the platform data dir
    fn autosave_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("com", "blastpad", "blastpad")
            .map(|dirs| dirs.data_dir().join("autosave.json"))
    }

    /// Save the drawing to the autosave file.
    /// Failures are reported via the log, never fatal.
    pub fn autosave(&self) {
        let Some(path) = Self::autosave_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&self.drawing) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Autosave failed: {e}");
                }
            }
            Err(e) => tracing::warn!("Autosave serialization failed: {e}"),
        }
    }

    /// Load the drawing from the autosave file, if present and valid
    pub fn load_autosave() -> Option<Drawing> {
        let path = Self::autosave_path()?;
        let json = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&json).ok()
    }
}

/// Coalesces rapid edits into one save: the trigger fires once the
/// combined drawing/selection fingerprint has been stable for `delay`.
pub struct SaveDebouncer {
    saved_fingerprint: (u64, u64),
    pending_since: Option<Instant>,
    pending_fingerprint: (u64, u64),
    delay: Duration,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            saved_fingerprint: (0, 0),
            pending_since: None,
            pending_fingerprint: (0, 0),
            delay,
        }
    }

    /// Feed the current versions; returns true when a save should fire.
    pub fn tick(&mut self, fingerprint: (u64, u64), now: Instant) -> bool {
        if fingerprint == self.saved_fingerprint {
            self.pending_since = None;
            return false;
        }
        match self.pending_since {
            Some(since) if fingerprint == self.pending_fingerprint => {
                if now.duration_since(since) >= self.delay {
                    self.saved_fingerprint = fingerprint;
                    self.pending_since = None;
                    true
                } else {
                    false
                }
            }
            _ => {
                // New or still-changing edit burst: restart the window
                self.pending_since = Some(now);
                self.pending_fingerprint = fingerprint;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_coalesces_rapid_edits() {
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(500));
        let t0 = Instant::now();

        // Unchanged state never fires
        assert!(!debouncer.tick((0, 0), t0));

        // A burst of edits keeps pushing the window
        assert!(!debouncer.tick((1, 0), t0));
        assert!(!debouncer.tick((2, 0), t0 + Duration::from_millis(200)));
        assert!(!debouncer.tick((3, 0), t0 + Duration::from_millis(400)));

        // Still inside the window for the last edit
        assert!(!debouncer.tick((3, 0), t0 + Duration::from_millis(700)));

        // Window elapsed: fire exactly once
        assert!(debouncer.tick((3, 0), t0 + Duration::from_millis(950)));
        assert!(!debouncer.tick((3, 0), t0 + Duration::from_secs(10)));
    }

    #[test]
    fn selection_changes_also_trigger() {
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert!(!debouncer.tick((5, 1), t0));
        assert!(debouncer.tick((5, 1), t0 + Duration::from_millis(150)));

        assert!(!debouncer.tick((5, 2), t0 + Duration::from_millis(200)));
        assert!(debouncer.tick((5, 2), t0 + Duration::from_millis(350)));
    }
}
