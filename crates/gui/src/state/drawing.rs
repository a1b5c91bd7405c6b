//! Drawing state: holes, KAD entities, surfaces, undo/redo history.

use shared::{combined_hole_key, Drawing, HoleRef, KadEntity, Surface};

use crate::geometry::{self, GeometryError, HoleEdit};

/// Parameters for creating a hole
#[derive(Debug, Clone)]
pub struct AddHoleParams {
    /// Owning pattern name
    pub entity_name: String,
    /// Explicit hole ID; auto-numbered within the pattern when None
    pub hole_id: Option<String>,
    pub collar: [f64; 3],
    pub angle: f64,
    pub bearing: f64,
    pub bench_height: f64,
    pub subdrill: f64,
    pub diameter: f64,
}

impl Default for AddHoleParams {
    fn default() -> Self {
        Self {
            entity_name: "blast_1".into(),
            hole_id: None,
            collar: [0.0, 0.0, 0.0],
            angle: 0.0,
            bearing: 0.0,
            bench_height: 10.0,
            subdrill: 1.0,
            diameter: 115.0,
        }
    }
}

/// Grid pattern creation parameters (rows along the bearing direction)
#[derive(Debug, Clone)]
pub struct PatternParams {
    pub name: String,
    /// Collar of the first hole
    pub origin: [f64; 3],
    pub rows: usize,
    pub columns: usize,
    /// Spacing between holes in a row, metres
    pub spacing: f64,
    /// Burden between rows, metres
    pub burden: f64,
    pub hole: AddHoleParams,
}

/// Working-set state with undo/redo history
#[derive(Default)]
pub struct DrawingState {
    /// Current drawing
    pub drawing: Drawing,
    undo_stack: Vec<Drawing>,
    redo_stack: Vec<Drawing>,
    version: u64,
}

impl DrawingState {
    /// Current drawing version (increments on every mutation)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Save current state to undo stack
    fn save_undo(&mut self) {
        self.undo_stack.push(self.drawing.clone());
        if self.undo_stack.len() > 100 {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(prev) => {
                self.redo_stack.push(std::mem::replace(&mut self.drawing, prev));
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(&mut self.drawing, next));
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Replace the whole drawing (project load)
    pub fn set_drawing(&mut self, drawing: Drawing) {
        self.save_undo();
        self.drawing = drawing;
        self.version += 1;
    }

    pub fn clear(&mut self) {
        self.save_undo();
        self.drawing = Drawing::default();
        self.version += 1;
    }

    // ── Hole operations ──────────────────────────────────────

    /// Add a single hole and return its reference.
    /// The hole starts as its own timing origin.
    pub fn add_hole(&mut self, params: AddHoleParams) -> HoleRef {
        self.save_undo();
        let hole_id = params
            .hole_id
            .unwrap_or_else(|| self.next_hole_id(&params.entity_name));
        let hole = geometry::solve_hole(
            params.entity_name,
            hole_id,
            params.collar,
            params.angle,
            params.bearing,
            params.bench_height,
            params.subdrill,
            params.diameter,
        );
        let reference = hole.reference();
        self.drawing.holes.push(hole);
        self.version += 1;
        reference
    }

    /// Add a rows × columns grid of holes. Each hole times from its
    /// predecessor in the row; row starters time from the previous row.
    pub fn add_pattern(&mut self, params: PatternParams) -> Vec<HoleRef> {
        self.save_undo();
        let bearing = params.hole.bearing.to_radians();
        let (sin, cos) = bearing.sin_cos();
        let mut refs = Vec::with_capacity(params.rows * params.columns);
        let mut previous: Option<String> = None;
        let mut row_start: Option<String> = None;

        let mut next_id: u64 = self
            .drawing
            .pattern_holes(&params.name)
            .filter_map(|h| h.hole_id.parse::<u64>().ok())
            .max()
            .map_or(1, |m| m + 1);

        for row in 0..params.rows {
            // Burden is perpendicular to the row direction
            let row_x = params.origin[0] + row as f64 * params.burden * cos;
            let row_y = params.origin[1] - row as f64 * params.burden * sin;
            let mut row_first: Option<String> = None;
            for col in 0..params.columns {
                let collar = [
                    row_x + col as f64 * params.spacing * sin,
                    row_y + col as f64 * params.spacing * cos,
                    params.origin[2],
                ];
                let mut hole = geometry::solve_hole(
                    params.name.clone(),
                    next_id.to_string(),
                    collar,
                    params.hole.angle,
                    params.hole.bearing,
                    params.hole.bench_height,
                    params.hole.subdrill,
                    params.hole.diameter,
                );
                let timing_source = if col == 0 {
                    row_start.clone()
                } else {
                    previous.clone()
                };
                if let Some(source) = timing_source {
                    hole.from_hole = source;
                }
                if col == 0 {
                    row_first = Some(hole.combined_key());
                }
                previous = Some(hole.combined_key());
                refs.push(hole.reference());
                self.drawing.holes.push(hole);
                next_id += 1;
            }
            row_start = row_first;
        }
        self.version += 1;
        refs
    }

    /// Delete a hole. Every other hole that timed from it is repointed
    /// to itself so the timing chain never dangles.
    pub fn delete_hole(&mut self, entity_name: &str, hole_id: &str) -> bool {
        let Some(index) = self
            .drawing
            .holes
            .iter()
            .position(|h| h.entity_name == entity_name && h.hole_id == hole_id)
        else {
            return false;
        };
        self.save_undo();
        let deleted_key = combined_hole_key(entity_name, hole_id);
        self.drawing.holes.remove(index);
        let mut repointed = 0usize;
        for hole in &mut self.drawing.holes {
            if hole.from_hole == deleted_key {
                hole.repoint_to_self();
                repointed += 1;
            }
        }
        if repointed > 0 {
            tracing::debug!(key = %deleted_key, repointed, "repointed timing references");
        }
        self.version += 1;
        true
    }

    /// Apply one attribute edit to a set of holes atomically: every
    /// hole is recomputed first, and nothing commits if any is rejected.
    pub fn apply_edit(&mut self, refs: &[HoleRef], edit: HoleEdit) -> Result<usize, GeometryError> {
        let mut updated = Vec::with_capacity(refs.len());
        for reference in refs {
            let Some(hole) = self.drawing.hole(&reference.entity_name, &reference.hole_id) else {
                continue;
            };
            updated.push(geometry::recompute(hole, edit)?);
        }
        if updated.is_empty() {
            return Ok(0);
        }
        self.save_undo();
        let count = updated.len();
        for hole in updated {
            if let Some(slot) = self.drawing.hole_mut(&hole.entity_name, &hole.hole_id) {
                *slot = hole;
            }
        }
        self.version += 1;
        Ok(count)
    }

    fn next_hole_id(&self, entity_name: &str) -> String {
        self.drawing
            .pattern_holes(entity_name)
            .filter_map(|h| h.hole_id.parse::<u64>().ok())
            .max()
            .map_or(1, |m| m + 1)
            .to_string()
    }

    // ── KAD and surface operations ───────────────────────────

    /// Insert a KAD entity. Fails (false) when the name is taken.
    pub fn add_kad(&mut self, entity: KadEntity) -> bool {
        if self.drawing.kad.contains_key(&entity.name) {
            return false;
        }
        self.save_undo();
        self.drawing.kad.insert(entity.name.clone(), entity);
        self.version += 1;
        true
    }

    pub fn remove_kad(&mut self, name: &str) -> bool {
        if !self.drawing.kad.contains_key(name) {
            return false;
        }
        self.save_undo();
        self.drawing.kad.remove(name);
        self.version += 1;
        true
    }

    pub fn add_surface(&mut self, surface: Surface) -> bool {
        if self.drawing.surfaces.contains_key(&surface.name) {
            return false;
        }
        self.save_undo();
        self.drawing.surfaces.insert(surface.name.clone(), surface);
        self.version += 1;
        true
    }

    pub fn remove_surface(&mut self, name: &str) -> bool {
        if !self.drawing.surfaces.contains_key(name) {
            return false;
        }
        self.save_undo();
        self.drawing.surfaces.remove(name);
        self.version += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_test_hole(state: &mut DrawingState, pattern: &str, id: &str) -> HoleRef {
        state.add_hole(AddHoleParams {
            entity_name: pattern.into(),
            hole_id: Some(id.into()),
            collar: [451_200.0, 6_780_450.0, 276.2],
            bench_height: 6.2,
            subdrill: 1.2,
            ..AddHoleParams::default()
        })
    }

    #[test]
    fn add_hole_auto_numbers_per_pattern() {
        let mut state = DrawingState::default();
        add_test_hole(&mut state, "a", "7");
        let r = state.add_hole(AddHoleParams {
            entity_name: "a".into(),
            ..AddHoleParams::default()
        });
        assert_eq!(r.hole_id, "8");
        // A different pattern starts numbering fresh
        let r = state.add_hole(AddHoleParams {
            entity_name: "b".into(),
            ..AddHoleParams::default()
        });
        assert_eq!(r.hole_id, "1");
    }

    #[test]
    fn delete_repoints_only_matching_combined_key() {
        let mut state = DrawingState::default();
        add_test_hole(&mut state, "A", "9999");
        add_test_hole(&mut state, "B", "9999");
        add_test_hole(&mut state, "B", "1");

        // B/1 times from A/9999; B/9999 times from B/1
        state.drawing.hole_mut("B", "1").unwrap().from_hole = combined_hole_key("A", "9999");
        state.drawing.hole_mut("B", "9999").unwrap().from_hole = combined_hole_key("B", "1");

        assert!(state.delete_hole("A", "9999"));

        // Same hole ID in another pattern is untouched
        let b9999 = state.drawing.hole("B", "9999").unwrap();
        assert_eq!(b9999.from_hole, combined_hole_key("B", "1"));

        // Only the hole that referenced the deleted key self-repoints
        let b1 = state.drawing.hole("B", "1").unwrap();
        assert!(b1.is_timing_origin());
    }

    #[test]
    fn multi_edit_is_atomic() {
        let mut state = DrawingState::default();
        let a = add_test_hole(&mut state, "a", "1");
        let b = add_test_hole(&mut state, "a", "2");
        // Make hole b shallow so a shared subdrill edit underflows it
        state
            .apply_edit(std::slice::from_ref(&b), HoleEdit::GradeZ(276.0))
            .unwrap();
        let before_a = state.drawing.hole("a", "1").unwrap().clone();
        let before_b = state.drawing.hole("a", "2").unwrap().clone();
        let version = state.version();

        let result = state.apply_edit(&[a.clone(), b.clone()], HoleEdit::Subdrill(-1.0));
        assert!(result.is_err());
        // Nothing committed, not even the hole that would have succeeded
        assert_eq!(state.drawing.hole("a", "1").unwrap(), &before_a);
        assert_eq!(state.drawing.hole("a", "2").unwrap(), &before_b);
        assert_eq!(state.version(), version);

        let count = state.apply_edit(&[a, b], HoleEdit::Diameter(152.0)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn edit_skips_missing_refs() {
        let mut state = DrawingState::default();
        let a = add_test_hole(&mut state, "a", "1");
        let missing = HoleRef::new("a", "404");
        let count = state.apply_edit(&[a, missing], HoleEdit::Diameter(200.0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn pattern_grid_counts_and_timing() {
        let mut state = DrawingState::default();
        let refs = state.add_pattern(PatternParams {
            name: "north".into(),
            origin: [451_000.0, 6_780_000.0, 276.2],
            rows: 3,
            columns: 4,
            spacing: 5.0,
            burden: 4.5,
            hole: AddHoleParams::default(),
        });
        assert_eq!(refs.len(), 12);
        assert_eq!(state.drawing.pattern_holes("north").count(), 12);

        // First hole is the timing origin; its row neighbour times from it
        let first = state.drawing.hole("north", "1").unwrap();
        assert!(first.is_timing_origin());
        let second = state.drawing.hole("north", "2").unwrap();
        assert_eq!(second.from_hole, first.combined_key());
        // Second row starter times from the first row starter
        let row2 = state.drawing.hole("north", "5").unwrap();
        assert_eq!(row2.from_hole, first.combined_key());
    }

    #[test]
    fn undo_redo_cycle() {
        let mut state = DrawingState::default();
        add_test_hole(&mut state, "a", "1");
        add_test_hole(&mut state, "a", "2");
        assert_eq!(state.drawing.holes.len(), 2);

        assert!(state.undo());
        assert_eq!(state.drawing.holes.len(), 1);
        assert!(state.undo());
        assert!(state.drawing.holes.is_empty());
        assert!(!state.undo());

        assert!(state.redo());
        assert!(state.redo());
        assert_eq!(state.drawing.holes.len(), 2);
        assert!(!state.redo());
    }

    #[test]
    fn kad_names_are_unique() {
        let mut state = DrawingState::default();
        let entity = KadEntity::new(
            "crest",
            shared::KadGeometry::Point {
                vertex: shared::KadVertex::new(1, [0.0, 0.0, 0.0]),
            },
        );
        assert!(state.add_kad(entity.clone()));
        assert!(!state.add_kad(entity));
        assert!(state.remove_kad("crest"));
        assert!(!state.remove_kad("crest"));
    }
}
