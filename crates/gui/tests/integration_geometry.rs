//! End-to-end geometry behavior through the headless harness: ray
//! consistency across every edit mode, the subdrill depth regression,
//! and timing-reference repointing on deletion.

use glam::DVec3;
use shared::{combined_hole_key, Hole, HoleRef};

use blastpad_gui_lib::geometry::vector::components;
use blastpad_gui_lib::geometry::HoleEdit;
use blastpad_gui_lib::harness::TestHarness;
use blastpad_gui_lib::state::AddHoleParams;

const EPS: f64 = 1e-9;

fn ray_deviation(hole: &Hole, point: [f64; 3]) -> f64 {
    let dir = components(hole.angle, hole.bearing, 1.0);
    let rel = DVec3::new(
        point[0] - hole.collar[0],
        point[1] - hole.collar[1],
        point[2] - hole.collar[2],
    );
    rel.cross(dir).length()
}

fn assert_consistent(hole: &Hole) {
    assert!(
        ray_deviation(hole, hole.grade) < EPS,
        "grade bent off the ray by {}",
        ray_deviation(hole, hole.grade)
    );
    assert!(
        ray_deviation(hole, hole.toe) < EPS,
        "toe bent off the ray by {}",
        ray_deviation(hole, hole.toe)
    );
}

fn inclined_harness() -> (TestHarness, HoleRef) {
    let mut h = TestHarness::new();
    let r = h.add_hole_with(AddHoleParams {
        entity_name: "blast_1".into(),
        hole_id: Some("1".into()),
        collar: [451_200.0, 6_780_450.0, 276.2],
        angle: 15.0,
        bearing: 120.0,
        bench_height: 6.2,
        subdrill: 1.2,
        diameter: 115.0,
    });
    (h, r)
}

#[test]
fn every_edit_mode_keeps_grade_and_toe_on_ray() {
    let edits = [
        HoleEdit::Length(9.5),
        HoleEdit::Angle(25.0),
        HoleEdit::Bearing(250.0),
        HoleEdit::CollarX(451_300.0),
        HoleEdit::CollarY(6_780_500.0),
        HoleEdit::CollarZ(280.0),
        HoleEdit::Diameter(165.0),
        HoleEdit::Subdrill(2.0),
        HoleEdit::GradeZ(269.0),
    ];
    for edit in edits {
        let (mut h, r) = inclined_harness();
        h.edit_hole(&r, edit).unwrap();
        let hole = h.hole("blast_1", "1").unwrap();
        assert_consistent(hole);
    }
}

#[test]
fn subdrill_depth_is_counted_once() {
    // collarZ 276.2, gradeZ 270, subdrill 1.2 => toeZ 268.8, never 267.6
    let mut h = TestHarness::new();
    let r = h.add_hole_with(AddHoleParams {
        entity_name: "blast_1".into(),
        hole_id: Some("9".into()),
        collar: [451_200.0, 6_780_450.0, 276.2],
        angle: 0.0,
        bearing: 0.0,
        bench_height: 6.2,
        subdrill: 1.2,
        diameter: 115.0,
    });
    h.edit_hole(&r, HoleEdit::Subdrill(1.2)).unwrap();

    let hole = h.hole("blast_1", "9").unwrap();
    assert!((hole.grade[2] - 270.0).abs() < EPS);
    assert!((hole.toe[2] - 268.8).abs() < EPS);
    assert!((hole.toe[2] - (hole.grade[2] - 1.2)).abs() < EPS);
}

#[test]
fn collar_z_edit_translates_all_three_points() {
    let (mut h, r) = inclined_harness();
    let before = h.hole("blast_1", "1").unwrap().clone();
    h.edit_hole(&r, HoleEdit::CollarZ(280.0)).unwrap();
    let after = h.hole("blast_1", "1").unwrap();

    let delta = 280.0 - before.collar[2];
    assert!((after.grade[2] - before.grade[2] - delta).abs() < EPS);
    assert!((after.toe[2] - before.toe[2] - delta).abs() < EPS);
    assert_eq!(after.grade[0], before.grade[0]);
    assert_eq!(after.toe[1], before.toe[1]);
    assert_eq!(after.angle, before.angle);
    assert_eq!(after.bearing, before.bearing);
    assert_eq!(after.length, before.length);
}

#[test]
fn rejected_edit_leaves_hole_untouched() {
    let (mut h, r) = inclined_harness();
    let before = h.hole("blast_1", "1").unwrap().clone();
    assert!(h.edit_hole(&r, HoleEdit::Length(0.0)).is_err());
    assert_eq!(h.hole("blast_1", "1").unwrap(), &before);
}

#[test]
fn deleting_a_hole_repoints_only_its_dependents() {
    let mut h = TestHarness::new();
    h.add_hole("A", "9999", [451_200.0, 6_780_450.0, 276.2]);
    h.add_hole("B", "9999", [451_210.0, 6_780_450.0, 276.2]);
    h.add_hole("B", "1", [451_220.0, 6_780_450.0, 276.2]);

    // B/1 times from A/9999; B/9999 times from B/1
    {
        let drawing = &mut h.state.drawing.drawing;
        drawing.hole_mut("B", "1").unwrap().from_hole = combined_hole_key("A", "9999");
        drawing.hole_mut("B", "9999").unwrap().from_hole = combined_hole_key("B", "1");
    }

    assert!(h.delete_hole("A", "9999"));

    // The same hole ID in pattern B is a different hole and stays put
    let b9999 = h.hole("B", "9999").unwrap();
    assert_eq!(b9999.hole_id, "9999");
    assert_eq!(b9999.from_hole, combined_hole_key("B", "1"));

    // Only the dependent of the deleted key self-repoints
    let b1 = h.hole("B", "1").unwrap();
    assert_eq!(b1.from_hole, combined_hole_key("B", "1"));
}

#[test]
fn multi_hole_edit_applies_to_whole_selection() {
    let mut h = TestHarness::new();
    let a = h.add_hole("blast_1", "1", [451_200.0, 6_780_450.0, 276.2]);
    let b = h.add_hole("blast_1", "2", [451_205.0, 6_780_450.0, 276.2]);

    h.set_selection(blastpad_gui_lib::state::Selection::Holes(vec![a, b]));
    assert!(h.recompute_selected(HoleEdit::Diameter(152.0)));

    assert_eq!(h.hole("blast_1", "1").unwrap().diameter, 152.0);
    assert_eq!(h.hole("blast_1", "2").unwrap().diameter, 152.0);
}
