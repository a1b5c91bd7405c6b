//! Attribute recompute engine for blast holes.
//!
//! Every edit goes through [`recompute`], which re-derives grade and toe
//! along the (angle, bearing) ray from the collar. Grade and toe are
//! never moved on a single axis in isolation: an edit that changed depth
//! without re-projecting XY would silently produce a bent hole.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use shared::Hole;
use thiserror::Error;

use super::vector;

/// Rejected edits. The input hole is never modified; the caller keeps
/// the original snapshot.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("hole length would be {0:.3} m; must be positive")]
    NonPositiveLength(f64),
    #[error("hole diameter must be positive, got {0}")]
    NonPositiveDiameter(f64),
    #[error("grade elevation {grade} is above collar elevation {collar}")]
    GradeAboveCollar { grade: f64, collar: f64 },
}

/// One single-attribute edit to a hole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "snake_case")]
pub enum HoleEdit {
    Length(f64),
    Angle(f64),
    Bearing(f64),
    CollarX(f64),
    CollarY(f64),
    CollarZ(f64),
    Diameter(f64),
    Subdrill(f64),
    GradeZ(f64),
}

/// Apply one edit to a hole snapshot and return the consistent result.
pub fn recompute(hole: &Hole, edit: HoleEdit) -> Result<Hole, GeometryError> {
    let mut out = hole.clone();
    match edit {
        HoleEdit::Length(new_length) => {
            if new_length <= 0.0 {
                return Err(GeometryError::NonPositiveLength(new_length));
            }
            let cos = vector::guarded_cos(out.angle);
            out.length = new_length;
            out.subdrill = new_length * cos - out.bench_height;
            project_onto_ray(&mut out);
        }
        HoleEdit::Angle(new_angle) => {
            // Grade and toe keep their along-ray distances; the vertical
            // bench height and subdrill are re-derived from the new tilt.
            let old_cos = vector::guarded_cos(out.angle);
            let grade_dist = out.bench_height / old_cos;
            let new_cos = vector::guarded_cos(new_angle);
            out.angle = new_angle;
            out.bench_height = grade_dist * new_cos;
            out.subdrill = (out.length - grade_dist) * new_cos;
            out.grade = offset(out.collar, vector::components(new_angle, out.bearing, grade_dist));
            out.toe = offset(out.collar, vector::components(new_angle, out.bearing, out.length));
        }
        HoleEdit::Bearing(new_bearing) => {
            out.bearing = vector::normalize_bearing(new_bearing);
            project_onto_ray(&mut out);
        }
        HoleEdit::CollarX(new_x) => {
            let delta = new_x - out.collar[0];
            out.collar[0] += delta;
            out.grade[0] += delta;
            out.toe[0] += delta;
        }
        HoleEdit::CollarY(new_y) => {
            let delta = new_y - out.collar[1];
            out.collar[1] += delta;
            out.grade[1] += delta;
            out.toe[1] += delta;
        }
        HoleEdit::CollarZ(new_z) => {
            let delta = new_z - out.collar[2];
            out.collar[2] += delta;
            out.grade[2] += delta;
            out.toe[2] += delta;
        }
        HoleEdit::Diameter(new_diameter) => {
            if new_diameter <= 0.0 {
                return Err(GeometryError::NonPositiveDiameter(new_diameter));
            }
            out.diameter = new_diameter;
        }
        HoleEdit::Subdrill(new_subdrill) => {
            let cos = vector::guarded_cos(out.angle);
            let new_length = (out.bench_height + new_subdrill) / cos;
            if new_length <= 0.0 {
                return Err(GeometryError::NonPositiveLength(new_length));
            }
            out.subdrill = new_subdrill;
            out.length = new_length;
            project_onto_ray(&mut out);
        }
        HoleEdit::GradeZ(new_grade_z) => {
            let new_bench = out.collar[2] - new_grade_z;
            if new_bench < 0.0 {
                return Err(GeometryError::GradeAboveCollar {
                    grade: new_grade_z,
                    collar: out.collar[2],
                });
            }
            let cos = vector::guarded_cos(out.angle);
            let new_length = (new_bench + out.subdrill) / cos;
            if new_length <= 0.0 {
                return Err(GeometryError::NonPositiveLength(new_length));
            }
            out.bench_height = new_bench;
            out.length = new_length;
            project_onto_ray(&mut out);
        }
    }
    Ok(out)
}

/// Build a fully consistent hole from its independent attributes.
pub fn solve_hole(
    entity_name: impl Into<String>,
    hole_id: impl Into<String>,
    collar: [f64; 3],
    angle: f64,
    bearing: f64,
    bench_height: f64,
    subdrill: f64,
    diameter: f64,
) -> Hole {
    let cos = vector::guarded_cos(angle);
    let mut hole = Hole {
        entity_name: entity_name.into(),
        hole_id: hole_id.into(),
        collar,
        grade: collar,
        toe: collar,
        angle,
        bearing: vector::normalize_bearing(bearing),
        length: (bench_height + subdrill) / cos,
        subdrill,
        bench_height,
        diameter,
        from_hole: String::new(),
    };
    hole.repoint_to_self();
    project_onto_ray(&mut hole);
    hole
}

/// Place grade and toe on the hole ray from the current attributes.
fn project_onto_ray(hole: &mut Hole) {
    let cos = vector::guarded_cos(hole.angle);
    let grade_dist = hole.bench_height / cos;
    hole.grade = offset(
        hole.collar,
        vector::components(hole.angle, hole.bearing, grade_dist),
    );
    hole.toe = offset(
        hole.collar,
        vector::components(hole.angle, hole.bearing, hole.length),
    );
}

fn offset(origin: [f64; 3], delta: DVec3) -> [f64; 3] {
    [origin[0] + delta.x, origin[1] + delta.y, origin[2] + delta.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sample() -> Hole {
        solve_hole(
            "blast_1",
            "1",
            [451_200.0, 6_780_450.0, 276.2],
            0.0,
            0.0,
            6.2,
            1.2,
            115.0,
        )
    }

    fn angled() -> Hole {
        solve_hole(
            "blast_1",
            "2",
            [451_210.0, 6_780_455.0, 276.2],
            15.0,
            120.0,
            6.2,
            1.2,
            115.0,
        )
    }

    /// Perpendicular distance of a point from the hole ray
    fn ray_deviation(hole: &Hole, point: [f64; 3]) -> f64 {
        let dir = vector::components(hole.angle, hole.bearing, 1.0);
        let rel = DVec3::new(
            point[0] - hole.collar[0],
            point[1] - hole.collar[1],
            point[2] - hole.collar[2],
        );
        rel.cross(dir).length()
    }

    fn assert_on_ray(hole: &Hole) {
        assert!(
            ray_deviation(hole, hole.grade) < EPS,
            "grade off ray by {}",
            ray_deviation(hole, hole.grade)
        );
        assert!(
            ray_deviation(hole, hole.toe) < EPS,
            "toe off ray by {}",
            ray_deviation(hole, hole.toe)
        );
    }

    #[test]
    fn solve_places_grade_and_toe_on_ray() {
        let hole = angled();
        assert_on_ray(&hole);
        assert!((hole.collar[2] - hole.grade[2] - 6.2).abs() < EPS);
    }

    #[test]
    fn subdrill_is_not_double_counted() {
        // collarZ 276.2, gradeZ 270, subdrill 1.2 => toeZ 268.8, not 267.6
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Subdrill(1.2)).unwrap();
        assert!((out.grade[2] - 270.0).abs() < EPS);
        assert!((out.toe[2] - 268.8).abs() < EPS);
        assert!((out.length - 7.4).abs() < EPS);
    }

    #[test]
    fn subdrill_edit_moves_toe_only() {
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Subdrill(2.0)).unwrap();
        assert_eq!(out.grade, hole.grade);
        assert!((out.toe[2] - (270.0 - 2.0)).abs() < EPS);
        assert!((out.length - 8.2).abs() < EPS);
        assert_on_ray(&out);
    }

    #[test]
    fn collar_z_translates_rigidly() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::CollarZ(280.0)).unwrap();
        let delta = 280.0 - hole.collar[2];
        for axis in 0..3 {
            let d = if axis == 2 { delta } else { 0.0 };
            assert!((out.collar[axis] - hole.collar[axis] - d).abs() < EPS);
            assert!((out.grade[axis] - hole.grade[axis] - d).abs() < EPS);
            assert!((out.toe[axis] - hole.toe[axis] - d).abs() < EPS);
        }
        assert_eq!(out.angle, hole.angle);
        assert_eq!(out.bearing, hole.bearing);
        assert_eq!(out.length, hole.length);
        assert_eq!(out.bench_height, hole.bench_height);
    }

    #[test]
    fn collar_xy_translates_rigidly() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::CollarX(451_215.0)).unwrap();
        assert!((out.toe[0] - hole.toe[0] - 5.0).abs() < EPS);
        assert_eq!(out.toe[1], hole.toe[1]);
        assert_on_ray(&out);

        let out = recompute(&hole, HoleEdit::CollarY(6_780_460.0)).unwrap();
        assert!((out.grade[1] - hole.grade[1] - 5.0).abs() < EPS);
        assert_on_ray(&out);
    }

    #[test]
    fn angle_edit_keeps_ray_distances() {
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Angle(20.0)).unwrap();
        assert_eq!(out.length, hole.length);
        assert_on_ray(&out);
        // Tilting shrinks the vertical bench height
        assert!(out.bench_height < hole.bench_height);
        assert!((out.bench_height - 6.2 * 20.0_f64.to_radians().cos()).abs() < EPS);
        // Grade gained an XY offset; Z alone was not patched
        let dx = out.grade[0] - out.collar[0];
        let dy = out.grade[1] - out.collar[1];
        assert!((dx * dx + dy * dy).sqrt() > 1.0);
    }

    #[test]
    fn bearing_edit_rotates_about_collar() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::Bearing(300.0)).unwrap();
        assert_eq!(out.length, hole.length);
        assert_eq!(out.bench_height, hole.bench_height);
        assert_eq!(out.subdrill, hole.subdrill);
        // Depths are untouched, only azimuth changed
        assert!((out.grade[2] - hole.grade[2]).abs() < EPS);
        assert!((out.toe[2] - hole.toe[2]).abs() < EPS);
        assert_on_ray(&out);
    }

    #[test]
    fn bearing_is_normalized() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::Bearing(-60.0)).unwrap();
        assert!((out.bearing - 300.0).abs() < EPS);
    }

    #[test]
    fn length_edit_re_derives_subdrill() {
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Length(10.0)).unwrap();
        assert!((out.subdrill - (10.0 - 6.2)).abs() < EPS);
        assert_eq!(out.bench_height, hole.bench_height);
        assert!((out.toe[2] - (276.2 - 10.0)).abs() < EPS);
        assert_on_ray(&out);
    }

    #[test]
    fn grade_z_edit_slides_grade_along_ray() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::GradeZ(268.0)).unwrap();
        assert!((out.bench_height - (276.2 - 268.0)).abs() < EPS);
        assert_eq!(out.subdrill, hole.subdrill);
        assert!((out.grade[2] - 268.0).abs() < EPS);
        assert_on_ray(&out);
        // Toe keeps the vertical subdrill below the new grade
        assert!((out.grade[2] - out.toe[2] - 1.2).abs() < EPS);
    }

    #[test]
    fn diameter_edit_is_value_only() {
        let hole = angled();
        let out = recompute(&hole, HoleEdit::Diameter(152.0)).unwrap();
        assert_eq!(out.diameter, 152.0);
        assert_eq!(out.collar, hole.collar);
        assert_eq!(out.grade, hole.grade);
        assert_eq!(out.toe, hole.toe);
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let hole = sample();
        assert!(matches!(
            recompute(&hole, HoleEdit::Length(0.0)),
            Err(GeometryError::NonPositiveLength(_))
        ));
        assert!(matches!(
            recompute(&hole, HoleEdit::Diameter(-1.0)),
            Err(GeometryError::NonPositiveDiameter(_))
        ));
        // Subdrill that would pull the toe above the collar
        assert!(matches!(
            recompute(&hole, HoleEdit::Subdrill(-6.2)),
            Err(GeometryError::NonPositiveLength(_))
        ));
        // Grade above collar
        assert!(matches!(
            recompute(&hole, HoleEdit::GradeZ(280.0)),
            Err(GeometryError::GradeAboveCollar { .. })
        ));
    }

    #[test]
    fn horizontal_hole_stays_finite() {
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Angle(90.0)).unwrap();
        assert!(out.length.is_finite());
        assert!(out.grade.iter().all(|v| v.is_finite()));
        assert!(out.toe.iter().all(|v| v.is_finite()));
        assert_on_ray(&out);
        // And a depth edit on a horizontal hole uses the guarded divisor
        let out = recompute(&out, HoleEdit::Subdrill(1.0)).unwrap();
        assert!(out.length.is_finite());
        assert!(out.length > 0.0);
    }

    #[test]
    fn negative_subdrill_is_allowed_short_of_collar() {
        // Toe above grade but below collar is a legal stab hole
        let hole = sample();
        let out = recompute(&hole, HoleEdit::Subdrill(-1.0)).unwrap();
        assert!((out.length - 5.2).abs() < EPS);
        assert!((out.toe[2] - 271.0).abs() < EPS);
    }
}
