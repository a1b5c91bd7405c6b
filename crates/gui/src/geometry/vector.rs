//! Direction math for drill-hole rays.
//!
//! Angle is measured in degrees from vertical, bearing in degrees
//! clockwise from north. World axes: x east, y north, z elevation.

use glam::DVec3;

/// Floor for `cos(angle)` so a horizontal hole never divides by zero
const MIN_COS: f64 = 1e-9;

/// Displacement of a point `distance` along the ray (angle, bearing)
pub fn components(angle_deg: f64, bearing_deg: f64, distance: f64) -> DVec3 {
    let angle = angle_deg.to_radians();
    let bearing = bearing_deg.to_radians();
    DVec3::new(
        distance * angle.sin() * bearing.sin(),
        distance * angle.sin() * bearing.cos(),
        -distance * angle.cos(),
    )
}

/// Recover (angle_deg, bearing_deg, length) from a collar-to-toe delta.
/// A zero-length delta yields a vertical ray of length zero.
pub fn from_components(delta: DVec3) -> (f64, f64, f64) {
    let length = delta.length();
    if length < f64::EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let angle = (-delta.z / length).clamp(-1.0, 1.0).acos().to_degrees();
    let bearing = normalize_bearing(delta.x.atan2(delta.y).to_degrees());
    (angle, bearing, length)
}

/// `cos(angle)` clamped away from zero, sign preserved.
///
/// Keeps depth-to-length conversions finite for horizontal holes.
pub fn guarded_cos(angle_deg: f64) -> f64 {
    let c = angle_deg.to_radians().cos();
    if c.abs() < MIN_COS {
        if c.is_sign_negative() {
            -MIN_COS
        } else {
            MIN_COS
        }
    } else {
        c
    }
}

/// Wrap a bearing into [0, 360)
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    bearing_deg.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn vertical_hole_points_straight_down() {
        let d = components(0.0, 0.0, 10.0);
        assert!(d.x.abs() < EPS);
        assert!(d.y.abs() < EPS);
        assert!((d.z + 10.0).abs() < EPS);
    }

    #[test]
    fn bearing_east_at_45_degrees() {
        let d = components(45.0, 90.0, 2.0_f64.sqrt());
        assert!((d.x - 1.0).abs() < EPS);
        assert!(d.y.abs() < EPS);
        assert!((d.z + 1.0).abs() < EPS);
    }

    #[test]
    fn component_round_trip() {
        for (angle, bearing, len) in [
            (0.0, 0.0, 5.0),
            (15.0, 45.0, 12.5),
            (30.0, 200.0, 7.4),
            (60.0, 359.0, 100.0),
        ] {
            let (a, b, l) = from_components(components(angle, bearing, len));
            assert!((a - angle).abs() < 1e-6, "angle {angle} -> {a}");
            assert!((l - len).abs() < 1e-6, "length {len} -> {l}");
            // Bearing is meaningless for a vertical ray
            if angle > 0.0 {
                assert!((b - bearing).abs() < 1e-6, "bearing {bearing} -> {b}");
            }
        }
    }

    #[test]
    fn zero_delta_is_vertical_zero_length() {
        let (a, b, l) = from_components(DVec3::ZERO);
        assert_eq!((a, b, l), (0.0, 0.0, 0.0));
    }

    #[test]
    fn guarded_cos_clamps_at_horizontal() {
        assert!(guarded_cos(90.0) > 0.0);
        assert!(guarded_cos(90.0) <= 1e-9);
        // Past horizontal the sign flips but stays finite
        assert!(guarded_cos(90.000001) < 0.0);
        // Ordinary angles are untouched
        assert!((guarded_cos(60.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bearing_normalization() {
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(725.0), 5.0);
    }
}
