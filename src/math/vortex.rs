//! Biot-Savart kernels for horseshoe vortices and the Trefftz plane
//!
//! All kernels return the velocity induced by a filament of unit circulation.
//! Points lying on a filament (or its downstream extension for trailing legs)
//! induce no velocity.

use std::f64::consts::PI;

use super::Vec3;

/// Relative tolerance below which a point is treated as lying on a filament
const CORE_TOLERANCE: f64 = 1e-10;

/// Velocity induced at `point` by the finite segment `a -> b`
pub fn segment_velocity(point: &Vec3, a: &Vec3, b: &Vec3) -> Vec3 {
    let r1 = point - a;
    let r2 = point - b;
    let m1 = r1.norm();
    let m2 = r2.norm();
    let m12 = m1 * m2;
    let cap = m12 + r1.dot(&r2);

    if m12 == 0.0 || cap <= CORE_TOLERANCE * m12 {
        return Vec3::zeros();
    }

    let cross = r1.cross(&r2);
    if cross.norm_squared() <= (CORE_TOLERANCE * m12).powi(2) {
        return Vec3::zeros();
    }

    cross * ((m1 + m2) / (m12 * cap) / (4.0 * PI))
}

/// Velocity induced at `point` by the semi-infinite filament leaving `origin`
/// along the unit vector `direction`
pub fn trailing_leg_velocity(point: &Vec3, origin: &Vec3, direction: &Vec3) -> Vec3 {
    let r = point - origin;
    let m = r.norm();
    let cap = m - direction.dot(&r);

    if m == 0.0 || cap <= CORE_TOLERANCE * m {
        return Vec3::zeros();
    }

    direction.cross(&r) / (m * cap * 4.0 * PI)
}

/// Velocity induced at `point` by a horseshoe vortex with bound leg `a -> b`
/// and trailing legs running to infinity along `direction`
pub fn horseshoe_velocity(point: &Vec3, a: &Vec3, b: &Vec3, direction: &Vec3) -> Vec3 {
    segment_velocity(point, a, b) + trailing_leg_velocity(point, b, direction)
        - trailing_leg_velocity(point, a, direction)
}

/// Velocity induced in the Trefftz plane at `point` by an infinite line vortex
/// along +X passing through `origin`. Only the Y and Z components are used.
pub fn trefftz_line_velocity(point: &Vec3, origin: &Vec3) -> Vec3 {
    let d = Vec3::new(0.0, point.y - origin.y, point.z - origin.z);
    let r2 = d.norm_squared();
    if r2 == 0.0 {
        return Vec3::zeros();
    }
    Vec3::x().cross(&d) / (2.0 * PI * r2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_long_segment_approaches_line_vortex() {
        let a = Vec3::new(0.0, -1.0e3, 0.0);
        let b = Vec3::new(0.0, 1.0e3, 0.0);
        let v = segment_velocity(&Vec3::new(1.0, 0.0, 0.0), &a, &b);
        assert_relative_eq!(v.norm(), 1.0 / (2.0 * PI), max_relative = 1e-6);
        assert!(v.z < 0.0, "Bound vortex along +Y induces downwash aft of it");
    }

    #[test]
    fn test_point_on_segment_is_zero() {
        let a = Vec3::new(0.0, -1.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let v = segment_velocity(&Vec3::zeros(), &a, &b);
        assert_eq!(v, Vec3::zeros());
    }

    #[test]
    fn test_trailing_leg_is_half_line_vortex() {
        let v = trailing_leg_velocity(&Vec3::new(0.0, 0.0, 1.0), &Vec3::zeros(), &Vec3::x());
        assert_relative_eq!(v.y, -1.0 / (4.0 * PI), epsilon = 1e-14);
    }

    #[test]
    fn test_trailing_leg_downstream_is_zero() {
        let v = trailing_leg_velocity(&Vec3::new(5.0, 0.0, 0.0), &Vec3::zeros(), &Vec3::x());
        assert_eq!(v, Vec3::zeros());
    }

    #[test]
    fn test_horseshoe_downwash_at_collocation() {
        let a = Vec3::new(0.25, -1.0, 0.0);
        let b = Vec3::new(0.25, 1.0, 0.0);
        let v = horseshoe_velocity(&Vec3::new(0.75, 0.0, 0.0), &a, &b, &Vec3::x());
        assert!(v.z < 0.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-14);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_trefftz_tip_vortex_downwash_inboard() {
        // Right tip trailing vortex of a positive-lift wing
        let v = trefftz_line_velocity(&Vec3::zeros(), &Vec3::new(0.0, 5.0, 0.0));
        assert!(v.z < 0.0);
        assert_relative_eq!(v.z, -1.0 / (2.0 * PI * 5.0), epsilon = 1e-14);
    }
}
