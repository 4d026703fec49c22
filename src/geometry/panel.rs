//! Panel - one horseshoe vortex element of the lattice

use serde::{Deserialize, Serialize};

use super::spacing::SpacingTriple;
use crate::math::{self, vortex, Vec3};

/// Chordwise stations of a panel as fractions of the local chord
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordStation {
    pub leading: f64,
    /// Quarter point of the panel, where the bound leg sits
    pub bound: f64,
    /// Three-quarter point of the panel, where the boundary condition is enforced
    pub collocation: f64,
    pub trailing: f64,
}

impl ChordStation {
    /// Stations for the chordwise subdivision `(a, m, b)`
    pub fn from_spacing(triple: &SpacingTriple) -> Self {
        let [a, _, b] = *triple;
        let length = b - a;
        Self {
            leading: a,
            bound: a + 0.25 * length,
            collocation: a + 0.75 * length,
            trailing: b,
        }
    }
}

/// A quadrilateral lattice element carrying one horseshoe vortex.
///
/// The bound leg runs from `bound[0]` to `bound[1]` (strip edge 1 to edge 2)
/// and the trailing legs leave its ends along +X.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Global panel id
    pub id: usize,
    /// Global id of the owning strip
    pub strip: usize,
    pub station: ChordStation,
    /// Leading edge 1, leading edge 2, trailing edge 2, trailing edge 1
    pub corners: [Vec3; 4],
    pub bound: [Vec3; 2],
    pub collocation: Vec3,
    /// Unit normal, including camber
    pub normal: Vec3,
    /// Unit spanwise axis of the owning sheet
    pub span_axis: Vec3,
    /// Chordwise length at mid-span
    pub chord: f64,
    /// Excluded from force integration
    pub noload: bool,
}

impl Panel {
    /// Unit-circulation velocity induced at `point` by this panel's horseshoe vortex
    pub fn induced_velocity(&self, point: &Vec3) -> Vec3 {
        vortex::horseshoe_velocity(point, &self.bound[0], &self.bound[1], &math::ihat())
    }

    pub fn bound_midpoint(&self) -> Vec3 {
        (self.bound[0] + self.bound[1]) * 0.5
    }

    /// Bound leg vector, edge 1 to edge 2
    pub fn bound_vector(&self) -> Vec3 {
        self.bound[1] - self.bound[0]
    }

    /// Planform area of the quadrilateral
    pub fn area(&self) -> f64 {
        let d1 = self.corners[2] - self.corners[0];
        let d2 = self.corners[3] - self.corners[1];
        0.5 * d1.cross(&d2).norm()
    }

    /// Normal rotated about the spanwise axis by `angle` radians (positive nose up)
    pub fn rotated_normal(&self, angle: f64) -> Vec3 {
        math::rotate_about_axis(&self.normal, &self.span_axis, angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_panel() -> Panel {
        Panel {
            id: 0,
            strip: 0,
            station: ChordStation::from_spacing(&[0.0, 0.5, 1.0]),
            corners: [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::new(1.0, 2.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
            bound: [Vec3::new(0.25, 0.0, 0.0), Vec3::new(0.25, 2.0, 0.0)],
            collocation: Vec3::new(0.75, 1.0, 0.0),
            normal: Vec3::z(),
            span_axis: Vec3::y(),
            chord: 1.0,
            noload: false,
        }
    }

    #[test]
    fn test_chord_stations() {
        let station = ChordStation::from_spacing(&[0.2, 0.3, 0.6]);
        assert_relative_eq!(station.bound, 0.3);
        assert_relative_eq!(station.collocation, 0.5);
        assert_eq!(station.trailing, 0.6);
    }

    #[test]
    fn test_panel_area_and_bound() {
        let panel = unit_panel();
        assert_relative_eq!(panel.area(), 2.0);
        assert_eq!(panel.bound_vector(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(panel.bound_midpoint(), Vec3::new(0.25, 1.0, 0.0));
    }

    #[test]
    fn test_self_induced_downwash() {
        let panel = unit_panel();
        let v = panel.induced_velocity(&panel.collocation);
        assert!(v.dot(&panel.normal) < 0.0);
    }

    #[test]
    fn test_rotated_normal_tilts_forward() {
        let panel = unit_panel();
        let n = panel.rotated_normal(0.1);
        assert!(n.x > 0.0);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-14);
    }
}
