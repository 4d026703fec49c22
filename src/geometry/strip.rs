//! Strip - a spanwise slice of a sheet, subdivided chordwise into panels

use serde::{Deserialize, Serialize};

use super::airfoil::Airfoil;
use super::panel::{ChordStation, Panel};
use super::spacing::SpacingTriple;
use crate::math::{self, Vec3};

/// Leading edge point and chord line at one spanwise station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordLine {
    /// Leading edge point
    pub point: Vec3,
    pub chord: f64,
    /// Twist in degrees, positive nose up
    pub twist: f64,
    /// Leading edge to trailing edge
    pub vector: Vec3,
}

impl ChordLine {
    /// Point on the chord line at chord fraction `fraction`
    pub fn at(&self, fraction: f64) -> Vec3 {
        self.point + self.vector * fraction
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strip {
    /// Global strip id
    pub id: usize,
    /// Global id of the owning sheet
    pub sheet: usize,
    pub edge1: ChordLine,
    pub edge2: ChordLine,
    pub mid: ChordLine,
    /// Spanwise fractions of the owning sheet
    pub bspc: SpacingTriple,
    /// Spanwise position of the strip middle along the surface
    pub bpos: f64,
    /// Width along the sheet's spanwise axis
    pub width: f64,
    /// Parasite drag coefficients at edge 1 and edge 2
    pub cdo: [f64; 2],
    pub mirror: bool,
    pub noload: bool,
    pub span_axis: Vec3,
    pub normal_axis: Vec3,
    /// Camber lines of the bounding sections
    pub airfoils: [Airfoil; 2],
    pub panels: Vec<Panel>,
}

impl Strip {
    /// Mean slope of the interpolated camber line at chord fraction `x`
    pub fn camber_slope(&self, x: f64) -> f64 {
        math::lerp(
            self.airfoils[0].camber_slope(x),
            self.airfoils[1].camber_slope(x),
            self.bspc[1],
        )
    }

    /// Subdivide the strip chordwise. Returns the next free panel id.
    pub fn mesh_panels(&mut self, start_id: usize, stations: &[SpacingTriple]) -> usize {
        let chord_dir = self
            .mid
            .vector
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(math::ihat);

        self.panels = stations
            .iter()
            .enumerate()
            .map(|(i, triple)| {
                let station = ChordStation::from_spacing(triple);
                let slope = self.camber_slope(station.collocation);
                let local_dir = math::rotate_about_axis(&chord_dir, &self.span_axis, -slope.atan());
                let normal = local_dir
                    .cross(&self.span_axis)
                    .try_normalize(f64::EPSILON)
                    .unwrap_or(self.normal_axis);

                Panel {
                    id: start_id + i,
                    strip: self.id,
                    station,
                    corners: [
                        self.edge1.at(station.leading),
                        self.edge2.at(station.leading),
                        self.edge2.at(station.trailing),
                        self.edge1.at(station.trailing),
                    ],
                    bound: [self.edge1.at(station.bound), self.edge2.at(station.bound)],
                    collocation: self.mid.at(station.collocation),
                    normal,
                    span_axis: self.span_axis,
                    chord: self.mid.chord * (station.trailing - station.leading),
                    noload: self.noload,
                }
            })
            .collect();

        start_id + self.panels.len()
    }

    /// Planform area
    pub fn area(&self) -> f64 {
        self.width * 0.5 * (self.edge1.chord + self.edge2.chord)
    }

    /// Mean chord
    pub fn chord(&self) -> f64 {
        0.5 * (self.edge1.chord + self.edge2.chord)
    }

    /// Integral of cdo times chord across the strip, both varying linearly
    /// between the edges
    pub fn parasite_area(&self) -> f64 {
        let [d1, d2] = self.cdo;
        let (c1, c2) = (self.edge1.chord, self.edge2.chord);
        self.width * (2.0 * d1 * c1 + d1 * c2 + d2 * c1 + 2.0 * d2 * c2) / 6.0
    }

    /// Area weighted parasite drag coefficient
    pub fn mean_cdo(&self) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.parasite_area() / area
        } else {
            0.5 * (self.cdo[0] + self.cdo[1])
        }
    }

    /// Quarter chord point at mid-span
    pub fn quarter_chord(&self) -> Vec3 {
        self.mid.at(0.25)
    }

    /// Edge 1 to edge 2 across the leading edge
    pub fn span_vector(&self) -> Vec3 {
        self.edge2.point - self.edge1.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::spacing::Spacing;
    use approx::assert_relative_eq;

    fn line(y: f64, chord: f64) -> ChordLine {
        ChordLine {
            point: Vec3::new(0.0, y, 0.0),
            chord,
            twist: 0.0,
            vector: Vec3::new(chord, 0.0, 0.0),
        }
    }

    fn flat_strip(airfoil: Airfoil) -> Strip {
        Strip {
            id: 0,
            sheet: 0,
            edge1: line(0.0, 1.0),
            edge2: line(1.0, 1.0),
            mid: line(0.5, 1.0),
            bspc: [0.0, 0.5, 1.0],
            bpos: 0.5,
            width: 1.0,
            cdo: [0.0, 0.0],
            mirror: false,
            noload: false,
            span_axis: Vec3::y(),
            normal_axis: Vec3::z(),
            airfoils: [airfoil, airfoil],
            panels: Vec::new(),
        }
    }

    #[test]
    fn test_mesh_flat_strip() {
        let mut strip = flat_strip(Airfoil::Flat);
        let stations = Spacing::Equal.distribution(4).unwrap();
        let next = strip.mesh_panels(10, &stations);
        assert_eq!(next, 14);
        assert_eq!(strip.panels.len(), 4);
        assert_eq!(strip.panels[0].id, 10);
        assert_relative_eq!(strip.panels[0].bound[0].x, 0.0625);
        assert_relative_eq!(strip.panels[0].collocation.x, 0.1875);
        for panel in &strip.panels {
            assert_relative_eq!(panel.normal.z, 1.0, epsilon = 1e-14);
        }
        let area: f64 = strip.panels.iter().map(|p| p.area()).sum();
        assert_relative_eq!(area, strip.area(), epsilon = 1e-12);
    }

    #[test]
    fn test_parasite_area_integrates_edge_values() {
        let mut strip = flat_strip(Airfoil::Flat);
        strip.edge2 = line(1.0, 0.5);
        strip.cdo = [0.01, 0.01];
        assert_relative_eq!(strip.parasite_area(), 0.01 * strip.area(), epsilon = 1e-14);
        assert_relative_eq!(strip.mean_cdo(), 0.01, epsilon = 1e-14);

        // cdo 0.02 -> 0.0 while chord runs 1.0 -> 0.5: ∫(0.02 - 0.02s)(1 - 0.5s) ds
        strip.cdo = [0.02, 0.0];
        let expected = 0.02 * (1.0 - 0.75 + 1.0 / 6.0);
        assert_relative_eq!(strip.parasite_area(), expected, epsilon = 1e-14);
        assert!(strip.mean_cdo() > 0.01);
    }

    #[test]
    fn test_camber_tilts_normals() {
        let mut strip = flat_strip(Airfoil::naca4("4412").unwrap());
        let stations = Spacing::Equal.distribution(4).unwrap();
        strip.mesh_panels(0, &stations);
        // Leading panels face forward of vertical, trailing panels aft
        assert!(strip.panels[0].normal.x < 0.0);
        assert!(strip.panels[3].normal.x > 0.0);
    }
}
