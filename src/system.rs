//! Lattice System - meshed geometry with its factorized influence matrix
//!
//! A system is immutable once built: every `LatticeResult` borrows it and
//! reuses the same LU factorization for each right-hand side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{VlmError, VlmResult};
use crate::geometry::{Panel, Sheet, Strip, Surface};
use crate::math::{self, vortex, Factorization, Mat, Vec as LatVec, Vec3};
use crate::results::{PanelGeometry, StripGeometry};

/// Pivot ratio below which the influence matrix is rejected
const MIN_PIVOT_RATIO: f64 = 1e-14;

/// Reference geometry used to non-dimensionalize forces and moments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct References {
    /// Reference span
    pub bref: f64,
    /// Reference chord
    pub cref: f64,
    /// Reference area
    pub sref: f64,
    /// Moment reference point
    pub rref: Vec3,
}

impl References {
    /// Fill in missing references from the loaded part of the meshed surfaces
    pub(crate) fn resolve(
        surfaces: &[Surface],
        bref: Option<f64>,
        cref: Option<f64>,
        sref: Option<f64>,
        rref: Option<Vec3>,
    ) -> VlmResult<Self> {
        let loaded: Vec<&Sheet> = surfaces
            .iter()
            .flat_map(|s| s.sheets().iter())
            .filter(|sheet| !sheet.noload)
            .collect();

        let area: f64 = loaded.iter().map(|sheet| sheet.area).sum();
        let (ymin, ymax) = loaded
            .iter()
            .flat_map(|sheet| [sheet.sect1.point.y, sheet.sect2.point.y])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        let mut span = ymax - ymin;
        if !(span > 1e-12) {
            span = loaded.iter().map(|sheet| sheet.width).sum();
        }

        let sref = sref.unwrap_or(area);
        let bref = bref.unwrap_or(span);
        let cref = cref.unwrap_or(sref / bref);

        for (label, value) in [("bref", bref), ("cref", cref), ("sref", sref)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(VlmError::InvalidGeometry(format!(
                    "reference {} resolved to {}; the model needs a loaded surface",
                    label, value
                )));
            }
        }

        Ok(Self {
            bref,
            cref,
            sref,
            rref: rref.unwrap_or_else(Vec3::zeros),
        })
    }
}

/// A strip's trailing vortex pair as seen in the Trefftz plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrefftzStation {
    pub strip: usize,
    /// Points where the strip's edge vortices cross the plane
    pub edges: [Vec3; 2],
    pub midpoint: Vec3,
    /// Unit normal in the plane, positive up for a right-going strip
    pub normal: Vec3,
    /// Projected strip width in the plane
    pub width: f64,
    /// Y extent, edge 1 to edge 2
    pub dy: f64,
    /// Z extent, edge 1 to edge 2
    pub dz: f64,
    pub noload: bool,
}

impl TrefftzStation {
    fn from_strip(strip: &Strip) -> Self {
        let p1 = Vec3::new(0.0, strip.edge1.point.y, strip.edge1.point.z);
        let p2 = Vec3::new(0.0, strip.edge2.point.y, strip.edge2.point.z);
        let d = p2 - p1;
        let width = d.norm();
        let normal = if width > 0.0 {
            Vec3::new(0.0, -d.z / width, d.y / width)
        } else {
            Vec3::z()
        };
        Self {
            strip: strip.id,
            edges: [p1, p2],
            midpoint: (p1 + p2) * 0.5,
            normal,
            width,
            dy: d.y,
            dz: d.z,
            noload: strip.noload,
        }
    }
}

/// Compiled lattice: meshed surfaces, lookup tables and influence matrices
#[derive(Debug, Clone)]
pub struct LatticeSystem {
    pub name: String,
    pub references: References,
    surfaces: Vec<Surface>,
    /// (surface, sheet, strip) positions by global strip id
    strip_index: Vec<(usize, usize, usize)>,
    /// (surface, sheet, strip, panel) positions by global panel id
    panel_index: Vec<(usize, usize, usize, usize)>,
    control_names: Vec<String>,
    aic: Mat,
    lu: Factorization,
    /// Unit-circulation induced velocity components at each bound leg midpoint
    bound_x: Mat,
    bound_y: Mat,
    bound_z: Mat,
    /// Circulation per unit freestream (x, y, z) and unit rotation (x, y, z)
    unit_gamma: Mat,
    trefftz: Vec<TrefftzStation>,
    /// Normal wash at each Trefftz station per unit strip circulation
    trefftz_wash: Mat,
}

impl LatticeSystem {
    /// Assemble and factorize the influence matrix for meshed surfaces
    pub(crate) fn assemble(
        name: &str,
        surfaces: Vec<Surface>,
        references: References,
    ) -> VlmResult<Self> {
        let mut strip_index = Vec::new();
        let mut panel_index = Vec::new();
        let mut controls = BTreeSet::new();
        for (si, surface) in surfaces.iter().enumerate() {
            for (hi, sheet) in surface.sheets().iter().enumerate() {
                controls.extend(sheet.controls.keys().cloned());
                for (ti, strip) in sheet.strips.iter().enumerate() {
                    if strip.id != strip_index.len() {
                        return Err(VlmError::InvalidGeometry(format!(
                            "strip id {} out of sequence",
                            strip.id
                        )));
                    }
                    strip_index.push((si, hi, ti));
                    for (pi, panel) in strip.panels.iter().enumerate() {
                        if panel.id != panel_index.len() {
                            return Err(VlmError::InvalidGeometry(format!(
                                "panel id {} out of sequence",
                                panel.id
                            )));
                        }
                        panel_index.push((si, hi, ti, pi));
                    }
                }
            }
        }

        let num = panel_index.len();
        if num == 0 {
            return Err(VlmError::EmptyModel);
        }

        let (aic, bound_x, bound_y, bound_z, unit_rhs) = {
            let panels: Vec<&Panel> = surfaces.iter().flat_map(|s| s.panels()).collect();
            let mut aic = Mat::zeros(num, num);
            let mut bound_x = Mat::zeros(num, num);
            let mut bound_y = Mat::zeros(num, num);
            let mut bound_z = Mat::zeros(num, num);
            for (i, pi) in panels.iter().enumerate() {
                let midpoint = pi.bound_midpoint();
                for (j, pj) in panels.iter().enumerate() {
                    aic[(i, j)] = pj.induced_velocity(&pi.collocation).dot(&pi.normal);
                    let v = pj.induced_velocity(&midpoint);
                    bound_x[(i, j)] = v.x;
                    bound_y[(i, j)] = v.y;
                    bound_z[(i, j)] = v.z;
                }
            }
            let normals: Vec<Vec3> = panels.iter().map(|p| p.normal).collect();
            let unit_rhs = unit_rhs(&panels, &normals, &references.rref);
            (aic, bound_x, bound_y, bound_z, unit_rhs)
        };

        log::debug!("Assembled {}x{} influence matrix for '{}'", num, num, name);

        let lu = aic.clone().lu();
        if !lu.is_invertible() {
            return Err(VlmError::SingularMatrix);
        }
        let ratio = math::pivot_ratio(&lu);
        if ratio < MIN_PIVOT_RATIO {
            return Err(VlmError::IllConditioned(ratio));
        }
        log::debug!("Factorized influence matrix, pivot ratio {:e}", ratio);

        let unit_gamma = lu.solve(&unit_rhs).ok_or(VlmError::SingularMatrix)?;

        let trefftz: Vec<TrefftzStation> = surfaces
            .iter()
            .flat_map(|s| s.strips())
            .map(TrefftzStation::from_strip)
            .collect();
        let trefftz_wash = trefftz_wash_matrix(&trefftz);

        Ok(Self {
            name: name.to_string(),
            references,
            surfaces,
            strip_index,
            panel_index,
            control_names: controls.into_iter().collect(),
            aic,
            lu,
            bound_x,
            bound_y,
            bound_z,
            unit_gamma,
            trefftz,
            trefftz_wash,
        })
    }

    // ========================
    // Geometry Access
    // ========================

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn surface(&self, name: &str) -> VlmResult<&Surface> {
        self.surfaces
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| VlmError::SurfaceNotFound(name.to_string()))
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.surfaces.iter().flat_map(|s| s.sheets().iter())
    }

    /// Strips in global id order
    pub fn strips(&self) -> impl Iterator<Item = &Strip> {
        self.surfaces.iter().flat_map(|s| s.strips())
    }

    /// Panels in global id order
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.surfaces.iter().flat_map(|s| s.panels())
    }

    pub fn num_strips(&self) -> usize {
        self.strip_index.len()
    }

    pub fn num_panels(&self) -> usize {
        self.panel_index.len()
    }

    pub fn strip(&self, id: usize) -> Option<&Strip> {
        let &(si, hi, ti) = self.strip_index.get(id)?;
        Some(&self.surfaces[si].sheets()[hi].strips[ti])
    }

    pub fn panel(&self, id: usize) -> Option<&Panel> {
        let &(si, hi, ti, pi) = self.panel_index.get(id)?;
        Some(&self.surfaces[si].sheets()[hi].strips[ti].panels[pi])
    }

    /// Surface owning a strip
    pub fn strip_surface(&self, id: usize) -> Option<&Surface> {
        let &(si, _, _) = self.strip_index.get(id)?;
        self.surfaces.get(si)
    }

    /// Names of every control, sorted
    pub fn control_names(&self) -> &[String] {
        &self.control_names
    }

    pub fn has_control(&self, name: &str) -> bool {
        self.control_names.iter().any(|c| c == name)
    }

    pub fn strip_geometry(&self) -> Vec<StripGeometry> {
        self.strips()
            .map(|strip| StripGeometry {
                id: strip.id,
                sheet: strip.sheet,
                bpos: strip.bpos,
                point: strip.mid.point,
                chord: strip.mid.chord,
                width: strip.width,
                area: strip.area(),
                twist: strip.mid.twist,
                cdo: strip.mean_cdo(),
                mirror: strip.mirror,
                noload: strip.noload,
            })
            .collect()
    }

    pub fn panel_geometry(&self) -> Vec<PanelGeometry> {
        self.panels()
            .map(|panel| PanelGeometry {
                id: panel.id,
                strip: panel.strip,
                collocation: panel.collocation,
                normal: panel.normal,
                bound_midpoint: panel.bound_midpoint(),
                area: panel.area(),
                chord: panel.chord,
                station: panel.station.collocation,
            })
            .collect()
    }

    // ========================
    // Influence Matrices
    // ========================

    /// Normal velocity at each collocation point per unit panel circulation
    pub fn influence_matrix(&self) -> &Mat {
        &self.aic
    }

    /// Solve `A Γ = b` with the cached factorization
    pub fn solve(&self, rhs: &LatVec) -> VlmResult<LatVec> {
        if rhs.len() != self.num_panels() {
            return Err(VlmError::InvalidInput(format!(
                "right-hand side has {} entries, expected {}",
                rhs.len(),
                self.num_panels()
            )));
        }
        self.lu.solve(rhs).ok_or(VlmError::SingularMatrix)
    }

    /// Solve for several right-hand sides at once
    pub fn solve_many(&self, rhs: &Mat) -> VlmResult<Mat> {
        self.lu.solve(rhs).ok_or(VlmError::SingularMatrix)
    }

    /// Circulation responses for the base geometry, columns ordered
    /// freestream x, y, z then rotation x, y, z
    pub fn unit_gamma(&self) -> &Mat {
        &self.unit_gamma
    }

    /// Velocity induced at each bound leg midpoint by the circulation `gamma`
    pub fn induced_at_bound(&self, gamma: &LatVec) -> Vec<Vec3> {
        let vx = &self.bound_x * gamma;
        let vy = &self.bound_y * gamma;
        let vz = &self.bound_z * gamma;
        (0..gamma.len())
            .map(|i| Vec3::new(vx[i], vy[i], vz[i]))
            .collect()
    }

    pub fn trefftz_stations(&self) -> &[TrefftzStation] {
        &self.trefftz
    }

    /// Trefftz-plane wash per unit strip circulation
    pub fn trefftz_wash(&self) -> &Mat {
        &self.trefftz_wash
    }

    /// Sum panel circulations into strip circulations
    pub fn strip_circulation(&self, gamma: &LatVec) -> LatVec {
        let mut strip_gamma = LatVec::zeros(self.num_strips());
        for (id, &(si, hi, ti, pi)) in self.panel_index.iter().enumerate() {
            let strip = &self.surfaces[si].sheets()[hi].strips[ti];
            debug_assert_eq!(strip.panels[pi].id, id);
            strip_gamma[strip.id] += gamma[id];
        }
        strip_gamma
    }
}

/// Right-hand sides for unit freestream along x, y, z and unit rotation
/// about x, y, z through `rref`
pub(crate) fn unit_rhs(panels: &[&Panel], normals: &[Vec3], rref: &Vec3) -> Mat {
    let mut rhs = Mat::zeros(panels.len(), 6);
    for (i, (panel, normal)) in panels.iter().zip(normals.iter()).enumerate() {
        let arm = panel.collocation - rref;
        for k in 0..3 {
            let axis = Vec3::ith(k, 1.0);
            rhs[(i, k)] = -axis.dot(normal);
            rhs[(i, k + 3)] = axis.cross(&arm).dot(normal);
        }
    }
    rhs
}

fn trefftz_wash_matrix(stations: &[TrefftzStation]) -> Mat {
    let num = stations.len();
    let mut wash = Mat::zeros(num, num);
    for (i, si) in stations.iter().enumerate() {
        for (j, sj) in stations.iter().enumerate() {
            let v = vortex::trefftz_line_velocity(&si.midpoint, &sj.edges[1])
                - vortex::trefftz_line_velocity(&si.midpoint, &sj.edges[0]);
            wash[(i, j)] = v.dot(&si.normal);
        }
    }
    wash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Section, Spacing};
    use crate::model::LatticeModel;
    use approx::assert_relative_eq;

    fn plank() -> LatticeSystem {
        let mut model = LatticeModel::new("Plank");
        model
            .add_surface(
                Surface::new("Wing")
                    .mirrored()
                    .with_chordwise(2, Spacing::Equal)
                    .with_section(Section::new(0.0, 0.0, 0.0, 1.0).with_spacing(6, Spacing::Equal))
                    .with_section(Section::new(0.0, 3.0, 0.0, 1.0)),
            )
            .unwrap();
        model.build().unwrap()
    }

    #[test]
    fn test_default_references() {
        let system = plank();
        let refs = system.references;
        assert_relative_eq!(refs.sref, 6.0, epsilon = 1e-12);
        assert_relative_eq!(refs.bref, 6.0, epsilon = 1e-12);
        assert_relative_eq!(refs.cref, 1.0, epsilon = 1e-12);
        assert_eq!(refs.rref, Vec3::zeros());
    }

    #[test]
    fn test_influence_dimensions_and_diagonal() {
        let system = plank();
        assert_eq!(system.num_panels(), 24);
        assert_eq!(system.influence_matrix().nrows(), 24);
        for i in 0..24 {
            assert!(system.influence_matrix()[(i, i)] < 0.0);
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let system = plank();
        for (id, panel) in system.panels().enumerate() {
            assert_eq!(panel.id, id);
            assert_eq!(system.panel(id).map(|p| p.id), Some(id));
        }
        assert!(system.panel(24).is_none());
        assert_eq!(system.strip(5).map(|s| s.id), Some(5));
    }

    #[test]
    fn test_unit_heave_response_is_symmetric() {
        let system = plank();
        let gamma_z = system.unit_gamma().column(2).into_owned();
        let strip_gamma = system.strip_circulation(&gamma_z);
        let n = strip_gamma.len();
        for i in 0..n / 2 {
            assert_relative_eq!(strip_gamma[i], strip_gamma[n - 1 - i], max_relative = 1e-9);
        }
        // Unit upward freestream component produces positive lift circulation
        assert!(strip_gamma.iter().all(|g| *g > 0.0));
    }

    #[test]
    fn test_trefftz_wash_is_downwash_for_positive_loading() {
        let system = plank();
        let gamma = LatVec::from_element(system.num_strips(), 1.0);
        let wash = system.trefftz_wash() * &gamma;
        assert!(wash.iter().all(|w| *w < 0.0));
    }

    #[test]
    fn test_solve_rejects_wrong_length() {
        let system = plank();
        assert!(system.solve(&LatVec::zeros(3)).is_err());
    }
}
