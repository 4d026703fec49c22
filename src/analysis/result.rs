//! Lattice Result - circulation, forces and coefficients for one flight state

use std::collections::BTreeMap;

use super::state::{FlightState, StabilityAxes};
use crate::error::{VlmError, VlmResult};
use crate::geometry::Panel;
use crate::math::{Mat, Vec as LatVec, Vec3};
use crate::results::{
    Coefficients, PanelForce, StripCoefficients, StripForces, TrefftzStrip,
};
use crate::system::{unit_rhs, LatticeSystem};

/// Quantities derived from one circulation solve
#[derive(Debug, Clone)]
struct Solution {
    gamma: LatVec,
    /// Total velocity at each bound leg midpoint
    velocity: Vec<Vec3>,
    panel_force: Vec<Vec3>,
    strip_forces: Vec<StripForces>,
    force: Vec3,
    moment: Vec3,
    parasite_drag: f64,
    strip_gamma: LatVec,
    wash: LatVec,
    induced_drag: f64,
    coefficients: Coefficients,
}

/// Solved lattice for one flight state and set of control deflections.
///
/// Every setter re-solves using the system's cached factorization, so the
/// accessors always describe the current state.
#[derive(Debug, Clone)]
pub struct LatticeResult<'a> {
    pub name: String,
    system: &'a LatticeSystem,
    panels: Vec<&'a Panel>,
    state: FlightState,
    /// Deflections in degrees, keyed by control name
    controls: BTreeMap<String, f64>,
    /// Twist offsets in degrees, by strip id
    strip_twist: LatVec,
    normals: Vec<Vec3>,
    unit_gamma: Mat,
    solution: Solution,
}

impl<'a> LatticeResult<'a> {
    /// Solve the system at the default state with zero deflections
    pub fn new(name: &str, system: &'a LatticeSystem) -> VlmResult<Self> {
        let panels: Vec<&'a Panel> = system.panels().collect();
        let normals = panels.iter().map(|p| p.normal).collect();
        let controls = system
            .control_names()
            .iter()
            .map(|name| (name.clone(), 0.0))
            .collect();

        let mut result = Self {
            name: name.to_string(),
            system,
            panels,
            state: FlightState::default(),
            controls,
            strip_twist: LatVec::zeros(system.num_strips()),
            normals,
            unit_gamma: system.unit_gamma().clone(),
            solution: Solution::empty(system.num_panels(), system.num_strips()),
        };
        result.solve()?;
        Ok(result)
    }

    pub fn system(&self) -> &'a LatticeSystem {
        self.system
    }

    pub fn state(&self) -> &FlightState {
        &self.state
    }

    /// Deflections in degrees
    pub fn controls(&self) -> &BTreeMap<String, f64> {
        &self.controls
    }

    // ========================
    // State Setters
    // ========================

    pub fn set_state(&mut self, state: FlightState) -> VlmResult<()> {
        state.validate()?;
        self.state = state;
        self.solve()
    }

    /// Set control deflections in degrees. Controls not named keep their deflection.
    pub fn set_controls(&mut self, deflections: &[(&str, f64)]) -> VlmResult<()> {
        let mut controls = self.controls.clone();
        for &(name, value) in deflections {
            if !value.is_finite() {
                return Err(VlmError::InvalidInput(format!(
                    "deflection of '{}' is not finite",
                    name
                )));
            }
            match controls.get_mut(name) {
                Some(deflection) => *deflection = value,
                None => return Err(VlmError::ControlNotFound(name.to_string())),
            }
        }
        self.controls = controls;
        self.solve()
    }

    /// Set state and every deflection together with a single solve
    pub(crate) fn apply(
        &mut self,
        state: FlightState,
        controls: BTreeMap<String, f64>,
    ) -> VlmResult<()> {
        state.validate()?;
        self.state = state;
        self.controls = controls;
        self.solve()
    }

    /// Twist each strip's panel normals nose up by the given angles (degrees).
    ///
    /// Only the boundary conditions change; the influence matrix is the
    /// system's.
    pub fn set_strip_twist(&mut self, twist: &[f64]) -> VlmResult<()> {
        if twist.len() != self.system.num_strips() {
            return Err(VlmError::InvalidInput(format!(
                "expected {} strip twists, got {}",
                self.system.num_strips(),
                twist.len()
            )));
        }
        if twist.iter().any(|t| !t.is_finite()) {
            return Err(VlmError::InvalidInput("strip twist is not finite".to_string()));
        }
        self.strip_twist = LatVec::from_column_slice(twist);
        self.normals = self
            .panels
            .iter()
            .map(|panel| panel.rotated_normal(twist[panel.strip].to_radians()))
            .collect();
        let rhs = unit_rhs(&self.panels, &self.normals, &self.system.references.rref);
        self.unit_gamma = self.system.solve_many(&rhs)?;
        self.solve()
    }

    /// Twist offsets in degrees, by strip id
    pub fn strip_twist(&self) -> &LatVec {
        &self.strip_twist
    }

    /// Current panel normals, including strip twist
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    // ========================
    // Boundary Conditions
    // ========================

    /// Velocity of the air relative to a point fixed on the vehicle
    pub fn onset_velocity(&self, point: &Vec3) -> Vec3 {
        let refs = &self.system.references;
        let omega = self.state.rotation(refs.bref, refs.cref);
        self.state.freestream_direction() * self.state.speed - omega.cross(&(point - refs.rref))
    }

    /// Right-hand side contribution per radian of deflection of one control,
    /// using the gain for the sign of `deflection`
    pub fn control_rhs(&self, name: &str, deflection: f64) -> LatVec {
        let mut rhs = LatVec::zeros(self.panels.len());
        for sheet in self.system.sheets() {
            let Some(control) = sheet.controls.get(name) else {
                continue;
            };
            let Some(hinge) = control.hinge_axis() else {
                continue;
            };
            let gain = control.gain(deflection);
            for &id in control.panels() {
                let panel = self.panels[id];
                let onset = self.onset_velocity(&panel.collocation);
                rhs[id] -= gain * onset.dot(&hinge.cross(&self.normals[id]));
            }
        }
        rhs
    }

    fn rhs(&self) -> LatVec {
        let mut rhs = LatVec::from_iterator(
            self.panels.len(),
            self.panels
                .iter()
                .zip(self.normals.iter())
                .map(|(panel, normal)| -self.onset_velocity(&panel.collocation).dot(normal)),
        );
        for (name, &deflection) in &self.controls {
            if deflection != 0.0 {
                rhs += self.control_rhs(name, deflection) * deflection.to_radians();
            }
        }
        rhs
    }

    fn solve(&mut self) -> VlmResult<()> {
        let gamma = self.system.solve(&self.rhs())?;
        self.solution = self.integrate(gamma);
        Ok(())
    }

    // ========================
    // Force Integration
    // ========================

    fn integrate(&self, gamma: LatVec) -> Solution {
        let refs = &self.system.references;
        let rho = self.state.rho;
        let q = self.state.dynamic_pressure();
        let axes = self.state.axes();

        let induced = self.system.induced_at_bound(&gamma);
        let velocity: Vec<Vec3> = self
            .panels
            .iter()
            .zip(induced.iter())
            .map(|(panel, v)| self.onset_velocity(&panel.bound_midpoint()) + v)
            .collect();

        let panel_force: Vec<Vec3> = self
            .panels
            .iter()
            .map(|panel| {
                if panel.noload {
                    Vec3::zeros()
                } else {
                    velocity[panel.id].cross(&panel.bound_vector()) * (rho * gamma[panel.id])
                }
            })
            .collect();

        let mut parasite_drag = 0.0;
        let strip_forces: Vec<StripForces> = self
            .system
            .strips()
            .map(|strip| {
                let mut force = Vec3::zeros();
                let mut moment = Vec3::zeros();
                for panel in &strip.panels {
                    let f = panel_force[panel.id];
                    force += f;
                    moment += (panel.bound_midpoint() - refs.rref).cross(&f);
                }
                let parasite = if strip.noload {
                    0.0
                } else {
                    q * strip.parasite_area()
                };
                let f0 = axes.drag * parasite;
                force += f0;
                moment += (strip.quarter_chord() - refs.rref).cross(&f0);
                parasite_drag += parasite;
                StripForces {
                    id: strip.id,
                    force,
                    moment,
                    lift: force.dot(&axes.lift),
                    side: force.dot(&axes.side),
                    drag: force.dot(&axes.drag),
                    parasite,
                }
            })
            .collect();

        let force = strip_forces.iter().fold(Vec3::zeros(), |acc, s| acc + s.force);
        let moment = strip_forces.iter().fold(Vec3::zeros(), |acc, s| acc + s.moment);

        let strip_gamma = self.system.strip_circulation(&gamma);
        let wash = self.system.trefftz_wash() * &strip_gamma;
        let induced_drag = trefftz_drag(self.system, rho, &strip_gamma, &wash);

        let coefficients = Coefficients {
            cdi: induced_drag / (q * refs.sref),
            cdo: parasite_drag / (q * refs.sref),
            ..force_coefficients(&axes, q, refs, &force, &moment)
        };

        Solution {
            gamma,
            velocity,
            panel_force,
            strip_forces,
            force,
            moment,
            parasite_drag,
            strip_gamma,
            wash,
            induced_drag,
            coefficients,
        }
    }

    // ========================
    // Results
    // ========================

    /// Panel circulations by panel id
    pub fn gamma(&self) -> &LatVec {
        &self.solution.gamma
    }

    /// Total velocity at each bound leg midpoint
    pub fn bound_velocity(&self) -> &[Vec3] {
        &self.solution.velocity
    }

    pub fn panel_forces(&self) -> Vec<PanelForce> {
        self.panels
            .iter()
            .map(|panel| PanelForce {
                id: panel.id,
                strip: panel.strip,
                gamma: self.solution.gamma[panel.id],
                force: self.solution.panel_force[panel.id],
            })
            .collect()
    }

    pub fn strip_forces(&self) -> &[StripForces] {
        &self.solution.strip_forces
    }

    pub fn strip_coefficients(&self) -> Vec<StripCoefficients> {
        let q = self.state.dynamic_pressure();
        let trefftz = self.trefftz_strips();
        self.system
            .strips()
            .zip(self.solution.strip_forces.iter())
            .zip(trefftz.iter())
            .map(|((strip, forces), far)| {
                let qa = q * strip.area();
                StripCoefficients {
                    id: strip.id,
                    cl: forces.lift / qa,
                    cy: forces.side / qa,
                    cn: forces.force.dot(&strip.normal_axis) / qa,
                    cdi: far.drag * strip.width / qa,
                    cdo: if strip.noload { 0.0 } else { strip.mean_cdo() },
                }
            })
            .collect()
    }

    /// Total force in geometry axes
    pub fn force(&self) -> Vec3 {
        self.solution.force
    }

    /// Total moment about the reference point in geometry axes
    pub fn moment(&self) -> Vec3 {
        self.solution.moment
    }

    pub fn lift(&self) -> f64 {
        self.solution.force.dot(&self.state.axes().lift)
    }

    pub fn side_force(&self) -> f64 {
        self.solution.force.dot(&self.state.axes().side)
    }

    pub fn parasite_drag(&self) -> f64 {
        self.solution.parasite_drag
    }

    /// Induced drag from the Trefftz plane
    pub fn induced_drag(&self) -> f64 {
        self.solution.induced_drag
    }

    pub fn coefficients(&self) -> Coefficients {
        self.solution.coefficients
    }

    /// Span efficiency based on the reference aspect ratio
    pub fn efficiency(&self) -> f64 {
        let refs = &self.system.references;
        self.solution
            .coefficients
            .efficiency(refs.bref * refs.bref / refs.sref)
    }

    /// Circulation shed by each strip
    pub fn strip_circulation(&self) -> &LatVec {
        &self.solution.strip_gamma
    }

    /// Spanwise lift, drag and wash distributions in the Trefftz plane
    pub fn trefftz_strips(&self) -> Vec<TrefftzStrip> {
        let rho = self.state.rho;
        let speed = self.state.speed;
        self.system
            .trefftz_stations()
            .iter()
            .zip(self.system.strips())
            .map(|(station, strip)| {
                let gamma = self.solution.strip_gamma[station.strip];
                let wash = self.solution.wash[station.strip];
                let (lift, drag) = if station.noload {
                    (0.0, 0.0)
                } else {
                    (rho * speed * gamma, -0.5 * rho * gamma * wash)
                };
                TrefftzStrip {
                    id: station.strip,
                    bpos: strip.bpos,
                    y: station.midpoint.y,
                    z: station.midpoint.z,
                    gamma,
                    lift,
                    drag,
                    wash,
                }
            })
            .collect()
    }

    // ========================
    // Sensitivities
    // ========================

    /// Circulation response for the current geometry: columns freestream
    /// x, y, z then rotation x, y, z
    pub fn unit_gamma(&self) -> &Mat {
        &self.unit_gamma
    }

    fn unit_response(&self, freestream: Vec3, rotation: Vec3) -> LatVec {
        let weights = LatVec::from_column_slice(&[
            freestream.x,
            freestream.y,
            freestream.z,
            rotation.x,
            rotation.y,
            rotation.z,
        ]);
        &self.unit_gamma * weights
    }

    /// Circulation change per radian of angle of attack
    pub fn galpha(&self) -> LatVec {
        let refs = &self.system.references;
        self.unit_response(
            self.state.freestream_alpha_derivative() * self.state.speed,
            self.state.rotation_alpha_derivative(refs.bref, refs.cref),
        )
    }

    /// Circulation change per radian of sideslip
    pub fn gbeta(&self) -> LatVec {
        self.unit_response(
            self.state.freestream_beta_derivative() * self.state.speed,
            Vec3::zeros(),
        )
    }

    /// Circulation change per radian of deflection of a control, using the
    /// positive or negative deflection gain
    pub fn gctrl(&self, name: &str, positive: bool) -> VlmResult<LatVec> {
        if !self.controls.contains_key(name) {
            return Err(VlmError::ControlNotFound(name.to_string()));
        }
        let sign = if positive { 1.0 } else { -1.0 };
        self.system.solve(&self.control_rhs(name, sign))
    }

    /// Circulation change per radian of positive deflection
    pub fn gctrlp(&self, name: &str) -> VlmResult<LatVec> {
        self.gctrl(name, true)
    }

    /// Circulation change per radian of negative deflection
    pub fn gctrln(&self, name: &str) -> VlmResult<LatVec> {
        self.gctrl(name, false)
    }

    pub(crate) fn axes(&self) -> StabilityAxes {
        self.state.axes()
    }
}

impl Solution {
    fn empty(num_panels: usize, num_strips: usize) -> Self {
        Self {
            gamma: LatVec::zeros(num_panels),
            velocity: Vec::new(),
            panel_force: Vec::new(),
            strip_forces: Vec::new(),
            force: Vec3::zeros(),
            moment: Vec3::zeros(),
            parasite_drag: 0.0,
            strip_gamma: LatVec::zeros(num_strips),
            wash: LatVec::zeros(num_strips),
            induced_drag: 0.0,
            coefficients: Coefficients::default(),
        }
    }
}

/// Induced drag -½ρ Σ Γ w Δs over loaded strips
pub(crate) fn trefftz_drag(
    system: &LatticeSystem,
    rho: f64,
    strip_gamma: &LatVec,
    wash: &LatVec,
) -> f64 {
    -0.5 * rho
        * system
            .trefftz_stations()
            .iter()
            .filter(|station| !station.noload)
            .map(|station| strip_gamma[station.strip] * wash[station.strip] * station.width)
            .sum::<f64>()
}

fn force_coefficients(
    axes: &StabilityAxes,
    q: f64,
    refs: &crate::system::References,
    force: &Vec3,
    moment: &Vec3,
) -> Coefficients {
    let qs = q * refs.sref;
    Coefficients {
        cl: force.dot(&axes.lift) / qs,
        cy: force.dot(&axes.side) / qs,
        cl_roll: moment.dot(&axes.roll) / (qs * refs.bref),
        cm: moment.dot(&axes.pitch) / (qs * refs.cref),
        cn: moment.dot(&axes.yaw) / (qs * refs.bref),
        cdi: 0.0,
        cdo: 0.0,
    }
}

/// Coefficients of a circulation perturbation about a solved result.
///
/// The force change is linearized: ρ[Γ'(V × l) + Γ(v' × l)], where v' is the
/// velocity induced by the perturbation. Parasite drag does not change.
#[derive(Debug, Clone, Copy)]
pub struct GammaResult {
    pub force: Vec3,
    pub moment: Vec3,
    pub induced_drag: f64,
    pub coefficients: Coefficients,
}

impl GammaResult {
    pub fn new(parent: &LatticeResult, gamma: &LatVec) -> VlmResult<Self> {
        let system = parent.system;
        if gamma.len() != system.num_panels() {
            return Err(VlmError::InvalidInput(format!(
                "circulation has {} entries, expected {}",
                gamma.len(),
                system.num_panels()
            )));
        }
        let refs = &system.references;
        let rho = parent.state.rho;
        let q = parent.state.dynamic_pressure();
        let axes = parent.axes();
        let base = &parent.solution;

        let induced = system.induced_at_bound(gamma);
        let mut force = Vec3::zeros();
        let mut moment = Vec3::zeros();
        for panel in parent.panels.iter().filter(|p| !p.noload) {
            let i = panel.id;
            let l = panel.bound_vector();
            let df = (base.velocity[i].cross(&l) * gamma[i]
                + induced[i].cross(&l) * base.gamma[i])
                * rho;
            force += df;
            moment += (panel.bound_midpoint() - refs.rref).cross(&df);
        }

        let strip_gamma = system.strip_circulation(gamma);
        let wash = system.trefftz_wash() * &strip_gamma;
        let induced_drag = trefftz_drag(system, rho, &strip_gamma, &base.wash)
            + trefftz_drag(system, rho, &base.strip_gamma, &wash);

        Ok(Self {
            force,
            moment,
            induced_drag,
            coefficients: Coefficients {
                cdi: induced_drag / (q * refs.sref),
                ..force_coefficients(&axes, q, refs, &force, &moment)
            },
        })
    }
}
