//! Lattice Optimum - target spanwise loadings and the twist that produces them
//!
//! Loadings are held as strip circulations. Lift, side force and moments of a
//! loading are evaluated in the Trefftz plane, where each is linear in the
//! strip circulations and the induced drag is quadratic.

use serde::{Deserialize, Serialize};

use super::result::{trefftz_drag, LatticeResult};
use super::IterationOptions;
use crate::error::{VlmError, VlmResult};
use crate::math::{self, Mat, Vec as LatVec};
use crate::system::LatticeSystem;

/// Quantity measured by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Lift,
    SideForce,
    /// Moment about the x axis through the reference point
    RollingMoment,
    /// Moment about the symmetry plane, positive for upward load on either half
    BendingMoment,
}

/// Strips a record sums over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripSelection {
    All,
    /// Strips on reflected sheets
    Mirrored,
    Unmirrored,
    Surface(String),
    Strips(Vec<usize>),
}

/// A named linear functional of the strip circulations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub kind: RecordKind,
    pub selection: StripSelection,
    /// Contribution per unit strip circulation, per unit ρV
    pub coefficients: LatVec,
}

impl Record {
    fn new(
        system: &LatticeSystem,
        name: &str,
        kind: RecordKind,
        selection: StripSelection,
    ) -> VlmResult<Self> {
        match &selection {
            StripSelection::Surface(surface) => {
                system.surface(surface)?;
            }
            StripSelection::Strips(ids) => {
                if let Some(id) = ids.iter().find(|&&id| id >= system.num_strips()) {
                    return Err(VlmError::InvalidInput(format!(
                        "record '{}' selects strip {} of {}",
                        name,
                        id,
                        system.num_strips()
                    )));
                }
            }
            _ => {}
        }

        let rref = system.references.rref;
        let mut coefficients = LatVec::zeros(system.num_strips());
        for station in system.trefftz_stations() {
            if station.noload || !is_selected(system, &selection, station.strip) {
                continue;
            }
            let y = station.midpoint.y;
            let z = station.midpoint.z;
            coefficients[station.strip] = match kind {
                RecordKind::Lift => station.dy,
                RecordKind::SideForce => -station.dz,
                RecordKind::RollingMoment => (y - rref.y) * station.dy + (z - rref.z) * station.dz,
                RecordKind::BendingMoment => {
                    let side = if y.abs() < 1e-12 { 0.0 } else { y.signum() };
                    side * (y * station.dy + z * station.dz)
                }
            };
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            selection,
            coefficients,
        })
    }

    /// Value of the record for the given strip circulations
    pub fn evaluate(&self, strip_gamma: &LatVec, rho: f64, speed: f64) -> f64 {
        rho * speed * self.coefficients.dot(strip_gamma)
    }
}

fn is_selected(system: &LatticeSystem, selection: &StripSelection, id: usize) -> bool {
    match selection {
        StripSelection::All => true,
        StripSelection::Mirrored => system.strip(id).is_some_and(|s| s.mirror),
        StripSelection::Unmirrored => system.strip(id).is_some_and(|s| !s.mirror),
        StripSelection::Surface(name) => system
            .strip_surface(id)
            .is_some_and(|s| s.name == *name),
        StripSelection::Strips(ids) => ids.contains(&id),
    }
}

/// Outcome of a twist iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwistReport {
    pub converged: bool,
    /// Twist corrections applied
    pub iterations: usize,
    /// Largest strip lift-per-span mismatch on loaded strips
    pub residual: f64,
    /// Strip twist offsets in degrees, by strip id
    pub twist: Vec<f64>,
}

/// A target loading attached to a solved result.
///
/// The target starts out as the result's own loading.
#[derive(Debug, Clone)]
pub struct LatticeOptimum<'a> {
    pub name: String,
    result: LatticeResult<'a>,
    rho: f64,
    speed: f64,
    /// Target circulation by strip id
    strip_gamma: LatVec,
    records: Vec<Record>,
}

impl<'a> LatticeOptimum<'a> {
    pub fn new(name: &str, system: &'a LatticeSystem) -> VlmResult<Self> {
        Ok(Self::from_result(LatticeResult::new(name, system)?))
    }

    pub fn from_result(result: LatticeResult<'a>) -> Self {
        Self {
            name: result.name.clone(),
            rho: result.state().rho,
            speed: result.state().speed,
            strip_gamma: result.strip_circulation().clone(),
            records: Vec::new(),
            result,
        }
    }

    fn system(&self) -> &'a LatticeSystem {
        self.result.system()
    }

    fn loaded_strips(&self) -> Vec<usize> {
        self.system()
            .trefftz_stations()
            .iter()
            .filter(|station| !station.noload)
            .map(|station| station.strip)
            .collect()
    }

    // ========================
    // Target Loading
    // ========================

    /// Set the target lift per unit span as a function of spanwise position.
    ///
    /// The result is moved to the given density and speed so that twist
    /// iterations reproduce the same lift. No-load strips carry no target.
    pub fn set_lift_distribution<F>(&mut self, lift: F, rho: f64, speed: f64) -> VlmResult<()>
    where
        F: Fn(f64) -> f64,
    {
        for (label, value) in [("density", rho), ("speed", speed)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(VlmError::InvalidInput(format!(
                    "{} must be positive, got {}",
                    label, value
                )));
            }
        }

        let mut strip_gamma = LatVec::zeros(self.system().num_strips());
        for strip in self.system().strips().filter(|s| !s.noload) {
            let value = lift(strip.bpos);
            if !value.is_finite() {
                return Err(VlmError::InvalidInput(format!(
                    "lift distribution is not finite at {}",
                    strip.bpos
                )));
            }
            strip_gamma[strip.id] = value / (rho * speed);
        }

        let state = self.result.state().with_density(rho).with_speed(speed);
        self.result.set_state(state)?;
        self.rho = rho;
        self.speed = speed;
        self.strip_gamma = strip_gamma;
        Ok(())
    }

    /// Target circulation by strip id
    pub fn strip_circulation(&self) -> &LatVec {
        &self.strip_gamma
    }

    /// Target lift per unit span by strip id
    pub fn lift_distribution(&self) -> Vec<f64> {
        self.system()
            .strips()
            .map(|strip| {
                if strip.noload {
                    0.0
                } else {
                    self.rho * self.speed * self.strip_gamma[strip.id]
                }
            })
            .collect()
    }

    /// Total Trefftz-plane lift of the target loading
    pub fn lift(&self) -> f64 {
        self.rho
            * self.speed
            * self
                .system()
                .trefftz_stations()
                .iter()
                .filter(|station| !station.noload)
                .map(|station| station.dy * self.strip_gamma[station.strip])
                .sum::<f64>()
    }

    /// Induced drag of the target loading
    pub fn return_induced_drag(&self) -> f64 {
        let wash = self.system().trefftz_wash() * &self.strip_gamma;
        trefftz_drag(self.system(), self.rho, &self.strip_gamma, &wash)
    }

    // ========================
    // Records
    // ========================

    pub fn add_record(
        &mut self,
        name: &str,
        kind: RecordKind,
        selection: StripSelection,
    ) -> VlmResult<()> {
        if self.records.iter().any(|r| r.name == name) {
            return Err(VlmError::DuplicateName(name.to_string()));
        }
        let record = Record::new(self.system(), name, kind, selection)?;
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn record(&self, name: &str) -> VlmResult<&Record> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| VlmError::RecordNotFound(name.to_string()))
    }

    /// Value of a record for the target loading
    pub fn record_value(&self, name: &str) -> VlmResult<f64> {
        Ok(self.record(name)?.evaluate(&self.strip_gamma, self.rho, self.speed))
    }

    // ========================
    // Minimum Induced Drag
    // ========================

    /// Replace the target with the loading of least induced drag that carries
    /// `lift` and holds each named record at its given value.
    ///
    /// Solves the KKT system of the equality constrained quadratic program over
    /// the loaded strips and returns the new induced drag.
    pub fn optimum_lift_distribution(&mut self, lift: f64, fixed: &[(&str, f64)]) -> VlmResult<f64> {
        if !lift.is_finite() {
            return Err(VlmError::InvalidInput(format!("lift is not finite: {}", lift)));
        }
        let system = self.system();
        let loaded = self.loaded_strips();
        if loaded.is_empty() {
            return Err(VlmError::InvalidGeometry(
                "no loaded strips to distribute lift over".to_string(),
            ));
        }

        let rho_v = self.rho * self.speed;
        let lift_record = Record::new(system, "lift", RecordKind::Lift, StripSelection::All)?;
        let mut constraints = vec![(lift_record.coefficients, lift / rho_v)];
        for &(name, value) in fixed {
            if !value.is_finite() {
                return Err(VlmError::InvalidInput(format!(
                    "value of record '{}' is not finite",
                    name
                )));
            }
            constraints.push((self.record(name)?.coefficients.clone(), value / rho_v));
        }

        let n = loaded.len();
        let m = constraints.len();
        let stations = system.trefftz_stations();
        let wash = system.trefftz_wash();
        let mut kkt = Mat::zeros(n + m, n + m);
        let mut rhs = LatVec::zeros(n + m);

        for (a, &sa) in loaded.iter().enumerate() {
            for (b, &sb) in loaded.iter().enumerate() {
                kkt[(a, b)] = -0.5
                    * self.rho
                    * (stations[sa].width * wash[(sa, sb)] + wash[(sb, sa)] * stations[sb].width);
            }
        }
        for (k, (coefficients, value)) in constraints.iter().enumerate() {
            for (a, &sa) in loaded.iter().enumerate() {
                kkt[(n + k, a)] = coefficients[sa];
                kkt[(a, n + k)] = coefficients[sa];
            }
            rhs[n + k] = *value;
        }

        let solution = math::solve_linear_system(&kkt, &rhs).ok_or(VlmError::SingularMatrix)?;
        let mut strip_gamma = LatVec::zeros(system.num_strips());
        for (a, &sa) in loaded.iter().enumerate() {
            strip_gamma[sa] = solution[a];
        }
        self.strip_gamma = strip_gamma;

        let drag = self.return_induced_drag();
        log::debug!(
            "Optimum '{}': lift {:.6e} with {} fixed records, induced drag {:.6e}",
            self.name,
            lift,
            fixed.len(),
            drag
        );
        Ok(drag)
    }

    // ========================
    // Twist Iteration
    // ========================

    /// Strip circulation change per radian of twist of each strip, strips by
    /// columns. Control deflections are held at their current linearization.
    fn twist_jacobian(&self) -> VlmResult<Mat> {
        let system = self.system();
        let normals = self.result.normals();
        let mut rhs = Mat::zeros(system.num_panels(), system.num_strips());
        for panel in system.panels() {
            let dn = panel.span_axis.cross(&normals[panel.id]);
            rhs[(panel.id, panel.strip)] = -self.result.onset_velocity(&panel.collocation).dot(&dn);
        }
        let dgamma = system.solve_many(&rhs)?;

        let mut jacobian = Mat::zeros(system.num_strips(), system.num_strips());
        for t in 0..system.num_strips() {
            let column = system.strip_circulation(&dgamma.column(t).into_owned());
            jacobian.set_column(t, &column);
        }
        Ok(jacobian)
    }

    fn twist_residual(&self, loaded: &[usize]) -> f64 {
        let current = self.result.strip_circulation();
        let worst = loaded
            .iter()
            .map(|&s| (self.strip_gamma[s] - current[s]).abs())
            .fold(0.0_f64, f64::max);
        self.rho * self.speed * worst
    }

    /// Twist the strips of the result until its loading matches the target
    pub fn optimum_strip_twist(&mut self, tolerance: f64) -> VlmResult<TwistReport> {
        let options = IterationOptions::default().with_tolerance(tolerance);
        self.optimum_strip_twist_with(&options)
    }

    pub fn optimum_strip_twist_with(&mut self, options: &IterationOptions) -> VlmResult<TwistReport> {
        options.validate()?;
        let loaded = self.loaded_strips();

        let mut iterations = 0;
        let mut residual = self.twist_residual(&loaded);
        while residual > options.tolerance {
            if iterations == options.max_iterations {
                log::warn!(
                    "Twist '{}' did not converge in {} iterations (residual {:e})",
                    self.name,
                    iterations,
                    residual
                );
                return Ok(self.twist_report(false, iterations, residual));
            }

            let jacobian = self.twist_jacobian()?;
            let current = self.result.strip_circulation();
            let n = loaded.len();
            let mut jac = Mat::zeros(n, n);
            let mut mismatch = LatVec::zeros(n);
            for (a, &sa) in loaded.iter().enumerate() {
                mismatch[a] = self.strip_gamma[sa] - current[sa];
                for (b, &sb) in loaded.iter().enumerate() {
                    jac[(a, b)] = jacobian[(sa, sb)];
                }
            }
            let step = math::solve_linear_system(&jac, &mismatch).ok_or(VlmError::SingularMatrix)?;

            let mut twist: Vec<f64> = self.result.strip_twist().iter().copied().collect();
            for (b, &sb) in loaded.iter().enumerate() {
                twist[sb] += step[b].to_degrees();
            }
            self.result.set_strip_twist(&twist)?;

            iterations += 1;
            residual = self.twist_residual(&loaded);
            if options.log {
                log::info!(
                    "Twist '{}' iteration {}: residual {:e}",
                    self.name,
                    iterations,
                    residual
                );
            }
        }
        Ok(self.twist_report(true, iterations, residual))
    }

    fn twist_report(&self, converged: bool, iterations: usize, residual: f64) -> TwistReport {
        TwistReport {
            converged,
            iterations,
            residual,
            twist: self.result.strip_twist().iter().copied().collect(),
        }
    }

    /// The result, twisted by any completed twist iteration
    pub fn result(&self) -> &LatticeResult<'a> {
        &self.result
    }

    pub fn into_result(self) -> LatticeResult<'a> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FlightState;
    use crate::geometry::{Section, Spacing, Surface};
    use crate::model::LatticeModel;
    use approx::assert_relative_eq;

    fn rectangular_wing() -> LatticeSystem {
        let mut model = LatticeModel::new("Rect");
        model
            .add_surface(
                Surface::new("Wing")
                    .mirrored()
                    .with_chordwise(2, Spacing::Equal)
                    .with_section(Section::new(0.0, 0.0, 0.0, 1.0).with_spacing(12, Spacing::Cosine))
                    .with_section(Section::new(0.0, 5.0, 0.0, 1.0)),
            )
            .unwrap();
        model.build().unwrap()
    }

    #[test]
    fn test_baseline_target_reports_baseline_drag() {
        let system = rectangular_wing();
        let mut result = LatticeResult::new("Base", &system).unwrap();
        result.set_state(FlightState::new(4.0, 0.0)).unwrap();
        let drag = result.induced_drag();
        let optimum = LatticeOptimum::from_result(result);
        assert_relative_eq!(optimum.return_induced_drag(), drag, max_relative = 1e-12);
    }

    #[test]
    fn test_record_errors() {
        let system = rectangular_wing();
        let mut optimum = LatticeOptimum::new("Opt", &system).unwrap();
        optimum
            .add_record("lift", RecordKind::Lift, StripSelection::All)
            .unwrap();
        assert!(matches!(
            optimum.add_record("lift", RecordKind::SideForce, StripSelection::All),
            Err(VlmError::DuplicateName(_))
        ));
        assert!(matches!(
            optimum.add_record("fin", RecordKind::Lift, StripSelection::Surface("Fin".to_string())),
            Err(VlmError::SurfaceNotFound(_))
        ));
        assert!(matches!(
            optimum.add_record("far", RecordKind::Lift, StripSelection::Strips(vec![999])),
            Err(VlmError::InvalidInput(_))
        ));
        assert!(matches!(
            optimum.record_value("bending"),
            Err(VlmError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_half_records_sum_to_whole() {
        let system = rectangular_wing();
        let mut result = LatticeResult::new("Base", &system).unwrap();
        result.set_state(FlightState::new(3.0, 0.0)).unwrap();
        let mut optimum = LatticeOptimum::from_result(result);
        optimum.add_record("all", RecordKind::Lift, StripSelection::All).unwrap();
        optimum.add_record("left", RecordKind::Lift, StripSelection::Mirrored).unwrap();
        optimum.add_record("right", RecordKind::Lift, StripSelection::Unmirrored).unwrap();
        optimum.add_record("roll", RecordKind::RollingMoment, StripSelection::All).unwrap();

        let all = optimum.record_value("all").unwrap();
        let left = optimum.record_value("left").unwrap();
        let right = optimum.record_value("right").unwrap();
        assert_relative_eq!(all, optimum.lift(), max_relative = 1e-12);
        assert_relative_eq!(left + right, all, max_relative = 1e-12);
        assert_relative_eq!(left, right, max_relative = 1e-9);
        assert_relative_eq!(optimum.record_value("roll").unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_optimum_carries_requested_lift() {
        let system = rectangular_wing();
        let mut optimum = LatticeOptimum::new("Opt", &system).unwrap();
        let drag = optimum.optimum_lift_distribution(2.0, &[]).unwrap();
        assert_relative_eq!(optimum.lift(), 2.0, max_relative = 1e-9);
        assert!(drag > 0.0);
        let distribution = optimum.lift_distribution();
        let n = distribution.len();
        assert_relative_eq!(distribution[0], distribution[n - 1], max_relative = 1e-6);
        assert!(distribution[n / 2] > distribution[n - 1]);
    }

    #[test]
    fn test_unknown_fixed_record() {
        let system = rectangular_wing();
        let mut optimum = LatticeOptimum::new("Opt", &system).unwrap();
        assert!(matches!(
            optimum.optimum_lift_distribution(1.0, &[("bending", 0.5)]),
            Err(VlmError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_twist_reproduces_target() {
        let system = rectangular_wing();
        let mut optimum = LatticeOptimum::new("Opt", &system).unwrap();
        let drag = optimum.optimum_lift_distribution(2.0, &[]).unwrap();
        let report = optimum.optimum_strip_twist(1e-8).unwrap();
        assert!(report.converged, "{:?}", report);
        assert!(report.iterations > 1);
        let n = report.twist.len();
        assert_relative_eq!(report.twist[0], report.twist[n - 1], epsilon = 1e-6);
        assert_relative_eq!(optimum.result().induced_drag(), drag, max_relative = 1e-6);
    }

    #[test]
    fn test_invalid_lift_distribution() {
        let system = rectangular_wing();
        let mut optimum = LatticeOptimum::new("Opt", &system).unwrap();
        assert!(optimum.set_lift_distribution(|_| 1.0, 0.0, 1.0).is_err());
        assert!(optimum.set_lift_distribution(|_| f64::NAN, 1.0, 1.0).is_err());
    }
}
