//! Lattice Trim - drive a result to target force and moment coefficients
//!
//! Each iteration linearizes the coefficients about the current state and
//! takes a minimum-norm least squares step in (alpha, beta, deflections).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::result::{GammaResult, LatticeResult};
use super::state::FlightState;
use super::IterationOptions;
use crate::error::{VlmError, VlmResult};
use crate::math::{self, Mat, Vec as LatVec};
use crate::system::LatticeSystem;

/// Outcome of a trim run. A run that hits the iteration cap is reported here
/// rather than as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimReport {
    pub converged: bool,
    /// Correction steps applied, zero when the start is already trimmed
    pub iterations: usize,
    /// Final ‖target - current‖₂
    pub residual: f64,
    /// Final angle of attack (degrees)
    pub alpha: f64,
    /// Final sideslip (degrees)
    pub beta: f64,
    /// Final deflections (degrees)
    pub controls: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct LatticeTrim<'a> {
    pub name: String,
    result: LatticeResult<'a>,
    /// Target [CL, CY, Cl, Cm, Cn]
    targets: [f64; 5],
}

impl<'a> LatticeTrim<'a> {
    pub fn new(name: &str, system: &'a LatticeSystem) -> VlmResult<Self> {
        Ok(Self::from_result(LatticeResult::new(name, system)?))
    }

    /// Trim starting from an existing result's state and deflections
    pub fn from_result(result: LatticeResult<'a>) -> Self {
        Self {
            name: result.name.clone(),
            result,
            targets: [0.0; 5],
        }
    }

    pub fn set_state(&mut self, state: FlightState) -> VlmResult<()> {
        self.result.set_state(state)
    }

    pub fn set_controls(&mut self, deflections: &[(&str, f64)]) -> VlmResult<()> {
        self.result.set_controls(deflections)
    }

    /// Set the target lift, side force, rolling, pitching and yawing moment coefficients
    pub fn set_targets(&mut self, cl: f64, cy: f64, cl_roll: f64, cm: f64, cn: f64) -> VlmResult<()> {
        let targets = [cl, cy, cl_roll, cm, cn];
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(VlmError::InvalidInput(format!(
                "trim targets must be finite, got {:?}",
                targets
            )));
        }
        self.targets = targets;
        Ok(())
    }

    pub fn targets(&self) -> [f64; 5] {
        self.targets
    }

    /// Target minus current coefficients
    pub fn residual_vector(&self) -> LatVec {
        let current = self.result.coefficients().as_array();
        LatVec::from_iterator(5, self.targets.iter().zip(current.iter()).map(|(t, c)| t - c))
    }

    pub fn residual(&self) -> f64 {
        self.residual_vector().norm()
    }

    /// Current (alpha, beta, deflections...) in radians
    fn current_dmat(&self) -> LatVec {
        let state = self.result.state();
        let mut values = vec![state.alpha.to_radians(), state.beta.to_radians()];
        values.extend(self.result.controls().values().map(|d| d.to_radians()));
        LatVec::from_vec(values)
    }

    fn apply_dmat(&mut self, dmat: &LatVec) -> VlmResult<()> {
        let state = self
            .result
            .state()
            .with_alpha(dmat[0].to_degrees())
            .with_beta(dmat[1].to_degrees());
        let controls = self
            .result
            .controls()
            .keys()
            .zip(dmat.iter().skip(2))
            .map(|(name, value)| (name.clone(), value.to_degrees()))
            .collect();
        self.result.apply(state, controls)
    }

    /// 5×(2 + controls) coefficient sensitivities per radian. Control columns
    /// use the gain matching the sign of the current deflection.
    pub fn sensitivity_matrix(&self) -> VlmResult<Mat> {
        let controls: Vec<(String, f64)> = self
            .result
            .controls()
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        let mut columns = vec![self.result.galpha(), self.result.gbeta()];
        for (name, deflection) in &controls {
            columns.push(self.result.gctrl(name, *deflection >= 0.0)?);
        }

        let mut hmat = Mat::zeros(5, columns.len());
        for (j, gamma) in columns.iter().enumerate() {
            let coeffs = GammaResult::new(&self.result, gamma)?.coefficients.as_array();
            for (i, value) in coeffs.iter().enumerate() {
                hmat[(i, j)] = *value;
            }
        }
        Ok(hmat)
    }

    /// One linearized step: the updated (alpha, beta, deflections) in radians
    pub fn trim_iteration(&self) -> VlmResult<LatVec> {
        let hmat = self.sensitivity_matrix()?;
        let delta = math::solve_least_squares(&hmat, &self.residual_vector())
            .ok_or(VlmError::SingularMatrix)?;
        Ok(self.current_dmat() + delta)
    }

    /// Iterate until the coefficient residual is within `tolerance`
    pub fn trim(&mut self, tolerance: f64, max_iterations: usize) -> VlmResult<TrimReport> {
        let options = IterationOptions::default()
            .with_tolerance(tolerance)
            .with_max_iter(max_iterations);
        self.trim_with(&options)
    }

    pub fn trim_with(&mut self, options: &IterationOptions) -> VlmResult<TrimReport> {
        options.validate()?;

        let mut iterations = 0;
        let mut residual = self.residual();
        while residual > options.tolerance {
            if iterations == options.max_iterations {
                log::warn!(
                    "Trim '{}' did not converge in {} iterations (residual {:e})",
                    self.name,
                    iterations,
                    residual
                );
                return Ok(self.report(false, iterations, residual));
            }
            let dmat = self.trim_iteration()?;
            self.apply_dmat(&dmat)?;
            iterations += 1;
            residual = self.residual();
            if options.log {
                log::info!(
                    "Trim '{}' iteration {}: residual {:e}",
                    self.name,
                    iterations,
                    residual
                );
            }
        }
        Ok(self.report(true, iterations, residual))
    }

    fn report(&self, converged: bool, iterations: usize, residual: f64) -> TrimReport {
        TrimReport {
            converged,
            iterations,
            residual,
            alpha: self.result.state().alpha,
            beta: self.result.state().beta,
            controls: self.result.controls().clone(),
        }
    }

    pub fn result(&self) -> &LatticeResult<'a> {
        &self.result
    }

    /// A plain result at the current trim state
    pub fn to_result(&self) -> LatticeResult<'a> {
        self.result.clone()
    }

    pub fn into_result(self) -> LatticeResult<'a> {
        self.result
    }
}
