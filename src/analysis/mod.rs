//! Analysis types and options

pub mod optimum;
pub mod result;
pub mod state;
pub mod trim;

pub use optimum::{LatticeOptimum, Record, RecordKind, StripSelection, TwistReport};
pub use result::{GammaResult, LatticeResult};
pub use state::{FlightState, StabilityAxes};
pub use trim::{LatticeTrim, TrimReport};

use serde::{Deserialize, Serialize};

/// Options for the iterative trim and twist solvers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationOptions {
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the residual norm
    pub tolerance: f64,
    /// Log per-iteration diagnostics at info level
    pub log: bool,
}

impl Default for IterationOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            log: false,
        }
    }
}

impl IterationOptions {
    /// Enable logging
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub(crate) fn validate(&self) -> crate::error::VlmResult<()> {
        if self.max_iterations == 0 {
            return Err(crate::error::VlmError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance >= 0.0) {
            return Err(crate::error::VlmError::InvalidInput(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
