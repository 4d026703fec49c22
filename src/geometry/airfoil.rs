//! Mean camber lines used to tilt panel normals

use serde::{Deserialize, Serialize};

use crate::error::{VlmError, VlmResult};

/// Section camber definition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Airfoil {
    /// Uncambered flat plate
    #[default]
    Flat,
    /// [4-digit NACA](https://en.wikipedia.org/wiki/NACA_airfoil) mean camber line
    Naca4 {
        /// Maximum camber (fraction of chord)
        camber: f64,
        /// Location of maximum camber (fraction of chord)
        position: f64,
    },
}

impl Airfoil {
    /// Parse the camber part of a 4-digit NACA designation, e.g. `"2412"`
    pub fn naca4(code: &str) -> VlmResult<Self> {
        let digits: Vec<u32> = code
            .trim()
            .trim_start_matches("NACA")
            .trim()
            .chars()
            .map(|c| c.to_digit(10))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| VlmError::InvalidInput(format!("'{}' is not a NACA 4-digit code", code)))?;

        if digits.len() != 4 {
            return Err(VlmError::InvalidInput(format!(
                "'{}' is not a NACA 4-digit code",
                code
            )));
        }

        let camber = digits[0] as f64 / 100.0;
        let position = digits[1] as f64 / 10.0;

        if camber == 0.0 {
            return Ok(Airfoil::Flat);
        }

        let airfoil = Airfoil::Naca4 { camber, position };
        airfoil.validate()?;
        Ok(airfoil)
    }

    /// Check the camber parameters are usable
    pub fn validate(&self) -> VlmResult<()> {
        if let Airfoil::Naca4 { camber, position } = *self {
            if camber != 0.0 && !(position > 0.0 && position < 1.0) {
                return Err(VlmError::InvalidInput(format!(
                    "camber position {} must lie strictly between 0 and 1",
                    position
                )));
            }
        }
        Ok(())
    }

    /// Slope `dz/dx` of the mean camber line at chord fraction `x`
    pub fn camber_slope(&self, x: f64) -> f64 {
        match *self {
            Airfoil::Flat => 0.0,
            Airfoil::Naca4 { camber, position } => {
                if camber == 0.0 {
                    0.0
                } else if x < position {
                    2.0 * camber / (position * position) * (position - x)
                } else {
                    let aft = 1.0 - position;
                    2.0 * camber / (aft * aft) * (position - x)
                }
            }
        }
    }
}
