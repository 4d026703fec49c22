//! Flight state and the wind/stability axes derived from it

use serde::{Deserialize, Serialize};

use crate::error::{VlmError, VlmResult};
use crate::math::Vec3;

/// Angles in degrees, rates as non-dimensional ratios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    /// Angle of attack (degrees)
    pub alpha: f64,
    /// Sideslip angle (degrees)
    pub beta: f64,
    /// Roll rate ratio pb/2V
    pub pbo2v: f64,
    /// Pitch rate ratio qc/2V
    pub qco2v: f64,
    /// Yaw rate ratio rb/2V
    pub rbo2v: f64,
    /// Air density
    pub rho: f64,
    /// Freestream speed
    pub speed: f64,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 0.0,
            pbo2v: 0.0,
            qco2v: 0.0,
            rbo2v: 0.0,
            rho: 1.0,
            speed: 1.0,
        }
    }
}

/// Stability axes and wind directions in geometry coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityAxes {
    /// Along the freestream
    pub drag: Vec3,
    pub side: Vec3,
    pub lift: Vec3,
    /// Forward stability axis (roll)
    pub roll: Vec3,
    /// Right stability axis (pitch)
    pub pitch: Vec3,
    /// Downward stability axis (yaw)
    pub yaw: Vec3,
}

impl FlightState {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            beta,
            ..Self::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the non-dimensional roll, pitch and yaw rates
    pub fn with_rates(mut self, pbo2v: f64, qco2v: f64, rbo2v: f64) -> Self {
        self.pbo2v = pbo2v;
        self.qco2v = qco2v;
        self.rbo2v = rbo2v;
        self
    }

    pub fn with_density(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn validate(&self) -> VlmResult<()> {
        let values = [
            self.alpha, self.beta, self.pbo2v, self.qco2v, self.rbo2v, self.rho, self.speed,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(VlmError::InvalidInput(format!(
                "flight state has non-finite values: {:?}",
                self
            )));
        }
        if self.rho <= 0.0 {
            return Err(VlmError::InvalidInput(format!(
                "density must be positive, got {}",
                self.rho
            )));
        }
        if self.speed <= 0.0 {
            return Err(VlmError::InvalidInput(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        Ok(())
    }

    /// Dynamic pressure ½ρV²
    pub fn dynamic_pressure(&self) -> f64 {
        0.5 * self.rho * self.speed * self.speed
    }

    /// Unit vector along which the air moves past the vehicle
    pub fn freestream_direction(&self) -> Vec3 {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let (sb, cb) = self.beta.to_radians().sin_cos();
        Vec3::new(ca * cb, -sb, sa * cb)
    }

    /// Derivative of the freestream direction with respect to alpha (per radian)
    pub fn freestream_alpha_derivative(&self) -> Vec3 {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let cb = self.beta.to_radians().cos();
        Vec3::new(-sa * cb, 0.0, ca * cb)
    }

    /// Derivative of the freestream direction with respect to beta (per radian)
    pub fn freestream_beta_derivative(&self) -> Vec3 {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let (sb, cb) = self.beta.to_radians().sin_cos();
        Vec3::new(-ca * sb, -cb, -sa * sb)
    }

    pub fn axes(&self) -> StabilityAxes {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let drag = self.freestream_direction();
        let lift = Vec3::new(-sa, 0.0, ca);
        StabilityAxes {
            drag,
            side: lift.cross(&drag),
            lift,
            roll: Vec3::new(-ca, 0.0, -sa),
            pitch: Vec3::y(),
            yaw: Vec3::new(sa, 0.0, -ca),
        }
    }

    /// Rotation vector in geometry axes for reference span `bref` and chord `cref`
    pub fn rotation(&self, bref: f64, cref: f64) -> Vec3 {
        let axes = self.axes();
        let (p, q, r) = self.rates(bref, cref);
        axes.roll * p + axes.pitch * q + axes.yaw * r
    }

    /// Derivative of the rotation vector with respect to alpha (per radian)
    pub fn rotation_alpha_derivative(&self, bref: f64, cref: f64) -> Vec3 {
        let (sa, ca) = self.alpha.to_radians().sin_cos();
        let (p, _, r) = self.rates(bref, cref);
        Vec3::new(sa, 0.0, -ca) * p + Vec3::new(ca, 0.0, sa) * r
    }

    /// Dimensional body rates (p, q, r)
    pub fn rates(&self, bref: f64, cref: f64) -> (f64, f64, f64) {
        let scale = 2.0 * self.speed;
        (
            self.pbo2v * scale / bref,
            self.qco2v * scale / cref,
            self.rbo2v * scale / bref,
        )
    }
}
