//! Result rows for lattice analysis

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Global aerodynamic coefficients in stability axes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Lift coefficient CL
    pub cl: f64,
    /// Side force coefficient CY
    pub cy: f64,
    /// Rolling moment coefficient Cl
    pub cl_roll: f64,
    /// Pitching moment coefficient Cm
    pub cm: f64,
    /// Yawing moment coefficient Cn
    pub cn: f64,
    /// Induced drag coefficient from the Trefftz plane
    pub cdi: f64,
    /// Parasite drag coefficient
    pub cdo: f64,
}

impl Coefficients {
    /// The trim quantities [CL, CY, Cl, Cm, Cn]
    pub fn as_array(&self) -> [f64; 5] {
        [self.cl, self.cy, self.cl_roll, self.cm, self.cn]
    }

    /// Total drag coefficient
    pub fn cd(&self) -> f64 {
        self.cdi + self.cdo
    }

    /// Span efficiency CL²/(π AR CDi)
    pub fn efficiency(&self, aspect_ratio: f64) -> f64 {
        if self.cdi == 0.0 {
            0.0
        } else {
            self.cl * self.cl / (std::f64::consts::PI * aspect_ratio * self.cdi)
        }
    }
}

/// Integrated forces on one strip
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StripForces {
    pub id: usize,
    /// Force in geometry axes, including parasite drag
    pub force: Vec3,
    /// Moment about the reference point in geometry axes
    pub moment: Vec3,
    pub lift: f64,
    pub side: f64,
    /// Near-field drag, including parasite drag
    pub drag: f64,
    /// Parasite drag alone
    pub parasite: f64,
}

/// Strip forces normalised by dynamic pressure and strip area
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StripCoefficients {
    pub id: usize,
    /// Local lift coefficient
    pub cl: f64,
    /// Local side force coefficient
    pub cy: f64,
    /// Local force coefficient along the strip normal
    pub cn: f64,
    /// Local induced drag coefficient from the Trefftz plane
    pub cdi: f64,
    pub cdo: f64,
}

/// Force on one panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanelForce {
    pub id: usize,
    pub strip: usize,
    pub gamma: f64,
    pub force: Vec3,
}

/// Read-only strip geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StripGeometry {
    pub id: usize,
    pub sheet: usize,
    /// Spanwise position along the surface
    pub bpos: f64,
    /// Leading edge point at mid-span
    pub point: Vec3,
    pub chord: f64,
    pub width: f64,
    pub area: f64,
    /// Mid-span twist (degrees)
    pub twist: f64,
    pub cdo: f64,
    pub mirror: bool,
    pub noload: bool,
}

/// Read-only panel geometry
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanelGeometry {
    pub id: usize,
    pub strip: usize,
    pub collocation: Vec3,
    pub normal: Vec3,
    pub bound_midpoint: Vec3,
    pub area: f64,
    pub chord: f64,
    /// Collocation station as a fraction of the local chord
    pub station: f64,
}

/// Far-field loading of one strip
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrefftzStrip {
    pub id: usize,
    pub bpos: f64,
    pub y: f64,
    pub z: f64,
    /// Total circulation shed by the strip
    pub gamma: f64,
    /// Force per unit span normal to the strip, ρVΓ
    pub lift: f64,
    /// Induced drag per unit span
    pub drag: f64,
    /// Normal wash velocity (negative is downwash)
    pub wash: f64,
}
