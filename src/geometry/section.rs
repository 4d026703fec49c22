//! Section - one spanwise station of a lifting surface

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::airfoil::Airfoil;
use super::control::Control;
use super::spacing::{Spacing, SpacingTriple};
use crate::error::{VlmError, VlmResult};
use crate::math::{self, Vec3};

fn one() -> usize {
    1
}

/// A spanwise station: leading edge point, chord, twist and the properties
/// inherited by the sheet that starts at it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Leading edge point
    pub point: Vec3,
    /// Chord length
    pub chord: f64,
    /// Twist angle in degrees, positive nose up
    #[serde(default)]
    pub twist: f64,
    /// Parasite drag coefficient
    #[serde(default)]
    pub cdo: f64,
    /// Interpolate the chord line in physical space rather than in angle
    #[serde(default)]
    pub ruled: bool,
    /// Exclude the following sheet from force integration
    #[serde(default)]
    pub noload: bool,
    /// Number of spanwise strips on the following sheet
    #[serde(default = "one")]
    pub bnum: usize,
    /// Spanwise spacing on the following sheet
    #[serde(default)]
    pub bspc: Spacing,
    /// Camber line
    #[serde(default)]
    pub airfoil: Airfoil,
    /// Controls on the following sheet, by name
    #[serde(default)]
    pub controls: BTreeMap<String, Control>,

    /// Reflected copy produced by surface mirroring
    #[serde(skip)]
    pub(crate) mirror: bool,

    /// Spanwise position along the surface, assigned during meshing
    #[serde(skip)]
    pub(crate) bpos: Option<f64>,
}

impl Section {
    /// Create an untwisted section with its leading edge at (x, y, z)
    pub fn new(x: f64, y: f64, z: f64, chord: f64) -> Self {
        Self {
            point: Vec3::new(x, y, z),
            chord,
            twist: 0.0,
            cdo: 0.0,
            ruled: false,
            noload: false,
            bnum: 1,
            bspc: Spacing::Equal,
            airfoil: Airfoil::Flat,
            controls: BTreeMap::new(),
            mirror: false,
            bpos: None,
        }
    }

    /// Set the twist angle (degrees)
    pub fn with_twist(mut self, twist: f64) -> Self {
        self.twist = twist;
        self
    }

    /// Set the parasite drag coefficient
    pub fn with_cdo(mut self, cdo: f64) -> Self {
        self.cdo = cdo;
        self
    }

    /// Mark the following sheet as ruled
    pub fn ruled(mut self) -> Self {
        self.ruled = true;
        self
    }

    /// Mark the following sheet as carrying no load
    pub fn noload(mut self) -> Self {
        self.noload = true;
        self
    }

    /// Set the spanwise strip count and spacing for the following sheet
    pub fn with_spacing(mut self, bnum: usize, bspc: Spacing) -> Self {
        self.bnum = bnum;
        self.bspc = bspc;
        self
    }

    /// Set the camber line
    pub fn with_airfoil(mut self, airfoil: Airfoil) -> Self {
        self.airfoil = airfoil;
        self
    }

    /// Add a control to the following sheet
    pub fn with_control(mut self, name: &str, control: Control) -> Self {
        self.controls.insert(name.to_string(), control);
        self
    }

    /// Check the section is usable for meshing
    pub fn validate(&self) -> VlmResult<()> {
        if !(self.point.iter().all(|v| v.is_finite())) {
            return Err(VlmError::InvalidSection(format!(
                "leading edge point {:?} is not finite",
                self.point
            )));
        }
        if !(self.chord > 0.0) || !self.chord.is_finite() {
            return Err(VlmError::InvalidSection(format!(
                "chord must be positive, got {}",
                self.chord
            )));
        }
        if !self.twist.is_finite() || !self.cdo.is_finite() {
            return Err(VlmError::InvalidSection(
                "twist and parasite drag must be finite".to_string(),
            ));
        }
        self.spacing()?;
        self.airfoil.validate()?;
        for (name, control) in &self.controls {
            control.validate(name)?;
        }
        Ok(())
    }

    /// Spanwise spacing triples for the sheet starting at this section
    pub fn spacing(&self) -> VlmResult<Vec<SpacingTriple>> {
        self.bspc.distribution(self.bnum)
    }

    /// Reflect the section through the XZ plane
    pub fn mirrored(&self) -> Self {
        Self {
            point: math::mirror_y(&self.point),
            mirror: true,
            bpos: None,
            ..self.clone()
        }
    }

    /// Whether this section is a reflected copy
    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// Spanwise position, once meshed
    pub fn bpos(&self) -> Option<f64> {
        self.bpos
    }

    /// Twisted chord vector, leading edge to trailing edge, for a sheet with
    /// normal axis `dirz`
    pub fn chord_vector(&self, dirz: &Vec3) -> Vec3 {
        twisted_chord(self.chord, self.twist, dirz)
    }
}

/// Chord vector of length `chord` rotated nose up by `twist` degrees
pub(crate) fn twisted_chord(chord: f64, twist: f64, dirz: &Vec3) -> Vec3 {
    let (s, c) = twist.to_radians().sin_cos();
    (math::ihat() * c - dirz * s) * chord
}

impl Default for Section {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}
