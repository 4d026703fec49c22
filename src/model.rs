//! Lattice Model - the mutable geometry description

use serde::{Deserialize, Serialize};

use crate::error::{VlmError, VlmResult};
use crate::geometry::{MeshIds, Surface};
use crate::math::Vec3;
use crate::system::{LatticeSystem, References};

/// A set of lifting surfaces plus optional reference geometry.
///
/// Editing the model never touches a previously built [`LatticeSystem`];
/// call [`LatticeModel::build`] again to get a system for the new geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeModel {
    /// Model name
    pub name: String,
    /// Lifting surfaces in build order
    #[serde(default)]
    pub surfaces: Vec<Surface>,
    /// Reference span
    #[serde(default)]
    pub bref: Option<f64>,
    /// Reference chord
    #[serde(default)]
    pub cref: Option<f64>,
    /// Reference area
    #[serde(default)]
    pub sref: Option<f64>,
    /// Moment reference point (centre of gravity)
    #[serde(default)]
    pub rref: Option<Vec3>,
}

impl LatticeModel {
    /// Create a new empty model
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            surfaces: Vec::new(),
            bref: None,
            cref: None,
            sref: None,
            rref: None,
        }
    }

    /// Parse a model from its JSON description
    pub fn from_json_str(json: &str) -> VlmResult<Self> {
        let model: LatticeModel = serde_json::from_str(json)?;
        let mut names: Vec<&str> = Vec::new();
        for surface in &model.surfaces {
            if names.contains(&surface.name.as_str()) {
                return Err(VlmError::DuplicateName(surface.name.clone()));
            }
            names.push(&surface.name);
        }
        Ok(model)
    }

    /// Serialize the model description to JSON
    pub fn to_json_string(&self) -> VlmResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a surface to the model
    pub fn add_surface(&mut self, surface: Surface) -> VlmResult<()> {
        if self.surfaces.iter().any(|s| s.name == surface.name) {
            return Err(VlmError::DuplicateName(surface.name));
        }
        surface.validate()?;
        self.surfaces.push(surface);
        Ok(())
    }

    /// Mutable access to a surface for editing
    pub fn surface_mut(&mut self, name: &str) -> VlmResult<&mut Surface> {
        self.surfaces
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| VlmError::SurfaceNotFound(name.to_string()))
    }

    /// Set the reference span, chord and area
    pub fn set_reference(&mut self, bref: f64, cref: f64, sref: f64) -> VlmResult<()> {
        for (label, value) in [("bref", bref), ("cref", cref), ("sref", sref)] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(VlmError::InvalidInput(format!(
                    "{} must be positive, got {}",
                    label, value
                )));
            }
        }
        self.bref = Some(bref);
        self.cref = Some(cref);
        self.sref = Some(sref);
        Ok(())
    }

    /// Set the moment reference point
    pub fn set_cg(&mut self, x: f64, y: f64, z: f64) {
        self.rref = Some(Vec3::new(x, y, z));
    }

    // ========================
    // Build
    // ========================

    /// Mesh every surface, assemble and factorize the influence matrix
    pub fn build(&self) -> VlmResult<LatticeSystem> {
        if self.surfaces.is_empty() {
            return Err(VlmError::EmptyModel);
        }

        let mut ids = MeshIds::default();
        let mut surfaces = self.surfaces.clone();
        for surface in surfaces.iter_mut() {
            surface.mesh(&mut ids)?;
        }

        let references = References::resolve(
            &surfaces,
            self.bref,
            self.cref,
            self.sref,
            self.rref,
        )?;

        LatticeSystem::assemble(&self.name, surfaces, references)
    }
}
