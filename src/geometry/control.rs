//! Control surface hinge definition and panel membership

use serde::{Deserialize, Serialize};

use crate::error::{VlmError, VlmResult};
use crate::math::{self, Vec3};

fn unit_gain() -> f64 {
    1.0
}

/// A control surface hinged at a chordwise fraction of the local chord.
///
/// Each sheet owns its own copy of every control inherited from its defining
/// section; the copies share the control name and carry their own hinge axis
/// and panel membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    /// Hinge position as a fraction of the local chord (0 = leading edge)
    pub xhinge: f64,
    /// Effectiveness per unit positive deflection
    #[serde(default = "unit_gain")]
    pub posgain: f64,
    /// Effectiveness per unit negative deflection
    #[serde(default = "unit_gain")]
    pub neggain: f64,
    /// Deflect antisymmetrically on the mirrored copy (ailerons)
    #[serde(default)]
    pub reverse: bool,
    /// Hinge axis, derived from the bounding sections when not given
    #[serde(default)]
    pub hinge_vector: Option<Vec3>,

    /// Whether this copy lives on a mirrored sheet
    #[serde(skip)]
    pub(crate) mirror: bool,

    /// Global ids of the panels rotated by this control
    #[serde(skip)]
    pub(crate) panels: Vec<usize>,
}

impl Control {
    /// Create a control hinged at `xhinge` with unit gains
    pub fn new(xhinge: f64) -> Self {
        Self {
            xhinge,
            posgain: 1.0,
            neggain: 1.0,
            reverse: false,
            hinge_vector: None,
            mirror: false,
            panels: Vec::new(),
        }
    }

    /// Set the positive and negative deflection gains
    pub fn with_gains(mut self, posgain: f64, neggain: f64) -> Self {
        self.posgain = posgain;
        self.neggain = neggain;
        self
    }

    /// Mark the control as deflecting antisymmetrically when mirrored
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Give the hinge axis explicitly instead of deriving it from the sections
    pub fn with_hinge_vector(mut self, x: f64, y: f64, z: f64) -> Self {
        self.hinge_vector = Some(Vec3::new(x, y, z));
        self
    }

    /// Check the definition is usable
    pub fn validate(&self, name: &str) -> VlmResult<()> {
        if !(0.0..=1.0).contains(&self.xhinge) {
            return Err(VlmError::InvalidControl(
                name.to_string(),
                format!("hinge fraction {} outside [0, 1]", self.xhinge),
            ));
        }
        if !self.posgain.is_finite() || !self.neggain.is_finite() {
            return Err(VlmError::InvalidControl(
                name.to_string(),
                "gains must be finite".to_string(),
            ));
        }
        if let Some(vector) = self.hinge_vector {
            if !(vector.norm() > 0.0) {
                return Err(VlmError::InvalidControl(
                    name.to_string(),
                    "hinge vector has zero length".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Copy this control for a new sheet.
    ///
    /// A mirrored copy reflects an explicit hinge vector through the symmetry
    /// plane, and a reversing control swaps and negates its gains. Panel
    /// membership is not copied.
    pub fn duplicate(&self, mirror: bool) -> Self {
        let (posgain, neggain) = if mirror && self.reverse {
            (-self.neggain, -self.posgain)
        } else {
            (self.posgain, self.neggain)
        };
        let hinge_vector = match (mirror, self.hinge_vector) {
            (true, Some(vector)) => Some(math::mirror_y(&vector)),
            (_, vector) => vector,
        };
        Self {
            xhinge: self.xhinge,
            posgain,
            neggain,
            reverse: self.reverse,
            hinge_vector,
            mirror,
            panels: Vec::new(),
        }
    }

    /// Set the hinge axis
    pub fn set_hinge_vector(&mut self, vector: Vec3) {
        self.hinge_vector = Some(vector);
    }

    /// Unit hinge axis, if known
    pub fn hinge_axis(&self) -> Option<Vec3> {
        self.hinge_vector
            .and_then(|v| v.try_normalize(f64::EPSILON))
    }

    /// Add a panel to the set rotated by this control
    pub fn add_panel(&mut self, panel_id: usize) {
        if !self.panels.contains(&panel_id) {
            self.panels.push(panel_id);
        }
    }

    /// Global ids of the member panels
    pub fn panels(&self) -> &[usize] {
        &self.panels
    }

    /// Whether this copy lives on a mirrored sheet
    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// Gain applied for a deflection of the given sign
    pub fn gain(&self, deflection: f64) -> f64 {
        if deflection < 0.0 {
            self.neggain
        } else {
            self.posgain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_plain() {
        let ctrl = Control::new(0.75).with_gains(1.0, 0.8);
        let copy = ctrl.duplicate(false);
        assert_eq!(copy.xhinge, 0.75);
        assert_eq!(copy.posgain, 1.0);
        assert_eq!(copy.neggain, 0.8);
        assert!(copy.hinge_vector.is_none());
        assert!(!copy.is_mirror());
    }

    #[test]
    fn test_duplicate_mirrored_reversing() {
        let ctrl = Control::new(0.8)
            .with_gains(1.0, 0.5)
            .reversed()
            .with_hinge_vector(0.1, 1.0, 0.0);
        let copy = ctrl.duplicate(true);
        assert_eq!(copy.posgain, -0.5);
        assert_eq!(copy.neggain, -1.0);
        assert_eq!(copy.hinge_vector, Some(Vec3::new(0.1, -1.0, 0.0)));
        assert!(copy.is_mirror());
    }

    #[test]
    fn test_duplicate_mirrored_symmetric_keeps_gains() {
        let copy = Control::new(0.7).with_gains(1.0, 0.5).duplicate(true);
        assert_eq!(copy.posgain, 1.0);
        assert_eq!(copy.neggain, 0.5);
    }

    #[test]
    fn test_gain_by_sign() {
        let ctrl = Control::new(0.7).with_gains(0.9, 0.6);
        assert_eq!(ctrl.gain(5.0), 0.9);
        assert_eq!(ctrl.gain(0.0), 0.9);
        assert_eq!(ctrl.gain(-5.0), 0.6);
    }

    #[test]
    fn test_validate() {
        assert!(Control::new(1.2).validate("flap").is_err());
        assert!(Control::new(0.7)
            .with_hinge_vector(0.0, 0.0, 0.0)
            .validate("flap")
            .is_err());
        assert!(Control::new(0.7).validate("flap").is_ok());
    }

    #[test]
    fn test_add_panel_once() {
        let mut ctrl = Control::new(0.7);
        ctrl.add_panel(3);
        ctrl.add_panel(3);
        ctrl.add_panel(4);
        assert_eq!(ctrl.panels(), &[3, 4]);
    }
}
