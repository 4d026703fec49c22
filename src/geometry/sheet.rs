//! Sheet - the planar patch between two consecutive sections

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::control::Control;
use super::panel::Panel;
use super::section::{twisted_chord, Section};
use super::spacing::{mirror_spacing, SpacingTriple};
use super::strip::{ChordLine, Strip};
use crate::error::{VlmError, VlmResult};
use crate::math::{self, Vec3};

/// Local axes of a sheet: X chordwise, Y along the leading edge projected
/// normal to X, Z completing the right-handed set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetFrame {
    pub origin: Vec3,
    pub dirx: Vec3,
    pub diry: Vec3,
    pub dirz: Vec3,
}

impl Default for SheetFrame {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            dirx: Vec3::x(),
            diry: Vec3::y(),
            dirz: Vec3::z(),
        }
    }
}

/// The patch between two sections. Spacing, flags and controls are inherited
/// from `sect1`, or from `sect2` on a mirrored sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Global sheet id
    pub id: usize,
    pub sect1: Section,
    pub sect2: Section,
    pub mirror: bool,
    pub ruled: bool,
    pub noload: bool,
    /// Spanwise spacing, running from `sect1` to `sect2`
    pub bspc: Vec<SpacingTriple>,
    /// This sheet's own copies of its controls
    pub controls: BTreeMap<String, Control>,
    pub frame: SheetFrame,
    pub width: f64,
    pub area: f64,
    pub strips: Vec<Strip>,
    /// Global ids of every panel on the sheet, in strip order
    pub panel_ids: Vec<usize>,
}

impl Sheet {
    /// Create a sheet between two sections and derive its inherited properties
    pub fn new(sect1: Section, sect2: Section) -> VlmResult<Self> {
        let mut sheet = Self {
            id: 0,
            sect1,
            sect2,
            mirror: false,
            ruled: false,
            noload: false,
            bspc: Vec::new(),
            controls: BTreeMap::new(),
            frame: SheetFrame::default(),
            width: 0.0,
            area: 0.0,
            strips: Vec::new(),
            panel_ids: Vec::new(),
        };
        sheet.update()?;
        Ok(sheet)
    }

    /// Reflection of this sheet through the XZ plane
    pub fn mirrored(&self) -> VlmResult<Self> {
        Sheet::new(self.sect2.mirrored(), self.sect1.mirrored())
    }

    /// Recompute the frame and inherited properties, discarding any mesh
    pub fn update(&mut self) -> VlmResult<()> {
        self.mirror = self.sect1.is_mirror() || self.sect2.is_mirror();
        self.set_frame()?;
        self.inherit_ruled();
        self.inherit_noload();
        self.inherit_spacing()?;
        self.inherit_controls();
        self.strips.clear();
        self.panel_ids.clear();
        Ok(())
    }

    fn source(&self) -> &Section {
        if self.mirror {
            &self.sect2
        } else {
            &self.sect1
        }
    }

    fn set_frame(&mut self) -> VlmResult<()> {
        let levec = self.sect2.point - self.sect1.point;
        let dirz = math::ihat()
            .cross(&levec)
            .try_normalize(1e-12 * levec.norm().max(1.0))
            .ok_or_else(|| {
                VlmError::InvalidGeometry(format!(
                    "sections at {:?} and {:?} have no spanwise separation",
                    self.sect1.point, self.sect2.point
                ))
            })?;
        let diry = dirz.cross(&math::ihat());

        self.frame = SheetFrame {
            origin: self.sect1.point,
            dirx: math::ihat(),
            diry,
            dirz,
        };
        self.width = levec.dot(&diry);
        self.area = self.width * 0.5 * (self.sect1.chord + self.sect2.chord);
        Ok(())
    }

    fn inherit_ruled(&mut self) {
        self.ruled = self.source().ruled;
    }

    fn inherit_noload(&mut self) {
        self.noload = self.source().noload;
    }

    fn inherit_spacing(&mut self) -> VlmResult<()> {
        let spacing = self.source().spacing()?;
        self.bspc = if self.mirror {
            mirror_spacing(&spacing)
        } else {
            spacing
        };
        Ok(())
    }

    fn inherit_controls(&mut self) {
        let dirz = self.frame.dirz;
        let mut controls = BTreeMap::new();
        for (name, control) in &self.source().controls {
            let mut copy = control.duplicate(self.mirror);
            if copy.hinge_vector.is_none() {
                let hinge1 = self.sect1.point + self.sect1.chord_vector(&dirz) * copy.xhinge;
                let hinge2 = self.sect2.point + self.sect2.chord_vector(&dirz) * copy.xhinge;
                copy.set_hinge_vector(hinge2 - hinge1);
            }
            controls.insert(name.clone(), copy);
        }
        self.controls = controls;
    }

    /// Leading edge point and chord line at spanwise fraction `t`
    pub fn chord_line(&self, t: f64) -> ChordLine {
        let dirz = self.frame.dirz;
        let point = self.sect1.point + (self.sect2.point - self.sect1.point) * t;
        let chord = math::lerp(self.sect1.chord, self.sect2.chord, t);
        let twist = if self.ruled {
            // Twist of the straight line joining the two trailing edge offsets
            let v1 = self.sect1.chord_vector(&dirz);
            let v2 = self.sect2.chord_vector(&dirz);
            let offset = v1 + (v2 - v1) * t;
            (-offset.dot(&dirz)).atan2(offset.x).to_degrees()
        } else {
            math::lerp(self.sect1.twist, self.sect2.twist, t)
        };
        ChordLine {
            point,
            chord,
            twist,
            vector: twisted_chord(chord, twist, &dirz),
        }
    }

    /// Build the strips of this sheet. Returns the next free strip id.
    pub fn mesh_strips(&mut self, start_id: usize) -> usize {
        let strips: Vec<Strip> = self
            .bspc
            .iter()
            .enumerate()
            .map(|(i, triple)| {
                let [a, m, b] = *triple;
                Strip {
                    id: start_id + i,
                    sheet: self.id,
                    edge1: self.chord_line(a),
                    edge2: self.chord_line(b),
                    mid: self.chord_line(m),
                    bspc: *triple,
                    bpos: self.width * m,
                    width: self.width * (b - a),
                    cdo: [
                        math::lerp(self.sect1.cdo, self.sect2.cdo, a),
                        math::lerp(self.sect1.cdo, self.sect2.cdo, b),
                    ],
                    mirror: self.mirror,
                    noload: self.noload,
                    span_axis: self.frame.diry,
                    normal_axis: self.frame.dirz,
                    airfoils: [self.sect1.airfoil, self.sect2.airfoil],
                    panels: Vec::new(),
                }
            })
            .collect();
        self.strips = strips;
        start_id + self.strips.len()
    }

    /// Subdivide every strip chordwise. Returns the next free panel id.
    pub fn mesh_panels(&mut self, start_id: usize, stations: &[SpacingTriple]) -> usize {
        self.strips
            .iter_mut()
            .fold(start_id, |next, strip| strip.mesh_panels(next, stations))
    }

    /// Collect the panel ids of every strip
    pub fn inherit_panels(&mut self) {
        self.panel_ids = self.panels().map(|panel| panel.id).collect();
    }

    /// Offset each strip's spanwise position by the spanwise position of `sect1`
    pub fn set_strip_bpos(&mut self) {
        let start = self.sect1.bpos().unwrap_or(0.0);
        for strip in self.strips.iter_mut() {
            strip.bpos = start + self.width * strip.bspc[1];
        }
    }

    /// Assign each panel to the control with the furthest aft hinge that is
    /// not aft of the panel's trailing edge station
    pub fn set_control_panels(&mut self) {
        for control in self.controls.values_mut() {
            control.panels.clear();
        }
        for strip in &self.strips {
            for panel in &strip.panels {
                let owner = self
                    .controls
                    .iter()
                    .filter(|(_, control)| panel.station.trailing >= control.xhinge)
                    .max_by(|a, b| a.1.xhinge.total_cmp(&b.1.xhinge))
                    .map(|(name, _)| name.clone());
                if let Some(control) = owner.and_then(|name| self.controls.get_mut(&name)) {
                    control.add_panel(panel.id);
                }
            }
        }
    }

    /// All panels of the sheet in strip order
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.strips.iter().flat_map(|strip| strip.panels.iter())
    }
}
