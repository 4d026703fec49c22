//! Surface - a named lifting surface built from an ordered list of sections

use serde::{Deserialize, Serialize};

use super::panel::Panel;
use super::section::Section;
use super::sheet::Sheet;
use super::spacing::{Spacing, SpacingTriple};
use super::strip::Strip;
use crate::error::{VlmError, VlmResult};

/// Sections closer than this to the symmetry plane are not duplicated when mirroring
const SYMMETRY_TOLERANCE: f64 = 1e-9;

fn one() -> usize {
    1
}

/// Next free global ids while meshing several surfaces in sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshIds {
    pub sheet: usize,
    pub strip: usize,
    pub panel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    /// Unique surface name
    pub name: String,
    /// Reflect the surface through the XZ plane
    #[serde(default)]
    pub mirror: bool,
    /// Number of chordwise panels per strip
    #[serde(default = "one")]
    pub cnum: usize,
    /// Chordwise spacing
    #[serde(default)]
    pub cspc: Spacing,
    /// Sections ordered root to tip
    pub sections: Vec<Section>,

    /// Meshed sheets, ordered along the span
    #[serde(skip)]
    pub(crate) sheets: Vec<Sheet>,
}

impl Surface {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mirror: false,
            cnum: 1,
            cspc: Spacing::Equal,
            sections: Vec::new(),
            sheets: Vec::new(),
        }
    }

    /// Reflect the surface through the XZ plane
    pub fn mirrored(mut self) -> Self {
        self.mirror = true;
        self
    }

    /// Set the chordwise panel count and spacing
    pub fn with_chordwise(mut self, cnum: usize, cspc: Spacing) -> Self {
        self.cnum = cnum;
        self.cspc = cspc;
        self
    }

    /// Append a section outboard of the existing ones
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
        self.sheets.clear();
    }

    /// Check the surface is usable for meshing
    pub fn validate(&self) -> VlmResult<()> {
        if self.name.trim().is_empty() {
            return Err(VlmError::InvalidGeometry(
                "surface name must not be empty".to_string(),
            ));
        }
        if self.sections.len() < 2 {
            return Err(VlmError::InvalidGeometry(format!(
                "surface '{}' needs at least 2 sections, has {}",
                self.name,
                self.sections.len()
            )));
        }
        for section in &self.sections {
            section.validate()?;
        }
        self.chord_stations()?;
        if self.mirror {
            if let Some(section) = self
                .sections
                .iter()
                .find(|s| s.point.y < -SYMMETRY_TOLERANCE)
            {
                return Err(VlmError::InvalidGeometry(format!(
                    "mirrored surface '{}' has a section at y = {}",
                    self.name, section.point.y
                )));
            }
        }
        Ok(())
    }

    /// Chordwise subdivision shared by every strip
    pub fn chord_stations(&self) -> VlmResult<Vec<SpacingTriple>> {
        self.cspc.distribution(self.cnum)
    }

    /// Sheets in spanwise order, including the reflected half when mirrored
    fn build_sheets(&self) -> VlmResult<Vec<Sheet>> {
        let defined = self
            .sections
            .windows(2)
            .map(|pair| Sheet::new(pair[0].clone(), pair[1].clone()))
            .collect::<VlmResult<Vec<Sheet>>>()?;

        if !self.mirror {
            return Ok(defined);
        }

        let mut sheets = defined
            .iter()
            .rev()
            .map(Sheet::mirrored)
            .collect::<VlmResult<Vec<Sheet>>>()?;

        let root = &self.sections[0];
        if root.point.y.abs() > SYMMETRY_TOLERANCE {
            sheets.push(Sheet::new(root.mirrored(), root.clone())?);
        }
        sheets.extend(defined);
        Ok(sheets)
    }

    /// Build sheets, strips and panels, assigning global ids from `ids`
    pub fn mesh(&mut self, ids: &mut MeshIds) -> VlmResult<()> {
        self.validate()?;
        let stations = self.chord_stations()?;
        let mut sheets = self.build_sheets()?;

        let total_width: f64 = sheets.iter().map(|s| s.width).sum();
        let mut bpos = if self.mirror { -0.5 * total_width } else { 0.0 };

        for sheet in sheets.iter_mut() {
            sheet.id = ids.sheet;
            ids.sheet += 1;

            sheet.sect1.bpos = Some(bpos);
            bpos += sheet.width;
            sheet.sect2.bpos = Some(bpos);

            ids.strip = sheet.mesh_strips(ids.strip);
            ids.panel = sheet.mesh_panels(ids.panel, &stations);
            sheet.inherit_panels();
            sheet.set_control_panels();
            sheet.set_strip_bpos();
        }

        log::debug!(
            "Meshed surface '{}': {} sheets, {} strips, {} panels",
            self.name,
            sheets.len(),
            sheets.iter().map(|s| s.strips.len()).sum::<usize>(),
            sheets.iter().map(|s| s.panels().count()).sum::<usize>()
        );

        self.sheets = sheets;
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn strips(&self) -> impl Iterator<Item = &Strip> {
        self.sheets.iter().flat_map(|sheet| sheet.strips.iter())
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.sheets.iter().flat_map(|sheet| sheet.panels())
    }

    /// Planform area of the meshed surface
    pub fn area(&self) -> f64 {
        self.sheets.iter().map(|s| s.area).sum()
    }

    /// Total width along the sheets' spanwise axes
    pub fn span(&self) -> f64 {
        self.sheets.iter().map(|s| s.width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wing(mirror: bool) -> Surface {
        let surface = Surface::new("Wing")
            .with_chordwise(3, Spacing::Equal)
            .with_section(Section::new(0.0, 0.0, 0.0, 1.0).with_spacing(4, Spacing::Equal))
            .with_section(Section::new(0.0, 2.0, 0.0, 1.0).with_spacing(2, Spacing::Equal))
            .with_section(Section::new(0.2, 3.0, 0.0, 0.6));
        if mirror {
            surface.mirrored()
        } else {
            surface
        }
    }

    #[test]
    fn test_mesh_counts_and_ids() {
        let mut surface = wing(false);
        let mut ids = MeshIds::default();
        surface.mesh(&mut ids).unwrap();
        assert_eq!(surface.sheets().len(), 2);
        assert_eq!(ids, MeshIds { sheet: 2, strip: 6, panel: 18 });
        let panel_ids: Vec<usize> = surface.panels().map(|p| p.id).collect();
        assert_eq!(panel_ids, (0..18).collect::<Vec<usize>>());
        assert_relative_eq!(surface.span(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_keeps_root_single() {
        let mut surface = wing(true);
        let mut ids = MeshIds { sheet: 1, strip: 10, panel: 100 };
        surface.mesh(&mut ids).unwrap();
        assert_eq!(surface.sheets().len(), 4);
        assert_eq!(ids.strip, 22);
        assert_eq!(surface.sheets()[0].id, 1);
        assert!(surface.sheets()[0].mirror);
        assert!(!surface.sheets()[3].mirror);

        // Reflected strips mirror their counterparts about the symmetry plane
        let strips: Vec<&Strip> = surface.strips().collect();
        for (left, right) in strips.iter().zip(strips.iter().rev()) {
            assert_relative_eq!(left.mid.point.y, -right.mid.point.y, epsilon = 1e-12);
            assert_relative_eq!(left.bpos, -right.bpos, epsilon = 1e-12);
            assert_relative_eq!(left.width, right.width, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mirror_with_offset_root_adds_centre_sheet() {
        let mut surface = Surface::new("Tail")
            .mirrored()
            .with_section(Section::new(4.0, 0.5, 0.0, 0.5))
            .with_section(Section::new(4.2, 1.5, 0.0, 0.3));
        surface.mesh(&mut MeshIds::default()).unwrap();
        assert_eq!(surface.sheets().len(), 3);
        assert_relative_eq!(surface.sheets()[1].width, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_rejects_negative_sections() {
        let surface = Surface::new("Bad")
            .mirrored()
            .with_section(Section::new(0.0, -1.0, 0.0, 1.0))
            .with_section(Section::new(0.0, 1.0, 0.0, 1.0));
        assert!(matches!(surface.validate(), Err(VlmError::InvalidGeometry(_))));
    }

    #[test]
    fn test_single_section_rejected() {
        let surface = Surface::new("Stub").with_section(Section::default());
        assert!(surface.validate().is_err());
    }
}
