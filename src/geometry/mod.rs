//! Lattice geometry: sections, sheets, strips and panels

pub mod airfoil;
pub mod control;
pub mod panel;
pub mod section;
pub mod sheet;
pub mod spacing;
pub mod strip;
pub mod surface;

pub use airfoil::Airfoil;
pub use control::Control;
pub use panel::{ChordStation, Panel};
pub use section::Section;
pub use sheet::{Sheet, SheetFrame};
pub use spacing::{Spacing, SpacingTriple};
pub use strip::{ChordLine, Strip};
pub use surface::{MeshIds, Surface};
