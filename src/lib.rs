//! VLM Solver - A native Rust vortex lattice library for finite wings
//!
//! Lifting surfaces are described by spanwise sections and meshed into a
//! lattice of horseshoe vortices, supporting:
//! - Mirrored surfaces, ruled sheets, camber and control surfaces
//! - Forces, moments and coefficients for any flight state
//! - Trefftz-plane induced drag and span loading
//! - Linearized trim to target coefficients
//! - Minimum induced drag loadings and the twist that produces them
//!
//! ## Example
//! ```rust
//! use vlm_solver::prelude::*;
//!
//! let mut model = LatticeModel::new("Glider");
//!
//! // A mirrored rectangular wing with a plain flap
//! model
//!     .add_surface(
//!         Surface::new("Wing")
//!             .mirrored()
//!             .with_chordwise(4, Spacing::Equal)
//!             .with_section(
//!                 Section::new(0.0, 0.0, 0.0, 1.0)
//!                     .with_spacing(8, Spacing::Cosine)
//!                     .with_control("flap", Control::new(0.7)),
//!             )
//!             .with_section(Section::new(0.0, 5.0, 0.0, 1.0)),
//!     )
//!     .unwrap();
//!
//! // Mesh and factorize once
//! let system = model.build().unwrap();
//!
//! // Solve a flight state
//! let mut result = LatticeResult::new("Cruise", &system).unwrap();
//! result.set_state(FlightState::new(4.0, 0.0)).unwrap();
//! let coefficients = result.coefficients();
//! assert!(coefficients.cl > 0.0);
//! ```

pub mod analysis;
pub mod error;
pub mod geometry;
pub mod math;
pub mod model;
pub mod results;
pub mod system;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        FlightState, GammaResult, IterationOptions, LatticeOptimum, LatticeResult, LatticeTrim,
        RecordKind, StripSelection, TrimReport, TwistReport,
    };
    pub use crate::error::{VlmError, VlmResult};
    pub use crate::geometry::{Airfoil, Control, Section, Spacing, Surface};
    pub use crate::model::LatticeModel;
    pub use crate::results::{
        Coefficients, PanelForce, StripCoefficients, StripForces, TrefftzStrip,
    };
    pub use crate::system::{LatticeSystem, References};
}
