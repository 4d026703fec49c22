//! Mathematical utilities for lattice calculations

pub mod vortex;

use nalgebra::{DMatrix, DVector, Dyn, Vector3};
use nalgebra::linalg::LU;

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Vec3 = Vector3<f64>;

/// Dense LU factorization of a square dynamic matrix
pub type Factorization = LU<f64, Dyn, Dyn>;

/// Unit vector along global X (chordwise, pointing downstream)
pub fn ihat() -> Vec3 {
    Vec3::x()
}

/// Rotate `v` about the unit vector `axis` by `angle` radians (Rodrigues' formula)
pub fn rotate_about_axis(v: &Vec3, axis: &Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    v * c + axis.cross(v) * s + axis * (axis.dot(v) * (1.0 - c))
}

/// Reflect a vector through the XZ symmetry plane
pub fn mirror_y(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, -v.y, v.z)
}

/// Linear interpolation between `a` and `b` at fraction `t`
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Solve a linear system using LU decomposition
pub fn solve_linear_system(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().lu().solve(b)
}

/// Ratio of the smallest to the largest absolute pivot of an LU factorization.
///
/// Returns 0.0 for an empty or exactly singular factor.
pub fn pivot_ratio(lu: &Factorization) -> f64 {
    let u = lu.u();
    let diag = u.diagonal();
    let max = diag.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    let min = diag.iter().fold(f64::INFINITY, |acc, x| acc.min(x.abs()));
    if max == 0.0 || !min.is_finite() {
        0.0
    } else {
        min / max
    }
}

/// Minimum-norm least squares solution of `a * x = b`.
///
/// Equivalent to `(AᵗA)⁻¹ Aᵗ b` whenever `AᵗA` is invertible, and still well
/// defined when some columns of `a` vanish.
pub fn solve_least_squares(a: &Mat, b: &Vec) -> Option<Vec> {
    let svd = a.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().fold(0.0_f64, |acc, x| acc.max(*x));
    let eps = (max_sv * 1e-12).max(f64::MIN_POSITIVE);
    svd.solve(b, eps).ok()
}
