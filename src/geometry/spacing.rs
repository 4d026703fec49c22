//! Spacing distributions used to subdivide sheets spanwise and strips chordwise

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{VlmError, VlmResult};

/// One `(start, mid, end)` subdivision of the unit interval
pub type SpacingTriple = [f64; 3];

/// Tolerance on interval ends and contiguity between triples
const SPACING_TOLERANCE: f64 = 1e-9;

/// Rule used to place subdivision boundaries along a unit interval
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spacing {
    /// Uniform subdivisions
    #[default]
    Equal,
    /// Full cosine clustering towards both ends
    Cosine,
    /// Half cosine clustering towards the far end (tips, trailing edges)
    SemiCosine,
    /// User supplied triples, validated on use
    Explicit(Vec<SpacingTriple>),
}

impl Spacing {
    /// Produce `num` validated triples covering `[0, 1]`.
    ///
    /// `num` is ignored for [`Spacing::Explicit`].
    pub fn distribution(&self, num: usize) -> VlmResult<Vec<SpacingTriple>> {
        let triples = match self {
            Spacing::Explicit(triples) => triples.clone(),
            _ => {
                if num == 0 {
                    return Err(VlmError::InvalidSpacing(
                        "number of subdivisions must be at least 1".to_string(),
                    ));
                }
                let n = num as f64;
                (0..num)
                    .map(|i| {
                        let t0 = i as f64 / n;
                        let t1 = (i + 1) as f64 / n;
                        let tm = 0.5 * (t0 + t1);
                        [self.map(t0), self.map(tm), self.map(t1)]
                    })
                    .collect()
            }
        };
        validate_spacing(&triples)?;
        Ok(triples)
    }

    fn map(&self, t: f64) -> f64 {
        match self {
            Spacing::Equal | Spacing::Explicit(_) => t,
            Spacing::Cosine => 0.5 * (1.0 - (PI * t).cos()),
            Spacing::SemiCosine => (FRAC_PI_2 * t).sin(),
        }
    }
}

/// Check that triples are monotonic, lie in `[0, 1]`, and partition it contiguously
pub fn validate_spacing(triples: &[SpacingTriple]) -> VlmResult<()> {
    let (first, last) = match (triples.first(), triples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(VlmError::InvalidSpacing(
                "distribution has no subdivisions".to_string(),
            ))
        }
    };

    for (i, &[a, m, b]) in triples.iter().enumerate() {
        if !(a.is_finite() && m.is_finite() && b.is_finite()) {
            return Err(VlmError::InvalidSpacing(format!(
                "triple {} is not finite",
                i
            )));
        }
        if a < -SPACING_TOLERANCE || b > 1.0 + SPACING_TOLERANCE {
            return Err(VlmError::InvalidSpacing(format!(
                "triple {} ({}, {}, {}) lies outside [0, 1]",
                i, a, m, b
            )));
        }
        if !(a < m && m < b) {
            return Err(VlmError::InvalidSpacing(format!(
                "triple {} ({}, {}, {}) is not strictly increasing",
                i, a, m, b
            )));
        }
    }

    if first[0].abs() > SPACING_TOLERANCE {
        return Err(VlmError::InvalidSpacing(format!(
            "distribution starts at {} instead of 0",
            first[0]
        )));
    }
    if (last[2] - 1.0).abs() > SPACING_TOLERANCE {
        return Err(VlmError::InvalidSpacing(format!(
            "distribution ends at {} instead of 1",
            last[2]
        )));
    }

    for (i, pair) in triples.windows(2).enumerate() {
        if (pair[0][2] - pair[1][0]).abs() > SPACING_TOLERANCE {
            return Err(VlmError::InvalidSpacing(format!(
                "gap between triples {} and {}",
                i,
                i + 1
            )));
        }
    }

    Ok(())
}

/// Reverse-complement a distribution so it runs the other way along a reflected sheet.
///
/// Each `(a, m, b)` becomes `(1-b, 1-m, 1-a)` and the triple order is reversed.
pub fn mirror_spacing(triples: &[SpacingTriple]) -> Vec<SpacingTriple> {
    triples
        .iter()
        .rev()
        .map(|&[a, m, b]| [1.0 - b, 1.0 - m, 1.0 - a])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_equal_distribution() {
        let triples = Spacing::Equal.distribution(4).unwrap();
        assert_eq!(triples.len(), 4);
        assert_relative_eq!(triples[1][0], 0.25);
        assert_relative_eq!(triples[1][1], 0.375);
        assert_relative_eq!(triples[3][2], 1.0);
    }

    #[test]
    fn test_cosine_clusters_at_ends() {
        let triples = Spacing::Cosine.distribution(10).unwrap();
        let first = triples[0][2] - triples[0][0];
        let middle = triples[5][2] - triples[5][0];
        assert!(first < middle);
        assert_eq!(triples[9][2], 1.0);
    }

    #[test]
    fn test_semi_cosine_clusters_at_far_end() {
        let triples = Spacing::SemiCosine.distribution(8).unwrap();
        let first = triples[0][2] - triples[0][0];
        let last = triples[7][2] - triples[7][0];
        assert!(last < first);
    }

    #[test]
    fn test_mirror_twice_is_identity() {
        let triples = Spacing::SemiCosine.distribution(7).unwrap();
        let twice = mirror_spacing(&mirror_spacing(&triples));
        for (a, b) in triples.iter().zip(twice.iter()) {
            for k in 0..3 {
                assert_relative_eq!(a[k], b[k], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_mirror_preserves_monotonic_progression() {
        let triples = vec![[0.0, 0.1, 0.2], [0.2, 0.5, 1.0]];
        let mirrored = mirror_spacing(&triples);
        assert!(validate_spacing(&mirrored).is_ok());
        assert_relative_eq!(mirrored[0][2], 0.8);
        assert_relative_eq!(mirrored[1][1], 0.9);
    }

    #[test]
    fn test_rejects_non_monotonic() {
        let result = Spacing::Explicit(vec![[0.0, 0.6, 0.5], [0.5, 0.7, 1.0]]).distribution(0);
        assert!(matches!(result, Err(VlmError::InvalidSpacing(_))));
    }

    #[test]
    fn test_rejects_gap_and_range() {
        assert!(validate_spacing(&[[0.0, 0.2, 0.4], [0.5, 0.7, 1.0]]).is_err());
        assert!(validate_spacing(&[[0.0, 0.5, 1.2]]).is_err());
        assert!(validate_spacing(&[[0.1, 0.5, 1.0]]).is_err());
        assert!(validate_spacing(&[]).is_err());
    }

    #[test]
    fn test_zero_subdivisions_rejected() {
        assert!(Spacing::Cosine.distribution(0).is_err());
    }
}
