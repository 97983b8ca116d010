//! Geometry primitives over landmark positions.
//!
//! Everything here is frame-local: all positions fed to one call must come
//! from the same pose snapshot.

use formcheck_models::Landmark;

use crate::error::{AnalysisError, AnalysisResult};

/// Slope magnitude at or above which a line is treated as vertical.
///
/// Near-vertical lines produce unstable huge slope values; anything at or
/// beyond this threshold maps to the symbolic [`Slope::Infinite`].
pub const DEFAULT_INF_THRESHOLD: f64 = 100.0;

/// Slope of a line between two landmarks: a finite value, or the symbolic
/// infinity used for vertical and near-vertical lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slope {
    Finite(f64),
    Infinite,
}

impl Slope {
    /// Absolute value; infinity is its own absolute value.
    pub fn abs(self) -> Slope {
        match self {
            Slope::Finite(m) => Slope::Finite(m.abs()),
            Slope::Infinite => Slope::Infinite,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Slope::Infinite)
    }
}

/// Euclidean magnitude of a 3D vector.
pub fn magnitude(v: (f64, f64, f64)) -> f64 {
    (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt()
}

/// Angle at `target` between the rays toward `adj1` and `adj2`, in radians.
///
/// Computed as `arccos((adj1-target)·(adj2-target) / (|adj1-target||adj2-target|))`.
/// A zero-magnitude difference vector means two landmarks collapsed onto the
/// same position; that is signaled as [`AnalysisError::DegenerateGeometry`]
/// rather than silently producing NaN.
pub fn angle(target: &Landmark, adj1: &Landmark, adj2: &Landmark) -> AnalysisResult<f64> {
    let t1 = (adj1.x - target.x, adj1.y - target.y, adj1.z - target.z);
    let t2 = (adj2.x - target.x, adj2.y - target.y, adj2.z - target.z);

    let mag1 = magnitude(t1);
    let mag2 = magnitude(t2);
    if mag1 == 0.0 || mag2 == 0.0 {
        return Err(AnalysisError::DegenerateGeometry);
    }

    let dot = t1.0 * t2.0 + t1.1 * t2.1 + t1.2 * t2.2;
    // Clamp against floating-point drift pushing the cosine out of [-1, 1].
    Ok((dot / (mag1 * mag2)).clamp(-1.0, 1.0).acos())
}

/// Slope of the image-plane line from `p1` to `p2`.
///
/// Vertical lines (`p2.x == p1.x`) and slopes whose magnitude reaches
/// `inf_threshold` map to [`Slope::Infinite`]; a finite result's magnitude is
/// always strictly below the threshold.
pub fn slope(p1: &Landmark, p2: &Landmark, inf_threshold: f64) -> Slope {
    if p2.x - p1.x == 0.0 {
        return Slope::Infinite;
    }
    let m = (p2.y - p1.y) / (p2.x - p1.x);
    if m.abs() >= inf_threshold {
        return Slope::Infinite;
    }
    Slope::Finite(m)
}

/// Symmetric percent difference between an actual and a desired value,
/// `|desired - actual| / ((desired + actual) / 2) * 100`.
///
/// Special cases, in evaluation order:
/// - desired is zero: returns `actual * 100` (the standard formula would pin
///   any deviation from a zero target at 200%; a zero target means any
///   deviation is proportionally large);
/// - both operands infinite: `0`, perfect agreement;
/// - actual infinite, desired finite: unconditional `+inf`;
/// - actual finite, desired infinite: the standard formula with
///   `inf_threshold` substituted for the infinite operand. An infinite
///   *target* slope is unattainable, so actual values are compared against
///   the threshold that declared infinity in the first place.
///
/// The asymmetry between the last two branches is deliberate; do not "fix" it.
pub fn percent_diff(actual: Slope, desired: Slope, inf_threshold: f64) -> f64 {
    if desired == Slope::Finite(0.0) {
        return match actual {
            Slope::Finite(a) => a * 100.0,
            Slope::Infinite => f64::INFINITY,
        };
    }
    match (actual, desired) {
        (Slope::Infinite, Slope::Infinite) => 0.0,
        (Slope::Infinite, Slope::Finite(_)) => f64::INFINITY,
        (Slope::Finite(a), Slope::Infinite) => {
            (a - inf_threshold).abs() / ((a + inf_threshold) / 2.0) * 100.0
        }
        (Slope::Finite(a), Slope::Finite(d)) => (d - a).abs() / ((d + a) / 2.0) * 100.0,
    }
}
