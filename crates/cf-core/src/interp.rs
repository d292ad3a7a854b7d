use crate::error::{CoreError, CoreResult};

/// Linearly interpolate the samples `(x, y)` onto the grid `xi`.
///
/// Used by the convergence checker to reconcile two iterations whose output
/// time grids legitimately differ: the current iteration's values are
/// interpolated onto the previous iteration's grid before comparison.
///
/// `x` must be strictly increasing and `xi` must lie within `[x[0], x[last]]`;
/// extrapolation is refused because a convergence verdict on extrapolated
/// values would be meaningless.
pub fn interp_onto(x: &[f64], y: &[f64], xi: &[f64]) -> CoreResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(CoreError::LengthMismatch {
            what: "interpolation samples",
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(CoreError::InvalidArg {
            what: "interpolation needs at least two samples",
        });
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CoreError::InvalidArg {
            what: "interpolation grid must be strictly increasing",
        });
    }

    let mut out = Vec::with_capacity(xi.len());
    for &q in xi {
        if q < x[0] || q > x[x.len() - 1] {
            return Err(CoreError::OutOfRange {
                what: "interpolation query",
                value: q,
            });
        }
        // partition_point gives the first sample > q, so the segment is
        // [hi - 1, hi].
        let hi = x.partition_point(|&v| v <= q).min(x.len() - 1).max(1);
        let lo = hi - 1;
        let frac = (q - x[lo]) / (x[hi] - x[lo]);
        out.push(y[lo] + frac * (y[hi] - y[lo]));
    }
    Ok(out)
}
