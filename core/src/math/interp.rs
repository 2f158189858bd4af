use ::interp::{interp_slice, InterpMode};

use crate::prelude::{ensure_aligned, StageError, StageResult};

/// Piecewise-linear resampling of `(xp, fp)` onto `x`.
///
/// Points outside the tabulated range take the nearest end value. `xp` must
/// be ascending.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> StageResult<Vec<f64>> {
    ensure_aligned("interpolation table", xp.len(), fp.len())?;
    if xp.is_empty() {
        return Err(StageError::InvalidInput(
            "cannot interpolate from an empty table".into(),
        ));
    }
    if xp.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(StageError::InvalidInput(
            "interpolation grid must be ascending".into(),
        ));
    }
    if xp.len() == 1 {
        return Ok(vec![fp[0]; x.len()]);
    }

    Ok(interp_slice(xp, fp, x, &InterpMode::FirstLast))
}
