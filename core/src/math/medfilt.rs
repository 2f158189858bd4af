use ndarray::Array1;
use scirs2_ndimage::{filters, BorderMode};

use crate::prelude::{StageError, StageResult};

/// Sliding-window median with edges padded by the nearest boundary value.
///
/// `window` must be odd; the output is index-aligned with `values`.
pub fn median_filter(values: &[f64], window: usize) -> StageResult<Vec<f64>> {
    median_filter_with(values, window, BorderMode::Nearest)
}

/// Sliding-window median with an explicit edge padding mode.
pub fn median_filter_with(
    values: &[f64],
    window: usize,
    border: BorderMode,
) -> StageResult<Vec<f64>> {
    if window == 0 || window % 2 == 0 {
        return Err(StageError::InvalidArgument(format!(
            "median window must be a positive odd width, got {}",
            window
        )));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let input = Array1::from(values.to_vec());
    let smoothed = filters::median_filter(&input, &[window], Some(border))
        .map_err(|err| StageError::Internal(format!("median filter failed: {}", err)))?;
    Ok(smoothed.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_one_is_identity() {
        let values = vec![3.0, -1.0, 7.5];
        assert_eq!(median_filter(&values, 1).unwrap(), values);
    }

    #[test]
    fn suppresses_single_channel_spikes() {
        let values = [1.0, 1.0, 50.0, 1.0, 1.0];
        assert_eq!(median_filter(&values, 3).unwrap(), vec![1.0; 5]);
    }

    #[test]
    fn edges_clamp_to_boundary_values() {
        // Window at index 0 sees [1, 1, 1, 2, 3].
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(
            median_filter(&values, 5).unwrap(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0]
        );
        let values = [9.0, 0.0, 0.0];
        assert_eq!(median_filter(&values, 3).unwrap(), vec![9.0, 0.0, 0.0]);
    }

    #[test]
    fn reflected_edges_differ_from_clamped() {
        // Reflection puts 2 ahead of the first sample, so the first two
        // windows both centre on 2.
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let reflected = median_filter_with(&values, 5, BorderMode::Reflect).unwrap();
        assert_eq!(reflected[0], 2.0);
        assert_eq!(reflected[1], 2.0);
        assert_eq!(reflected[2], 3.0);
        assert_eq!(median_filter(&values, 5).unwrap()[0], 1.0);
    }

    #[test]
    fn even_or_zero_window_is_rejected() {
        assert!(matches!(
            median_filter(&[1.0, 2.0], 4),
            Err(StageError::InvalidArgument(_))
        ));
        assert!(median_filter(&[1.0], 0).is_err());
        assert!(median_filter_with(&[1.0], 2, BorderMode::Reflect).is_err());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(median_filter(&[], 31).unwrap().is_empty());
    }
}
