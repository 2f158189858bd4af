use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::math::{interp, median_filter, StatsHelper};
use crate::observation::FluxReference;
use crate::prelude::{ensure_aligned, StageError, StageResult};
use crate::telemetry::log::LogManager;

/// Per-channel flux-density scale derived from a calibrator observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFunction {
    /// Calibrator frequency grid in GHz.
    pub freqs: Vec<f64>,
    /// Expected flux density (Jy) on `freqs`.
    pub expected: Vec<f64>,
    /// Median-filtered calibrator antenna temperature.
    pub smoothed: Vec<f64>,
    /// `expected / smoothed`, Jy per unit antenna temperature.
    pub factors: Vec<f64>,
}

impl CalibrationFunction {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Factors resampled onto `target_freqs`, or copied when the grids match.
    pub fn factors_on(&self, target_freqs: &[f64]) -> StageResult<Vec<f64>> {
        if self.freqs.as_slice() == target_freqs {
            return Ok(self.factors.clone());
        }
        interp(target_freqs, &self.freqs, &self.factors)
    }
}

/// Derives the calibration multiplier from a calibrator's antenna temperature.
///
/// A smoothed temperature of zero yields an infinite or NaN factor; such
/// channels are logged and passed through.
pub fn derive_calibration(
    freqs: &[f64],
    antenna_temp: &[f64],
    reference: &FluxReference,
    window: usize,
) -> StageResult<CalibrationFunction> {
    ensure_aligned("calibrator antenna temperature", freqs.len(), antenna_temp.len())?;

    let smoothed = median_filter(antenna_temp, window)?;
    let expected = reference.sample(freqs)?;
    let factors = (Array1::from(expected.clone()) / Array1::from(smoothed.clone())).to_vec();

    let non_finite = StatsHelper::non_finite_count(&factors);
    if non_finite > 0 {
        LogManager::new().warn(&format!(
            "{} of {} calibration factors are not finite",
            non_finite,
            factors.len()
        ));
    }

    Ok(CalibrationFunction {
        freqs: freqs.to_vec(),
        expected,
        smoothed,
        factors,
    })
}

/// Scales a target observation to flux density.
///
/// The output has one value per target channel; an empty target yields an
/// empty result whatever the calibration holds.
pub fn apply_calibration(
    target_freqs: &[f64],
    target_values: &[f64],
    calibration: &CalibrationFunction,
) -> StageResult<Vec<f64>> {
    ensure_aligned("target values", target_freqs.len(), target_values.len())?;
    if target_freqs.is_empty() {
        return Ok(Vec::new());
    }
    if calibration.is_empty() {
        return Err(StageError::InvalidInput(
            "calibration function has no channels".into(),
        ));
    }

    let factors = calibration.factors_on(target_freqs)?;
    apply_factors(target_values, &factors)
}

/// Multiplies `values` by factors already resampled onto the same grid.
pub fn apply_factors(values: &[f64], factors: &[f64]) -> StageResult<Vec<f64>> {
    ensure_aligned("calibration factors", values.len(), factors.len())?;
    Ok((Array1::from(values.to_vec()) * Array1::from(factors.to_vec())).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::CalibrationSource;
    use approx::assert_relative_eq;

    fn table(freqs: &[f64], flux: &[f64]) -> FluxReference {
        FluxReference::Table {
            freqs: freqs.to_vec(),
            flux: flux.to_vec(),
        }
    }

    #[test]
    fn factors_times_smoothed_reproduce_expected_flux() {
        let freqs: Vec<f64> = (0..200).map(|i| 1.1 + i as f64 * 0.003).collect();
        let temps: Vec<f64> = freqs
            .iter()
            .enumerate()
            .map(|(i, f)| 2.0 + f + if i % 17 == 0 { 3.0 } else { 0.0 })
            .collect();
        let reference = FluxReference::Source(CalibrationSource::ThreeC286);

        let cal = derive_calibration(&freqs, &temps, &reference, 31).unwrap();
        assert_eq!(cal.len(), freqs.len());
        for i in 0..cal.len() {
            assert_relative_eq!(
                cal.factors[i] * cal.smoothed[i],
                cal.expected[i],
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn tabulated_reference_is_interpolated() {
        let freqs = [1.0, 1.5, 2.0];
        let cal = derive_calibration(
            &freqs,
            &[2.0, 2.0, 2.0],
            &table(&[1.0, 2.0], &[10.0, 20.0]),
            1,
        )
        .unwrap();
        assert_eq!(cal.expected, vec![10.0, 15.0, 20.0]);
        assert_eq!(cal.factors, vec![5.0, 7.5, 10.0]);
    }

    #[test]
    fn zero_temperature_propagates_infinity() {
        let cal = derive_calibration(
            &[1.0, 2.0],
            &[0.0, 1.0],
            &table(&[1.0, 2.0], &[4.0, 4.0]),
            1,
        )
        .unwrap();
        assert!(cal.factors[0].is_infinite());
        assert_eq!(cal.factors[1], 4.0);
    }

    #[test]
    fn misaligned_calibrator_is_rejected() {
        let result = derive_calibration(
            &[1.0, 2.0],
            &[1.0],
            &FluxReference::Source(CalibrationSource::ThreeC48),
            1,
        );
        assert!(matches!(result, Err(StageError::Alignment(_))));
    }

    #[test]
    fn apply_on_matching_grid_multiplies_directly() {
        let cal = derive_calibration(
            &[1.0, 2.0, 3.0],
            &[1.0, 2.0, 4.0],
            &table(&[1.0, 3.0], &[8.0, 8.0]),
            1,
        )
        .unwrap();
        let flux = apply_calibration(&[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0], &cal).unwrap();
        assert_eq!(flux, vec![8.0, 4.0, 2.0]);
    }

    #[test]
    fn apply_on_different_grid_resamples_factors() {
        let cal = CalibrationFunction {
            freqs: vec![1.0, 2.0],
            expected: vec![1.0, 1.0],
            smoothed: vec![1.0, 1.0],
            factors: vec![2.0, 4.0],
        };
        let flux = apply_calibration(&[1.25, 1.5, 3.0], &[1.0, 2.0, 1.0], &cal).unwrap();
        assert_eq!(flux.len(), 3);
        assert_relative_eq!(flux[0], 2.5);
        assert_relative_eq!(flux[1], 6.0);
        assert_relative_eq!(flux[2], 4.0);
    }

    #[test]
    fn apply_rejects_empty_calibration() {
        let cal = CalibrationFunction {
            freqs: vec![],
            expected: vec![],
            smoothed: vec![],
            factors: vec![],
        };
        assert!(apply_calibration(&[1.0], &[1.0], &cal).is_err());
    }

    #[test]
    fn empty_target_needs_no_calibration_channels() {
        let cal = CalibrationFunction {
            freqs: vec![],
            expected: vec![],
            smoothed: vec![],
            factors: vec![],
        };
        assert!(apply_calibration(&[], &[], &cal).unwrap().is_empty());
    }

    #[test]
    fn apply_factors_checks_alignment() {
        assert_eq!(apply_factors(&[1.0, 2.0], &[3.0, 0.5]).unwrap(), vec![3.0, 1.0]);
        assert!(matches!(
            apply_factors(&[1.0, 2.0], &[3.0]),
            Err(StageError::Alignment(_))
        ));
    }
}
