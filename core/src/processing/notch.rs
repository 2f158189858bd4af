use crate::math::stats::StatsHelper;
use crate::prelude::{
    ensure_aligned, FrequencyBand, ProcessingStage, StageConfig, StageError, StageInput,
    StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Same-length mask: `1.0` outside `band`, NaN inside it (inclusive).
pub fn interference_mask(freqs: &[f64], band: &FrequencyBand) -> StageResult<Vec<f64>> {
    band.validate()?;
    Ok(freqs
        .iter()
        .map(|&freq| if band.contains(freq) { f64::NAN } else { 1.0 })
        .collect())
}

/// Multiplies `values` by `mask`, so blanked channels become NaN in place.
pub fn apply_mask(values: &[f64], mask: &[f64]) -> StageResult<Vec<f64>> {
    ensure_aligned("mask", values.len(), mask.len())?;
    Ok(values.iter().zip(mask).map(|(v, m)| v * m).collect())
}

/// Blanks a known interference band (e.g. a receiver notch filter).
///
/// Unlike [`BandStage`](crate::processing::BandStage) the channel count is
/// untouched; the mask is stored as the `mask` series.
pub struct NotchStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl NotchStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for NotchStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for NotchStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if let Some(notch) = &config.notch {
            notch.validate()?;
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let mut stack = input.stack;
        let channels_in = stack.len();
        let Some(notch) = &config.notch else {
            return Ok(StageOutput {
                metadata: StageMetadata {
                    channels_in,
                    channels_out: channels_in,
                    blanked: Some(0),
                    notes: vec!["notch disabled".into()],
                },
                stack,
            });
        };

        let mask = interference_mask(stack.freqs(), notch)?;
        let mut notes = Vec::new();
        for name in &config.masked_series {
            let Some(values) = stack.series(name) else {
                notes.push(format!("series '{}' absent, not masked", name));
                continue;
            };
            let masked = apply_mask(values, &mask)?;
            stack.insert(name.clone(), masked)?;
        }

        let blanked = StatsHelper::non_finite_count(&mask);
        stack.insert("mask", mask)?;
        self.logger.record(&format!(
            "NotchStage blanked {} of {} channels in {:.4}-{:.4} GHz",
            blanked, channels_in, notch.lower, notch.upper
        ));
        notes.push(format!("notch {:.4}-{:.4} GHz", notch.lower, notch.upper));

        Ok(StageOutput {
            metadata: StageMetadata {
                channels_in,
                channels_out: stack.len(),
                blanked: Some(blanked),
                notes,
            },
            stack,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectralStack;

    #[test]
    fn mask_blanks_inclusive_band() {
        let freqs = [1.0, 1.2, 1.25, 1.3, 1.4];
        let mask = interference_mask(&freqs, &FrequencyBand::new(1.2, 1.3)).unwrap();
        assert_eq!(mask.len(), freqs.len());
        assert_eq!(mask[0], 1.0);
        assert!(mask[1].is_nan() && mask[2].is_nan() && mask[3].is_nan());
        assert_eq!(mask[4], 1.0);
    }

    #[test]
    fn applying_mask_preserves_length() {
        let freqs: Vec<f64> = (0..64).map(|i| 1.0 + i as f64 * 0.01).collect();
        let values = vec![2.0; freqs.len()];
        for (lo, hi) in [(0.0, 0.5), (1.1, 1.2), (0.0, 5.0)] {
            let mask = interference_mask(&freqs, &FrequencyBand::new(lo, hi)).unwrap();
            assert_eq!(apply_mask(&values, &mask).unwrap().len(), values.len());
        }
    }

    #[test]
    fn mismatched_mask_is_an_alignment_error() {
        assert!(matches!(
            apply_mask(&[1.0, 2.0], &[1.0]),
            Err(StageError::Alignment(_))
        ));
    }

    #[test]
    fn notch_stage_masks_configured_series_only() {
        let mut stage = NotchStage::new();
        let config = StageConfig {
            notch: Some(FrequencyBand::new(1.2, 1.3)),
            masked_series: vec!["flux".into(), "missing".into()],
            ..Default::default()
        };
        stage.initialize(&config).unwrap();

        let stack = SpectralStack::new(vec![1.1, 1.25, 1.4])
            .with_series("flux", vec![5.0, 5.0, 5.0])
            .unwrap()
            .with_series("ta", vec![1.0, 1.0, 1.0])
            .unwrap();
        let output = stage.execute(StageInput { stack }).unwrap();

        let flux = output.stack.series("flux").unwrap();
        assert_eq!(flux[0], 5.0);
        assert!(flux[1].is_nan());
        assert_eq!(output.stack.series("ta").unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(output.stack.series("mask").unwrap().len(), 3);
        assert_eq!(output.metadata.blanked, Some(1));
        assert!(output.metadata.notes[0].contains("missing"));
        stage.cleanup();
    }

    #[test]
    fn disabled_notch_leaves_stack_untouched() {
        let mut stage = NotchStage::new();
        stage.initialize(&StageConfig::default()).unwrap();
        let stack = SpectralStack::new(vec![1.0])
            .with_series("flux", vec![2.0])
            .unwrap();
        let output = stage.execute(StageInput { stack }).unwrap();
        assert_eq!(output.stack.series("flux").unwrap(), &[2.0]);
        assert!(output.stack.series("mask").is_none());
    }
}
