use crate::prelude::{
    FrequencyBand, ProcessingStage, StageConfig, StageError, StageInput, StageMetadata,
    StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Indices of the channels with `lower <= freq <= upper`.
pub fn band_indices(freqs: &[f64], band: &FrequencyBand) -> StageResult<Vec<usize>> {
    band.validate()?;
    Ok(freqs
        .iter()
        .enumerate()
        .filter(|(_, freq)| band.contains(**freq))
        .map(|(idx, _)| idx)
        .collect())
}

/// Restricts the stack to the instrument's valid data-taking range.
pub struct BandStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl BandStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for BandStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for BandStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if let Some(band) = &config.band {
            band.validate()?;
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let channels_in = input.stack.len();
        let (stack, note) = match &config.band {
            Some(band) => {
                let stack = input.stack.restrict(band)?;
                if stack.is_empty() && channels_in > 0 {
                    self.logger.warn(&format!(
                        "BandStage kept no channels in {:.4}-{:.4} GHz",
                        band.lower, band.upper
                    ));
                }
                (
                    stack,
                    format!("band {:.4}-{:.4} GHz", band.lower, band.upper),
                )
            }
            None => (input.stack, "band unrestricted".to_string()),
        };
        self.logger.record(&format!(
            "BandStage {} -> {} channels",
            channels_in,
            stack.len()
        ));

        let metadata = StageMetadata {
            channels_in,
            channels_out: stack.len(),
            notes: vec![note],
            ..Default::default()
        };

        Ok(StageOutput { stack, metadata })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}
