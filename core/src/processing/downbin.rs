use ndarray::{ArrayView2, Axis};

use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Block-averages `samples` in contiguous groups of `factor`.
///
/// The trailing `len % factor` samples do not form a full block and are
/// dropped; a factor larger than the input yields an empty output.
pub fn downbin(samples: &[f64], factor: usize) -> StageResult<Vec<f64>> {
    if factor == 0 {
        return Err(StageError::InvalidArgument(
            "downsampling factor must be positive".into(),
        ));
    }
    let intervals = samples.len() / factor;
    if intervals == 0 {
        return Ok(Vec::new());
    }

    let blocks = ArrayView2::from_shape((intervals, factor), &samples[..intervals * factor])
        .map_err(|err| StageError::Internal(format!("reshaping for downbin: {}", err)))?;
    blocks
        .mean_axis(Axis(1))
        .map(|means| means.to_vec())
        .ok_or_else(|| StageError::Internal("downbin block is empty".into()))
}

/// Stage that shifts and downbins the whole stack.
pub struct DownbinStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl DownbinStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new(),
        }
    }
}

impl Default for DownbinStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DownbinStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.downsample == 0 {
            return Err(StageError::InvalidArgument(
                "downsampling factor must be positive".into(),
            ));
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
        let stack = input.stack.downbin(config.downsample, config.shift)?;
        self.logger.record(&format!(
            "DownbinStage {} -> {} channels (factor {}, shift {})",
            channels_in,
            stack.len(),
            config.downsample,
            config.shift
        ));

        let metadata = StageMetadata {
            channels_in,
            channels_out: stack.len(),
            notes: vec![format!("downbin x{}", config.downsample)],
            ..Default::default()
        };

        Ok(StageOutput { stack, metadata })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::StageInput;
    use crate::spectrum::SpectralStack;

    #[test]
    fn trailing_partial_block_is_dropped() {
        let out = downbin(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 3).unwrap();
        assert_eq!(out, vec![2.0, 5.0]);
    }

    #[test]
    fn output_length_is_floor_of_ratio() {
        let samples: Vec<f64> = (0..103).map(f64::from).collect();
        for factor in 1..12 {
            let out = downbin(&samples, factor).unwrap();
            assert_eq!(out.len(), samples.len() / factor);
            for (i, value) in out.iter().enumerate() {
                let block = &samples[i * factor..(i + 1) * factor];
                let mean = block.iter().sum::<f64>() / factor as f64;
                assert!((value - mean).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn factor_larger_than_input_yields_empty() {
        assert!(downbin(&[1.0, 2.0], 3).unwrap().is_empty());
    }

    #[test]
    fn zero_factor_is_rejected() {
        assert!(matches!(
            downbin(&[1.0], 0),
            Err(StageError::InvalidArgument(_))
        ));
        let mut stage = DownbinStage::new();
        let config = StageConfig {
            downsample: 0,
            ..Default::default()
        };
        assert!(stage.initialize(&config).is_err());
    }

    #[test]
    fn downbin_stage_reports_channel_counts() {
        let mut stage = DownbinStage::new();
        let config = StageConfig {
            downsample: 2,
            ..Default::default()
        };
        stage.initialize(&config).unwrap();

        let stack = SpectralStack::new(vec![1.0, 1.1, 1.2, 1.3, 1.4])
            .with_series("sig", vec![2.0, 4.0, 6.0, 8.0, 10.0])
            .unwrap();
        let output = stage.execute(StageInput { stack }).unwrap();
        assert_eq!(output.metadata.channels_in, 5);
        assert_eq!(output.metadata.channels_out, 2);
        assert_eq!(output.stack.series("sig").unwrap(), &[3.0, 7.0]);
        stage.cleanup();
    }

    #[test]
    fn uninitialized_stage_fails() {
        let mut stage = DownbinStage::new();
        let result = stage.execute(StageInput {
            stack: SpectralStack::default(),
        });
        assert!(matches!(result, Err(StageError::Internal(_))));
    }
}
