use serde::{Deserialize, Serialize};

use crate::spectrum::SpectralStack;

/// Inclusive frequency interval in GHz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub lower: f64,
    pub upper: f64,
}

impl FrequencyBand {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Rejects inverted or NaN bounds.
    pub fn validate(&self) -> StageResult<()> {
        if self.lower <= self.upper {
            Ok(())
        } else {
            Err(StageError::InvalidArgument(format!(
                "band lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            )))
        }
    }

    pub fn contains(&self, freq: f64) -> bool {
        self.lower <= freq && freq <= self.upper
    }
}

/// Shared configuration for each reduction stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Block-averaging factor applied by the downbin stage.
    pub downsample: usize,
    /// Leading channels dropped before downbinning.
    pub shift: usize,
    /// Valid data-taking range; `None` keeps every channel.
    pub band: Option<FrequencyBand>,
    /// Interference band blanked with NaN; `None` disables the notch.
    pub notch: Option<FrequencyBand>,
    /// Median-filter width used when smoothing the calibrator.
    pub median_window: usize,
    /// Series the notch stage blanks.
    pub masked_series: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            downsample: 1,
            shift: 0,
            band: None,
            notch: None,
            median_window: 31,
            masked_series: vec!["flux".to_string()],
        }
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub stack: SpectralStack,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub stack: SpectralStack,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub channels_in: usize,
    pub channels_out: usize,
    pub blanked: Option<usize>,
    pub notes: Vec<String>,
}

/// Common error type for the reduction core.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("misaligned arrays: {0}")]
    Alignment(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal failure: {0}")]
    Internal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("archive decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type StageResult<T> = Result<T, StageError>;

/// Checks that a co-indexed array matches the reference length.
pub(crate) fn ensure_aligned(what: &str, expected: usize, found: usize) -> StageResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(StageError::Alignment(format!(
            "{} has {} channels, expected {}",
            what, found, expected
        )))
    }
}

/// Trait describing the chained reduction stages.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_contains_is_inclusive() {
        let band = FrequencyBand::new(1.1, 1.3);
        assert!(band.contains(1.1));
        assert!(band.contains(1.3));
        assert!(!band.contains(1.31));
    }

    #[test]
    fn inverted_band_is_rejected() {
        assert!(matches!(
            FrequencyBand::new(1.4, 1.2).validate(),
            Err(StageError::InvalidArgument(_))
        ));
        assert!(FrequencyBand::new(f64::NAN, 1.2).validate().is_err());
    }

    #[test]
    fn stage_config_defaults_fill_missing_fields() {
        let config: StageConfig = serde_json::from_str(r#"{"downsample": 4}"#).unwrap();
        assert_eq!(config.downsample, 4);
        assert_eq!(config.median_window, 31);
        assert_eq!(config.masked_series, vec!["flux".to_string()]);
    }
}
