use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::prelude::{FrequencyBand, StageConfig, StageError};

/// Telescope/receiver combinations with known reduction defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    /// Green Bank Telescope, L-band receiver.
    Gbt,
    /// Effelsberg 100 m, L-band receiver.
    Effelsberg,
}

impl Instrument {
    /// Median-filter width used to smooth the calibrator.
    pub fn median_window(&self) -> usize {
        match self {
            Self::Gbt => 201,
            Self::Effelsberg => 31,
        }
    }

    pub fn valid_band(&self) -> FrequencyBand {
        match self {
            Self::Gbt => FrequencyBand::new(1.15, 1.73),
            Self::Effelsberg => FrequencyBand::new(1.29, 1.43),
        }
    }

    /// Receiver notch filter to blank, if the instrument has one.
    pub fn notch(&self) -> Option<FrequencyBand> {
        match self {
            Self::Gbt => Some(FrequencyBand::new(1.20, 1.34)),
            Self::Effelsberg => None,
        }
    }

    pub fn stage_config(&self) -> StageConfig {
        StageConfig {
            band: Some(self.valid_band()),
            notch: self.notch(),
            median_window: self.median_window(),
            ..Default::default()
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gbt => f.write_str("gbt"),
            Self::Effelsberg => f.write_str("effelsberg"),
        }
    }
}

impl FromStr for Instrument {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gbt" => Ok(Self::Gbt),
            "effelsberg" | "eff" => Ok(Self::Effelsberg),
            other => Err(StageError::InvalidArgument(format!(
                "unknown instrument '{}' (valid: gbt, effelsberg)",
                other
            ))),
        }
    }
}
