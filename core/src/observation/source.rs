use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::interp;
use crate::prelude::{StageError, StageResult};

/// Flux-density calibrators with a polynomial spectral model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationSource {
    #[serde(rename = "3C286")]
    ThreeC286,
    #[serde(rename = "3C48")]
    ThreeC48,
}

impl CalibrationSource {
    pub const ALL: [CalibrationSource; 2] = [Self::ThreeC286, Self::ThreeC48];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ThreeC286 => "3C286",
            Self::ThreeC48 => "3C48",
        }
    }

    /// Coefficients of `log10 S` as a cubic in `log10(f / GHz)`.
    pub fn coefficients(&self) -> [f64; 4] {
        match self {
            Self::ThreeC286 => [1.2481, -0.4507, -0.1798, 0.0357],
            Self::ThreeC48 => [1.3253, -0.7553, -0.1914, 0.0498],
        }
    }

    /// Expected flux density in Jy at `freq_ghz`.
    pub fn expected_flux(&self, freq_ghz: f64) -> f64 {
        let x = freq_ghz.log10();
        let [a0, a1, a2, a3] = self.coefficients();
        10f64.powf(a0 + x * (a1 + x * (a2 + x * a3)))
    }
}

impl fmt::Display for CalibrationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalibrationSource {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.name()).collect();
                StageError::InvalidArgument(format!(
                    "unknown calibration source '{}' (valid: {})",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Where the calibrator's expected flux density comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluxReference {
    Source(CalibrationSource),
    /// Tabulated curve, linearly interpolated onto the calibrator grid.
    Table { freqs: Vec<f64>, flux: Vec<f64> },
}

impl FluxReference {
    /// Expected flux density (Jy) on each of `freqs`.
    pub fn sample(&self, freqs: &[f64]) -> StageResult<Vec<f64>> {
        match self {
            Self::Source(source) => Ok(freqs.iter().map(|&f| source.expected_flux(f)).collect()),
            Self::Table { freqs: xp, flux } => interp(freqs, xp, flux),
        }
    }
}

impl From<CalibrationSource> for FluxReference {
    fn from(source: CalibrationSource) -> Self {
        Self::Source(source)
    }
}
