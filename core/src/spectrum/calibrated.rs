use serde::{Deserialize, Serialize};

use crate::prelude::StageResult;
use crate::spectrum::SpectralStack;

/// Final product of a reduction: flux density per channel.
///
/// Blanked channels carry NaN in both `flux` and `mask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedSpectrum {
    pub freqs: Vec<f64>,
    pub flux: Vec<f64>,
    pub mask: Vec<f64>,
    pub factors: Vec<f64>,
}

impl CalibratedSpectrum {
    /// Collects `flux`, `mask` and `factors` from a reduced stack.
    ///
    /// A stack without a `mask` series is treated as unmasked.
    pub fn from_stack(stack: &SpectralStack) -> StageResult<Self> {
        let flux = stack.require("flux")?.to_vec();
        let factors = stack.require("factors")?.to_vec();
        let mask = stack
            .series("mask")
            .map(<[f64]>::to_vec)
            .unwrap_or_else(|| vec![1.0; stack.len()]);

        Ok(Self {
            freqs: stack.freqs().to_vec(),
            flux,
            mask,
            factors,
        })
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Number of channels that survived masking with a finite flux.
    pub fn valid_channels(&self) -> usize {
        self.flux.iter().filter(|v| v.is_finite()).count()
    }
}
