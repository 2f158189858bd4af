use anyhow::Context;
use fluxcore::observation::{FluxReference, Instrument};
use fluxcore::prelude::{FrequencyBand, StageConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::profile::GeneratorConfig;

/// Where an observation's channels come from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    /// Every archive in `dir` whose file name contains `tag`.
    Archives { dir: PathBuf, tag: String },
    Synthetic(GeneratorConfig),
}

/// Enum-valued fields are written as single-key maps, e.g.
/// `target: {archives: {dir: ..., tag: ...}}` or `reference: {source: 3C48}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub instrument: Instrument,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub target: ObservationSource,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub calibrator: ObservationSource,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub reference: FluxReference,
    #[serde(default = "default_downsample")]
    pub downsample: usize,
    #[serde(default)]
    pub shift: usize,
    /// Overrides the instrument's valid band.
    #[serde(default)]
    pub band: Option<FrequencyBand>,
    /// Overrides the instrument's notch.
    #[serde(default)]
    pub notch: Option<FrequencyBand>,
    #[serde(default)]
    pub disable_notch: bool,
    #[serde(default)]
    pub median_window: Option<usize>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_downsample() -> usize {
    1
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        instrument: Instrument,
        target: ObservationSource,
        calibrator: ObservationSource,
        reference: FluxReference,
    ) -> Self {
        Self {
            instrument,
            target,
            calibrator,
            reference,
            downsample: default_downsample(),
            shift: 0,
            band: None,
            notch: None,
            disable_notch: false,
            median_window: None,
            output: None,
        }
    }

    /// Instrument defaults with this workflow's overrides applied.
    pub fn to_stage_config(&self) -> StageConfig {
        let mut config = self.instrument.stage_config();
        config.downsample = self.downsample;
        config.shift = self.shift;
        if let Some(band) = self.band {
            config.band = Some(band);
        }
        if let Some(notch) = self.notch {
            config.notch = Some(notch);
        }
        if self.disable_notch {
            config.notch = None;
        }
        if let Some(window) = self.median_window {
            config.median_window = window;
        }
        config
    }
}
