use crate::generator::profile::synthetic_stack;
use crate::workflow::config::{ObservationSource, WorkflowConfig};
use anyhow::Context;
use fluxcore::observation::archive::{matching_files, read_archive};
use fluxcore::observation::{
    effelsberg_stack, gbt_stack, EffelsbergArchive, GbtArchive, Instrument, TSYS_MEDIAN_WINDOW,
};
use fluxcore::prelude::{ProcessingStage, StageConfig, StageInput, StageOutput};
use fluxcore::processing::{
    apply_factors, derive_calibration, BandStage, CalibrationFunction, DownbinStage, NotchStage,
};
use fluxcore::spectrum::{CalibratedSpectrum, SpectralStack};
use fluxcore::telemetry::{Metrics, MetricsRecorder};
use log::info;
use std::path::Path;

pub struct WorkflowResult {
    pub spectrum: CalibratedSpectrum,
    pub calibration: CalibrationFunction,
    pub notes: Vec<String>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Loads both observations and reduces them.
    pub fn run(&self) -> anyhow::Result<WorkflowResult> {
        let target = self
            .load_stack(&self.config.target)
            .context("loading target observation")?;
        let calibrator = self
            .load_stack(&self.config.calibrator)
            .context("loading calibrator observation")?;
        self.execute(target, calibrator)
    }

    pub fn load_stack(&self, source: &ObservationSource) -> anyhow::Result<SpectralStack> {
        match source {
            ObservationSource::Archives { dir, tag } => {
                load_archives(self.config.instrument, dir, tag)
            }
            ObservationSource::Synthetic(generator) => {
                synthetic_stack(self.config.instrument, generator)
            }
        }
    }

    /// Downbin and band-limit both observations, calibrate the target, then
    /// blank the notch.
    pub fn execute(
        &self,
        target: SpectralStack,
        calibrator: SpectralStack,
    ) -> anyhow::Result<WorkflowResult> {
        let stage_config = self.config.to_stage_config();
        let metrics = MetricsRecorder::new();
        let mut notes = Vec::new();

        let target = reduce(target, &stage_config, &metrics, &mut notes)
            .context("reducing target observation")?;
        let calibrator = reduce(calibrator, &stage_config, &metrics, &mut notes)
            .context("reducing calibrator observation")?;

        let calibration = derive_calibration(
            calibrator.freqs(),
            calibrator.require("ta")?,
            &self.config.reference,
            stage_config.median_window,
        )
        .context("deriving calibration function")?;
        let factors = calibration
            .factors_on(target.freqs())
            .context("resampling calibration onto target")?;
        let flux = apply_factors(target.require("ta")?, &factors)
            .context("applying calibration to target")?;
        notes.push(format!(
            "calibration from {} channels, window {}",
            calibration.len(),
            stage_config.median_window
        ));

        let mut target = target;
        target.insert("flux", flux)?;
        target.insert("factors", factors)?;
        let notched = run_stage(
            &mut NotchStage::new(),
            "notch",
            &stage_config,
            target,
            &metrics,
        )?;
        notes.extend(notched.metadata.notes);

        let spectrum = CalibratedSpectrum::from_stack(&notched.stack)?;
        info!(
            "calibrated {} channels, {} valid",
            spectrum.len(),
            spectrum.valid_channels()
        );

        Ok(WorkflowResult {
            spectrum,
            calibration,
            notes,
            metrics: metrics.snapshot(),
        })
    }
}

fn load_archives(instrument: Instrument, dir: &Path, tag: &str) -> anyhow::Result<SpectralStack> {
    let paths = matching_files(dir, tag)?;
    info!("loading {} {} archives from {}", paths.len(), instrument, dir.display());
    let stack = match instrument {
        Instrument::Gbt => {
            let archives = paths
                .iter()
                .map(|path| {
                    read_archive::<GbtArchive>(path)
                        .with_context(|| format!("reading GBT archive {}", path.display()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            gbt_stack(&archives, TSYS_MEDIAN_WINDOW)?
        }
        Instrument::Effelsberg => {
            let archives = paths
                .iter()
                .map(|path| {
                    read_archive::<EffelsbergArchive>(path)
                        .with_context(|| format!("reading Effelsberg archive {}", path.display()))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            effelsberg_stack(&archives)?
        }
    };
    Ok(stack)
}

fn reduce(
    stack: SpectralStack,
    config: &StageConfig,
    metrics: &MetricsRecorder,
    notes: &mut Vec<String>,
) -> anyhow::Result<SpectralStack> {
    let binned = run_stage(&mut DownbinStage::new(), "downbin", config, stack, metrics)?;
    notes.extend(binned.metadata.notes);
    let banded = run_stage(&mut BandStage::new(), "band", config, binned.stack, metrics)?;
    notes.extend(banded.metadata.notes);
    Ok(banded.stack)
}

fn run_stage<S: ProcessingStage>(
    stage: &mut S,
    name: &str,
    config: &StageConfig,
    stack: SpectralStack,
    metrics: &MetricsRecorder,
) -> anyhow::Result<StageOutput> {
    let output = stage
        .initialize(config)
        .with_context(|| format!("initializing {} stage", name))
        .and_then(|()| {
            stage
                .execute(StageInput { stack })
                .with_context(|| format!("executing {} stage", name))
        });
    stage.cleanup();

    match output {
        Ok(output) => {
            metrics.record_stage(output.metadata.blanked);
            Ok(output)
        }
        Err(err) => {
            metrics.record_error();
            Err(err)
        }
    }
}
