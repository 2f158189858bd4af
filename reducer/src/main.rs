use anyhow::{bail, Context};
use clap::Parser;
use fluxcore::observation::{CalibrationSource, FluxReference, Instrument};
use fluxcore::prelude::FrequencyBand;
use generator::profile::GeneratorConfig;
use output::writer::{write_report, ReductionReport};
use std::path::PathBuf;
use workflow::config::{ObservationSource, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod output;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Flux-calibrate single-dish spectra against a known calibrator"
)]
struct Args {
    /// Load a workflow config from YAML; the other flags are ignored
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// gbt or effelsberg
    #[arg(long, default_value = "gbt")]
    instrument: Instrument,
    /// Directory holding the target archives
    #[arg(long)]
    target: Option<PathBuf>,
    #[arg(long, default_value = "")]
    target_tag: String,
    /// Directory holding the calibrator archives
    #[arg(long)]
    calibrator: Option<PathBuf>,
    #[arg(long, default_value = "")]
    calibrator_tag: String,
    /// Calibrator name (3C286 or 3C48)
    #[arg(long, default_value = "3C286")]
    source: CalibrationSource,
    #[arg(long, default_value_t = 1)]
    downsample: usize,
    #[arg(long, default_value_t = 0)]
    shift: usize,
    /// Valid band in GHz, overriding the instrument default
    #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
    band: Option<Vec<f64>>,
    /// Interference band to blank in GHz
    #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
    notch: Option<Vec<f64>>,
    #[arg(long, default_value_t = false)]
    no_notch: bool,
    #[arg(long)]
    median_window: Option<usize>,
    /// Reduce seeded synthetic observations instead of archives
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Report path; `.csv` writes the spectrum table, anything else JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn band_arg(values: Option<Vec<f64>>) -> Option<FrequencyBand> {
    values.and_then(|v| match v.as_slice() {
        [lower, upper] => Some(FrequencyBand::new(*lower, *upper)),
        _ => None,
    })
}

fn workflow_from_args(args: Args) -> anyhow::Result<WorkflowConfig> {
    let (target, calibrator) = if args.synthetic {
        (
            ObservationSource::Synthetic(GeneratorConfig::target(args.seed)),
            ObservationSource::Synthetic(GeneratorConfig::calibrator(
                args.source,
                args.seed.wrapping_add(1),
            )),
        )
    } else {
        let (Some(target_dir), Some(calibrator_dir)) = (args.target, args.calibrator) else {
            bail!("--target and --calibrator are required unless --synthetic or --workflow is given");
        };
        (
            ObservationSource::Archives {
                dir: target_dir,
                tag: args.target_tag,
            },
            ObservationSource::Archives {
                dir: calibrator_dir,
                tag: args.calibrator_tag,
            },
        )
    };

    let mut config = WorkflowConfig::from_args(
        args.instrument,
        target,
        calibrator,
        FluxReference::Source(args.source),
    );
    config.downsample = args.downsample;
    config.shift = args.shift;
    config.band = band_arg(args.band);
    config.notch = band_arg(args.notch);
    config.disable_notch = args.no_notch;
    config.median_window = args.median_window;
    config.output = args.output;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow.clone() {
        WorkflowConfig::load(path)?
    } else {
        workflow_from_args(args)?
    };

    let runner = Runner::new(workflow_config.clone());
    let result = runner.run().context("running reduction workflow")?;

    println!(
        "Reduced {} channels ({} valid) with {} stages, {} blanked",
        result.spectrum.len(),
        result.spectrum.valid_channels(),
        result.metrics.stages,
        result.metrics.blanked
    );
    for note in &result.notes {
        log::debug!("{}", note);
    }

    if let Some(path) = workflow_config.output.as_ref() {
        let report = ReductionReport {
            instrument: workflow_config.instrument,
            reference: &workflow_config.reference,
            spectrum: &result.spectrum,
            calibration: &result.calibration,
            notes: &result.notes,
        };
        write_report(path, &report)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_flags_build_generated_sources() {
        let args = Args::parse_from([
            "fluxreduce",
            "--synthetic",
            "--seed",
            "7",
            "--source",
            "3C48",
            "--band",
            "1.2",
            "1.6",
            "--no-notch",
        ]);
        let config = workflow_from_args(args).unwrap();
        assert!(matches!(
            config.calibrator,
            ObservationSource::Synthetic(ref generator) if generator.seed == 8
        ));
        assert_eq!(
            config.reference,
            FluxReference::Source(CalibrationSource::ThreeC48)
        );
        let stage = config.to_stage_config();
        assert_eq!(stage.band, Some(FrequencyBand::new(1.2, 1.6)));
        assert_eq!(stage.notch, None);
    }

    #[test]
    fn archive_mode_requires_both_directories() {
        let args = Args::parse_from(["fluxreduce", "--target", "/data/target"]);
        assert!(workflow_from_args(args).is_err());
    }

    #[test]
    fn unknown_instrument_is_rejected_by_parser() {
        assert!(Args::try_parse_from(["fluxreduce", "--instrument", "vla"]).is_err());
    }
}
