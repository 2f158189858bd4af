use anyhow::Context;
use fluxcore::observation::{FluxReference, Instrument};
use fluxcore::processing::CalibrationFunction;
use fluxcore::spectrum::CalibratedSpectrum;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// JSON document written for a finished reduction.
///
/// serde_json writes NaN as `null`, so blanked channels appear as nulls.
#[derive(Debug, Serialize)]
pub struct ReductionReport<'a> {
    pub instrument: Instrument,
    pub reference: &'a FluxReference,
    pub spectrum: &'a CalibratedSpectrum,
    pub calibration: &'a CalibrationFunction,
    pub notes: &'a [String],
}

#[derive(Debug, Serialize)]
struct SpectrumRow {
    freq_ghz: f64,
    flux_jy: f64,
    mask: f64,
    factor: f64,
}

/// Writes CSV for a `.csv` path, the JSON report otherwise.
pub fn write_report(path: &Path, report: &ReductionReport<'_>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        write_csv(path, report.spectrum)
    } else {
        let file =
            File::create(path).with_context(|| format!("creating report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report)
            .with_context(|| format!("writing report {}", path.display()))
    }
}

fn write_csv(path: &Path, spectrum: &CalibratedSpectrum) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating spectrum {}", path.display()))?;
    for i in 0..spectrum.len() {
        writer.serialize(SpectrumRow {
            freq_ghz: spectrum.freqs[i],
            flux_jy: spectrum.flux[i],
            mask: spectrum.mask[i],
            factor: spectrum.factors[i],
        })?;
    }
    writer.flush()?;
    Ok(())
}
