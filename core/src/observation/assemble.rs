use ndarray::Array1;
use scirs2_ndimage::BorderMode;

use crate::math::median_filter_with;
use crate::observation::archive::{EffelsbergArchive, GbtArchive};
use crate::prelude::{StageError, StageResult};
use crate::spectrum::SpectralStack;

/// Median width used to smooth the reference system temperature.
///
/// The smoothing reflects at the band edges rather than clamping.
pub const TSYS_MEDIAN_WINDOW: usize = 31;

/// Merges GBT dumps and reduces both polarizations to antenna temperature.
///
/// Each polarization is reduced on its own then XX and YY are averaged into
/// `ta`, `sig`, `ref`, `sig_accepted`, `ref_accepted`, `sig_tsys` and
/// `ref_tsys`.
pub fn gbt_stack(archives: &[GbtArchive], tsys_window: usize) -> StageResult<SpectralStack> {
    if archives.is_empty() {
        return Err(StageError::InvalidInput("no GBT archives to assemble".into()));
    }

    let mut merged = SpectralStack::default();
    for archive in archives {
        archive.validate()?;
        let channels = archive.freqs.len();
        let mut part = SpectralStack::new(archive.freqs.clone());
        for (pol, rows, tcal) in [
            ("xx", &archive.xx, archive.xx_tcal),
            ("yy", &archive.yy, archive.yy_tcal),
        ] {
            for (name, row) in rows.rows() {
                part.insert(format!("{}_{}", pol, name), row.to_vec())?;
            }
            // Kept per channel so it follows the frequency sort.
            part.insert(format!("{}_tcal", pol), vec![tcal; channels])?;
        }
        merged.concat(&part)?;
    }

    let raw = merged.sort_by_frequency();
    let xx = PolarizationTemps::reduce(&raw, "xx", tsys_window)?;
    let yy = PolarizationTemps::reduce(&raw, "yy", tsys_window)?;
    let average = |a: &Array1<f64>, b: &Array1<f64>| ((a + b) / 2.0).to_vec();

    SpectralStack::new(raw.freqs().to_vec())
        .with_series("ta", average(&xx.ta, &yy.ta))?
        .with_series("sig", average(&xx.sig, &yy.sig))?
        .with_series("ref", average(&xx.reference, &yy.reference))?
        .with_series("sig_accepted", average(&xx.sig_accepted, &yy.sig_accepted))?
        .with_series("ref_accepted", average(&xx.ref_accepted, &yy.ref_accepted))?
        .with_series("sig_tsys", average(&xx.sig_tsys, &yy.sig_tsys))?
        .with_series("ref_tsys", average(&xx.ref_tsys, &yy.ref_tsys))
}

/// Merges Effelsberg dumps into one frequency-sorted stack.
///
/// Series: `sig`, `ref` and the relative antenna temperature
/// `ta = (sig - ref) / ref`.
pub fn effelsberg_stack(archives: &[EffelsbergArchive]) -> StageResult<SpectralStack> {
    if archives.is_empty() {
        return Err(StageError::InvalidInput("no Effelsberg archives to assemble".into()));
    }

    let mut merged = SpectralStack::default();
    for archive in archives {
        archive.validate()?;
        let part = SpectralStack::new(archive.freqs.clone())
            .with_series("sig", archive.sig.clone())?
            .with_series("ref", archive.reference.clone())?;
        merged.concat(&part)?;
    }

    let stack = merged.sort_by_frequency();
    let sig = Array1::from(stack.require("sig")?.to_vec());
    let reference = Array1::from(stack.require("ref")?.to_vec());
    let ta = (&sig - &reference) / &reference;
    stack.with_series("ta", ta.to_vec())
}

struct PolarizationTemps {
    sig: Array1<f64>,
    reference: Array1<f64>,
    sig_accepted: Array1<f64>,
    ref_accepted: Array1<f64>,
    sig_tsys: Array1<f64>,
    ref_tsys: Array1<f64>,
    ta: Array1<f64>,
}

impl PolarizationTemps {
    fn reduce(raw: &SpectralStack, pol: &str, tsys_window: usize) -> StageResult<Self> {
        let column = |name: &str| -> StageResult<Array1<f64>> {
            Ok(Array1::from(raw.require(&format!("{}_{}", pol, name))?.to_vec()))
        };

        let tcal = column("tcal")?;
        let (sig_on, sig_off) = (column("sig_on")?, column("sig_off")?);
        let (ref_on, ref_off) = (column("ref_on")?, column("ref_off")?);

        let sig = (&sig_on + &sig_off) / 2.0;
        let reference = (&ref_on + &ref_off) / 2.0;
        let sig_tsys = system_temperature(&tcal, &sig_on, &sig_off);
        let ref_tsys = system_temperature(&tcal, &ref_on, &ref_off);

        let smoothed_tsys = Array1::from(median_filter_with(
            &ref_tsys.to_vec(),
            tsys_window,
            BorderMode::Reflect,
        )?);
        let ta = (&sig - &reference) / &reference * &smoothed_tsys;

        Ok(Self {
            sig,
            reference,
            sig_accepted: column("sig_accepted")?,
            ref_accepted: column("ref_accepted")?,
            sig_tsys,
            ref_tsys,
            ta,
        })
    }
}

/// Noise-diode system temperature, `tcal * (off / (on - off) + 1/2)`.
fn system_temperature(tcal: &Array1<f64>, on: &Array1<f64>, off: &Array1<f64>) -> Array1<f64> {
    let diode_step = on - off;
    let ratio = off / &diode_step + 0.5;
    tcal * &ratio
}
