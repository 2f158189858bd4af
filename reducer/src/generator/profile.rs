use anyhow::{ensure, Context};
use fluxcore::observation::{
    effelsberg_stack, gbt_stack, CalibrationSource, EffelsbergArchive, GbtArchive, Instrument,
    PolarizationRows, TSYS_MEDIAN_WINDOW,
};
use fluxcore::spectrum::SpectralStack;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating a synthetic observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub channels: usize,
    pub start_ghz: f64,
    pub stop_ghz: f64,
    /// Emit the spectrum of a known calibrator instead of the power law.
    pub source: Option<CalibrationSource>,
    /// Power-law flux density at 1 GHz in Jy.
    pub flux_1ghz: f64,
    pub spectral_index: f64,
    /// System-equivalent flux density in Jy.
    pub sefd: f64,
    /// System temperature in K.
    pub tsys: f64,
    /// Noise-diode temperature in K, both polarizations.
    pub tcal: f64,
    /// Reference-position counts with the diode off.
    pub system_counts: f64,
    /// Fractional uniform jitter on the counts.
    pub noise: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            channels: 4096,
            start_ghz: 1.10,
            stop_ghz: 1.80,
            source: None,
            flux_1ghz: 2.5,
            spectral_index: -0.7,
            sefd: 10.0,
            tsys: 20.0,
            tcal: 1.5,
            system_counts: 1.0e6,
            noise: 0.002,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn calibrator(source: CalibrationSource, seed: u64) -> Self {
        Self {
            source: Some(source),
            seed,
            ..Default::default()
        }
    }

    pub fn target(seed: u64) -> Self {
        Self {
            channels: 3072,
            seed,
            ..Default::default()
        }
    }

    /// True flux density of the simulated source at `freq_ghz`.
    pub fn flux_at(&self, freq_ghz: f64) -> f64 {
        match self.source {
            Some(source) => source.expected_flux(freq_ghz),
            None => self.flux_1ghz * freq_ghz.powf(self.spectral_index),
        }
    }

    fn channel_freqs(&self) -> Vec<f64> {
        let width = (self.stop_ghz - self.start_ghz) / self.channels as f64;
        (0..self.channels)
            .map(|i| self.start_ghz + (i as f64 + 0.5) * width)
            .collect()
    }

    fn check(&self) -> anyhow::Result<()> {
        ensure!(self.channels > 0, "generator needs at least one channel");
        ensure!(
            self.stop_ghz > self.start_ghz,
            "generator band {}-{} GHz is empty",
            self.start_ghz,
            self.stop_ghz
        );
        ensure!(self.sefd > 0.0, "generator SEFD must be positive");
        ensure!(
            self.tsys > 0.0 && self.tcal > 0.0,
            "generator system and diode temperatures must be positive"
        );
        Ok(())
    }
}

struct Jitter {
    rng: StdRng,
    noise: f64,
}

impl Jitter {
    fn new(config: &GeneratorConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            noise: config.noise,
        }
    }

    fn scale(&mut self) -> f64 {
        if self.noise > 0.0 {
            1.0 + self.rng.gen_range(-self.noise..self.noise)
        } else {
            1.0
        }
    }
}

/// Dual-polarization dump with diode on/off phases.
///
/// The source adds `flux * tsys / sefd` kelvin on top of the system
/// temperature, which is what the Tsys-scaled antenna temperature recovers.
pub fn build_gbt_archive(config: &GeneratorConfig) -> anyhow::Result<GbtArchive> {
    config.check()?;
    let mut jitter = Jitter::new(config);
    let counts_per_kelvin = config.system_counts / config.tsys;

    let freqs = config.channel_freqs();
    let mut polarization = || {
        let mut rows = PolarizationRows::from([
            vec![1.0; freqs.len()],
            Vec::with_capacity(freqs.len()),
            Vec::with_capacity(freqs.len()),
            vec![1.0; freqs.len()],
            Vec::with_capacity(freqs.len()),
            Vec::with_capacity(freqs.len()),
        ]);
        for &freq in &freqs {
            let source_temp = config.flux_at(freq) * config.tsys / config.sefd;
            let off = config.tsys * counts_per_kelvin;
            let diode = config.tcal * counts_per_kelvin;
            let sig_off = off + source_temp * counts_per_kelvin;
            rows.ref_off.push(off * jitter.scale());
            rows.ref_on.push((off + diode) * jitter.scale());
            rows.sig_off.push(sig_off * jitter.scale());
            rows.sig_on.push((sig_off + diode) * jitter.scale());
        }
        rows
    };
    let xx = polarization();
    let yy = polarization();

    let archive = GbtArchive {
        freqs,
        xx,
        yy,
        xx_tcal: config.tcal,
        yy_tcal: config.tcal,
    };
    archive
        .validate()
        .context("synthetic archive lost channel alignment")?;
    Ok(archive)
}

/// Signal/reference dump where `ta = flux / sefd`.
pub fn build_effelsberg_archive(config: &GeneratorConfig) -> anyhow::Result<EffelsbergArchive> {
    config.check()?;
    let mut jitter = Jitter::new(config);

    let freqs = config.channel_freqs();
    let mut sig = Vec::with_capacity(freqs.len());
    let mut reference = Vec::with_capacity(freqs.len());
    for &freq in &freqs {
        let ta = config.flux_at(freq) / config.sefd;
        let ref_counts = config.system_counts * jitter.scale();
        reference.push(ref_counts);
        sig.push(ref_counts * (1.0 + ta) * jitter.scale());
    }

    let archive = EffelsbergArchive {
        freqs,
        sig,
        reference,
    };
    archive
        .validate()
        .context("synthetic archive lost channel alignment")?;
    Ok(archive)
}

/// Builds the instrument's archive format and assembles it into a stack.
pub fn synthetic_stack(
    instrument: Instrument,
    config: &GeneratorConfig,
) -> anyhow::Result<SpectralStack> {
    let stack = match instrument {
        Instrument::Gbt => gbt_stack(&[build_gbt_archive(config)?], TSYS_MEDIAN_WINDOW)?,
        Instrument::Effelsberg => effelsberg_stack(&[build_effelsberg_archive(config)?])?,
    };
    Ok(stack)
}
