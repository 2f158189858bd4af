//! Spectral reduction core for single-dish radio observations.
//!
//! Raw GBT and Effelsberg dumps are assembled into frequency-aligned stacks,
//! downbinned, restricted to the receiver's valid band, flux-calibrated
//! against a known calibrator and finally notch-masked.

pub mod math;
pub mod observation;
pub mod prelude;
pub mod processing;
pub mod spectrum;
pub mod telemetry;

pub use prelude::{FrequencyBand, ProcessingStage, StageConfig, StageError, StageInput, StageOutput};
pub use spectrum::{CalibratedSpectrum, SpectralStack};
