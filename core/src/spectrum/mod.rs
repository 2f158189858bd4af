pub mod calibrated;
pub mod stack;

pub use calibrated::CalibratedSpectrum;
pub use stack::{Series, SpectralStack};
