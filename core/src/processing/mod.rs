pub mod band;
pub mod calibration;
pub mod downbin;
pub mod notch;

pub use band::{band_indices, BandStage};
pub use calibration::{apply_calibration, apply_factors, derive_calibration, CalibrationFunction};
pub use downbin::{downbin, DownbinStage};
pub use notch::{apply_mask, interference_mask, NotchStage};
