pub mod archive;
pub mod assemble;
pub mod instrument;
pub mod source;

pub use archive::{EffelsbergArchive, GbtArchive, PolarizationRows};
pub use assemble::{effelsberg_stack, gbt_stack, TSYS_MEDIAN_WINDOW};
pub use instrument::Instrument;
pub use source::{CalibrationSource, FluxReference};
