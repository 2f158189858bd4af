pub mod interp;
pub mod medfilt;
pub mod stats;

pub use self::interp::interp;
pub use medfilt::{median_filter, median_filter_with};
pub use stats::StatsHelper;
