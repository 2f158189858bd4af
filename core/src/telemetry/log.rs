use log::{info, warn};

/// Thin wrapper so stages log under a single `fluxcore` target.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!(target: "fluxcore", "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: "fluxcore", "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
