//! Settings for the parallel driver.
//!
//! Values are layered: built-in defaults, then an optional configuration file
//! (any format the `config` crate recognises by extension), then environment
//! variables prefixed with `PREDSTAT_`, e.g. `PREDSTAT_WORKERS=8`.

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{PredstatError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AnalysisConfig {
    /// Number of threads analysing partitions; 1 keeps everything on the calling thread.
    pub workers: usize,
    /// How many partitions may wait for a free worker.
    pub queue_depth: usize,
}

impl AnalysisConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue_depth: 2 * workers,
        }
    }
    pub fn load(path: Option<&str>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("workers", defaults.workers as u64)?
            .set_default("queue_depth", defaults.queue_depth as u64)?;
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("PREDSTAT").try_parsing(true))
            .build()?;
        settings.try_deserialize::<AnalysisConfig>()?.validated()
    }
    pub fn validated(mut self) -> Result<Self> {
        if self.workers == 0 {
            return Err(PredstatError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.queue_depth == 0 {
            self.queue_depth = 1;
        }
        Ok(self)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}
