//! Run/batch configuration: YAML files with a fallback-path loader mirroring
//! the teacher's layered `DEFAULT_CONFIG_PATHS` lookup.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{DEFAULT_BATCH_PATHS, DEFAULT_CONFIG_PATHS, load_batch_config, load_config};
pub use types::{BatchConfig, LoggingConfig, RunConfig};
