//! Configuration file loading for conformity-bench
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CONFORMITY_<SECTION>__<KEY>` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./conformity.toml` or `./.conformity.toml`
//! 4. Global: `$XDG_CONFIG_HOME/conformity-bench/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileExperimentConfig, FileInferenceConfig, FileOutputConfig, FilePanelConfig,
    FileProviderConfig, FileSamplingConfig,
};
pub use loader::ConfigLoader;
