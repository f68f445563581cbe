//! Configuration and logging setup shared by the binaries

mod config;
mod logging;

pub use config::{load_config, Config, ServerConfig, TrainingConfig};
pub use logging::init_logging;
