//! Configuration: `tarseal.toml` in the config directory.

pub mod settings;

pub use settings::{default_config_dir, Settings};
