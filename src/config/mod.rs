//! Configuration loading and application.
mod apply;
mod loader;
pub mod types;


pub use apply::{apply_dashboard_config, apply_load_config};
pub use loader::load_config;

pub(crate) use loader::load_config_file;
