pub mod commands;
pub mod config;
pub mod dataset;
pub mod fixtures;
pub mod loader;
pub mod preload;
pub mod stats;
pub mod url_sync;
pub mod viewer;
