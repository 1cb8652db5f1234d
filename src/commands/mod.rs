pub mod stats;
pub mod teams;

use anyhow::{Context, Result};
use std::path::Path;

use crate::dataset::Dataset;

/// Load the dataset file, attaching the path to any failure
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    Dataset::load(path).with_context(|| format!("Failed to load teams from '{}'", path.display()))
}
