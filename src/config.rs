use xdg::BaseDirectories;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::loader::PreviewQuality;
use crate::preload::{QueueConfig, DEFAULT_MAX_CACHE_ENTRIES, DEFAULT_MAX_CONCURRENT};

/// Default lazy-load margin around the visible grid area
pub const DEFAULT_LAZY_MARGIN: u32 = 50;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub log_file: String,
    /// Maximum number of image loads in flight at once
    pub max_concurrent_loads: usize,
    /// Upper bound on cached images (the viewer's priority set may exceed it)
    pub max_cache_entries: usize,
    /// How many photos on each side of the current one to warm
    pub preload_neighbor_radius: usize,
    pub preview_quality: PreviewQuality,
    /// Thumbnails within this distance of the viewport start loading
    pub lazy_margin: u32,
    /// External voting page; `{team}` is replaced with the team number
    pub vote_url: String,
    /// Path the gallery is served under, used when no address is given
    pub base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            log_file: "/dev/null".to_string(),
            max_concurrent_loads: DEFAULT_MAX_CONCURRENT,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            preload_neighbor_radius: 1,
            preview_quality: PreviewQuality::default(),
            lazy_margin: DEFAULT_LAZY_MARGIN,
            vote_url: String::new(),
            base_path: "/".to_string(),
        }
    }
}

impl Config {
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_concurrent: self.max_concurrent_loads,
            max_cache_entries: self.max_cache_entries,
        }
    }

    /// Voting page for a team, or None when voting is not configured
    pub fn vote_url_for(&self, team_number: u32) -> Option<String> {
        let url = self.vote_url.trim();
        if url.is_empty() {
            return None;
        }
        Some(url.replace("{team}", &team_number.to_string()))
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    let pgm = env!("CARGO_PKG_NAME");
    let xdg_dirs = BaseDirectories::with_prefix(pgm);
    let config_home = xdg_dirs.get_config_home()?;
    Some(config_home.join("config.toml"))
}

pub fn read() -> Config {
    let config_path = match get_config_path() {
        Some(path) => path,
        None => return Config::default(),
    };

    // Check if file exists
    if !config_path.exists() {
        return Config::default();
    }

    let content = match fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };

    toml::from_str(&content).unwrap_or_else(|_| Config::default())
}
