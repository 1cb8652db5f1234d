//! Test doubles for the viewer runtime.
//!
//! `MockLoader` serves bytes from memory and records every load it performs;
//! `RecordingSurface` captures what the runtime asks the surface to do.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::loader::{ImageHandle, ImageLoadError, ImageLoader, LoadResult};
use crate::url_sync::History;

use super::grid::GridModel;
use super::runtime::Runtime;
use super::state::{AppState, Modal};
use super::surface::Surface;

/// In-memory loader; every URL loads unless marked as failing
#[derive(Default)]
pub struct MockLoader {
    loads: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    url_delays: Mutex<HashMap<String, Duration>>,
}

impl MockLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Loader whose loads take `delay` to finish
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    /// Make loads of `url` take `delay`, overriding the loader-wide delay
    pub fn delay_url(&self, url: &str, delay: Duration) {
        self.url_delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn heal(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    /// URLs loaded so far, in start order
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    pub fn load_count(&self, url: &str) -> usize {
        self.loads.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl ImageLoader for MockLoader {
    async fn load(&self, url: &str) -> LoadResult {
        self.loads.lock().unwrap().push(url.to_string());
        let delay = self.url_delays.lock().unwrap().get(url).copied().or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(url) {
            return Err(ImageLoadError::NotFound(url.to_string()));
        }
        Ok(ImageHandle::new(url, url.as_bytes().to_vec()))
    }
}

/// Surface that records calls instead of drawing
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub rendered_cards: Option<usize>,
    pub viewer_updates: usize,
    pub last_modal: Modal,
    pub external: Vec<String>,
}

impl Surface for RecordingSurface {
    fn render(&mut self, grid: &GridModel) {
        self.rendered_cards = Some(grid.len());
    }

    fn update_viewer(&mut self, state: &AppState) {
        self.viewer_updates += 1;
        self.last_modal = state.viewer.active_modal;
    }

    fn open_external(&mut self, url: &str) {
        self.external.push(url.to_string());
    }
}

/// Let loader tasks run and feed their completions back until things go quiet
pub async fn settle<S: Surface, H: History>(runtime: &mut Runtime<S, H>) {
    let mut quiet_rounds = 0;
    for _ in 0..500 {
        tokio::time::sleep(Duration::from_millis(2)).await;
        let busy = runtime.queue().active_count() + runtime.queue().pending_count() > 0;
        if runtime.process_actions() == 0 && !busy {
            quiet_rounds += 1;
            if quiet_rounds >= 5 {
                return;
            }
        } else {
            quiet_rounds = 0;
        }
    }
}
