use ratatui::layout::{Position, Rect};
use ratatui::Frame;
use tracing::info;

use crate::dataset::PhotoRef;

use super::grid::GridModel;
use super::state::AppState;
use super::view;

/// Presentation capability the runtime drives
///
/// `render` paints the grid once after the dataset is known; `update_viewer`
/// is called after every state change.
pub trait Surface {
    fn render(&mut self, grid: &GridModel);

    fn update_viewer(&mut self, state: &AppState);

    /// Open a page outside the gallery (vote link)
    fn open_external(&mut self, url: &str);
}

/// Clickable region mapped to the photo it opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    pub area: Rect,
    pub photo: PhotoRef,
}

/// Terminal surface drawn with ratatui
#[derive(Debug, Default)]
pub struct TerminalSurface {
    grid: GridModel,
    hitboxes: Vec<Hitbox>,
    external: Vec<String>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, frame: &mut Frame, state: &AppState) {
        self.hitboxes = view::draw(frame, state, &self.grid);
    }

    /// Photo under a terminal cell, if a thumbnail was drawn there
    pub fn hit_test(&self, column: u16, row: u16) -> Option<PhotoRef> {
        let position = Position::new(column, row);
        self.hitboxes
            .iter()
            .find(|h| h.area.contains(position))
            .map(|h| h.photo)
    }

    /// Pages the user asked to open, most recent last
    pub fn external_pages(&self) -> &[String] {
        &self.external
    }
}

impl Surface for TerminalSurface {
    fn render(&mut self, grid: &GridModel) {
        self.grid = grid.clone();
    }

    // Redrawn every loop iteration from runtime state
    fn update_viewer(&mut self, _state: &AppState) {}

    fn open_external(&mut self, url: &str) {
        info!("SURFACE: Opening external page {}", url);
        self.external.push(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_test() {
        let mut surface = TerminalSurface::new();
        surface.hitboxes = vec![Hitbox {
            area: Rect::new(2, 3, 10, 2),
            photo: PhotoRef::new(5, 2),
        }];

        assert_eq!(surface.hit_test(2, 3), Some(PhotoRef::new(5, 2)));
        assert_eq!(surface.hit_test(11, 4), Some(PhotoRef::new(5, 2)));
        assert_eq!(surface.hit_test(12, 4), None);
        assert_eq!(surface.hit_test(2, 5), None);
    }

    #[test]
    fn test_open_external_records_page() {
        let mut surface = TerminalSurface::new();

        surface.open_external("https://vote.example.com/?team=1");

        assert_eq!(surface.external_pages(), &["https://vote.example.com/?team=1"]);
    }
}
