use crate::config::Config;
use crate::dataset::{Dataset, PhotoRef};
use crate::loader::ImageHandle;

use super::gesture::GestureController;
use super::grid::GridState;

pub const MIN_SCALE: f32 = 0.3;
pub const MAX_SCALE: f32 = 5.0;

pub const DEFAULT_STATUS_MESSAGE: &str =
    "Keys: ←→ photo | ↑↓ team | r/l rotate | +/-/0 zoom | i info | s stats | v vote | ESC close | q quit";

/// Which overlay is showing; `None` means only the grid is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    Gallery,
    Stats,
    TeamDetails,
}

/// Photo display transform: scale, then translate by pan / scale, then rotate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    /// Degrees, always in `0..360`
    pub rotation: u16,
    pub pan: (f32, f32),
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0,
            pan: (0.0, 0.0),
        }
    }
}

impl Transform {
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        if self.scale <= 1.0 {
            self.pan = (0.0, 0.0);
        }
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.set_scale(self.scale + delta);
    }

    pub fn rotate(&mut self, degrees: i32) {
        self.rotation = (self.rotation as i32 + degrees).rem_euclid(360) as u16;
    }

    /// Pan only applies while zoomed in
    pub fn set_pan(&mut self, x: f32, y: f32) {
        if self.scale > 1.0 {
            self.pan = (x, y);
        }
    }

    /// CSS transform string for web hosts
    pub fn css(&self) -> String {
        format!(
            "scale({}) translate({}px, {}px) rotate({}deg)",
            self.scale,
            self.pan.0 / self.scale,
            self.pan.1 / self.scale,
            self.rotation
        )
    }
}

/// Display status of the current photo
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PhotoStatus {
    #[default]
    Idle,
    Loading,
    Ready(ImageHandle),
    /// Load failed; carries the reason for the status line
    Placeholder(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerState {
    pub current: Option<PhotoRef>,
    pub transform: Transform,
    pub active_modal: Modal,
    pub photo: PhotoStatus,
}

impl ViewerState {
    pub fn is_open(&self) -> bool {
        self.active_modal != Modal::None
    }

    /// Photo shown in the gallery (or beneath team details)
    pub fn viewing(&self) -> Option<PhotoRef> {
        match self.active_modal {
            Modal::Gallery | Modal::TeamDetails => self.current,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemState {
    pub config: Config,
    pub status_message: Option<String>,
    pub status_is_error: bool,
}

impl SystemState {
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_is_error = false;
    }

    pub fn set_status_error_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_is_error = true;
    }

    pub fn reset_status_message(&mut self) {
        self.status_message = Some(DEFAULT_STATUS_MESSAGE.to_string());
        self.status_is_error = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub data: Dataset,
    pub viewer: ViewerState,
    pub grid: GridState,
    pub gesture: GestureController,
    pub system: SystemState,
}

impl AppState {
    pub fn new(data: Dataset, config: Config) -> Self {
        let grid = GridState::new(&data, config.lazy_margin);
        let mut system = SystemState {
            config,
            ..Default::default()
        };
        system.reset_status_message();
        Self {
            data,
            grid,
            system,
            ..Default::default()
        }
    }

    /// Image URL of the photo currently in the viewer
    pub fn current_url(&self) -> Option<&str> {
        self.viewer
            .viewing()
            .and_then(|p| self.data.photo_url(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_clamped() {
        let mut t = Transform::default();
        t.set_scale(9.0);
        assert_eq!(t.scale, MAX_SCALE);

        t.set_scale(0.01);
        assert_eq!(t.scale, MIN_SCALE);
    }

    #[test]
    fn test_pan_reset_when_zoomed_out() {
        let mut t = Transform::default();
        t.set_scale(2.0);
        t.set_pan(10.0, -4.0);
        assert_eq!(t.pan, (10.0, -4.0));

        t.set_scale(1.0);
        assert_eq!(t.pan, (0.0, 0.0));
    }

    #[test]
    fn test_pan_ignored_at_base_scale() {
        let mut t = Transform::default();
        t.set_pan(10.0, 10.0);
        assert_eq!(t.pan, (0.0, 0.0));
    }

    #[test]
    fn test_rotation_normalized() {
        let mut t = Transform::default();
        t.rotate(-90);
        assert_eq!(t.rotation, 270);

        for _ in 0..5 {
            t.rotate(90);
        }
        assert_eq!(t.rotation, 0);
    }

    #[test]
    fn test_css_order() {
        let mut t = Transform::default();
        t.set_scale(2.0);
        t.set_pan(10.0, 20.0);
        t.rotate(90);

        assert_eq!(t.css(), "scale(2) translate(5px, 10px) rotate(90deg)");
    }

    #[test]
    fn test_set_status_message_overwrites_error_flag() {
        let mut state = SystemState::default();

        state.set_status_error_message("Error".to_string());
        assert!(state.status_is_error);

        state.set_status_message("Normal message".to_string());
        assert_eq!(state.status_message, Some("Normal message".to_string()));
        assert!(!state.status_is_error);
    }
}
