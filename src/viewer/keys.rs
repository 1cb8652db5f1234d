/// Keyboard event to action mapping
///
/// This module handles converting crossterm KeyEvents into viewer Actions.
/// Which keys apply depends on the active modal; a few keys are global.
use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use super::action::Action;
use super::state::{AppState, Modal};

/// Scale change per zoom key press
pub const KEY_ZOOM_STEP: f32 = 0.25;

/// Rows scrolled per PageUp/PageDown
const PAGE_SCROLL: i32 = 10;

/// Handle global keys that work regardless of modal state
fn handle_global_keys(key_code: KeyCode) -> Option<Action> {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::OpenStats),
        KeyCode::Char('[') => Some(Action::HistoryBack),
        KeyCode::Char(']') => Some(Action::HistoryForward),
        _ => None,
    }
}

/// Grid navigation when no modal is open
fn handle_grid_keys(key_code: KeyCode) -> Option<Action> {
    match key_code {
        KeyCode::Left => Some(Action::MoveSelection { dx: -1, dy: 0 }),
        KeyCode::Right => Some(Action::MoveSelection { dx: 1, dy: 0 }),
        KeyCode::Up => Some(Action::MoveSelection { dx: 0, dy: -1 }),
        KeyCode::Down => Some(Action::MoveSelection { dx: 0, dy: 1 }),
        KeyCode::PageUp => Some(Action::ScrollGrid(-PAGE_SCROLL)),
        KeyCode::PageDown => Some(Action::ScrollGrid(PAGE_SCROLL)),
        KeyCode::Enter => Some(Action::ActivateSelection),
        _ => None,
    }
}

/// Photo viewer keys
fn handle_gallery_keys(key_code: KeyCode) -> Option<Action> {
    match key_code {
        KeyCode::Left => Some(Action::NavigatePhoto(-1)),
        KeyCode::Right => Some(Action::NavigatePhoto(1)),
        KeyCode::Up => Some(Action::NavigateTeam(-1)),
        KeyCode::Down => Some(Action::NavigateTeam(1)),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Rotate(90)),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Action::Rotate(-90)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(KEY_ZOOM_STEP)),
        KeyCode::Char('-') => Some(Action::Zoom(-KEY_ZOOM_STEP)),
        KeyCode::Char('0') => Some(Action::ResetZoom),
        KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::ToggleInfo),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(Action::Vote),
        KeyCode::F(5) => Some(Action::ReloadPhoto),
        _ => None,
    }
}

fn handle_team_details_keys(key_code: KeyCode) -> Option<Action> {
    match key_code {
        KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::CloseTeamDetails),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(Action::Vote),
        _ => None,
    }
}

pub fn key_to_action(key: KeyEvent, state: &AppState) -> Option<Action> {
    let modal = state.viewer.active_modal;

    if key.code == KeyCode::Esc {
        if modal == Modal::None {
            debug!("KEY: ESC pressed at grid - ignoring (use 'q' to quit)");
            return None;
        }
        debug!("KEY: ESC pressed in {:?}", modal);
        return Some(Action::NavigateBack);
    }

    if let Some(action) = handle_global_keys(key.code) {
        return Some(action);
    }

    match modal {
        Modal::None => handle_grid_keys(key.code),
        Modal::Gallery => handle_gallery_keys(key.code),
        Modal::TeamDetails => handle_team_details_keys(key.code),
        Modal::Stats => None,
    }
}
