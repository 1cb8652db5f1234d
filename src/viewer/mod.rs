// Core modules
pub mod action;
pub mod effects;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod keys;
pub mod navigation;
pub mod reducer;
pub mod runtime;
pub mod state;
pub mod surface;
pub mod view;

#[cfg(test)]
pub mod testing;


pub use action::Action;
pub use effects::Effect;
pub use error::{NavigationError, NavigationResult};
pub use keys::key_to_action;
pub use reducer::reduce;
pub use runtime::Runtime;
pub use state::{AppState, Modal, PhotoStatus};
pub use surface::{Surface, TerminalSurface};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEvent, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::loader::FsImageLoader;
use crate::url_sync::MemoryHistory;
use gesture::{PointerEvent, PointerPhase};
use grid::CARD_WIDTH;

/// Rows scrolled per mouse wheel notch over the grid
const WHEEL_SCROLL_ROWS: i32 = 3;

/// Title bar plus status bar
const CHROME_ROWS: u16 = 2;

/// Translate a mouse event into an action
///
/// Left button drives the gesture controller while the viewer is open; over
/// the grid a click opens the thumbnail under the cursor.
fn mouse_to_action(mouse: MouseEvent, runtime: &Runtime<TerminalSurface, MemoryHistory>) -> Option<Action> {
    let open = runtime.state().viewer.viewing().is_some();
    let (x, y) = (mouse.column as f32, mouse.row as f32);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if open => {
            Some(Action::Pointer(PointerEvent::new(0, PointerPhase::Down, x, y)))
        }
        MouseEventKind::Drag(MouseButton::Left) if open => {
            Some(Action::Pointer(PointerEvent::new(0, PointerPhase::Move, x, y)))
        }
        MouseEventKind::Up(MouseButton::Left) if open => {
            Some(Action::Pointer(PointerEvent::new(0, PointerPhase::Up, x, y)))
        }
        MouseEventKind::Down(MouseButton::Left) if !runtime.state().viewer.is_open() => {
            let photo = runtime.surface().hit_test(mouse.column, mouse.row)?;
            tracing::debug!("MOUSE: Click on team {} photo {}", photo.team, photo.photo);
            Some(Action::OpenGallery {
                team: photo.team,
                photo: photo.photo,
            })
        }
        MouseEventKind::ScrollUp if open => Some(Action::Wheel { delta_y: -1.0 }),
        MouseEventKind::ScrollDown if open => Some(Action::Wheel { delta_y: 1.0 }),
        MouseEventKind::ScrollUp => Some(Action::ScrollGrid(-WHEEL_SCROLL_ROWS)),
        MouseEventKind::ScrollDown => Some(Action::ScrollGrid(WHEEL_SCROLL_ROWS)),
        _ => None,
    }
}

/// Main entry point for the interactive gallery
pub async fn run(
    dataset: Dataset,
    config: Config,
    images_dir: PathBuf,
    initial_url: Option<String>,
) -> Result<(), io::Error> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let loader = Arc::new(FsImageLoader::new(images_dir));
    let history = MemoryHistory::new(initial_url.unwrap_or_else(|| config.base_path.clone()));
    let initial_state = AppState::new(dataset, config);

    let mut runtime = Runtime::new(initial_state, loader, history, TerminalSurface::new());
    runtime.start();

    // Main loop
    loop {
        // Process completions first so finished loads show on this frame
        let actions_processed = runtime.process_actions();
        if actions_processed > 0 {
            tracing::debug!("LOOP: Processed {} actions", actions_processed);
        }

        terminal.draw(|f| {
            let area = f.area();

            let cards_per_row = (area.width / CARD_WIDTH).max(1) as usize;
            let height = area.height.saturating_sub(CHROME_ROWS) as u32;
            let grid = &runtime.state().grid;
            if cards_per_row != grid.layout.cards_per_row() || height != grid.viewport_height {
                tracing::debug!(
                    "DRAW: viewport changed: {} rows, {} cards per row",
                    height,
                    cards_per_row
                );
                runtime.dispatch(Action::UpdateViewport {
                    height,
                    cards_per_row,
                });
            }

            runtime.draw(f);
        })?;

        if actions_processed > 0 {
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            let action = match event::read()? {
                Event::Key(key) => key_to_action(key, runtime.state()),
                Event::Mouse(mouse) => mouse_to_action(mouse, &runtime),
                _ => None,
            };

            let should_quit = matches!(action, Some(Action::Quit));

            if let Some(act) = action {
                runtime.dispatch(act);
            }

            if should_quit {
                tracing::debug!("ACTION: Quitting application");
                break;
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
