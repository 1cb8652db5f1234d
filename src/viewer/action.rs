use crate::dataset::PhotoRef;
use crate::loader::{ImageLoadError, LoadResult};
use crate::preload::LoadTicket;

use super::gesture::PointerEvent;

/// Global actions
///
/// All state changes happen through actions, dispatched from:
/// - User input (keys, mouse)
/// - Load completions posted back by loader tasks
/// - Address changes (restore, back/forward)
#[derive(Debug)]
pub enum Action {
    // Viewer actions
    OpenGallery { team: u32, photo: usize },
    NavigatePhoto(i32),
    NavigateTeam(i32),
    Rotate(i32),
    Zoom(f32),
    ResetZoom,
    OpenStats,
    OpenTeamDetails,
    CloseTeamDetails,
    ToggleInfo,
    Close,
    /// ESC: step back one level, closing the viewer at the top
    NavigateBack,
    ReloadPhoto,
    Vote,

    // Grid actions
    MoveSelection { dx: i32, dy: i32 },
    ActivateSelection,
    ScrollGrid(i32),
    UpdateViewport { height: u32, cards_per_row: usize },

    // Address actions
    /// Apply the position parsed from the address; None closes without writing history
    RestoreFromUrl(Option<PhotoRef>),
    HistoryBack,
    HistoryForward,

    // Loading (from loader tasks)
    LoadFinished(LoadTicket, LoadResult),
    PhotoResolved { url: String, result: LoadResult },
    ThumbnailResolved {
        photo: PhotoRef,
        /// Byte size on success
        result: Result<usize, ImageLoadError>,
    },

    // Input
    Pointer(PointerEvent),
    Wheel { delta_y: f32 },

    // System
    Quit,
}
