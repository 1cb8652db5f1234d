use thiserror::Error;

/// Rejected viewer transitions
///
/// None of these are fatal: the reducer leaves the state unchanged and shows
/// the message in the status bar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Team {0} does not exist")]
    UnknownTeam(u32),

    #[error("Team {0} has no photos")]
    NoPhotos(u32),

    #[error("The photo viewer is not open")]
    NotOpen,

    #[error("Team details are only available from the photo viewer")]
    DetailsRequireGallery,
}

/// Result type for viewer navigation
pub type NavigationResult<T> = Result<T, NavigationError>;
