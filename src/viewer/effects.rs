use crate::dataset::PhotoRef;
use crate::preload::Priority;

use super::action::Action;

/// Who receives the result of an image request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    /// The photo in the viewer; resolves through the stale check
    Photo,
    /// A grid cell
    Thumbnail(PhotoRef),
    /// Cache warming only; nobody waits on it
    Preload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub url: String,
    pub priority: Priority,
    pub target: ImageTarget,
}

impl ImageRequest {
    pub fn new(url: impl Into<String>, priority: Priority, target: ImageTarget) -> Self {
        Self {
            url: url.into(),
            priority,
            target,
        }
    }
}

/// Side effects returned by the reducer and executed by the runtime
#[derive(Debug)]
pub enum Effect {
    None,
    Action(Action),
    Batch(Vec<Effect>),
    /// Submit requests to the preload queue as one batch
    RequestImages(Vec<ImageRequest>),
    /// Drop the cached entry and load again
    RefreshImage(ImageRequest),
    /// Protect the current photo and its neighbors from eviction
    SetPrioritySet {
        current: Option<String>,
        urls: Vec<String>,
    },
    /// Write `?team=T&photo=P` over the current history entry
    ReplaceUrl(PhotoRef),
    /// New history entry with the query cleared
    PushBareUrl,
    OpenExternal(String),
}

impl Effect {
    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Flatten nested batches into a list, dropping `None`
    pub fn flatten(self) -> Vec<Effect> {
        match self {
            Effect::None => Vec::new(),
            Effect::Batch(effects) => effects.into_iter().flat_map(Effect::flatten).collect(),
            other => vec![other],
        }
    }
}
