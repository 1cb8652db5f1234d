/// Address bar synchronisation
///
/// The viewer position is mirrored into `?team=T&photo=P`. Navigation inside
/// the viewer replaces the current history entry; closing the viewer pushes
/// the bare path so "closed" and "viewing" are separate back-history entries.
use tracing::{debug, trace};

use crate::dataset::PhotoRef;

pub const TEAM_PARAM: &str = "team";
pub const PHOTO_PARAM: &str = "photo";

/// Path portion of an address (everything before `?` or `#`)
pub fn path_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}

fn query_of(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or_default();
    without_fragment
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or_default()
}

/// Read the viewer position from an address
///
/// Both parameters must be present and positive integers; otherwise the
/// address does not describe a viewer position.
pub fn parse_location(url: &str) -> Option<PhotoRef> {
    let mut team = None;
    let mut photo = None;

    for pair in query_of(url).split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            TEAM_PARAM => team = value.trim().parse::<u32>().ok().filter(|&t| t > 0),
            PHOTO_PARAM => photo = value.trim().parse::<usize>().ok().filter(|&p| p > 0),
            _ => {}
        }
    }

    let location = Some(PhotoRef::new(team?, photo?));
    trace!("URL: Parsed {:?} from {}", location, url);
    location
}

/// Address for viewing `photo`, keeping the current path
pub fn viewer_url(current: &str, photo: PhotoRef) -> String {
    format!(
        "{}?{}={}&{}={}",
        path_of(current),
        TEAM_PARAM,
        photo.team,
        PHOTO_PARAM,
        photo.photo
    )
}

/// Address with the query string cleared
pub fn bare_url(current: &str) -> String {
    path_of(current).to_string()
}

/// Browser-style session history
pub trait History {
    fn current(&self) -> &str;

    /// Overwrite the current entry
    fn replace(&mut self, url: String);

    /// Add a new entry after the current one, discarding forward entries
    fn push(&mut self, url: String);

    /// Move back one entry, returning the new current address
    fn back(&mut self) -> Option<&str>;

    /// Move forward one entry, returning the new current address
    fn forward(&mut self) -> Option<&str>;
}

/// In-process history used by the terminal front end and tests
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl History for MemoryHistory {
    fn current(&self) -> &str {
        &self.entries[self.index]
    }

    fn replace(&mut self, url: String) {
        debug!("URL: Replace {}", url);
        self.entries[self.index] = url;
    }

    fn push(&mut self, url: String) {
        debug!("URL: Push {}", url);
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }
}
