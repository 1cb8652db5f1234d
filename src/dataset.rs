/// Team dataset - the immutable roster and photo list the gallery presents
///
/// The dataset is produced by an external conversion step (spreadsheet export
/// to `teams.toml`) and loaded once at startup. After loading it is never
/// mutated; clones share the same backing storage.
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Number of photos every submission is expected to contain
pub const EXPECTED_PHOTOS_PER_TEAM: usize = 4;

/// One contest entrant: roster plus submitted photo set
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamRecord {
    pub team_number: u32,
    pub team_name: String,
    pub members: Vec<String>,
    pub course: String,
    pub batch: String,
    pub semester: u32,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub upload_time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TeamRecord {
    pub fn photo_count(&self) -> usize {
        self.images.len()
    }

    pub fn has_photos(&self) -> bool {
        !self.images.is_empty()
    }

    /// Image URL for a 1-based photo index
    pub fn image(&self, photo: usize) -> Option<&str> {
        photo
            .checked_sub(1)
            .and_then(|idx| self.images.get(idx))
            .map(|s| s.as_str())
    }

    /// True when fewer than the expected number of photos were submitted
    pub fn is_incomplete(&self) -> bool {
        self.images.len() < EXPECTED_PHOTOS_PER_TEAM
    }
}

/// A single photo position in the gallery: team number plus 1-based photo index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoRef {
    pub team: u32,
    pub photo: usize,
}

impl PhotoRef {
    pub fn new(team: u32, photo: usize) -> Self {
        Self { team, photo }
    }
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("team number must be positive (team '{0}')")]
    InvalidTeamNumber(String),

    #[error("duplicate team number {0}")]
    DuplicateTeam(u32),

    #[error("team {0} has no members")]
    NoMembers(u32),

    #[error("team {0} has an invalid semester")]
    InvalidSemester(u32),
}

#[derive(Deserialize)]
struct DatasetFile {
    #[serde(default)]
    teams: Vec<TeamRecord>,
}

/// Ordered, validated, immutable collection of teams
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    teams: Arc<[TeamRecord]>,
    /// Indices into `teams`, sorted by team number
    by_number: Arc<[usize]>,
}

impl Dataset {
    /// Validate and freeze a list of team records
    ///
    /// Blank image entries are dropped so the remaining list is dense.
    pub fn from_teams(teams: Vec<TeamRecord>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        let mut cleaned = Vec::with_capacity(teams.len());

        for mut team in teams {
            if team.team_number == 0 {
                return Err(DatasetError::InvalidTeamNumber(team.team_name));
            }
            if !seen.insert(team.team_number) {
                return Err(DatasetError::DuplicateTeam(team.team_number));
            }
            team.members.retain(|m| !m.trim().is_empty());
            if team.members.is_empty() {
                return Err(DatasetError::NoMembers(team.team_number));
            }
            if team.semester == 0 {
                return Err(DatasetError::InvalidSemester(team.team_number));
            }
            team.images.retain(|url| !url.trim().is_empty());
            cleaned.push(team);
        }

        let mut by_number: Vec<usize> = (0..cleaned.len()).collect();
        by_number.sort_by_key(|&idx| cleaned[idx].team_number);

        Ok(Self {
            teams: cleaned.into(),
            by_number: by_number.into(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DatasetError> {
        let file: DatasetFile = toml::from_str(content)?;
        Self::from_teams(file.teams)
    }

    /// Load a dataset from a `teams.toml` file
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_toml_str(&content)?;
        tracing::info!("DATASET: Loaded {} teams from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Teams in dataset (display) order
    pub fn teams(&self) -> &[TeamRecord] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn team(&self, team_number: u32) -> Option<&TeamRecord> {
        self.by_number
            .binary_search_by_key(&team_number, |&idx| self.teams[idx].team_number)
            .ok()
            .map(|pos| &self.teams[self.by_number[pos]])
    }

    /// Teams sorted by team number ascending
    pub fn sorted_teams(&self) -> impl Iterator<Item = &TeamRecord> + '_ {
        self.by_number.iter().map(move |&idx| &self.teams[idx])
    }

    /// Image URL for a photo position, if it exists
    pub fn photo_url(&self, photo: PhotoRef) -> Option<&str> {
        self.team(photo.team).and_then(|t| t.image(photo.photo))
    }

    pub fn total_photos(&self) -> usize {
        self.teams.iter().map(|t| t.photo_count()).sum()
    }
}
