/// Photo and team stepping over the dataset
///
/// All teams with at least one image form a single cyclic photo sequence
/// ordered by team number, then photo index. Teams without images are never
/// landed on.
use crate::dataset::{Dataset, PhotoRef, TeamRecord};

use super::error::{NavigationError, NavigationResult};

/// Teams that can be shown in the viewer, sorted by team number
pub fn navigable_teams(dataset: &Dataset) -> Vec<&TeamRecord> {
    dataset.sorted_teams().filter(|t| t.has_photos()).collect()
}

/// Validate an open request, clamping the photo index into range
pub fn resolve_target(dataset: &Dataset, team: u32, photo: usize) -> NavigationResult<PhotoRef> {
    let record = dataset.team(team).ok_or(NavigationError::UnknownTeam(team))?;
    if !record.has_photos() {
        return Err(NavigationError::NoPhotos(team));
    }
    let photo = photo.clamp(1, record.photo_count());
    Ok(PhotoRef::new(team, photo))
}

fn team_index(teams: &[&TeamRecord], team: u32) -> Option<usize> {
    teams.binary_search_by_key(&team, |t| t.team_number).ok()
}

fn wrap(index: usize, delta: i64, len: usize) -> usize {
    (index as i64 + delta).rem_euclid(len as i64) as usize
}

fn step_once(teams: &[&TeamRecord], at: PhotoRef, forward: bool) -> Option<PhotoRef> {
    let idx = team_index(teams, at.team)?;
    let count = teams[idx].photo_count();

    if forward {
        if at.photo < count {
            return Some(PhotoRef::new(at.team, at.photo + 1));
        }
        let next = teams[wrap(idx, 1, teams.len())];
        Some(PhotoRef::new(next.team_number, 1))
    } else {
        if at.photo > 1 {
            return Some(PhotoRef::new(at.team, at.photo - 1));
        }
        let prev = teams[wrap(idx, -1, teams.len())];
        Some(PhotoRef::new(prev.team_number, prev.photo_count()))
    }
}

/// Move `delta` photos through the cyclic sequence
///
/// Returns None when `at` is not a navigable team.
pub fn step_photo(dataset: &Dataset, at: PhotoRef, delta: i32) -> Option<PhotoRef> {
    let teams = navigable_teams(dataset);
    let mut position = at;
    for _ in 0..delta.unsigned_abs() {
        position = step_once(&teams, position, delta > 0)?;
    }
    Some(position)
}

/// First photo of the team `delta` steps away in team-number order
pub fn step_team(dataset: &Dataset, team: u32, delta: i32) -> Option<PhotoRef> {
    let teams = navigable_teams(dataset);
    let idx = team_index(&teams, team)?;
    let target = teams[wrap(idx, delta as i64, teams.len())];
    Some(PhotoRef::new(target.team_number, 1))
}

/// Photos worth warming around the current one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Neighborhood {
    /// Previous/next photos in the cyclic sequence, nearest first
    pub sequence: Vec<PhotoRef>,
    /// Leading photos of the previous and next teams
    pub team_heads: Vec<PhotoRef>,
}

impl Neighborhood {
    pub fn all(&self) -> impl Iterator<Item = PhotoRef> + '_ {
        self.sequence.iter().chain(self.team_heads.iter()).copied()
    }
}

/// Number of leading photos of each adjacent team to warm
const TEAM_HEAD_PHOTOS: usize = 2;

pub fn neighborhood(dataset: &Dataset, at: PhotoRef, radius: usize) -> Neighborhood {
    let teams = navigable_teams(dataset);
    let mut result = Neighborhood::default();
    let mut seen = vec![at];

    let mut push = |list: &mut Vec<PhotoRef>, photo: PhotoRef| {
        if !seen.contains(&photo) {
            seen.push(photo);
            list.push(photo);
        }
    };

    let mut ahead = at;
    let mut behind = at;
    for _ in 0..radius {
        if let Some(next) = step_once(&teams, ahead, true) {
            ahead = next;
            push(&mut result.sequence, next);
        }
        if let Some(prev) = step_once(&teams, behind, false) {
            behind = prev;
            push(&mut result.sequence, prev);
        }
    }

    if let Some(idx) = team_index(&teams, at.team) {
        for delta in [-1, 1] {
            let team = teams[wrap(idx, delta, teams.len())];
            for photo in 1..=team.photo_count().min(TEAM_HEAD_PHOTOS) {
                push(&mut result.team_heads, PhotoRef::new(team.team_number, photo));
            }
        }
    }

    result
}
