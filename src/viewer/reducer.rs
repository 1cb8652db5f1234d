use tracing::{debug, warn};

use crate::dataset::PhotoRef;
use crate::preload::{PRIORITY_ADJACENT_TEAM, PRIORITY_CURRENT, PRIORITY_NEIGHBOR, PRIORITY_THUMBNAIL};

use super::action::Action;
use super::effects::{Effect, ImageRequest, ImageTarget};
use super::error::{NavigationError, NavigationResult};
use super::gesture::{GestureOutcome, TransformUpdate};
use super::grid::ThumbnailStatus;
use super::navigation::{neighborhood, resolve_target, step_photo, step_team};
use super::state::{AppState, Modal, PhotoStatus, Transform, ViewerState};

/// Pure state reducer
///
/// Takes the current state and an action, returns the new state and an
/// effect. No I/O happens here; image loads, address writes and external
/// pages are all described as `Effect`s for the runtime to execute.
///
/// Ownership is passed through the sub-reducer chain to avoid cloning:
/// - Each sub-reducer returns Ok((state, effect)) if it handled the action
/// - Or Err(state) to pass ownership back for the next reducer to try
pub fn reduce(state: AppState, action: Action) -> (AppState, Effect) {
    let state = match reduce_viewer(state, &action) {
        Ok(result) => return result,
        Err(state) => state,
    };

    let state = match reduce_grid(state, &action) {
        Ok(result) => return result,
        Err(state) => state,
    };

    let state = match reduce_input(state, &action) {
        Ok(result) => return result,
        Err(state) => state,
    };

    match action {
        Action::PhotoResolved { url, result } => {
            let mut new_state = state;
            if new_state.current_url() != Some(url.as_str()) {
                debug!("VIEWER: Discarding stale result for {}", url);
                return (new_state, Effect::None);
            }
            new_state.viewer.photo = match result {
                Ok(handle) => {
                    new_state.viewer.transform.pan = (0.0, 0.0);
                    PhotoStatus::Ready(handle)
                }
                Err(e) => {
                    warn!("VIEWER: Showing placeholder for {}: {}", url, e);
                    PhotoStatus::Placeholder(e.to_string())
                }
            };
            (new_state, Effect::None)
        }

        Action::ThumbnailResolved { photo, result } => {
            let mut new_state = state;
            let status = match result {
                Ok(bytes) => ThumbnailStatus::Loaded { bytes },
                Err(e) => {
                    debug!("GRID: Thumbnail {:?} unavailable: {}", photo, e);
                    ThumbnailStatus::Placeholder
                }
            };
            new_state.grid.thumbnails.insert(photo, status);
            (new_state, Effect::None)
        }

        // Queue completions and history moves are owned by the runtime
        Action::LoadFinished(..) | Action::HistoryBack | Action::HistoryForward => {
            (state, Effect::None)
        }

        Action::Quit => (state, Effect::None),

        _ => (state, Effect::None),
    }
}

type Reduced = Result<(AppState, Effect), AppState>;

fn reject(mut state: AppState, error: NavigationError) -> (AppState, Effect) {
    debug!("VIEWER: Rejected: {}", error);
    state.system.set_status_error_message(error.to_string());
    (state, Effect::None)
}

fn in_gallery(state: &AppState) -> NavigationResult<PhotoRef> {
    match (state.viewer.active_modal, state.viewer.current) {
        (Modal::Gallery, Some(current)) => Ok(current),
        _ => Err(NavigationError::NotOpen),
    }
}

/// Effects warming the cache around `target` and pinning it against eviction
fn preload_effects(state: &AppState, target: PhotoRef) -> Effect {
    let Some(url) = state.data.photo_url(target) else {
        return Effect::None;
    };
    let radius = state.system.config.preload_neighbor_radius;
    let hood = neighborhood(&state.data, target, radius);

    let mut requests = vec![ImageRequest::new(url, PRIORITY_CURRENT, ImageTarget::Photo)];
    let mut protected = Vec::new();

    let tiers = [
        (&hood.sequence, PRIORITY_NEIGHBOR),
        (&hood.team_heads, PRIORITY_ADJACENT_TEAM),
    ];
    for (photos, priority) in tiers {
        for neighbor in photos.iter().filter_map(|p| state.data.photo_url(*p)) {
            requests.push(ImageRequest::new(neighbor, priority, ImageTarget::Preload));
            protected.push(neighbor.to_string());
        }
    }

    Effect::Batch(vec![
        Effect::SetPrioritySet {
            current: Some(url.to_string()),
            urls: protected,
        },
        Effect::RequestImages(requests),
    ])
}

/// Show `target` in the gallery with a fresh transform
fn show_photo(mut state: AppState, target: PhotoRef) -> (AppState, Effect) {
    debug!("VIEWER: Showing team {} photo {}", target.team, target.photo);
    state.viewer = ViewerState {
        current: Some(target),
        active_modal: Modal::Gallery,
        photo: PhotoStatus::Loading,
        ..Default::default()
    };
    state.gesture.reset();

    let effect = Effect::Batch(vec![preload_effects(&state, target), Effect::ReplaceUrl(target)]);
    (state, effect)
}

fn open_gallery(state: AppState, team: u32, photo: usize) -> (AppState, Effect) {
    match resolve_target(&state.data, team, photo) {
        Ok(target) => show_photo(state, target),
        Err(e) => reject(state, e),
    }
}

/// Leave the viewer for `modal`; only leaving a viewed photo writes history
fn close_viewer(mut state: AppState, modal: Modal, write_history: bool) -> (AppState, Effect) {
    let write_history = write_history && state.viewer.viewing().is_some();
    debug!("VIEWER: Closing to {:?} (write_history={})", modal, write_history);
    state.viewer = ViewerState {
        active_modal: modal,
        ..Default::default()
    };
    state.gesture.reset();

    let mut effects = vec![Effect::SetPrioritySet {
        current: None,
        urls: Vec::new(),
    }];
    if write_history {
        effects.push(Effect::PushBareUrl);
    }
    (state, Effect::Batch(effects))
}

fn step(state: AppState, next: impl FnOnce(&AppState, PhotoRef) -> Option<PhotoRef>) -> (AppState, Effect) {
    let current = match in_gallery(&state) {
        Ok(current) => current,
        Err(e) => return reject(state, e),
    };
    match next(&state, current) {
        Some(target) if target != current => show_photo(state, target),
        _ => (state, Effect::None),
    }
}

fn with_transform(mut state: AppState, apply: impl FnOnce(&mut Transform)) -> (AppState, Effect) {
    if let Err(e) = in_gallery(&state) {
        return reject(state, e);
    }
    apply(&mut state.viewer.transform);
    (state, Effect::None)
}

fn reduce_viewer(state: AppState, action: &Action) -> Reduced {
    let result = match action {
        Action::OpenGallery { team, photo } => open_gallery(state, *team, *photo),

        Action::NavigatePhoto(delta) => {
            step(state, |s, at| step_photo(&s.data, at, *delta))
        }

        Action::NavigateTeam(delta) => {
            step(state, |s, at| step_team(&s.data, at.team, *delta))
        }

        Action::Rotate(degrees) => with_transform(state, |t| t.rotate(*degrees)),
        Action::Zoom(delta) => with_transform(state, |t| t.zoom_by(*delta)),
        Action::ResetZoom => with_transform(state, |t| t.set_scale(1.0)),

        Action::OpenStats => close_viewer(state, Modal::Stats, true),

        Action::OpenTeamDetails => {
            if state.viewer.active_modal != Modal::Gallery {
                return Ok(reject(state, NavigationError::DetailsRequireGallery));
            }
            let mut new_state = state;
            new_state.viewer.active_modal = Modal::TeamDetails;
            (new_state, Effect::None)
        }

        Action::CloseTeamDetails => {
            let mut new_state = state;
            if new_state.viewer.active_modal == Modal::TeamDetails {
                new_state.viewer.active_modal = Modal::Gallery;
            }
            (new_state, Effect::None)
        }

        Action::ToggleInfo => {
            let next = match state.viewer.active_modal {
                Modal::Gallery => Modal::TeamDetails,
                Modal::TeamDetails => Modal::Gallery,
                _ => return Ok(reject(state, NavigationError::DetailsRequireGallery)),
            };
            let mut new_state = state;
            new_state.viewer.active_modal = next;
            (new_state, Effect::None)
        }

        Action::Close => close_viewer(state, Modal::None, true),

        Action::NavigateBack => match state.viewer.active_modal {
            Modal::TeamDetails => {
                let mut new_state = state;
                new_state.viewer.active_modal = Modal::Gallery;
                (new_state, Effect::None)
            }
            Modal::None => (state, Effect::None),
            Modal::Gallery | Modal::Stats => close_viewer(state, Modal::None, true),
        },

        Action::ReloadPhoto => {
            let Some(url) = state.current_url().map(str::to_string) else {
                return Ok(reject(state, NavigationError::NotOpen));
            };
            let mut new_state = state;
            new_state.viewer.photo = PhotoStatus::Loading;
            let request = ImageRequest::new(url, PRIORITY_CURRENT, ImageTarget::Photo);
            (new_state, Effect::RefreshImage(request))
        }

        Action::Vote => {
            let Some(team) = state.viewer.viewing().and_then(|p| state.data.team(p.team)) else {
                return Ok(reject(state, NavigationError::NotOpen));
            };
            let team_number = team.team_number;
            let team_name = team.team_name.clone();

            let mut new_state = state;
            match new_state.system.config.vote_url_for(team_number) {
                Some(url) => {
                    new_state
                        .system
                        .set_status_message(format!("Opening vote page for {}", team_name));
                    (new_state, Effect::OpenExternal(url))
                }
                None => {
                    new_state
                        .system
                        .set_status_error_message("Voting is not configured (set vote_url)".to_string());
                    (new_state, Effect::None)
                }
            }
        }

        Action::RestoreFromUrl(Some(target)) => open_gallery(state, target.team, target.photo),
        Action::RestoreFromUrl(None) => {
            if state.viewer.is_open() {
                close_viewer(state, Modal::None, false)
            } else {
                (state, Effect::None)
            }
        }

        _ => return Err(state),
    };
    Ok(result)
}

/// Request thumbnails that just came into lazy-load range
fn observe_thumbnails(mut state: AppState) -> (AppState, Effect) {
    let quality = state.system.config.preview_quality;
    let mut requests = Vec::new();

    for photo in state.grid.observe() {
        let Some(url) = state.data.photo_url(photo) else {
            continue;
        };
        requests.push(ImageRequest::new(
            quality.preview_url(url),
            PRIORITY_THUMBNAIL,
            ImageTarget::Thumbnail(photo),
        ));
        state.grid.thumbnails.insert(photo, ThumbnailStatus::Loading);
    }

    if requests.is_empty() {
        return (state, Effect::None);
    }
    debug!("GRID: Requesting {} thumbnails", requests.len());
    (state, Effect::RequestImages(requests))
}

fn reduce_grid(state: AppState, action: &Action) -> Reduced {
    let result = match action {
        Action::MoveSelection { dx, dy } => {
            let mut new_state = state;
            new_state.grid.move_selection(*dx, *dy);
            observe_thumbnails(new_state)
        }

        Action::ActivateSelection => {
            if state.viewer.is_open() {
                return Ok((state, Effect::None));
            }
            match state.grid.selected_photo() {
                Some(photo) => open_gallery(state, photo.team, photo.photo),
                None => (state, Effect::None),
            }
        }

        Action::ScrollGrid(delta) => {
            let mut new_state = state;
            new_state.grid.scroll_by(*delta);
            observe_thumbnails(new_state)
        }

        Action::UpdateViewport {
            height,
            cards_per_row,
        } => {
            let mut new_state = state;
            new_state.grid.set_viewport(*height, *cards_per_row);
            observe_thumbnails(new_state)
        }

        _ => return Err(state),
    };
    Ok(result)
}

fn apply_gesture(mut state: AppState, outcome: GestureOutcome) -> (AppState, Effect) {
    match outcome.update {
        Some(TransformUpdate::Pan(x, y)) => state.viewer.transform.set_pan(x, y),
        Some(TransformUpdate::Scale(scale)) => state.viewer.transform.set_scale(scale),
        None => {}
    }
    (state, Effect::None)
}

fn reduce_input(state: AppState, action: &Action) -> Reduced {
    let result = match action {
        Action::Pointer(event) => {
            if in_gallery(&state).is_err() {
                return Ok((state, Effect::None));
            }
            let mut new_state = state;
            let outcome = new_state
                .gesture
                .pointer(*event, &new_state.viewer.transform);
            apply_gesture(new_state, outcome)
        }

        Action::Wheel { delta_y } => {
            if in_gallery(&state).is_err() {
                return Ok((state, Effect::None));
            }
            let outcome = state.gesture.wheel(*delta_y, &state.viewer.transform);
            apply_gesture(state, outcome)
        }

        _ => return Err(state),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fixtures::{dataset_with, sample_dataset};
    use crate::loader::{ImageHandle, ImageLoadError, PreviewQuality};
    use crate::viewer::gesture::{PointerEvent, PointerPhase};

    fn app() -> AppState {
        AppState::new(sample_dataset(), Config::default())
    }

    fn open(team: u32, photo: usize) -> AppState {
        reduce(app(), Action::OpenGallery { team, photo }).0
    }

    fn requests(effect: Effect) -> Vec<ImageRequest> {
        effect
            .flatten()
            .into_iter()
            .flat_map(|e| match e {
                Effect::RequestImages(reqs) => reqs,
                _ => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_open_gallery_sets_state() {
        let state = app();
        let (state, effect) = reduce(state, Action::OpenGallery { team: 2, photo: 3 });

        assert_eq!(state.viewer.active_modal, Modal::Gallery);
        assert_eq!(state.viewer.current, Some(PhotoRef::new(2, 3)));
        assert_eq!(state.viewer.photo, PhotoStatus::Loading);

        let effects = effect.flatten();
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::ReplaceUrl(p) if *p == PhotoRef::new(2, 3))));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SetPrioritySet { current: Some(url), .. } if url == "image/2/Photo3.jpg"
        )));
    }

    #[test]
    fn test_open_gallery_every_photo_resets_transform() {
        let dataset = sample_dataset();
        for team in dataset.teams() {
            for photo in 1..=team.photo_count() {
                let mut state = open(1, 1);
                state.viewer.transform = Transform {
                    scale: 2.5,
                    rotation: 270,
                    pan: (12.0, -4.0),
                };

                let (state, _) = reduce(
                    state,
                    Action::OpenGallery {
                        team: team.team_number,
                        photo,
                    },
                );

                assert_eq!(state.viewer.current, Some(PhotoRef::new(team.team_number, photo)));
                assert_eq!(state.viewer.transform.scale, 1.0);
                assert_eq!(state.viewer.transform.rotation, 0);
                assert_eq!(state.viewer.transform.pan, (0.0, 0.0));
            }
        }
    }

    #[test]
    fn test_open_gallery_request_priorities() {
        let (_, effect) = reduce(app(), Action::OpenGallery { team: 2, photo: 1 });
        let reqs = requests(effect);

        assert_eq!(reqs[0].url, "image/2/Photo1.jpg");
        assert_eq!(reqs[0].priority, PRIORITY_CURRENT);
        assert_eq!(reqs[0].target, ImageTarget::Photo);

        let neighbors: Vec<&str> = reqs
            .iter()
            .filter(|r| r.priority == PRIORITY_NEIGHBOR)
            .map(|r| r.url.as_str())
            .collect();
        assert_eq!(neighbors, vec!["image/2/Photo2.jpg", "image/1/Photo4.jpg"]);

        let heads = reqs
            .iter()
            .filter(|r| r.priority == PRIORITY_ADJACENT_TEAM)
            .count();
        assert_eq!(heads, 4);
    }

    #[test]
    fn test_open_gallery_clamps_photo() {
        let state = open(3, 99);
        assert_eq!(state.viewer.current, Some(PhotoRef::new(3, 4)));
    }

    #[test]
    fn test_open_unknown_team_is_rejected() {
        let (state, effect) = reduce(app(), Action::OpenGallery { team: 42, photo: 1 });

        assert_eq!(state.viewer.active_modal, Modal::None);
        assert_eq!(state.viewer.current, None);
        assert!(state.system.status_is_error);
        assert!(effect.is_none());
    }

    #[test]
    fn test_open_team_without_photos_is_rejected() {
        let state = AppState::new(dataset_with(&[(1, 4), (2, 0)]), Config::default());
        let (state, _) = reduce(state, Action::OpenGallery { team: 2, photo: 1 });

        assert!(!state.viewer.is_open());
        assert_eq!(
            state.system.status_message.as_deref(),
            Some("Team 2 has no photos")
        );
    }

    #[test]
    fn test_navigate_photo_crosses_teams_and_writes_url() {
        let state = open(1, 4);
        let (state, effect) = reduce(state, Action::NavigatePhoto(1));

        assert_eq!(state.viewer.current, Some(PhotoRef::new(2, 1)));
        assert!(effect
            .flatten()
            .iter()
            .any(|e| matches!(e, Effect::ReplaceUrl(p) if *p == PhotoRef::new(2, 1))));
    }

    #[test]
    fn test_navigate_team_lands_on_first_photo() {
        let state = open(4, 3);
        let (state, _) = reduce(state, Action::NavigateTeam(1));
        assert_eq!(state.viewer.current, Some(PhotoRef::new(1, 1)));

        let (state, _) = reduce(state, Action::NavigateTeam(-1));
        assert_eq!(state.viewer.current, Some(PhotoRef::new(4, 1)));
    }

    #[test]
    fn test_navigation_resets_transform() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::Rotate(90));
        let (state, _) = reduce(state, Action::Zoom(1.0));
        assert_eq!(state.viewer.transform.rotation, 90);
        assert_eq!(state.viewer.transform.scale, 2.0);

        let (state, _) = reduce(state, Action::NavigatePhoto(1));
        assert_eq!(state.viewer.transform, Default::default());
    }

    #[test]
    fn test_navigation_when_closed_is_rejected() {
        let (state, effect) = reduce(app(), Action::NavigatePhoto(1));

        assert_eq!(state.viewer.current, None);
        assert!(state.system.status_is_error);
        assert!(effect.is_none());
    }

    #[test]
    fn test_zoom_is_clamped_and_reset() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::Zoom(10.0));
        assert_eq!(state.viewer.transform.scale, 5.0);

        let (state, _) = reduce(state, Action::ResetZoom);
        assert_eq!(state.viewer.transform.scale, 1.0);
    }

    #[test]
    fn test_stats_from_gallery_clears_url() {
        let state = open(2, 2);
        let (state, effect) = reduce(state, Action::OpenStats);

        assert_eq!(state.viewer.active_modal, Modal::Stats);
        assert_eq!(state.viewer.current, None);
        assert!(effect
            .flatten()
            .iter()
            .any(|e| matches!(e, Effect::PushBareUrl)));
    }

    #[test]
    fn test_stats_from_grid_writes_no_history() {
        let (state, effect) = reduce(app(), Action::OpenStats);
        assert_eq!(state.viewer.active_modal, Modal::Stats);
        assert!(!effect.flatten().iter().any(|e| matches!(e, Effect::PushBareUrl)));

        let (state, effect) = reduce(state, Action::NavigateBack);
        assert_eq!(state.viewer.active_modal, Modal::None);
        assert!(!effect.flatten().iter().any(|e| matches!(e, Effect::PushBareUrl)));
    }

    #[test]
    fn test_team_details_only_from_gallery() {
        let (state, _) = reduce(app(), Action::OpenTeamDetails);
        assert_eq!(state.viewer.active_modal, Modal::None);
        assert!(state.system.status_is_error);

        let state = open(3, 2);
        let (state, _) = reduce(state, Action::OpenTeamDetails);
        assert_eq!(state.viewer.active_modal, Modal::TeamDetails);
        assert_eq!(state.viewer.current, Some(PhotoRef::new(3, 2)));

        let (state, _) = reduce(state, Action::CloseTeamDetails);
        assert_eq!(state.viewer.active_modal, Modal::Gallery);
    }

    #[test]
    fn test_toggle_info() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::ToggleInfo);
        assert_eq!(state.viewer.active_modal, Modal::TeamDetails);

        let (state, _) = reduce(state, Action::ToggleInfo);
        assert_eq!(state.viewer.active_modal, Modal::Gallery);
    }

    #[test]
    fn test_navigate_back_steps_one_level() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::OpenTeamDetails);

        let (state, effect) = reduce(state, Action::NavigateBack);
        assert_eq!(state.viewer.active_modal, Modal::Gallery);
        assert!(effect.is_none());

        let (state, effect) = reduce(state, Action::NavigateBack);
        assert_eq!(state.viewer.active_modal, Modal::None);
        assert_eq!(state.viewer.current, None);
        assert!(effect
            .flatten()
            .iter()
            .any(|e| matches!(e, Effect::PushBareUrl)));
    }

    #[test]
    fn test_close_pushes_bare_url() {
        let state = open(2, 2);
        let (state, effect) = reduce(state, Action::Close);

        assert!(!state.viewer.is_open());
        assert_eq!(state.viewer.transform, Default::default());
        let effects = effect.flatten();
        assert!(effects.iter().any(|e| matches!(e, Effect::PushBareUrl)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::SetPrioritySet { current: None, .. })));
    }

    #[test]
    fn test_restore_without_position_closes_silently() {
        let state = open(2, 2);
        let (state, effect) = reduce(state, Action::RestoreFromUrl(None));

        assert!(!state.viewer.is_open());
        assert!(!effect
            .flatten()
            .iter()
            .any(|e| matches!(e, Effect::PushBareUrl)));
    }

    #[test]
    fn test_restore_with_position_opens() {
        let (state, _) = reduce(app(), Action::RestoreFromUrl(Some(PhotoRef::new(4, 2))));
        assert_eq!(state.viewer.viewing(), Some(PhotoRef::new(4, 2)));
    }

    #[test]
    fn test_stale_photo_result_is_discarded() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::NavigatePhoto(1));

        let stale = ImageHandle::new("image/1/Photo1.jpg", vec![1]);
        let (state, _) = reduce(
            state,
            Action::PhotoResolved {
                url: "image/1/Photo1.jpg".to_string(),
                result: Ok(stale),
            },
        );
        assert_eq!(state.viewer.photo, PhotoStatus::Loading);

        let fresh = ImageHandle::new("image/1/Photo2.jpg", vec![2]);
        let (state, _) = reduce(
            state,
            Action::PhotoResolved {
                url: "image/1/Photo2.jpg".to_string(),
                result: Ok(fresh.clone()),
            },
        );
        assert_eq!(state.viewer.photo, PhotoStatus::Ready(fresh));
    }

    #[test]
    fn test_failed_photo_shows_placeholder() {
        let state = open(1, 1);
        let (state, _) = reduce(
            state,
            Action::PhotoResolved {
                url: "image/1/Photo1.jpg".to_string(),
                result: Err(ImageLoadError::NotFound("image/1/Photo1.jpg".to_string())),
            },
        );

        assert!(matches!(state.viewer.photo, PhotoStatus::Placeholder(_)));
        assert!(state.viewer.is_open());
    }

    #[test]
    fn test_reload_photo_refreshes_current() {
        let state = open(2, 3);
        let (state, effect) = reduce(state, Action::ReloadPhoto);

        assert_eq!(state.viewer.photo, PhotoStatus::Loading);
        match effect {
            Effect::RefreshImage(req) => {
                assert_eq!(req.url, "image/2/Photo3.jpg");
                assert_eq!(req.target, ImageTarget::Photo);
            }
            other => panic!("Expected RefreshImage, got {:?}", other),
        }
    }

    #[test]
    fn test_vote_opens_configured_page() {
        let config = Config {
            vote_url: "https://vote.example.com/?team={team}".to_string(),
            ..Config::default()
        };
        let state = AppState::new(sample_dataset(), config);
        let (state, _) = reduce(state, Action::OpenGallery { team: 3, photo: 1 });
        let (state, effect) = reduce(state, Action::Vote);

        assert!(matches!(
            effect,
            Effect::OpenExternal(ref url) if url == "https://vote.example.com/?team=3"
        ));
        assert!(!state.system.status_is_error);
    }

    #[test]
    fn test_vote_without_config_sets_error() {
        let state = open(3, 1);
        let (state, effect) = reduce(state, Action::Vote);

        assert!(effect.is_none());
        assert!(state.system.status_is_error);
    }

    #[test]
    fn test_wheel_and_pinch_scale() {
        let state = open(1, 1);
        let (state, _) = reduce(state, Action::Wheel { delta_y: -1.0 });
        assert!((state.viewer.transform.scale - 1.1).abs() < 1e-6);

        let (state, _) = reduce(state, Action::ResetZoom);
        let (state, _) = reduce(state, Action::Pointer(PointerEvent::new(1, PointerPhase::Down, 0.0, 0.0)));
        let (state, _) = reduce(state, Action::Pointer(PointerEvent::new(2, PointerPhase::Down, 10.0, 0.0)));
        let (state, _) = reduce(state, Action::Pointer(PointerEvent::new(2, PointerPhase::Move, 40.0, 0.0)));
        assert_eq!(state.viewer.transform.scale, 4.0);
    }

    #[test]
    fn test_gestures_ignored_when_closed() {
        let (state, _) = reduce(app(), Action::Wheel { delta_y: -1.0 });
        assert_eq!(state.viewer.transform.scale, 1.0);
        assert!(state.system.status_message.is_some());
        assert!(!state.system.status_is_error);
    }

    #[test]
    fn test_viewport_requests_visible_thumbnails() {
        let config = Config {
            preview_quality: PreviewQuality::Low,
            lazy_margin: 0,
            ..Config::default()
        };
        let state = AppState::new(sample_dataset(), config);
        let (state, effect) = reduce(
            state,
            Action::UpdateViewport {
                height: 9,
                cards_per_row: 1,
            },
        );

        let reqs = requests(effect);
        assert_eq!(reqs.len(), 4);
        assert!(reqs.iter().all(|r| r.priority == PRIORITY_THUMBNAIL));
        assert_eq!(reqs[0].url, "image/1/Photo1.jpg?w=200");
        assert_eq!(
            state.grid.thumbnail_status(PhotoRef::new(1, 1)),
            ThumbnailStatus::Loading
        );

        let (state, effect) = reduce(state, Action::ScrollGrid(9));
        let reqs = requests(effect);
        assert!(reqs
            .iter()
            .all(|r| matches!(r.target, ImageTarget::Thumbnail(p) if p.team == 2)));
        assert_eq!(reqs.len(), 4);
        assert_eq!(state.grid.scroll_top, 9);
    }

    #[test]
    fn test_thumbnail_resolution_updates_grid() {
        let (state, _) = reduce(
            app(),
            Action::ThumbnailResolved {
                photo: PhotoRef::new(1, 2),
                result: Ok(2048),
            },
        );
        assert_eq!(
            state.grid.thumbnail_status(PhotoRef::new(1, 2)),
            ThumbnailStatus::Loaded { bytes: 2048 }
        );

        let (state, _) = reduce(
            state,
            Action::ThumbnailResolved {
                photo: PhotoRef::new(1, 3),
                result: Err(ImageLoadError::Empty("x".to_string())),
            },
        );
        assert_eq!(
            state.grid.thumbnail_status(PhotoRef::new(1, 3)),
            ThumbnailStatus::Placeholder
        );
    }

    #[test]
    fn test_activate_selection_opens_selected_photo() {
        let (state, _) = reduce(app(), Action::MoveSelection { dx: 1, dy: 0 });
        let (state, _) = reduce(state, Action::ActivateSelection);

        assert_eq!(state.viewer.viewing(), Some(PhotoRef::new(1, 2)));
    }
}
