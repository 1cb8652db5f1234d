use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::loader::ImageLoader;
use crate::preload::{ImageFuture, LoadSink, LoadTicket, PreloadQueue};
use crate::url_sync::{bare_url, parse_location, viewer_url, History};

use super::action::Action;
use super::effects::{Effect, ImageRequest, ImageTarget};
use super::reducer::reduce;
use super::state::AppState;
use super::surface::{Surface, TerminalSurface};

/// Starts queue loads as tokio tasks and posts completions back as actions
pub struct SpawnSink {
    loader: Arc<dyn ImageLoader>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl LoadSink for SpawnSink {
    fn start(&mut self, ticket: LoadTicket) {
        trace!("LOAD: Spawning load #{} for {}", ticket.load_id, ticket.url);
        let loader = Arc::clone(&self.loader);
        let action_tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&ticket.url).await;
            let _ = action_tx.send(Action::LoadFinished(ticket, result));
        });
    }
}

/// Viewer runtime - owns state, preload queue, history and surface
///
/// The Runtime is responsible for:
/// - Dispatching actions through the reducer
/// - Executing effects against the queue, the history and the surface
/// - Feeding load completions back into the queue so it stays saturated
///
/// All mutation happens on the thread that calls `dispatch`; loader tasks
/// only ever send actions.
pub struct Runtime<S: Surface, H: History> {
    state: AppState,
    queue: PreloadQueue<SpawnSink>,
    history: H,
    surface: S,

    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl<S: Surface, H: History> Runtime<S, H> {
    pub fn new(initial_state: AppState, loader: Arc<dyn ImageLoader>, history: H, surface: S) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let sink = SpawnSink {
            loader,
            action_tx: action_tx.clone(),
        };
        let queue = PreloadQueue::new(initial_state.system.config.queue_config(), sink);

        Self {
            state: initial_state,
            queue,
            history,
            surface,
            action_tx,
            action_rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn queue(&self) -> &PreloadQueue<SpawnSink> {
        &self.queue
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Get a sender for dispatching actions from external sources
    pub fn action_sender(&self) -> mpsc::UnboundedSender<Action> {
        self.action_tx.clone()
    }

    /// Initial paint, then restore the viewer from the current address
    pub fn start(&mut self) {
        self.surface.render(&self.state.grid.model);
        let location = parse_location(self.history.current());
        debug!("RUNTIME: Starting at {:?}", location);
        self.dispatch(Action::RestoreFromUrl(location));
    }

    /// Dispatch an action to be processed by the reducer
    ///
    /// Uses mem::take to avoid cloning AppState. Load completions and history
    /// moves are handled here because they touch the queue and the history.
    pub fn dispatch(&mut self, action: Action) {
        trace!("ACTION: Dispatching {:?}", action);

        let effect = match action {
            Action::LoadFinished(ticket, result) => {
                self.queue.complete(&ticket, result);
                return;
            }
            Action::HistoryBack => {
                let location = self.history.back().map(parse_location);
                match location {
                    Some(location) => Effect::Action(Action::RestoreFromUrl(location)),
                    None => return,
                }
            }
            Action::HistoryForward => {
                let location = self.history.forward().map(parse_location);
                match location {
                    Some(location) => Effect::Action(Action::RestoreFromUrl(location)),
                    None => return,
                }
            }
            action => {
                let state = std::mem::take(&mut self.state);
                let (new_state, effect) = reduce(state, action);
                self.state = new_state;
                effect
            }
        };

        self.execute_effect(effect);
        self.surface.update_viewer(&self.state);
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Batch(effects) => {
                for e in effects {
                    self.execute_effect(e);
                }
            }
            Effect::Action(action) => self.dispatch(action),
            Effect::RequestImages(requests) => {
                debug!("EFFECT: Requesting {} images", requests.len());
                let batch = requests.iter().map(|r| (r.url.clone(), r.priority));
                let futures = self.queue.request_many(batch);
                for (request, future) in requests.into_iter().zip(futures) {
                    self.await_image(request, future);
                }
            }
            Effect::RefreshImage(request) => {
                debug!("EFFECT: Refreshing {}", request.url);
                let future = self.queue.refresh(&request.url, request.priority);
                self.await_image(request, future);
            }
            Effect::SetPrioritySet { current, urls } => {
                self.queue.set_priority_set(current, urls);
            }
            Effect::ReplaceUrl(photo) => {
                let url = viewer_url(self.history.current(), photo);
                self.history.replace(url);
            }
            Effect::PushBareUrl => {
                let url = bare_url(self.history.current());
                self.history.push(url);
            }
            Effect::OpenExternal(url) => self.surface.open_external(&url),
        }
    }

    /// Route a request's result back to whoever asked for it
    fn await_image(&self, request: ImageRequest, future: ImageFuture) {
        let action_tx = self.action_tx.clone();
        match request.target {
            ImageTarget::Preload => {}
            ImageTarget::Photo => {
                tokio::spawn(async move {
                    let result = future.await;
                    let _ = action_tx.send(Action::PhotoResolved {
                        url: request.url,
                        result,
                    });
                });
            }
            ImageTarget::Thumbnail(photo) => {
                tokio::spawn(async move {
                    let result = future.await.map(|handle| handle.len());
                    let _ = action_tx.send(Action::ThumbnailResolved { photo, result });
                });
            }
        }
    }

    /// Process all pending actions in the queue
    ///
    /// Returns the number of actions processed
    pub fn process_actions(&mut self) -> usize {
        let mut count = 0;
        while let Ok(action) = self.action_rx.try_recv() {
            self.dispatch(action);
            count += 1;
        }
        count
    }
}

impl<H: History> Runtime<TerminalSurface, H> {
    pub fn draw(&mut self, frame: &mut ratatui::Frame) {
        self.surface.draw(frame, &self.state);
    }
}
