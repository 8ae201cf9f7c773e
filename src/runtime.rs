//! Session runtime
//!
//! Executes the controller's effects: requests run as abortable tokio tasks
//! keyed by their token, the push channel and media player report back as
//! events, and everything funnels into one `dispatch` call per event.

use std::collections::HashMap;
use std::time::Instant;

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::catalog::PlayerApi;
use crate::api::push::{ChannelSignal, PushChannel};
use crate::cache::CacheHelper;
use crate::config::Config;
use crate::controller::{
    Completion, Effect, Event, Outcome, PlaybackSessionController, Request, RequestKind,
    RequestToken,
};
use crate::models::{SessionId, Viewport};
use crate::stream::LocalPlayer;

// =============================================================================
// Request execution
// =============================================================================

/// Run one request against the server
pub async fn execute(api: &PlayerApi, session: &SessionId, request: &Request) -> Outcome {
    match &request.kind {
        RequestKind::Catalog(query) => Outcome::Catalog(api.movies(query).await),
        RequestKind::Play { movie_id, quality } => {
            Outcome::Play(api.play(*movie_id, *quality, session).await)
        }
        RequestKind::Control(action) => Outcome::Control(api.control(session, *action).await),
        RequestKind::Status => Outcome::Status(api.status(session).await),
    }
}

/// Spawns requests as tasks; a cancelled token's task is aborted
pub struct TaskRunner {
    api: PlayerApi,
    session: SessionId,
    tasks: HashMap<RequestToken, JoinHandle<()>>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl TaskRunner {
    pub fn new(
        api: PlayerApi,
        session: SessionId,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = Self {
            api,
            session,
            tasks: HashMap::new(),
            completions: tx,
        };
        (runner, rx)
    }

    pub fn submit(&mut self, request: Request) {
        self.reap();
        let api = self.api.clone();
        let session = self.session.clone();
        let tx = self.completions.clone();
        let token = request.token;
        debug!(%token, kind = ?request.kind, "submit");
        let handle = tokio::spawn(async move {
            let outcome = execute(&api, &session, &request).await;
            let _ = tx.send(Completion { request, outcome });
        });
        self.tasks.insert(token, handle);
    }

    pub fn cancel(&mut self, token: RequestToken) {
        if let Some(handle) = self.tasks.remove(&token) {
            debug!(%token, "cancel");
            handle.abort();
        }
    }

    /// Number of tasks still running
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    fn reap(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

// =============================================================================
// Media element output
// =============================================================================

/// Drives the local player process for the media element
pub struct MediaDriver {
    player: LocalPlayer,
    api: PlayerApi,
    child: Option<Child>,
}

impl MediaDriver {
    pub fn new(player: LocalPlayer, api: PlayerApi) -> Self {
        Self {
            player,
            api,
            child: None,
        }
    }

    /// Launch the player; the returned event reports how it went
    pub fn start(&mut self, source: &str, autoplay: bool) -> Event {
        self.stop();
        let url = self.api.resolve(source);
        match self.player.play(&url) {
            Ok(child) => {
                info!(%url, player = %self.player.player_type(), "player started");
                self.child = Some(child);
                Event::MediaStarted
            }
            Err(e) if autoplay => Event::AutoplayRejected(e.to_string()),
            Err(e) => Event::MediaFailed(e.to_string()),
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                debug!("player already gone: {}", e);
            }
        }
    }

    /// Check whether the player exited
    pub fn poll(&mut self) -> Option<Event> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(None) => None,
            Ok(Some(status)) => {
                self.child = None;
                if status.success() {
                    Some(Event::MediaEnded)
                } else {
                    Some(Event::MediaFailed(format!("player exited with {}", status)))
                }
            }
            Err(e) => {
                self.child = None;
                Some(Event::MediaFailed(e.to_string()))
            }
        }
    }
}

// =============================================================================
// Session runtime
// =============================================================================

/// One session: controller plus the machinery that executes its effects
pub struct SessionRuntime {
    pub controller: PlaybackSessionController,
    runner: TaskRunner,
    media: MediaDriver,
    completions: mpsc::UnboundedReceiver<Completion>,
    signals: mpsc::UnboundedReceiver<ChannelSignal>,
    push: Option<PushChannel>,
    cache: Option<CacheHelper>,
}

impl SessionRuntime {
    /// Build a runtime without starting anything
    pub fn new(config: &Config, session: SessionId, viewport: Viewport) -> Self {
        let api = PlayerApi::new(config.server_url.clone());
        let (runner, completions) = TaskRunner::new(api.clone(), session.clone());
        // Replaced by the live channel in `initialize`
        let (_, signals) = mpsc::unbounded_channel();
        Self {
            controller: PlaybackSessionController::new(session, config.quality, viewport),
            runner,
            media: MediaDriver::new(LocalPlayer::new(config.player), api),
            completions,
            signals,
            push: None,
            cache: None,
        }
    }

    /// Startup: open the push channel (which announces `join_session`),
    /// adopt the cache helper if one was registered, and load the first
    /// catalog page.
    pub fn initialize(
        config: &Config,
        session: SessionId,
        viewport: Viewport,
        cache: Option<CacheHelper>,
    ) -> Self {
        let mut runtime = Self::new(config, session.clone(), viewport);
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.push = Some(PushChannel::spawn(&config.server_url, session, tx));
        runtime.signals = rx;
        runtime.cache = cache;
        let effects = runtime.controller.initialize();
        runtime.apply(effects);
        runtime
    }

    pub fn cache(&self) -> Option<&CacheHelper> {
        self.cache.as_ref()
    }

    /// Feed one event through the controller and execute its effects
    pub fn dispatch(&mut self, event: Event) {
        let effects = self.controller.dispatch(event);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(request) => self.runner.submit(request),
                Effect::Cancel(token) => self.runner.cancel(token),
                Effect::StartMedia { source, autoplay } => {
                    let outcome = self.media.start(&source, autoplay);
                    self.dispatch(outcome);
                }
                Effect::StopMedia => self.media.stop(),
            }
        }
    }

    /// Drain everything that arrived since the last call without blocking.
    /// Returns whether any event was dispatched.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.completions.try_recv() {
            self.dispatch(Event::Completed(completion));
            changed = true;
        }
        while let Ok(signal) = self.signals.try_recv() {
            self.dispatch(signal_event(signal));
            changed = true;
        }
        if let Some(event) = self.media.poll() {
            self.dispatch(event);
            changed = true;
        }
        self.controller.notifications_mut().prune(Instant::now());
        changed
    }

    /// Wait for the next completion or push signal and dispatch it
    pub async fn step(&mut self) -> bool {
        let event = tokio::select! {
            Some(completion) = self.completions.recv() => Event::Completed(completion),
            Some(signal) = self.signals.recv() => signal_event(signal),
            else => return false,
        };
        self.dispatch(event);
        true
    }

    /// Stop the player and the push channel
    pub fn shutdown(&mut self) {
        self.media.stop();
        if let Some(push) = self.push.take() {
            push.shutdown();
        }
        if self.runner.in_flight() > 0 {
            warn!("shutting down with requests in flight");
        }
    }
}

fn signal_event(signal: ChannelSignal) -> Event {
    match signal {
        ChannelSignal::Connected => Event::ChannelConnected,
        ChannelSignal::Disconnected => Event::ChannelDisconnected,
        ChannelSignal::Event(event) => Event::Push(event),
    }
}
