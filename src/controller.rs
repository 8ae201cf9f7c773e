//! Playback session controller
//!
//! Owns one session's worth of client state: the catalog result set, the
//! active movie, the latest transfer status, the visible panel, control
//! button enablement and the local media element.
//!
//! The controller never performs I/O. Every input arrives as an [`Event`]
//! through [`PlaybackSessionController::dispatch`], and every side effect
//! leaves as an [`Effect`] for the runtime to execute. Outbound requests
//! carry a [`RequestToken`]; a newer request in the same [`Lane`] supersedes
//! the older one, and completions for superseded tokens are dropped.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::api::catalog::{ApiError, CatalogQuery, ControlAck, PlayStarted};
use crate::api::push::{ProgressEvent, PushEvent, VideoReadyEvent};
use crate::models::{
    ControlAction, ControlButtons, MediaElement, Movie, Quality, SessionId, SessionStatus,
    TransferPhase, TransferStatus, UiMode, Viewport,
};
use crate::notify::Notifications;

// =============================================================================
// Requests
// =============================================================================

/// Monotonically increasing request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Requests in the same lane supersede each other
///
/// Control requests get one lane per action: each has its own effect on the
/// server, so a pause never cancels an in-flight stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Catalog,
    Playback,
    Control(ControlAction),
    Status,
}

/// What to ask the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Catalog(CatalogQuery),
    Play { movie_id: u64, quality: Quality },
    Control(ControlAction),
    Status,
}

impl RequestKind {
    pub fn lane(&self) -> Lane {
        match self {
            RequestKind::Catalog(_) => Lane::Catalog,
            RequestKind::Play { .. } => Lane::Playback,
            RequestKind::Control(action) => Lane::Control(*action),
            RequestKind::Status => Lane::Status,
        }
    }
}

/// Outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub token: RequestToken,
    pub kind: RequestKind,
}

/// Result of executing a [`Request`]
#[derive(Debug)]
pub enum Outcome {
    Catalog(Result<Vec<Movie>, ApiError>),
    Play(Result<PlayStarted, ApiError>),
    Control(Result<ControlAck, ApiError>),
    Status(Result<SessionStatus, ApiError>),
}

/// A finished request, routed back through [`Event::Completed`]
#[derive(Debug)]
pub struct Completion {
    pub request: Request,
    pub outcome: Outcome,
}

// =============================================================================
// Events and Effects
// =============================================================================

/// Everything the controller reacts to
#[derive(Debug)]
pub enum Event {
    /// Search box submitted
    Search(String),
    /// "Load more" at the end of the list
    LoadMore,
    /// Play the result at this index
    Select(usize),
    /// Pause, resume or stop the transfer
    Control(ControlAction),
    /// Navigation between panels
    SwitchPanel(UiMode),
    /// Quality selector changed
    SetQuality(Quality),
    /// User asked to start the loaded video (the "tap to play" path)
    StartVideo,
    /// Re-read the session state from the server
    Resync,
    /// Push channel traffic
    Push(PushEvent),
    ChannelConnected,
    ChannelDisconnected,
    NetworkOnline,
    NetworkOffline,
    /// A request finished
    Completed(Completion),
    /// The media player started rendering
    MediaStarted,
    /// Autoplay was refused (soft failure)
    AutoplayRejected(String),
    /// The media player failed while playing
    MediaFailed(String),
    /// The media player exited on its own
    MediaEnded,
}

/// Side effects for the runtime to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Execute a request
    Send(Request),
    /// Abort a superseded in-flight request
    Cancel(RequestToken),
    /// Start playing the given source (a server path or URL). `autoplay`
    /// marks attempts the user did not ask for explicitly.
    StartMedia { source: String, autoplay: bool },
    /// Stop the media player
    StopMedia,
}

// =============================================================================
// Controller
// =============================================================================

/// Session state machine, constructed once by the entry point
#[derive(Debug)]
pub struct PlaybackSessionController {
    session: SessionId,
    quality: Quality,
    viewport: Viewport,

    results: Vec<Movie>,
    /// Bumped whenever a search replaces `results`
    result_set: u64,
    /// Last applied catalog page (0 = nothing loaded yet)
    page: u32,
    active_movie: Option<Movie>,
    transfer: Option<TransferStatus>,
    mode: UiMode,
    buttons: ControlButtons,
    media: MediaElement,
    notifications: Notifications,

    next_token: u64,
    in_flight: HashMap<Lane, RequestToken>,
    online: bool,
}

impl PlaybackSessionController {
    pub fn new(session: SessionId, quality: Quality, viewport: Viewport) -> Self {
        Self {
            session,
            quality,
            viewport,
            results: Vec::new(),
            result_set: 0,
            page: 0,
            active_movie: None,
            transfer: None,
            mode: UiMode::Catalog,
            buttons: ControlButtons::default(),
            media: MediaElement::default(),
            notifications: Notifications::new(),
            next_token: 0,
            in_flight: HashMap::new(),
            online: true,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn results(&self) -> &[Movie] {
        &self.results
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Identifies the current result set; appends keep it, replacements change it
    pub fn result_set(&self) -> u64 {
        self.result_set
    }

    pub fn active_movie(&self) -> Option<&Movie> {
        self.active_movie.as_ref()
    }

    pub fn transfer(&self) -> Option<&TransferStatus> {
        self.transfer.as_ref()
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn buttons(&self) -> ControlButtons {
        self.buttons
    }

    pub fn media(&self) -> &MediaElement {
        &self.media
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Whether a catalog load is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.contains_key(&Lane::Catalog)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Latest token issued for a lane, while its request is in flight
    pub fn in_flight(&self, lane: Lane) -> Option<RequestToken> {
        self.in_flight.get(&lane).copied()
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Startup: the initial catalog load
    pub fn initialize(&mut self) -> Vec<Effect> {
        info!(session = %self.session, "session controller initialized");
        self.load_catalog(None, 1)
    }

    /// Route an event to its handler
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Search(term) => self.search(&term),
            Event::LoadMore => self.load_more(),
            Event::Select(index) => match self.results.get(index).cloned() {
                Some(movie) => self.request_playback(movie),
                None => Vec::new(),
            },
            Event::Control(action) => self.send_control(action),
            Event::SwitchPanel(mode) => {
                self.switch_panel(mode);
                Vec::new()
            }
            Event::SetQuality(quality) => {
                self.quality = quality;
                self.notifications.info(format!("Quality: {}", quality));
                Vec::new()
            }
            Event::StartVideo => self.start_video(),
            Event::Resync => self.issue(RequestKind::Status),
            Event::Push(PushEvent::TransferProgress(event)) => {
                self.on_transfer_progress(&event);
                Vec::new()
            }
            Event::Push(PushEvent::VideoReady(event)) => self.on_video_ready(&event),
            Event::Push(PushEvent::SessionJoined { session_id }) => {
                if self.session == *session_id.as_str() {
                    debug!(%session_id, "session joined");
                }
                Vec::new()
            }
            Event::Push(PushEvent::ServerStatus { message }) => {
                debug!(%message, "server status");
                Vec::new()
            }
            Event::ChannelConnected => {
                self.notifications.success("Connected to server");
                Vec::new()
            }
            Event::ChannelDisconnected => {
                self.notifications.warning("Disconnected from server");
                Vec::new()
            }
            Event::NetworkOnline => {
                self.set_online(true);
                Vec::new()
            }
            Event::NetworkOffline => {
                self.set_online(false);
                Vec::new()
            }
            Event::Completed(completion) => self.on_completion(completion),
            Event::MediaStarted => {
                self.media.playing = true;
                self.notifications.success("Video ready to play");
                Vec::new()
            }
            Event::AutoplayRejected(reason) => {
                debug!(%reason, "autoplay prevented");
                self.media.playing = false;
                self.notifications.info("Press Enter to start the video");
                Vec::new()
            }
            Event::MediaFailed(reason) => {
                warn!(%reason, "video playback error");
                self.media.playing = false;
                self.notifications.error("Video playback error");
                Vec::new()
            }
            Event::MediaEnded => {
                self.media.playing = false;
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// Request a catalog page. With a term the result set is replaced on
    /// success; without one the page is appended.
    pub fn load_catalog(&mut self, query: Option<String>, page: u32) -> Vec<Effect> {
        let catalog = match query {
            Some(term) => CatalogQuery::search(term, self.quality),
            None => CatalogQuery::browse(page.max(1), self.quality),
        };
        self.issue(RequestKind::Catalog(catalog))
    }

    /// Search; blank terms are rejected locally
    pub fn search(&mut self, term: &str) -> Vec<Effect> {
        let term = term.trim();
        if term.is_empty() {
            self.notifications.warning("Please enter a search term");
            return Vec::new();
        }
        self.load_catalog(Some(term.to_string()), 1)
    }

    /// Next browse page after the last applied one
    pub fn load_more(&mut self) -> Vec<Effect> {
        self.load_catalog(None, self.page + 1)
    }

    fn apply_catalog(&mut self, query: &CatalogQuery, result: Result<Vec<Movie>, ApiError>) {
        match result {
            Ok(movies) => {
                let count = movies.len();
                if query.term.is_some() {
                    self.results = movies;
                    self.result_set += 1;
                    self.page = 1;
                } else {
                    self.results.extend(movies);
                    self.page = query.page;
                }
                info!(count, page = self.page, total = self.results.len(), "catalog loaded");
                self.notifications.success(format!("Loaded {} movies", count));
            }
            Err(e) => self.report_failure(&e, "Failed to load movies"),
        }
    }

    // -------------------------------------------------------------------------
    // Playback
    // -------------------------------------------------------------------------

    /// Make `movie` the active movie and ask the server to start its transfer
    pub fn request_playback(&mut self, movie: Movie) -> Vec<Effect> {
        self.notifications.info(format!("Starting {}...", movie.title));
        let kind = RequestKind::Play {
            movie_id: movie.id,
            quality: self.quality,
        };
        self.active_movie = Some(movie);
        self.issue(kind)
    }

    fn apply_play(&mut self, result: Result<PlayStarted, ApiError>) {
        match result {
            Ok(started) => {
                info!(torrent = ?started.torrent_id, "transfer started");
                self.switch_panel(UiMode::Playback);
                self.buttons.pause = true;
                self.buttons.stop = true;
                self.notifications.success("Torrent started successfully");
            }
            // ActiveMovie stays set
            Err(e) => self.report_failure(&e, "Failed to start movie"),
        }
    }

    /// Progress push event; foreign sessions are ignored
    pub fn on_transfer_progress(&mut self, event: &ProgressEvent) {
        if self.session != *event.session_id.as_str() {
            return;
        }
        self.apply_phase(&event.status);
        self.transfer = Some(event.to_status());
    }

    fn apply_phase(&mut self, phase: &TransferPhase) {
        match phase {
            TransferPhase::Downloading => {
                self.buttons.pause = true;
                self.buttons.resume = false;
            }
            TransferPhase::Paused => {
                self.buttons.pause = false;
                self.buttons.resume = true;
            }
            TransferPhase::Other(_) => {}
        }
    }

    /// Stream readiness push event; foreign sessions are ignored
    pub fn on_video_ready(&mut self, event: &VideoReadyEvent) -> Vec<Effect> {
        if self.session != *event.session_id.as_str() {
            return Vec::new();
        }
        info!(path = %event.video_path, "video ready");
        self.media.source = Some(event.video_path.clone());
        self.media.playing = false;
        self.notifications.info("Loading video...");

        if self.viewport.is_mobile() {
            self.notifications.info("Press Enter to start the video");
            Vec::new()
        } else {
            vec![Effect::StartMedia {
                source: event.video_path.clone(),
                autoplay: true,
            }]
        }
    }

    fn start_video(&mut self) -> Vec<Effect> {
        match self.media.source.clone().filter(|s| !s.is_empty()) {
            Some(source) if !self.media.playing => vec![Effect::StartMedia {
                source,
                autoplay: false,
            }],
            Some(_) => Vec::new(),
            None => {
                self.notifications.warning("No video loaded yet");
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Transfer control
    // -------------------------------------------------------------------------

    /// Send pause/resume/stop for this session. A stop already in flight is
    /// left to finish; repeating it sends nothing.
    pub fn send_control(&mut self, action: ControlAction) -> Vec<Effect> {
        if action == ControlAction::Stop
            && self.in_flight.contains_key(&Lane::Control(ControlAction::Stop))
        {
            debug!("stop already in flight");
            return Vec::new();
        }
        self.issue(RequestKind::Control(action))
    }

    fn apply_control(
        &mut self,
        action: ControlAction,
        result: Result<ControlAck, ApiError>,
    ) -> Vec<Effect> {
        match result {
            Ok(ack) => {
                let message = ack
                    .message
                    .unwrap_or_else(|| format!("Torrent {}", action.as_str()));
                self.notifications.success(message);
                if action == ControlAction::Stop {
                    return self.stop_video();
                }
                Vec::new()
            }
            Err(e) => {
                self.report_failure(&e, "Control failed");
                Vec::new()
            }
        }
    }

    /// Local teardown after a successful stop. ActiveMovie is kept.
    fn stop_video(&mut self) -> Vec<Effect> {
        self.media = MediaElement::default();
        self.buttons = ControlButtons::default();
        self.switch_panel(UiMode::Catalog);
        vec![Effect::StopMedia]
    }

    fn apply_status(&mut self, result: Result<SessionStatus, ApiError>) {
        match result {
            Ok(status) => {
                let phase = TransferPhase::from(status.status.clone());
                self.apply_phase(&phase);
                let transfer = self.transfer.get_or_insert(TransferStatus {
                    phase: phase.clone(),
                    progress: 0.0,
                    download_rate: 0.0,
                    peers: 0,
                });
                transfer.phase = phase;
                transfer.progress = status.progress;
                self.notifications
                    .info(format!("Session status: {}", status.status));
            }
            Err(e) => self.report_failure(&e, "Failed to fetch session status"),
        }
    }

    // -------------------------------------------------------------------------
    // Panels
    // -------------------------------------------------------------------------

    /// Show exactly one panel
    pub fn switch_panel(&mut self, mode: UiMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "switch panel");
        }
        self.mode = mode;
    }

    // -------------------------------------------------------------------------
    // Request bookkeeping
    // -------------------------------------------------------------------------

    fn issue(&mut self, kind: RequestKind) -> Vec<Effect> {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        let mut effects = Vec::with_capacity(2);
        if let Some(old) = self.in_flight.insert(kind.lane(), token) {
            debug!(%old, new = %token, lane = ?kind.lane(), "request superseded");
            effects.push(Effect::Cancel(old));
        }
        effects.push(Effect::Send(Request { token, kind }));
        effects
    }

    /// Apply a completion unless a newer request in its lane superseded it
    pub fn on_completion(&mut self, completion: Completion) -> Vec<Effect> {
        let Completion { request, outcome } = completion;
        let lane = request.kind.lane();
        if self.in_flight.get(&lane) != Some(&request.token) {
            debug!(token = %request.token, ?lane, "discarding stale completion");
            return Vec::new();
        }
        self.in_flight.remove(&lane);

        match (&request.kind, outcome) {
            (RequestKind::Catalog(query), Outcome::Catalog(result)) => {
                self.track_connectivity(&result);
                self.apply_catalog(query, result);
            }
            (RequestKind::Play { .. }, Outcome::Play(result)) => {
                self.track_connectivity(&result);
                self.apply_play(result);
            }
            (RequestKind::Control(action), Outcome::Control(result)) => {
                self.track_connectivity(&result);
                return self.apply_control(*action, result);
            }
            (RequestKind::Status, Outcome::Status(result)) => {
                self.track_connectivity(&result);
                self.apply_status(result);
            }
            (kind, outcome) => {
                warn!(?kind, ?outcome, "completion does not match its request");
            }
        }
        Vec::new()
    }

    fn track_connectivity<T>(&mut self, result: &Result<T, ApiError>) {
        match result {
            Err(e) if e.is_unreachable() => self.set_online(false),
            _ => self.set_online(true),
        }
    }

    fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;
        if online {
            self.notifications.success("Connection restored");
        } else {
            self.notifications.warning("Connection lost");
        }
    }

    fn report_failure(&mut self, error: &ApiError, fallback: &str) {
        warn!("{}: {}", fallback, error);
        let message = error.server_message().unwrap_or(fallback).to_string();
        self.notifications.error(message);
    }
}
