//! REST client for the torrent player server
//!
//! Every endpoint answers with a `{"success": bool, ...}` envelope. A
//! `success: false` envelope is a logical failure carrying the server's
//! message; anything that is not a parsable envelope is a transport failure.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ControlAction, Movie, Quality, SessionId, SessionStatus, TorrentInfo};

/// Fixed catalog page size
pub const PAGE_SIZE: u32 = 20;

/// Player API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with `success: false`
    #[error("{}", .0.as_deref().unwrap_or("Request rejected by server"))]
    Rejected(Option<String>),

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Could not reach the server at all (connect failure or timeout)
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Request failed: {0}")]
    RequestFailed(reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ApiError::Unreachable(e.to_string())
        } else {
            ApiError::RequestFailed(e)
        }
    }
}

impl ApiError {
    /// Message the server supplied, if this was a logical failure
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected(msg) => msg.as_deref(),
            _ => None,
        }
    }

    /// Transport-level failure (no usable envelope)
    pub fn is_transport(&self) -> bool {
        !matches!(self, ApiError::Rejected(_))
    }

    /// The server could not be reached; drives the online/offline signal
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}

/// Catalog page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// 1-based page number
    pub page: u32,
    pub quality: Quality,
    /// Search term; `None` browses the full catalog
    pub term: Option<String>,
}

impl CatalogQuery {
    /// Browse request for a given page
    pub fn browse(page: u32, quality: Quality) -> Self {
        Self {
            page,
            quality,
            term: None,
        }
    }

    /// Search request; searches always start at page 1
    pub fn search(term: impl Into<String>, quality: Quality) -> Self {
        Self {
            page: 1,
            quality,
            term: Some(term.into()),
        }
    }

    fn endpoint(&self) -> String {
        let mut endpoint = format!(
            "/api/movies?page={}&limit={}&quality={}",
            self.page,
            PAGE_SIZE,
            urlencoding::encode(self.quality.as_str())
        );
        if let Some(term) = self.term.as_deref().filter(|t| !t.is_empty()) {
            endpoint.push_str("&query=");
            endpoint.push_str(&urlencoding::encode(term));
        }
        endpoint
    }
}

#[derive(Debug, Deserialize)]
struct MoviesResponse {
    #[serde(default)]
    movies: Vec<Movie>,
}

#[derive(Debug, Deserialize)]
struct MovieResponse {
    movie: Movie,
}

/// Torrent info with the movie it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentLookup {
    pub torrent: TorrentInfo,
    pub movie: Movie,
    #[serde(default)]
    pub streaming_available: bool,
}

/// Successful play response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayStarted {
    #[serde(default)]
    pub torrent_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful control response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlayBody<'a> {
    movie_id: u64,
    quality: Quality,
    session_id: &'a SessionId,
}

#[derive(Debug, Serialize)]
struct ControlBody {
    action: ControlAction,
}

/// HTTP client for the server's REST endpoints
#[derive(Debug, Clone)]
pub struct PlayerApi {
    base_url: String,
    client: reqwest::Client,
}

impl PlayerApi {
    /// Create a client for the given server base URL (e.g. `http://localhost:5000`)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server-relative path such as `/api/video/<sid>`
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Fetch one catalog page
    pub async fn movies(&self, query: &CatalogQuery) -> Result<Vec<Movie>, ApiError> {
        let response: MoviesResponse = self.get(&query.endpoint()).await?;
        Ok(response.movies)
    }

    /// Fetch details for a single movie
    pub async fn movie(&self, id: u64) -> Result<Movie, ApiError> {
        let response: MovieResponse = self.get(&format!("/api/movie/{}", id)).await?;
        Ok(response.movie)
    }

    /// Best torrent for a movie at the given quality
    pub async fn torrent(&self, id: u64, quality: Quality) -> Result<TorrentLookup, ApiError> {
        let endpoint = format!(
            "/api/torrent/{}?quality={}",
            id,
            urlencoding::encode(quality.as_str())
        );
        self.get(&endpoint).await
    }

    /// Ask the server to start a transfer for this session
    pub async fn play(
        &self,
        movie_id: u64,
        quality: Quality,
        session: &SessionId,
    ) -> Result<PlayStarted, ApiError> {
        let body = PlayBody {
            movie_id,
            quality,
            session_id: session,
        };
        self.post("/api/play", &body).await
    }

    /// Pause, resume or stop the session's transfer
    pub async fn control(
        &self,
        session: &SessionId,
        action: ControlAction,
    ) -> Result<ControlAck, ApiError> {
        let endpoint = format!("/api/control/{}", urlencoding::encode(session.as_str()));
        self.post(&endpoint, &ControlBody { action }).await
    }

    /// Server-side view of the session
    pub async fn status(&self, session: &SessionId) -> Result<SessionStatus, ApiError> {
        let endpoint = format!("/api/status/{}", urlencoding::encode(session.as_str()));
        self.get(&endpoint).await
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    /// Decode the `{success, ...}` envelope regardless of HTTP status
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status, &body)
    }
}

fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => {
            return Err(ApiError::InvalidResponse(format!("JSON parse error: {}", e)));
        }
        Err(_) => return Err(ApiError::ServerError(status.as_u16())),
    };

    match value.get("success").and_then(|s| s.as_bool()) {
        Some(true) => serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON parse error: {}", e))),
        Some(false) => {
            let message = value
                .get("error")
                .and_then(|e| e.as_str())
                .filter(|e| !e.is_empty())
                .map(str::to_string);
            warn!(status = status.as_u16(), error = ?message, "server rejected request");
            Err(ApiError::Rejected(message))
        }
        None if status.is_success() => Err(ApiError::InvalidResponse(
            "missing success flag".to_string(),
        )),
        None => Err(ApiError::ServerError(status.as_u16())),
    }
}
