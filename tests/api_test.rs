//! Player API client tests
//!
//! Runs `PlayerApi` against a mockito server. Covers the catalog
//! query string, JSON request bodies and the `{success, ...}` envelope
//! handling for rejected and failed requests.

use mockito::{Matcher, Server};
use serde_json::json;
use torrentplayer::api::catalog::ApiError;
use torrentplayer::api::{CatalogQuery, PlayerApi};
use torrentplayer::models::{ControlAction, Quality, SessionId};

// =============================================================================
// Fixtures
// =============================================================================

fn movies_body() -> String {
    json!({
        "success": true,
        "movies": [
            {
                "id": 1,
                "title": "Inception",
                "year": 2010,
                "rating": 8.8,
                "runtime": 148,
                "genres": ["Action", "Sci-Fi", "Thriller"],
                "summary": "A thief who steals corporate secrets.",
                "medium_cover_image": "https://img/inception-m.jpg"
            },
            {
                "id": 2,
                "title": "Interstellar",
                "year": 2014,
                "rating": 8.6,
                "genres": ["Adventure", "Drama"]
            }
        ]
    })
    .to_string()
}

fn session() -> SessionId {
    SessionId::from_string("session_abc123xyz")
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_browse_sends_page_limit_quality() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movies")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "20".into()),
            Matcher::UrlEncoded("quality".into(), "1080p".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(movies_body())
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let movies = api
        .movies(&CatalogQuery::browse(2, Quality::FHD1080p))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].title, "Inception");
    assert_eq!(movies[0].year, Some(2010));
    assert_eq!(movies[1].runtime, None);
}

#[tokio::test]
async fn test_search_sends_query_term() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/movies")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "1".into()),
            Matcher::UrlEncoded("query".into(), "the matrix".into()),
        ]))
        .with_status(200)
        .with_body(movies_body())
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let movies = api
        .movies(&CatalogQuery::search("the matrix", Quality::HD720p))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn test_null_fields_keep_the_page() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "movies": [
                    {"id": 1, "title": "Inception", "year": 2010, "rating": 8.8},
                    {"id": 2, "title": null, "year": null, "rating": null,
                     "runtime": null, "genres": null, "summary": null}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let movies = api
        .movies(&CatalogQuery::browse(1, Quality::HD720p))
        .await
        .unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].rating, Some(8.8));
    assert_eq!(movies[1].rating, None);
    assert!(movies[1].genres.is_empty());
}

#[tokio::test]
async fn test_missing_movies_key_is_empty_page() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let movies = api
        .movies(&CatalogQuery::browse(9, Quality::HD720p))
        .await
        .unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_movie_details() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movie/1")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "movie": {"id": 1, "title": "Inception", "year": 2010, "language": "en"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = PlayerApi::new(format!("{}/", server.url()));
    let movie = api.movie(1).await.unwrap();
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.language.as_deref(), Some("en"));
    assert_eq!(movie.summary_or_placeholder(), "No summary available");
}

#[tokio::test]
async fn test_torrent_lookup() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/torrent/1")
        .match_query(Matcher::UrlEncoded("quality".into(), "720p".into()))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "torrent": {"url": "https://t/1.torrent", "quality": "720p", "size": "1.1 GB", "seeds": 120, "peers": 15},
                "movie": {"id": 1, "title": "Inception"},
                "streaming_available": false
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let lookup = api.torrent(1, Quality::HD720p).await.unwrap();
    assert_eq!(lookup.torrent.seeds, 120);
    assert_eq!(lookup.movie.id, 1);
    assert!(!lookup.streaming_available);
}

// =============================================================================
// Session endpoints
// =============================================================================

#[tokio::test]
async fn test_play_posts_session_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/play")
        .match_body(Matcher::Json(json!({
            "movie_id": 1,
            "quality": "720p",
            "session_id": "session_abc123xyz"
        })))
        .with_status(200)
        .with_body(r#"{"success": true, "torrent_id": "t-1", "message": "Torrent started"}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let started = api.play(1, Quality::HD720p, &session()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(started.torrent_id.as_deref(), Some("t-1"));
    assert_eq!(started.message.as_deref(), Some("Torrent started"));
}

#[tokio::test]
async fn test_control_posts_action() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/control/session_abc123xyz")
        .match_body(Matcher::Json(json!({"action": "pause"})))
        .with_status(200)
        .with_body(r#"{"success": true, "message": "Torrent paused"}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let ack = api.control(&session(), ControlAction::Pause).await.unwrap();

    mock.assert_async().await;
    assert_eq!(ack.message.as_deref(), Some("Torrent paused"));
}

#[tokio::test]
async fn test_status_snapshot() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/status/session_abc123xyz")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "status": "downloading",
                "progress": 42.5,
                "current_movie": {"id": 1, "title": "Inception"},
                "streaming_available": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let status = api.status(&session()).await.unwrap();
    assert_eq!(status.status, "downloading");
    assert_eq!(status.progress, 42.5);
    assert_eq!(status.current_movie.unwrap().title, "Inception");
}

// =============================================================================
// Envelope errors
// =============================================================================

#[tokio::test]
async fn test_rejected_envelope_carries_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/control/session_abc123xyz")
        .with_status(404)
        .with_body(r#"{"success": false, "error": "No active torrent for this session"}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let err = api
        .control(&session(), ControlAction::Stop)
        .await
        .unwrap_err();

    assert!(!err.is_transport());
    assert_eq!(err.server_message(), Some("No active torrent for this session"));
}

#[tokio::test]
async fn test_rejected_on_503_with_envelope() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/play")
        .with_status(503)
        .with_body(r#"{"success": false, "error": "Torrent functionality not available"}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let err = api.play(1, Quality::HD720p, &session()).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(Some(ref m)) if m == "Torrent functionality not available"));
}

#[tokio::test]
async fn test_rejected_without_message() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movie/7")
        .with_status(200)
        .with_body(r#"{"success": false}"#)
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let err = api.movie(7).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(None)));
    assert_eq!(err.server_message(), None);
}

#[tokio::test]
async fn test_html_error_page_is_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/movies")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("<html><body>Internal Server Error</body></html>")
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let err = api
        .movies(&CatalogQuery::browse(1, Quality::HD720p))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ServerError(500)));
    assert!(err.is_transport());
    assert!(!err.is_unreachable());
}

#[tokio::test]
async fn test_garbage_success_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/status/session_abc123xyz")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let api = PlayerApi::new(server.url());
    let err = api.status(&session()).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_unreachable() {
    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api = PlayerApi::new(format!("http://127.0.0.1:{}", port));
    let err = api
        .movies(&CatalogQuery::browse(1, Quality::HD720p))
        .await
        .unwrap_err();
    assert!(err.is_unreachable());
}

#[test]
fn test_resolve_relative_paths() {
    let api = PlayerApi::new("http://localhost:5000/");
    assert_eq!(api.base_url(), "http://localhost:5000");
    assert_eq!(
        api.resolve("/api/video/session_1"),
        "http://localhost:5000/api/video/session_1"
    );
    assert_eq!(
        api.resolve("stream/a.mp4"),
        "http://localhost:5000/stream/a.mp4"
    );
    assert_eq!(api.resolve("https://cdn/x.mp4"), "https://cdn/x.mp4");
}
