//! CLI Command Handlers
//!
//! Each handler takes its CLI args, the server client and Output, and
//! returns an ExitCode.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::catalog::PlayerApi;
use crate::api::push::{ChannelSignal, PushChannel, PushEvent};
use crate::api::CatalogQuery;
use crate::cli::{
    BrowseCmd, ControlResponse, ExitCode, InfoCmd, Output, PlayCmd, PlayResponse, SearchCmd,
    SessionArg, StatusCmd, TorrentCmd,
};
use crate::config::Config;
use crate::models::{ControlAction, Movie, Quality, SessionId, TransferPhase};
use crate::stream::LocalPlayer;

/// Print a movie list: JSON envelope, or one line per movie
fn print_movies(movies: &[Movie], output: &Output) -> ExitCode {
    if output.json {
        if let Err(e) = output.print(movies) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
        return ExitCode::Success;
    }
    if movies.is_empty() {
        output.info("No movies found");
    }
    for movie in movies {
        println!(
            "{:>7}  {}  ★ {}  {}",
            movie.id,
            movie,
            movie.rating_label(),
            movie.card_genres().join(", ")
        );
    }
    ExitCode::Success
}

// =============================================================================
// Catalog Commands
// =============================================================================

pub async fn search_cmd(
    cmd: SearchCmd,
    api: &PlayerApi,
    quality: Quality,
    output: &Output,
) -> ExitCode {
    let term = cmd.query.trim();
    if term.is_empty() {
        return output.error("Please enter a search term", ExitCode::InvalidArgs);
    }
    output.info(format!("Searching for: {}", term));

    match api.movies(&CatalogQuery::search(term, quality)).await {
        Ok(mut movies) => {
            if let Some(limit) = cmd.limit {
                movies.truncate(limit);
            }
            print_movies(&movies, output)
        }
        Err(e) => output.api_error("Search failed", &e),
    }
}

pub async fn browse_cmd(
    cmd: BrowseCmd,
    api: &PlayerApi,
    quality: Quality,
    output: &Output,
) -> ExitCode {
    output.info(format!("Loading page {} ({})...", cmd.page, quality));
    match api.movies(&CatalogQuery::browse(cmd.page, quality)).await {
        Ok(movies) => print_movies(&movies, output),
        Err(e) => output.api_error("Failed to load movies", &e),
    }
}

pub async fn info_cmd(cmd: InfoCmd, api: &PlayerApi, output: &Output) -> ExitCode {
    match api.movie(cmd.id).await {
        Ok(movie) => {
            if output.json {
                if let Err(e) = output.print(&movie) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                println!("{}", movie);
                println!("{}", movie.subtitle_line());
                for line in movie.detail_lines() {
                    println!("  {}", line);
                }
                if let Some(poster) = movie.poster() {
                    println!("  Poster: {}", poster);
                }
                println!();
                println!("{}", movie.summary_or_placeholder());
            }
            ExitCode::Success
        }
        Err(e) => output.api_error("Movie lookup failed", &e),
    }
}

pub async fn torrent_cmd(
    cmd: TorrentCmd,
    api: &PlayerApi,
    quality: Quality,
    output: &Output,
) -> ExitCode {
    match api.torrent(cmd.id, quality).await {
        Ok(lookup) => {
            if output.json {
                if let Err(e) = output.print(&lookup) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else {
                println!("{}", lookup.movie);
                println!("  {}", lookup.torrent);
                if !lookup.streaming_available {
                    output.info("Server has no torrent engine; streaming unavailable");
                }
            }
            ExitCode::Success
        }
        Err(e) => output.api_error("Torrent lookup failed", &e),
    }
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(
    cmd: PlayCmd,
    api: &PlayerApi,
    config: &Config,
    quality: Quality,
    output: &Output,
) -> ExitCode {
    let session = cmd.session_id();
    info!(%session, movie = cmd.id, %quality, "starting transfer");

    // Subscribe before asking for the transfer so no early event is missed
    let watch = if cmd.watch {
        let (tx, rx) = mpsc::unbounded_channel();
        Some((PushChannel::spawn(api.base_url(), session.clone(), tx), rx))
    } else {
        None
    };

    let started = match api.play(cmd.id, quality, &session).await {
        Ok(started) => started,
        Err(e) => return output.api_error("Failed to start movie", &e),
    };

    let mut response = PlayResponse {
        session_id: session.to_string(),
        movie_id: cmd.id,
        quality: quality.to_string(),
        torrent_id: started.torrent_id,
        message: started.message,
        stream_url: None,
    };

    let Some((channel, mut signals)) = watch else {
        return print_play(&response, output);
    };

    output.info(format!("Torrent started successfully ({})", session));
    let stream_url = match follow_until_ready(&session, &mut signals, output).await {
        Some(path) => api.resolve(&path),
        None => {
            channel.shutdown();
            return output.error("Interrupted before the video was ready", ExitCode::Error);
        }
    };
    channel.shutdown();
    response.stream_url = Some(stream_url.clone());

    if cmd.no_player {
        return print_play(&response, output);
    }

    let player = LocalPlayer::new(cmd.player.map(Into::into).unwrap_or(config.player));
    if !player.is_available() {
        output.info(format!("Stream URL: {}", stream_url));
        return output.error(
            format!("{} not found. Install it or pass --no-player", player.player_type()),
            ExitCode::PlayerFailed,
        );
    }
    output.info(format!("Opening {}...", player.player_type()));
    match player.play_and_wait(&stream_url).await {
        Ok(()) => print_play(&response, output),
        Err(e) => output.error(e.to_string(), ExitCode::PlayerFailed),
    }
}

fn print_play(response: &PlayResponse, output: &Output) -> ExitCode {
    if output.json {
        if let Err(e) = output.print(response) {
            return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
        }
    } else {
        println!("{}", response.session_id);
        if let Some(url) = &response.stream_url {
            println!("{}", url);
        }
    }
    ExitCode::Success
}

/// Print progress until `video_ready` for this session arrives. Returns the
/// server-relative stream path, or None on Ctrl-C / channel loss.
async fn follow_until_ready(
    session: &SessionId,
    signals: &mut mpsc::UnboundedReceiver<ChannelSignal>,
    output: &Output,
) -> Option<String> {
    loop {
        let signal = tokio::select! {
            signal = signals.recv() => signal?,
            _ = tokio::signal::ctrl_c() => return None,
        };
        match signal {
            ChannelSignal::Connected => output.info("Connected to server"),
            ChannelSignal::Disconnected => output.info("Disconnected from server, retrying..."),
            ChannelSignal::Event(event) if event.session_id() == Some(session.as_str()) => {
                match event {
                    PushEvent::TransferProgress(progress) => {
                        let status = progress.to_status();
                        if output.json {
                            let _ = output.print_line(&status);
                        } else if !output.quiet {
                            eprintln!("{}", status);
                        }
                    }
                    PushEvent::VideoReady(ready) => {
                        output.info("Video ready to play");
                        return Some(ready.video_path);
                    }
                    other => debug!(?other, "push event"),
                }
            }
            ChannelSignal::Event(other) => debug!(?other, "ignoring push event"),
        }
    }
}

// =============================================================================
// Transfer Control Commands
// =============================================================================

pub async fn pause_cmd(arg: SessionArg, api: &PlayerApi, output: &Output) -> ExitCode {
    control(ControlAction::Pause, arg.session_id(), api, output).await
}

pub async fn resume_cmd(arg: SessionArg, api: &PlayerApi, output: &Output) -> ExitCode {
    control(ControlAction::Resume, arg.session_id(), api, output).await
}

pub async fn stop_cmd(arg: SessionArg, api: &PlayerApi, output: &Output) -> ExitCode {
    control(ControlAction::Stop, arg.session_id(), api, output).await
}

async fn control(
    action: ControlAction,
    session: SessionId,
    api: &PlayerApi,
    output: &Output,
) -> ExitCode {
    match api.control(&session, action).await {
        Ok(ack) => {
            let response = ControlResponse {
                session_id: session.to_string(),
                action: action.to_string(),
                message: ack.message,
            };
            if output.json {
                if let Err(e) = output.print(&response) {
                    return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                }
            } else if !output.quiet {
                let message = response
                    .message
                    .unwrap_or_else(|| format!("Torrent {}", action));
                println!("{}", message);
            }
            ExitCode::Success
        }
        Err(e) => output.api_error("Control failed", &e),
    }
}

// =============================================================================
// Status Command
// =============================================================================

pub async fn status_cmd(cmd: StatusCmd, api: &PlayerApi, output: &Output) -> ExitCode {
    let session = cmd.target.session_id();
    let interval = Duration::from_secs(cmd.interval.max(1));

    loop {
        match api.status(&session).await {
            Ok(status) => {
                if output.json {
                    let printed = if cmd.watch {
                        output.print_line(&status)
                    } else {
                        output.print(&status)
                    };
                    if let Err(e) = printed {
                        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
                    }
                } else {
                    let title = status
                        .current_movie
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}  {:.1}%  {}",
                        TransferPhase::from(status.status.clone()),
                        status.progress,
                        title
                    );
                }
            }
            Err(e) => return output.api_error("Failed to fetch session status", &e),
        }

        if !cmd.watch {
            return ExitCode::Success;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => return ExitCode::Success,
        }
    }
}
