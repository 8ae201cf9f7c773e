//! CLI Command Tests
//!
//! Argument parsing, exit codes and JSON output types, plus the command
//! handlers run against a mocked server.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use torrentplayer::cli::{Cli, Command, PlayerChoice};
    use torrentplayer::models::Quality;

    #[test]
    fn test_search_command_basic() {
        let cli = Cli::parse_from(["torrentplayer", "search", "inception"]);
        assert!(cli.is_cli_mode());
        match cli.command {
            Some(Command::Search(cmd)) => {
                assert_eq!(cmd.query, "inception");
                assert!(cmd.limit.is_none());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_alias_and_limit() {
        let cli = Cli::parse_from(["torrentplayer", "s", "dune", "-l", "5"]);
        match cli.command {
            Some(Command::Search(cmd)) => {
                assert_eq!(cmd.query, "dune");
                assert_eq!(cmd.limit, Some(5));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["torrentplayer", "search"]).is_err());
    }

    #[test]
    fn test_browse_defaults_to_first_page() {
        let cli = Cli::parse_from(["torrentplayer", "browse"]);
        match cli.command {
            Some(Command::Browse(cmd)) => assert_eq!(cmd.page, 1),
            _ => panic!("Expected Browse command"),
        }
    }

    #[test]
    fn test_info_and_torrent_ids() {
        let cli = Cli::parse_from(["torrentplayer", "info", "42"]);
        assert!(matches!(cli.command, Some(Command::Info(ref cmd)) if cmd.id == 42));

        let cli = Cli::parse_from(["torrentplayer", "t", "7", "-Q", "1080p"]);
        assert_eq!(cli.quality, Some(Quality::FHD1080p));
        assert!(matches!(cli.command, Some(Command::Torrent(ref cmd)) if cmd.id == 7));

        assert!(Cli::try_parse_from(["torrentplayer", "info", "abc"]).is_err());
    }

    #[test]
    fn test_play_with_all_flags() {
        let cli = Cli::parse_from([
            "torrentplayer",
            "play",
            "42",
            "--session",
            "session_fixed0001",
            "--watch",
            "--no-player",
            "--player",
            "mpv",
        ]);
        match cli.command {
            Some(Command::Play(cmd)) => {
                assert_eq!(cmd.session_id().as_str(), "session_fixed0001");
                assert!(cmd.watch);
                assert!(cmd.no_player);
                assert_eq!(cmd.player, Some(PlayerChoice::Mpv));
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_play_generates_distinct_sessions() {
        let cli = Cli::parse_from(["torrentplayer", "play", "1"]);
        let Some(Command::Play(cmd)) = cli.command else {
            panic!("Expected Play command");
        };
        let a = cmd.session_id();
        let b = cmd.session_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), "session_".len() + 9);
    }

    #[test]
    fn test_status_watch_interval() {
        let cli = Cli::parse_from([
            "torrentplayer",
            "status",
            "-s",
            "session_abc",
            "--watch",
            "-i",
            "5",
        ]);
        match cli.command {
            Some(Command::Status(cmd)) => {
                assert_eq!(cmd.target.session, "session_abc");
                assert!(cmd.watch);
                assert_eq!(cmd.interval, 5);
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["torrentplayer", "browse", "-p", "3", "--json", "-q"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(cli.should_json());
    }

    #[test]
    fn test_config_path_flag() {
        let cli = Cli::parse_from(["torrentplayer", "-c", "/tmp/player.toml"]);
        assert!(!cli.is_cli_mode());
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/player.toml"))
        );
    }
}

// =============================================================================
// Exit Code and JSON Output Tests
// =============================================================================

mod output_types {
    use torrentplayer::api::catalog::ApiError;
    use torrentplayer::cli::{ControlResponse, ExitCode, JsonOutput, PlayResponse};

    #[test]
    fn test_exit_code_values() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
        assert_eq!(i32::from(ExitCode::Rejected), 5);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 6);
    }

    #[test]
    fn test_exit_code_for_server_errors() {
        assert_eq!(
            ExitCode::for_api_error(&ApiError::ServerError(500)),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::for_api_error(&ApiError::InvalidResponse("x".into())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::for_api_error(&ApiError::Rejected(Some("No active torrent".into()))),
            ExitCode::Rejected
        );
    }

    #[test]
    fn test_json_success_envelope() {
        let out = JsonOutput::success(vec![1, 2, 3]);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json, serde_json::json!({"data": [1, 2, 3]}));
    }

    #[test]
    fn test_json_error_envelope() {
        let out = JsonOutput::<()>::error_msg("Failed to load movies", ExitCode::NetworkError);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Failed to load movies", "exit_code": 3})
        );
    }

    #[test]
    fn test_play_response_skips_empty_fields() {
        let response = PlayResponse {
            session_id: "session_abc".into(),
            movie_id: 42,
            quality: "720p".into(),
            torrent_id: None,
            message: None,
            stream_url: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"session_id": "session_abc", "movie_id": 42, "quality": "720p"})
        );
    }

    #[test]
    fn test_control_response_serializes_message() {
        let response = ControlResponse {
            session_id: "session_abc".into(),
            action: "pause".into(),
            message: Some("Torrent paused".into()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["action"], "pause");
        assert_eq!(json["message"], "Torrent paused");
    }
}

// =============================================================================
// Command Handlers Against a Mocked Server
// =============================================================================

mod handlers {
    use clap::Parser;
    use mockito::{Matcher, Server};
    use torrentplayer::api::PlayerApi;
    use torrentplayer::cli::{Cli, Command, ExitCode, Output};
    use torrentplayer::commands;
    use torrentplayer::config::Config;
    use torrentplayer::models::Quality;

    fn parse(args: &[&str]) -> (Output, Command) {
        let mut argv = vec!["torrentplayer", "--json", "--quiet"];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let output = Output::new(&cli);
        (output, cli.command.unwrap())
    }

    #[tokio::test]
    async fn test_search_cmd_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/movies")
            .match_query(Matcher::UrlEncoded("query".into(), "inception".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "movies": [{"id": 1, "title": "Inception"}]}"#)
            .create_async()
            .await;

        let (output, command) = parse(&["search", "inception"]);
        let Command::Search(cmd) = command else {
            panic!("Expected Search command");
        };
        let api = PlayerApi::new(server.url());
        let code = commands::search_cmd(cmd, &api, Quality::HD720p, &output).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_search_cmd_blank_term() {
        let (output, command) = parse(&["search", "   "]);
        let Command::Search(cmd) = command else {
            panic!("Expected Search command");
        };
        // Never reaches the network
        let api = PlayerApi::new("http://127.0.0.1:9");
        let code = commands::search_cmd(cmd, &api, Quality::HD720p, &output).await;
        assert_eq!(code, ExitCode::InvalidArgs);
    }

    #[tokio::test]
    async fn test_info_cmd_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/movie/999")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let (output, command) = parse(&["info", "999"]);
        let Command::Info(cmd) = command else {
            panic!("Expected Info command");
        };
        let api = PlayerApi::new(server.url());
        assert_eq!(
            commands::info_cmd(cmd, &api, &output).await,
            ExitCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_play_cmd_without_watch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/play")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "movie_id": 42,
                "quality": "1080p",
                "session_id": "session_cli000001"
            })))
            .with_status(200)
            .with_body(r#"{"success": true, "torrent_id": "abc"}"#)
            .create_async()
            .await;

        let (output, command) = parse(&["play", "42", "-s", "session_cli000001"]);
        let Command::Play(cmd) = command else {
            panic!("Expected Play command");
        };
        let api = PlayerApi::new(server.url());
        let code =
            commands::play_cmd(cmd, &api, &Config::default(), Quality::FHD1080p, &output).await;

        mock.assert_async().await;
        assert_eq!(code, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_play_cmd_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/play")
            .with_status(503)
            .with_body(r#"{"success": false, "error": "Torrent functionality not available"}"#)
            .create_async()
            .await;

        let (output, command) = parse(&["play", "42"]);
        let Command::Play(cmd) = command else {
            panic!("Expected Play command");
        };
        let api = PlayerApi::new(server.url());
        let code =
            commands::play_cmd(cmd, &api, &Config::default(), Quality::HD720p, &output).await;
        assert_eq!(code, ExitCode::Rejected);
    }

    #[tokio::test]
    async fn test_control_cmds() {
        let mut server = Server::new_async().await;
        let pause = server
            .mock("POST", "/api/control/session_abc")
            .match_body(Matcher::Json(serde_json::json!({"action": "pause"})))
            .with_status(200)
            .with_body(r#"{"success": true, "message": "Torrent paused"}"#)
            .create_async()
            .await;
        let stop = server
            .mock("POST", "/api/control/session_abc")
            .match_body(Matcher::Json(serde_json::json!({"action": "stop"})))
            .with_status(404)
            .with_body(r#"{"success": false, "error": "No active torrent"}"#)
            .create_async()
            .await;
        let api = PlayerApi::new(server.url());

        let (output, command) = parse(&["pause", "-s", "session_abc"]);
        let Command::Pause(arg) = command else {
            panic!("Expected Pause command");
        };
        assert_eq!(
            commands::pause_cmd(arg, &api, &output).await,
            ExitCode::Success
        );

        let (output, command) = parse(&["stop", "-s", "session_abc"]);
        let Command::Stop(arg) = command else {
            panic!("Expected Stop command");
        };
        assert_eq!(
            commands::stop_cmd(arg, &api, &output).await,
            ExitCode::Rejected
        );

        pause.assert_async().await;
        stop.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_cmd_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (output, command) = parse(&["status", "-s", "session_abc"]);
        let Command::Status(cmd) = command else {
            panic!("Expected Status command");
        };
        let api = PlayerApi::new(format!("http://127.0.0.1:{}", port));
        assert_eq!(
            commands::status_cmd(cmd, &api, &output).await,
            ExitCode::NetworkError
        );
    }
}
