//! Integration tests for torrentplayer
//!
//! Tests are organized by component:
//! - api_test: REST client against a mocked server (envelopes, errors)
//! - push_test: push channel against a local WebSocket server
//! - controller_test: session controller event/effect behaviour
//! - cli_test: argument parsing, exit codes, JSON output types
//! - ui_test: rendering and key handling
//! - e2e_test: runtime flows (Search -> Play -> Stop) against a mocked server

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
