//! Mock BeatSaver server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the BeatSaver
//! API for integration and end-to-end testing. Unlike wiremock which mocks at
//! the HTTP level per-test, this server maintains state across requests
//! (votes change stats, counted downloads bump the counter), enabling
//! realistic workflow testing.
//!
//! # Example
//!
//! ```ignore
//! use beatsaver::mock_server::MockServer;
//! use beatsaver::{BeatSaver, ClientOptions};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = BeatSaver::new(ClientOptions::default().with_base_url(server.url())).unwrap();
//!
//!     // Server comes with default fixtures
//!     let map = client.by_key("17f9", &Default::default()).await.unwrap().unwrap();
//!     assert_eq!(map.name(), Some("Centipede"));
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures};
pub use server::MockServer;
pub use state::{MockState, PageSlice, VoteRejection, DEFAULT_PAGE_SIZE};
