//! Mock BeatSaver server.
//!
//! Provides an axum-based HTTP server that simulates the BeatSaver API and
//! its CDN.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::MockState;

/// A mock BeatSaver server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Pass this as the `base_url` of the client options.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Number of requests handled so far, health checks excluded.
    pub async fn request_count(&self) -> u64 {
        self.state.read().await.request_count
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    pub fn default_state() -> MockState {
        Self::state_from_scenario(Fixtures::default_scenario())
    }

    /// Create state from a scenario.
    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();

        for user in scenario.users {
            state.users.insert(user.id.clone(), user);
        }

        for beatmap in scenario.beatmaps {
            state.insert_beatmap(beatmap);
        }

        state
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            // Listings and lookups share a prefix; the first segment decides.
            .route("/api/maps/:kind/:arg", get(handlers::get_maps))
            .route("/api/maps/:kind/:arg/:page", get(handlers::get_uploader_maps))
            .route("/api/search/:kind/:page", get(handlers::search))
            .route("/api/users/find/:id", get(handlers::find_user))
            .route("/api/vote/steam/:key", post(handlers::vote_steam))
            .route("/api/download/key/:key", get(handlers::download_by_key))
            .route("/cdn/:key/:file", get(handlers::cdn_file))
            .route_layer(middleware::from_fn_with_state(state.clone(), track_request))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Count the request and apply the configured latency.
async fn track_request(
    State(state): State<Arc<RwLock<MockState>>>,
    request: Request,
    next: Next,
) -> Response {
    let latency = {
        let mut state = state.write().await;
        state.request_count += 1;
        state.latency
    };

    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }

    next.run(request).await
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
