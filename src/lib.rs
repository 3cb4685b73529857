//! BeatSaver API client library.
//!
//! A Rust library for browsing the BeatSaver beatmap catalog: paged
//! listings, search, lookups by key or hash, user lookups, downloads and
//! Steam-authenticated voting.
//!
//! # Quick Start
//!
//! ```no_run
//! use beatsaver::{AutomapperQuery, BeatSaver, Beatmap, ClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> beatsaver::Result<()> {
//!     let client = BeatSaver::new(ClientOptions::default().with_application("MyApp", "1.0.0"))?;
//!
//!     // Browse a listing
//!     if let Some(page) = client.hot(0, AutomapperQuery::None, &Default::default()).await? {
//!         println!("{} of {} maps", page.len(), page.total_docs);
//!
//!         if let Some(next) = page.fetch_next(&Default::default()).await? {
//!             println!("page {} has {} maps", next.index(), next.len());
//!         }
//!     }
//!
//!     // Resolve a partial beatmap
//!     let mut map = Beatmap::from_key(&client, "17f9")?;
//!     map.populate().await?;
//!     println!("{:?} by {:?}", map.name(), map.uploader().map(|u| &u.username));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation and progress
//!
//! Every read operation takes [`RequestOptions`]. A [`CancellationToken`]
//! aborts the request with [`BeatSaverError::Cancelled`]; a progress sink
//! receives monotonically increasing fractions ending at `1.0`.
//!
//! # Streams
//!
//! The `*_stream` operations and [`Page::into_stream`] flatten consecutive
//! pages into a [`BeatmapStream`]. Pages are fetched only as the stream is
//! polled.

mod catalog;
mod client;
mod config;
mod error;
mod http;
mod models;
mod pagination;
mod progress;
mod routes;
mod traits;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::BeatSaver;
pub use config::{ClientOptions, DEFAULT_BASE_URL};
pub use error::{BeatSaverError, Result};
pub use http::{HttpResponse, ReqwestTransport, Transport};
pub use pagination::{BeatmapStream, Page};
pub use progress::{ProgressSink, RequestOptions};
pub use routes::{AutomapperQuery, ListingType, PageRoute, SearchType};
pub use tokio_util::sync::CancellationToken;

// Re-export traits
pub use traits::{BeatmapId, Lookup};

// Re-export models
pub use models::{
    // Beatmap types
    Beatmap,
    BeatmapData,
    // Metadata types
    Characteristic,
    CharacteristicDifficulty,
    Difficulties,
    Metadata,
    Stats,
    // User types
    User,
    // Vote types
    AuthTicket,
    RestError,
    VoteDirection,
};
