//! Lookup trait for fetching single entities.

use async_trait::async_trait;

use crate::client::BeatSaver;
use crate::error::Result;
use crate::models::{Beatmap, User};
use crate::progress::RequestOptions;

/// Fetch a single entity by identifier.
///
/// Lookups of missing entities resolve to `Ok(None)`.
///
/// # Example
///
/// ```no_run
/// use beatsaver::{BeatSaver, Beatmap, BeatmapId, Lookup};
///
/// # async fn example() -> beatsaver::Result<()> {
/// let client = BeatSaver::default_client()?;
/// let id = BeatmapId::Key("17f9".to_string());
/// let map = Beatmap::lookup(&client, &id, &Default::default()).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Lookup: Sized {
    /// The identifier type for this entity.
    type Id: Send + Sync;

    /// Fetch the entity by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty or the request fails.
    async fn lookup(
        client: &BeatSaver,
        id: &Self::Id,
        options: &RequestOptions,
    ) -> Result<Option<Self>>;
}

/// The two ways a beatmap can be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BeatmapId {
    /// Short hex key, e.g. `17f9`.
    Key(String),
    /// Content hash of the map archive.
    Hash(String),
}

#[async_trait]
impl Lookup for Beatmap {
    type Id = BeatmapId;

    async fn lookup(
        client: &BeatSaver,
        id: &BeatmapId,
        options: &RequestOptions,
    ) -> Result<Option<Self>> {
        match id {
            BeatmapId::Key(key) => client.by_key(key, options).await,
            BeatmapId::Hash(hash) => client.by_hash(hash, options).await,
        }
    }
}

#[async_trait]
impl Lookup for User {
    type Id = String;

    async fn lookup(
        client: &BeatSaver,
        id: &String,
        options: &RequestOptions,
    ) -> Result<Option<Self>> {
        client.user(id, options).await
    }
}
