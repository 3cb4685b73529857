//! Beatmap model, partial construction and resolution.

use std::hash::{Hash, Hasher};
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{BeatSaver, ClientHandle};
use crate::error::{require_non_empty, BeatSaverError, Result};
use crate::models::metadata::{Metadata, Stats};
use crate::models::user::User;
use crate::progress::RequestOptions;

/// The full record served by the catalog for one beatmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatmapData {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: String,

    /// Short hex key (e.g. "17f9").
    pub key: String,

    pub name: String,

    /// Multiline description.
    #[serde(default)]
    pub description: Option<String>,

    /// User who uploaded this beatmap.
    pub uploader: User,

    /// When this beatmap was uploaded.
    pub uploaded: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub stats: Stats,

    /// Download path that skips the download counter.
    pub direct_download: String,

    #[serde(rename = "downloadURL")]
    pub download_url: String,

    #[serde(rename = "coverURL")]
    pub cover_url: String,

    /// SHA-1 of the beatmap contents, hex encoded.
    pub hash: String,
}

/// Identifiers a partial beatmap was built from.
///
/// At least one of key and hash is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PartialIdent {
    Key(String),
    Hash(String),
    Both { key: String, hash: String },
}

impl PartialIdent {
    fn key(&self) -> Option<&str> {
        match self {
            Self::Key(key) | Self::Both { key, .. } => Some(key),
            Self::Hash(_) => None,
        }
    }

    fn hash(&self) -> Option<&str> {
        match self {
            Self::Hash(hash) | Self::Both { hash, .. } => Some(hash),
            Self::Key(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PartialBeatmap {
    ident: PartialIdent,
    name: Option<String>,
    description: Option<String>,
    stats: Option<Stats>,
}

#[derive(Debug, Clone)]
enum BeatmapState {
    Partial(PartialBeatmap),
    Full(Box<BeatmapData>),
}

/// A beatmap, either fully fetched or partial.
///
/// Beatmaps returned by the client are full. A partial beatmap is built by
/// the caller from a key or a hash and carries nothing else until
/// [`populate`](Self::populate) replaces it with the authoritative record.
///
/// Equality compares the (id, key, hash) triple.
///
/// # Example
///
/// ```ignore
/// let mut map = Beatmap::from_key(&client, "17f9")?;
/// assert!(map.is_partial());
///
/// map.populate().await?;
/// assert_eq!(map.hash(), Some("108c239db3c0596f1ba7426353af1b4cc4fd8b08"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "BeatmapData")]
pub struct Beatmap {
    state: BeatmapState,
    client: ClientHandle,
}

impl From<BeatmapData> for Beatmap {
    fn from(data: BeatmapData) -> Self {
        Self {
            state: BeatmapState::Full(Box::new(data)),
            client: ClientHandle::default(),
        }
    }
}

impl Beatmap {
    /// Build a partial beatmap from its hex key.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::InvalidArgument`] if `key` is empty.
    pub fn from_key(client: &BeatSaver, key: impl Into<String>) -> Result<Self> {
        Self::partial(client, Some(key.into()), None, None)
    }

    /// Build a partial beatmap from its content hash.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::InvalidArgument`] if `hash` is empty.
    pub fn from_hash(client: &BeatSaver, hash: impl Into<String>) -> Result<Self> {
        Self::partial(client, None, Some(hash.into()), None)
    }

    /// Build a partial beatmap from a key, a hash, or both, with an optional
    /// display name.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::InvalidArgument`] if neither a non-empty key
    /// nor a non-empty hash is given.
    pub fn partial(
        client: &BeatSaver,
        key: Option<String>,
        hash: Option<String>,
        name: Option<String>,
    ) -> Result<Self> {
        let key = key.filter(|k| !k.trim().is_empty());
        let hash = hash.filter(|h| !h.trim().is_empty());

        let ident = match (key, hash) {
            (Some(key), Some(hash)) => PartialIdent::Both { key, hash },
            (Some(key), None) => PartialIdent::Key(key),
            (None, Some(hash)) => PartialIdent::Hash(hash),
            (None, None) => {
                return Err(BeatSaverError::InvalidArgument {
                    name: "key",
                    reason: "key and hash cannot both be empty",
                })
            }
        };

        Ok(Self {
            state: BeatmapState::Partial(PartialBeatmap {
                ident,
                name,
                description: None,
                stats: None,
            }),
            client: client.handle(),
        })
    }

    pub(crate) fn attach(&mut self, client: ClientHandle) {
        if let BeatmapState::Full(data) = &mut self.state {
            data.uploader.attach(client.clone());
        }
        self.client = client;
    }

    pub(crate) fn client(&self) -> Result<BeatSaver> {
        self.client.client()
    }

    pub(crate) fn set_stats(&mut self, stats: Stats) {
        match &mut self.state {
            BeatmapState::Full(data) => data.stats = stats,
            BeatmapState::Partial(partial) => partial.stats = Some(stats),
        }
    }

    fn into_full(self) -> Option<Box<BeatmapData>> {
        match self.state {
            BeatmapState::Full(data) => Some(data),
            BeatmapState::Partial(_) => None,
        }
    }

    /// True until [`populate`](Self::populate) succeeds.
    pub fn is_partial(&self) -> bool {
        matches!(self.state, BeatmapState::Partial(_))
    }

    /// The full record, if this beatmap has been resolved.
    pub fn data(&self) -> Option<&BeatmapData> {
        match &self.state {
            BeatmapState::Full(data) => Some(data),
            BeatmapState::Partial(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.data().map(|d| d.id.as_str())
    }

    pub fn key(&self) -> Option<&str> {
        match &self.state {
            BeatmapState::Full(data) => Some(&data.key),
            BeatmapState::Partial(partial) => partial.ident.key(),
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match &self.state {
            BeatmapState::Full(data) => Some(&data.hash),
            BeatmapState::Partial(partial) => partial.ident.hash(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match &self.state {
            BeatmapState::Full(data) => Some(&data.name),
            BeatmapState::Partial(partial) => partial.name.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match &self.state {
            BeatmapState::Full(data) => data.description.as_deref(),
            BeatmapState::Partial(partial) => partial.description.as_deref(),
        }
    }

    pub fn stats(&self) -> Option<&Stats> {
        match &self.state {
            BeatmapState::Full(data) => Some(&data.stats),
            BeatmapState::Partial(partial) => partial.stats.as_ref(),
        }
    }

    pub fn uploader(&self) -> Option<&User> {
        self.data().map(|d| &d.uploader)
    }

    pub fn uploaded(&self) -> Option<DateTime<Utc>> {
        self.data().map(|d| d.uploaded)
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.data().map(|d| &d.metadata)
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.data().map(|d| d.cover_url.as_str())
    }

    /// File name component of the cover art URL.
    pub fn cover_filename(&self) -> Option<&str> {
        let url = self.cover_url()?;
        let path = url.split(['?', '#']).next().unwrap_or(url);
        Path::new(path).file_name().and_then(|n| n.to_str())
    }

    /// Absent-aware equality: `false` whenever either side is `None`.
    pub fn same(lhs: Option<&Beatmap>, rhs: Option<&Beatmap>) -> bool {
        matches!((lhs, rhs), (Some(a), Some(b)) if a == b)
    }

    fn identity(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (self.id(), self.key(), self.hash())
    }

    /// Resolve a partial beatmap. No-op if already full.
    ///
    /// # Errors
    ///
    /// - [`BeatSaverError::InvalidPartialHash`] / [`BeatSaverError::InvalidPartialKey`]
    ///   if the identifier does not exist (hash is preferred when both are set)
    /// - [`BeatSaverError::InvalidPartial`] if the service answers with a
    ///   beatmap whose key or hash contradicts this one
    pub async fn populate(&mut self) -> Result<()> {
        self.populate_with(&RequestOptions::default()).await
    }

    /// [`populate`](Self::populate) with cancellation and progress.
    #[tracing::instrument(skip_all, fields(key = ?Beatmap::key(self), hash = ?Beatmap::hash(self)))]
    pub async fn populate_with(&mut self, options: &RequestOptions) -> Result<()> {
        let ident = match &self.state {
            BeatmapState::Full(_) => return Ok(()),
            BeatmapState::Partial(partial) => partial.ident.clone(),
        };

        let client = self.client()?;
        let fetched = match ident.hash() {
            Some(hash) => client
                .by_hash(hash, options)
                .await?
                .ok_or_else(|| BeatSaverError::InvalidPartialHash(hash.to_string()))?,
            None => {
                let key = ident.key().ok_or_else(|| {
                    BeatSaverError::InvalidPartial("key and hash are both absent".to_string())
                })?;
                client
                    .by_key(key, options)
                    .await?
                    .ok_or_else(|| BeatSaverError::InvalidPartialKey(key.to_string()))?
            }
        };

        let data = fetched.into_full().ok_or_else(|| {
            BeatSaverError::InvalidPartial("service returned an unresolved beatmap".to_string())
        })?;

        if let Some(key) = ident.key() {
            if !key.eq_ignore_ascii_case(&data.key) {
                return Err(BeatSaverError::InvalidPartial(format!(
                    "key '{key}' does not match resolved key '{}'",
                    data.key
                )));
            }
        }
        if let Some(hash) = ident.hash() {
            if !hash.eq_ignore_ascii_case(&data.hash) {
                return Err(BeatSaverError::InvalidPartial(format!(
                    "hash '{hash}' does not match resolved hash '{}'",
                    data.hash
                )));
            }
        }

        tracing::debug!(id = %data.id, "partial beatmap resolved");
        self.state = BeatmapState::Full(data);
        Ok(())
    }

    /// Re-fetch name, description and stats by hash.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::MissingHash`] if the hash is unknown, and
    /// [`BeatSaverError::InvalidPartialHash`] if it no longer resolves.
    pub async fn refresh(&mut self) -> Result<()> {
        self.refresh_with(&RequestOptions::default()).await
    }

    #[tracing::instrument(skip_all, fields(hash = ?Beatmap::hash(self)))]
    pub async fn refresh_with(&mut self, options: &RequestOptions) -> Result<()> {
        let fresh = self.fetch_current(options).await?;
        match &mut self.state {
            BeatmapState::Full(data) => {
                data.name = fresh.name;
                data.description = fresh.description;
                data.stats = fresh.stats;
            }
            BeatmapState::Partial(partial) => {
                partial.name = Some(fresh.name);
                partial.description = fresh.description;
                partial.stats = Some(fresh.stats);
            }
        }
        Ok(())
    }

    /// Re-fetch only the stats by hash.
    pub async fn refresh_stats(&mut self) -> Result<()> {
        self.refresh_stats_with(&RequestOptions::default()).await
    }

    #[tracing::instrument(skip_all, fields(hash = ?Beatmap::hash(self)))]
    pub async fn refresh_stats_with(&mut self, options: &RequestOptions) -> Result<()> {
        let fresh = self.fetch_current(options).await?;
        self.set_stats(fresh.stats);
        Ok(())
    }

    async fn fetch_current(&self, options: &RequestOptions) -> Result<Box<BeatmapData>> {
        let hash = self.hash().ok_or(BeatSaverError::MissingHash)?;
        let hash = require_non_empty("hash", hash)?;
        self.client()?
            .by_hash(hash, options)
            .await?
            .and_then(Beatmap::into_full)
            .ok_or_else(|| BeatSaverError::InvalidPartialHash(hash.to_string()))
    }

    /// Download the beatmap archive.
    ///
    /// With `direct`, the request skips the service's download counter.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::Unpopulated`] for a partial beatmap.
    #[tracing::instrument(skip(self, options), fields(key = ?self.key()))]
    pub async fn download_zip(&self, direct: bool, options: &RequestOptions) -> Result<Bytes> {
        let data = self.data().ok_or(BeatSaverError::Unpopulated {
            operation: "download",
        })?;
        let path = if direct {
            &data.direct_download
        } else {
            &data.download_url
        };

        let client = self.client()?;
        let url = client.resource_url(path)?;
        client.download(url, options).await
    }

    /// Download the cover art.
    #[tracing::instrument(skip(self, options), fields(key = ?self.key()))]
    pub async fn fetch_cover_image(&self, options: &RequestOptions) -> Result<Bytes> {
        let data = self.data().ok_or(BeatSaverError::Unpopulated {
            operation: "fetch the cover of",
        })?;

        let client = self.client()?;
        let url = client.resource_url(&data.cover_url)?;
        client.download(url, options).await
    }
}

impl PartialEq for Beatmap {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Beatmap {}

impl Hash for Beatmap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::config::ClientOptions;
    use crate::http::{HttpResponse, Transport};

    const TOWER_OF_HEAVEN: &str = r#"{
        "_id": "5cff621048229f7d88fc724c",
        "key": "17f9",
        "name": "Tower of Heaven",
        "description": "Expert+ only",
        "uploader": {"_id": "5cff0b7498cc5a672c850786", "username": "zorowo"},
        "uploaded": "2019-01-10T21:34:11.000Z",
        "metadata": {"songName": "Tower of Heaven", "bpm": 150},
        "stats": {"downloads": 1000, "plays": 50, "upVotes": 90, "downVotes": 3, "rating": 0.93, "heat": 120.5},
        "directDownload": "/cdn/17f9/108c239db3c0596f1ba7426353af1b4cc4fd8b08.zip",
        "downloadURL": "/api/download/key/17f9",
        "coverURL": "/cdn/17f9/108c239db3c0596f1ba7426353af1b4cc4fd8b08.jpg",
        "hash": "108c239db3c0596f1ba7426353af1b4cc4fd8b08"
    }"#;

    const TOWER_HASH: &str = "108c239db3c0596f1ba7426353af1b4cc4fd8b08";

    fn client() -> BeatSaver {
        BeatSaver::new(Default::default()).unwrap()
    }

    /// Answers every GET with the same beatmap record.
    struct FixedTransport {
        body: String,
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, _url: Url, _options: &RequestOptions) -> Result<HttpResponse> {
            Ok(HttpResponse::new(200, self.body.clone()))
        }

        async fn post_json(&self, _url: Url, _body: &serde_json::Value) -> Result<HttpResponse> {
            Ok(HttpResponse::new(404, ""))
        }
    }

    fn serving(body: &str) -> BeatSaver {
        let transport = FixedTransport {
            body: body.to_string(),
        };
        BeatSaver::with_transport(ClientOptions::default(), transport).unwrap()
    }

    #[test]
    fn test_beatmap_deserialize_is_full() {
        let map: Beatmap = serde_json::from_str(TOWER_OF_HEAVEN).expect("Failed to deserialize");
        assert!(!map.is_partial());
        assert_eq!(map.id(), Some("5cff621048229f7d88fc724c"));
        assert_eq!(map.key(), Some("17f9"));
        assert_eq!(map.name(), Some("Tower of Heaven"));
        assert_eq!(map.uploader().unwrap().username, "zorowo");
        assert_eq!(map.stats().unwrap().up_votes, 90);
        assert_eq!(
            map.cover_filename(),
            Some("108c239db3c0596f1ba7426353af1b4cc4fd8b08.jpg")
        );
    }

    #[test]
    fn test_partial_from_key() {
        let client = client();
        let map = Beatmap::from_key(&client, "17f9").unwrap();
        assert!(map.is_partial());
        assert_eq!(map.key(), Some("17f9"));
        assert_eq!(map.hash(), None);
        assert_eq!(map.id(), None);
        assert!(map.name().is_none());
        assert!(map.stats().is_none());
        assert!(map.data().is_none());
    }

    #[test]
    fn test_partial_requires_identifier() {
        let client = client();
        assert!(matches!(
            Beatmap::partial(&client, None, None, Some("name".to_string())),
            Err(BeatSaverError::InvalidArgument { .. })
        ));
        assert!(Beatmap::from_key(&client, "").is_err());
        assert!(Beatmap::from_hash(&client, "   ").is_err());
    }

    #[test]
    fn test_partial_with_name() {
        let client = client();
        let map = Beatmap::partial(
            &client,
            Some("17f9".to_string()),
            Some("108c239db3c0596f1ba7426353af1b4cc4fd8b08".to_string()),
            Some("Tower of Heaven".to_string()),
        )
        .unwrap();
        assert!(map.is_partial());
        assert_eq!(map.name(), Some("Tower of Heaven"));
        assert_eq!(map.hash(), Some("108c239db3c0596f1ba7426353af1b4cc4fd8b08"));
    }

    #[test]
    fn test_equality_over_identifiers() {
        let a: Beatmap = serde_json::from_str(TOWER_OF_HEAVEN).unwrap();
        let mut b = a.clone();
        b.set_stats(Stats::default());
        assert_eq!(a, b);

        let partial = Beatmap::from_key(&client(), "17f9").unwrap();
        assert_ne!(a, partial);

        assert!(Beatmap::same(Some(&a), Some(&b)));
        assert!(!Beatmap::same(Some(&a), None));
        assert!(!Beatmap::same(None, None));
    }

    #[test]
    fn test_set_stats_on_partial() {
        let mut map = Beatmap::from_hash(&client(), "abc").unwrap();
        map.set_stats(Stats {
            up_votes: 2,
            ..Default::default()
        });
        assert!(map.is_partial());
        assert_eq!(map.stats().unwrap().up_votes, 2);
    }

    #[tokio::test]
    async fn test_populate_full_is_noop() {
        // Detached full beatmap: a request would fail with ClientUnavailable.
        let mut map: Beatmap = serde_json::from_str(TOWER_OF_HEAVEN).unwrap();
        map.populate().await.expect("populate on full beatmap is a no-op");
        assert!(!map.is_partial());
    }

    #[tokio::test]
    async fn test_populate_with_resolves_partial() {
        let client = serving(TOWER_OF_HEAVEN);
        let mut map = Beatmap::from_hash(&client, TOWER_HASH.to_uppercase()).unwrap();

        map.populate_with(&RequestOptions::default()).await.unwrap();

        assert!(!map.is_partial());
        assert_eq!(map.key(), Some("17f9"));
        assert_eq!(map.name(), Some("Tower of Heaven"));
    }

    #[tokio::test]
    async fn test_populate_rejects_mismatched_hash() {
        let client = serving(TOWER_OF_HEAVEN);
        let mut map = Beatmap::from_hash(&client, "f".repeat(40)).unwrap();

        assert!(matches!(
            map.populate().await,
            Err(BeatSaverError::InvalidPartial(_))
        ));
        assert!(map.is_partial());
        assert_eq!(map.hash(), Some("f".repeat(40).as_str()));
    }

    #[tokio::test]
    async fn test_populate_rejects_mismatched_key() {
        let client = serving(TOWER_OF_HEAVEN);
        let mut map = Beatmap::from_key(&client, "2144").unwrap();

        assert!(matches!(
            map.populate().await,
            Err(BeatSaverError::InvalidPartial(_))
        ));
        assert!(map.is_partial());
    }

    #[tokio::test]
    async fn test_refresh_with_keeps_partial_state() {
        let client = serving(TOWER_OF_HEAVEN);
        let mut map = Beatmap::from_hash(&client, TOWER_HASH).unwrap();

        map.refresh_with(&RequestOptions::default()).await.unwrap();
        map.refresh_stats_with(&RequestOptions::default()).await.unwrap();

        assert!(map.is_partial());
        assert_eq!(map.name(), Some("Tower of Heaven"));
        assert_eq!(map.description(), Some("Expert+ only"));
        assert_eq!(map.stats().unwrap().up_votes, 90);
    }

    #[tokio::test]
    async fn test_refresh_requires_hash() {
        let mut map = Beatmap::from_key(&client(), "17f9").unwrap();
        assert!(matches!(
            map.refresh().await,
            Err(BeatSaverError::MissingHash)
        ));
        assert!(matches!(
            map.refresh_stats().await,
            Err(BeatSaverError::MissingHash)
        ));
    }

    #[tokio::test]
    async fn test_downloads_require_full_beatmap() {
        let map = Beatmap::from_key(&client(), "17f9").unwrap();
        assert!(matches!(
            map.download_zip(false, &Default::default()).await,
            Err(BeatSaverError::Unpopulated { .. })
        ));
        assert!(matches!(
            map.fetch_cover_image(&Default::default()).await,
            Err(BeatSaverError::Unpopulated { .. })
        ));
    }
}
