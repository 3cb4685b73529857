//! User model.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::client::ClientHandle;
use crate::error::Result;
use crate::pagination::{BeatmapStream, Page};
use crate::progress::RequestOptions;
use crate::routes::PageRoute;

/// A BeatSaver user (typically a beatmap uploader).
///
/// Users are identified by [`id`](Self::id) alone; two users with the same
/// id are equal regardless of display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name.
    pub username: String,

    #[serde(skip)]
    client: ClientHandle,
}

impl User {
    /// Create a detached user. Attach it by fetching through a client.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            client: ClientHandle::default(),
        }
    }

    pub(crate) fn attach(&mut self, client: ClientHandle) {
        self.client = client;
    }

    /// Fetch a page of beatmaps uploaded by this user.
    ///
    /// Returns `None` if the service has no such page.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let user = client.user("5cff0b7398cc5a672c84efe4", &Default::default()).await?.unwrap();
    /// if let Some(page) = user.beatmaps(0, &Default::default()).await? {
    ///     for map in &page {
    ///         println!("{:?}", map.name());
    ///     }
    /// }
    /// ```
    #[tracing::instrument(skip(self, options), fields(user = %self.id))]
    pub async fn beatmaps(&self, page: u32, options: &RequestOptions) -> Result<Option<Page>> {
        self.client.client()?.uploader(&self.id, page, options).await
    }

    /// Stream every beatmap uploaded by this user, starting at `page`.
    pub fn beatmaps_stream(&self, page: u32, options: RequestOptions) -> Result<BeatmapStream> {
        let client = self.client.client()?;
        Ok(crate::pagination::beatmap_stream(
            Some(client),
            PageRoute::uploader(&self.id),
            Vec::new(),
            Some(page),
            options,
        ))
    }

    /// Absent-aware equality: `false` whenever either side is `None`.
    pub fn same(lhs: Option<&User>, rhs: Option<&User>) -> bool {
        matches!((lhs, rhs), (Some(a), Some(b)) if a == b)
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
