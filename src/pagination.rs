//! Pages of listing results and navigation between them.

use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;

use crate::client::{BeatSaver, ClientHandle};
use crate::error::{BeatSaverError, Result};
use crate::models::Beatmap;
use crate::progress::RequestOptions;
use crate::routes::PageRoute;

/// Lazy stream of beatmaps spanning consecutive pages.
pub type BeatmapStream = BoxStream<'static, Result<Beatmap>>;

/// A page of results from a listing or search.
///
/// A page remembers the route that produced it, so [`fetch_next`](Self::fetch_next)
/// and [`fetch_previous`](Self::fetch_previous) need no further input. Each
/// navigation issues a new request and returns a new page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// The beatmaps on this page.
    pub docs: Vec<Beatmap>,
    /// Total number of beatmaps across all pages.
    pub total_docs: u64,
    /// Index of the last page.
    pub last_page: u32,
    /// Index of the previous page; `None` on the first page.
    #[serde(rename = "prevPage", default)]
    pub previous_page: Option<u32>,
    /// Index of the next page; `None` on the last page.
    #[serde(default)]
    pub next_page: Option<u32>,

    #[serde(skip)]
    index: u32,
    #[serde(skip)]
    route: PageRoute,
    #[serde(skip)]
    client: ClientHandle,
}

impl Page {
    pub(crate) fn attach(&mut self, client: ClientHandle, route: PageRoute, index: u32) {
        for beatmap in &mut self.docs {
            beatmap.attach(client.clone());
        }
        self.client = client;
        self.route = route;
        self.index = index;
    }

    /// Index this page was fetched with.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Route template used to fetch this page and its neighbours.
    pub fn route(&self) -> &PageRoute {
        &self.route
    }

    /// Returns true if this page has no beatmaps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Returns the number of beatmaps on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns an iterator over the beatmaps in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, Beatmap> {
        self.docs.iter()
    }

    /// Returns true if this is the last page of the sequence.
    pub fn is_last(&self) -> bool {
        self.next_page.is_none()
    }

    /// Fetch the next page in this sequence.
    ///
    /// Returns `Ok(None)` on the last page without making a request.
    #[tracing::instrument(
        skip(self, options),
        fields(route = self.route.base(), next = ?self.next_page)
    )]
    pub async fn fetch_next(&self, options: &RequestOptions) -> Result<Option<Page>> {
        match self.next_page {
            Some(next) => self.fetch_index(next, options).await,
            None => Ok(None),
        }
    }

    /// Fetch the previous page in this sequence.
    ///
    /// Returns `Ok(None)` on the first page without making a request.
    #[tracing::instrument(
        skip(self, options),
        fields(route = self.route.base(), previous = ?self.previous_page)
    )]
    pub async fn fetch_previous(&self, options: &RequestOptions) -> Result<Option<Page>> {
        match self.previous_page {
            Some(previous) => self.fetch_index(previous, options).await,
            None => Ok(None),
        }
    }

    async fn fetch_index(&self, index: u32, options: &RequestOptions) -> Result<Option<Page>> {
        self.client
            .client()?
            .fetch_page(&self.route, index, options)
            .await
    }

    /// Stream this page's beatmaps followed by those of every later page.
    ///
    /// Later pages are requested only as the stream is polled past the
    /// beatmaps already buffered.
    pub fn into_stream(self, options: RequestOptions) -> BeatmapStream {
        let client = self.client.client().ok();
        beatmap_stream(client, self.route, self.docs, self.next_page, options)
    }
}

impl IntoIterator for Page {
    type Item = Beatmap;
    type IntoIter = std::vec::IntoIter<Beatmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Beatmap;
    type IntoIter = std::slice::Iter<'a, Beatmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

struct StreamState {
    client: Option<BeatSaver>,
    route: PageRoute,
    buffered: std::vec::IntoIter<Beatmap>,
    next: Option<u32>,
    options: RequestOptions,
}

/// Flatten pages into beatmaps, fetching `next` only once `buffered` is
/// drained. Ends after the first page without a next index, on a missing
/// page, or after yielding a request error.
///
/// Only the cancellation token of `options` is kept; per-page progress
/// would restart at 0 for every page.
pub(crate) fn beatmap_stream(
    client: Option<BeatSaver>,
    route: PageRoute,
    buffered: Vec<Beatmap>,
    next: Option<u32>,
    options: RequestOptions,
) -> BeatmapStream {
    let state = StreamState {
        client,
        route,
        buffered: buffered.into_iter(),
        next,
        options: options.cancellation_only(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(beatmap) = state.buffered.next() {
                return Some((Ok(beatmap), state));
            }

            let Some(index) = state.next.take() else {
                return None;
            };
            let Some(client) = state.client.clone() else {
                return Some((Err(BeatSaverError::ClientUnavailable), state));
            };

            match client.fetch_page(&state.route, index, &state.options).await {
                Ok(Some(page)) => {
                    tracing::debug!(index, count = page.len(), "stream advanced");
                    state.next = page.next_page;
                    state.buffered = page.docs.into_iter();
                }
                Ok(None) => return None,
                Err(e) => return Some((Err(e), state)),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialize() {
        let json = r#"{"docs": [], "totalDocs": 42, "lastPage": 4, "prevPage": null, "nextPage": 1}"#;
        let page: Page = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(page.is_empty());
        assert_eq!(page.total_docs, 42);
        assert_eq!(page.last_page, 4);
        assert_eq!(page.previous_page, None);
        assert_eq!(page.next_page, Some(1));
        assert!(!page.is_last());
    }

    #[test]
    fn test_page_deserialize_missing_cursors() {
        let json = r#"{"docs": [], "totalDocs": 0, "lastPage": 0}"#;
        let page: Page = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(page.previous_page.is_none());
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_boundaries_make_no_request() {
        // Detached page: any request would fail with ClientUnavailable.
        let json = r#"{"docs": [], "totalDocs": 3, "lastPage": 0}"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert!(page.fetch_next(&Default::default()).await.unwrap().is_none());
        assert!(page.fetch_previous(&Default::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detached_page_navigation_fails() {
        let json = r#"{"docs": [], "totalDocs": 30, "lastPage": 2, "nextPage": 1}"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert!(matches!(
            page.fetch_next(&Default::default()).await,
            Err(BeatSaverError::ClientUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_stream_on_last_page_yields_buffered_only() {
        let json = r#"{"docs": [], "totalDocs": 0, "lastPage": 0}"#;
        let page: Page = serde_json::from_str(json).unwrap();
        let items: Vec<_> = page.into_stream(Default::default()).collect().await;
        assert!(items.is_empty());
    }
}
