//! Catalog operations on [`BeatSaver`].
//!
//! Listings and lookups map a 404 onto `Ok(None)`. Empty identifiers are
//! rejected with [`BeatSaverError::InvalidArgument`](crate::BeatSaverError::InvalidArgument)
//! before any request is made.

use crate::client::BeatSaver;
use crate::error::{require_non_empty, Result};
use crate::models::{Beatmap, User};
use crate::pagination::{beatmap_stream, BeatmapStream, Page};
use crate::progress::RequestOptions;
use crate::routes::{self, AutomapperQuery, ListingType, PageRoute, SearchType};

impl BeatSaver {
    /// Fetch one page of an ordered listing.
    #[tracing::instrument(skip(self, options))]
    pub async fn listing(
        &self,
        listing: ListingType,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.fetch_page(&PageRoute::listing(listing, automappers), page, options)
            .await
    }

    /// Fetch a page of the most recently uploaded beatmaps.
    pub async fn latest(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.listing(ListingType::Latest, page, automappers, options)
            .await
    }

    /// Fetch a page of trending beatmaps.
    pub async fn hot(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.listing(ListingType::Hot, page, automappers, options)
            .await
    }

    /// Fetch a page of beatmaps ordered by rating.
    pub async fn rating(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.listing(ListingType::Rating, page, automappers, options)
            .await
    }

    /// Fetch a page of beatmaps ordered by download count.
    pub async fn downloads(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.listing(ListingType::Downloads, page, automappers, options)
            .await
    }

    /// Fetch a page of beatmaps ordered by play count.
    pub async fn plays(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.listing(ListingType::Plays, page, automappers, options)
            .await
    }

    /// Fetch a page of beatmaps uploaded by `user_id`.
    #[tracing::instrument(skip(self, options))]
    pub async fn uploader(
        &self,
        user_id: &str,
        page: u32,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        let user_id = require_non_empty("user_id", user_id)?;
        self.fetch_page(&PageRoute::uploader(user_id), page, options)
            .await
    }

    /// Text search.
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.search_with(SearchType::Text, query, page, options)
            .await
    }

    /// Advanced (Lucene-style) search.
    pub async fn search_advanced(
        &self,
        query: &str,
        page: u32,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        self.search_with(SearchType::Advanced, query, page, options)
            .await
    }

    #[tracing::instrument(skip(self, options))]
    async fn search_with(
        &self,
        search: SearchType,
        query: &str,
        page: u32,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        let query = require_non_empty("query", query)?;
        self.fetch_page(&PageRoute::search(search, query), page, options)
            .await
    }

    /// Fetch a beatmap by hex key.
    ///
    /// Returns `None` if no beatmap has this key.
    #[tracing::instrument(skip(self, options))]
    pub async fn by_key(&self, key: &str, options: &RequestOptions) -> Result<Option<Beatmap>> {
        let key = require_non_empty("key", key)?;
        self.fetch_beatmap(&routes::by_key(key), options).await
    }

    /// Fetch a beatmap by content hash.
    ///
    /// Returns `None` if no beatmap has this hash.
    #[tracing::instrument(skip(self, options))]
    pub async fn by_hash(&self, hash: &str, options: &RequestOptions) -> Result<Option<Beatmap>> {
        let hash = require_non_empty("hash", hash)?;
        self.fetch_beatmap(&routes::by_hash(hash), options).await
    }

    /// Fetch a user by ID.
    ///
    /// Returns `None` if no user has this ID.
    #[tracing::instrument(skip(self, options))]
    pub async fn user(&self, id: &str, options: &RequestOptions) -> Result<Option<User>> {
        let id = require_non_empty("id", id)?;
        self.fetch_user(&routes::user(id), options).await
    }

    /// Stream every beatmap of a listing, starting at `page`.
    ///
    /// Pages are fetched on demand; dropping the stream stops fetching.
    /// The stream keeps this client alive until dropped. Cancellation in
    /// `options` applies to every page request; a progress sink is ignored.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use beatsaver::{AutomapperQuery, BeatSaver, ListingType, RequestOptions};
    /// use futures_util::TryStreamExt;
    ///
    /// # async fn example() -> beatsaver::Result<()> {
    /// let client = BeatSaver::default_client()?;
    /// let options = RequestOptions::default();
    /// let mut maps = client.listing_stream(ListingType::Rating, 0, AutomapperQuery::None, options);
    /// while let Some(map) = maps.try_next().await? {
    ///     println!("{:?}", map.name());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn listing_stream(
        &self,
        listing: ListingType,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.stream(PageRoute::listing(listing, automappers), page, options)
    }

    pub fn latest_stream(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.listing_stream(ListingType::Latest, page, automappers, options)
    }

    pub fn hot_stream(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.listing_stream(ListingType::Hot, page, automappers, options)
    }

    pub fn rating_stream(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.listing_stream(ListingType::Rating, page, automappers, options)
    }

    pub fn downloads_stream(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.listing_stream(ListingType::Downloads, page, automappers, options)
    }

    pub fn plays_stream(
        &self,
        page: u32,
        automappers: AutomapperQuery,
        options: RequestOptions,
    ) -> BeatmapStream {
        self.listing_stream(ListingType::Plays, page, automappers, options)
    }

    /// Stream text search results, starting at `page`.
    ///
    /// # Errors
    ///
    /// Rejects an empty query immediately.
    pub fn search_stream(
        &self,
        query: &str,
        page: u32,
        options: RequestOptions,
    ) -> Result<BeatmapStream> {
        let query = require_non_empty("query", query)?;
        Ok(self.stream(PageRoute::search(SearchType::Text, query), page, options))
    }

    /// Stream advanced search results, starting at `page`.
    pub fn search_advanced_stream(
        &self,
        query: &str,
        page: u32,
        options: RequestOptions,
    ) -> Result<BeatmapStream> {
        let query = require_non_empty("query", query)?;
        Ok(self.stream(PageRoute::search(SearchType::Advanced, query), page, options))
    }

    /// Stream every beatmap uploaded by `user_id`, starting at `page`.
    pub fn uploader_stream(
        &self,
        user_id: &str,
        page: u32,
        options: RequestOptions,
    ) -> Result<BeatmapStream> {
        let user_id = require_non_empty("user_id", user_id)?;
        Ok(self.stream(PageRoute::uploader(user_id), page, options))
    }

    fn stream(&self, route: PageRoute, page: u32, options: RequestOptions) -> BeatmapStream {
        beatmap_stream(Some(self.clone()), route, Vec::new(), Some(page), options)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::config::ClientOptions;
    use crate::error::BeatSaverError;
    use crate::http::{HttpResponse, Transport};

    /// Records every URL and answers 404.
    #[derive(Default)]
    struct RecordingTransport {
        urls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, url: Url, _options: &RequestOptions) -> Result<HttpResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(HttpResponse::new(404, ""))
        }

        async fn post_json(&self, url: Url, _body: &serde_json::Value) -> Result<HttpResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(HttpResponse::new(404, ""))
        }
    }

    fn client() -> (BeatSaver, Arc<Mutex<Vec<String>>>) {
        let transport = RecordingTransport::default();
        let urls = transport.urls.clone();
        let client = BeatSaver::with_transport(ClientOptions::default(), transport).unwrap();
        (client, urls)
    }

    #[tokio::test]
    async fn test_empty_identifiers_make_no_request() {
        let (client, urls) = client();
        let options = RequestOptions::default();

        assert!(matches!(
            client.by_key("", &options).await,
            Err(BeatSaverError::InvalidArgument { name: "key", .. })
        ));
        assert!(matches!(
            client.by_hash("  ", &options).await,
            Err(BeatSaverError::InvalidArgument { name: "hash", .. })
        ));
        assert!(client.user("", &options).await.is_err());
        assert!(client.search("", 0, &options).await.is_err());
        assert!(client.search_advanced("", 0, &options).await.is_err());
        assert!(client.uploader("", 0, &options).await.is_err());
        assert!(client.search_stream("", 0, options.clone()).is_err());
        assert!(client.uploader_stream("", 0, options).is_err());

        assert!(urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let (client, urls) = client();
        let options = RequestOptions::default();

        assert!(client.by_key("17f9", &options).await.unwrap().is_none());
        assert!(client.user("4284201", &options).await.unwrap().is_none());
        assert!(client
            .hot(3, AutomapperQuery::None, &options)
            .await
            .unwrap()
            .is_none());

        let urls = urls.lock().unwrap();
        assert_eq!(
            *urls,
            vec![
                "https://beatsaver.com/api/maps/key/17f9".to_string(),
                "https://beatsaver.com/api/users/find/4284201".to_string(),
                "https://beatsaver.com/api/maps/hot/3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_urls() {
        let (client, urls) = client();
        let options = RequestOptions::default();

        client.latest(0, AutomapperQuery::Only, &options).await.unwrap();
        client.search("Beat Saber & more", 2, &options).await.unwrap();
        client.search_advanced("bpm:[100 TO 200]", 0, &options).await.unwrap();
        client.uploader("4284201", 1, &options).await.unwrap();

        let urls = urls.lock().unwrap();
        assert_eq!(urls[0], "https://beatsaver.com/api/maps/latest/0?automapper=-1");
        assert_eq!(urls[1], "https://beatsaver.com/api/search/text/2?q=Beat%20Saber%20%26%20more");
        assert_eq!(
            urls[2],
            "https://beatsaver.com/api/search/advanced/0?q=bpm%3A%5B100%20TO%20200%5D"
        );
        assert_eq!(urls[3], "https://beatsaver.com/api/maps/uploader/4284201/1");
    }

    #[tokio::test]
    async fn test_stream_ends_on_missing_first_page() {
        use futures_util::StreamExt;

        let (client, urls) = client();
        let items: Vec<_> = client
            .rating_stream(5, AutomapperQuery::None, RequestOptions::default())
            .collect()
            .await;
        assert!(items.is_empty());
        assert_eq!(urls.lock().unwrap().len(), 1);
    }
}
