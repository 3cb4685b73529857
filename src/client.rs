//! BeatSaver API client.
//!
//! Owns the transport and resolves routes against the configured site.
//! The public catalog operations live in [`crate::catalog`].

use std::fmt;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use url::Url;

use crate::config::ClientOptions;
use crate::error::{BeatSaverError, Result};
use crate::http::{HttpResponse, ReqwestTransport, Transport};
use crate::models::{Beatmap, User};
use crate::pagination::Page;
use crate::progress::RequestOptions;
use crate::routes::PageRoute;

pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    site_url: Url,
    api_url: Url,
}

/// BeatSaver API client.
///
/// This struct is cheaply cloneable; clones share the same transport.
/// Pages, beatmaps and users returned by the client keep a non-owning
/// handle back to it, so follow-up calls (next page, populate, vote) work
/// for as long as some clone of the client is alive.
///
/// # Example
///
/// ```no_run
/// use beatsaver::{AutomapperQuery, BeatSaver, ClientOptions};
///
/// # async fn example() -> beatsaver::Result<()> {
/// let client = BeatSaver::new(ClientOptions::default().with_application("MyApp", "1.0.0"))?;
///
/// if let Some(page) = client.hot(0, AutomapperQuery::None, &Default::default()).await? {
///     for map in &page {
///         println!("{:?}", map.name());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BeatSaver {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for BeatSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeatSaver")
            .field("base_url", &self.inner.site_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BeatSaver {
    /// Create a client using the default `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(&options)?;
        Self::with_transport(options, transport)
    }

    /// Create a client for the public service with default options.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientOptions::default())
    }

    /// Create a client with a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn with_transport(
        options: ClientOptions,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        options.user_agent()?;
        let (site_url, api_url) = options.urls()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport: Arc::new(transport),
                site_url,
                api_url,
            }),
        })
    }

    /// Site root that resource paths resolve against.
    pub fn base_url(&self) -> &Url {
        &self.inner.site_url
    }

    /// Root of the API routes.
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    pub(crate) fn handle(&self) -> ClientHandle {
        ClientHandle(Some(Arc::downgrade(&self.inner)))
    }

    pub(crate) fn api(&self, path: &str) -> Result<Url> {
        Ok(self.inner.api_url.join(path)?)
    }

    /// Resolve a root-relative resource path such as a cover URL.
    pub(crate) fn resource_url(&self, path: &str) -> Result<Url> {
        Ok(self.inner.site_url.join(path)?)
    }

    /// GET with 404 mapped to `None`.
    async fn get_optional(
        &self,
        url: Url,
        options: &RequestOptions,
    ) -> Result<Option<HttpResponse>> {
        let response = self.inner.transport.get(url.clone(), options).await?;
        if response.is_not_found() {
            tracing::debug!(%url, "not found");
            return Ok(None);
        }
        Self::check_response(response).map(Some)
    }

    /// Fetch one page of a listing and wire it back to this client.
    pub(crate) async fn fetch_page(
        &self,
        route: &PageRoute,
        index: u32,
        options: &RequestOptions,
    ) -> Result<Option<Page>> {
        let url = self.api(&route.path_for(index))?;
        let Some(response) = self.get_optional(url, options).await? else {
            return Ok(None);
        };

        let mut page: Page = response.json()?;
        page.attach(self.handle(), route.clone(), index);
        Ok(Some(page))
    }

    pub(crate) async fn fetch_beatmap(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Option<Beatmap>> {
        let url = self.api(path)?;
        let Some(response) = self.get_optional(url, options).await? else {
            return Ok(None);
        };

        let mut beatmap: Beatmap = response.json()?;
        beatmap.attach(self.handle());
        Ok(Some(beatmap))
    }

    pub(crate) async fn fetch_user(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Option<User>> {
        let url = self.api(path)?;
        let Some(response) = self.get_optional(url, options).await? else {
            return Ok(None);
        };

        let mut user: User = response.json()?;
        user.attach(self.handle());
        Ok(Some(user))
    }

    /// Download raw bytes. A 404 here is an error: the URL came from the
    /// service itself.
    pub(crate) async fn download(&self, url: Url, options: &RequestOptions) -> Result<Bytes> {
        let response = self.inner.transport.get(url, options).await?;
        Ok(Self::check_response(response)?.into_bytes())
    }

    /// POST a JSON body. Status handling is left to the caller.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let url = self.api(path)?;
        self.inner.transport.post_json(url, body).await
    }

    /// Check response status and convert errors.
    fn check_response(response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        // Handle rate limiting
        if response.status == 429 {
            return Err(BeatSaverError::RateLimited {
                retry_after_secs: response.retry_after_secs,
            });
        }

        Err(BeatSaverError::ApiError {
            message: response.error_message(),
            status_code: Some(response.status),
        })
    }
}

/// Non-owning back-reference from an entity to its client.
///
/// Never keeps the client alive. A default handle is detached.
#[derive(Clone, Default)]
pub(crate) struct ClientHandle(Option<Weak<ClientInner>>);

impl ClientHandle {
    pub(crate) fn client(&self) -> Result<BeatSaver> {
        self.0
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| BeatSaver { inner })
            .ok_or(BeatSaverError::ClientUnavailable)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.0 {
            Some(weak) if weak.strong_count() > 0 => "attached",
            Some(_) => "dropped",
            None => "detached",
        };
        f.debug_tuple("ClientHandle").field(&state).finish()
    }
}
