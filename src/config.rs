//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{BeatSaverError, Result};

/// Public BeatSaver site.
pub const DEFAULT_BASE_URL: &str = "https://beatsaver.com";
const LIBRARY_AGENT: &str = concat!("beatsaver-rs/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Options used to construct a [`BeatSaver`](crate::BeatSaver) client.
///
/// # Example
///
/// ```
/// use beatsaver::ClientOptions;
///
/// let options = ClientOptions::default()
///     .with_application("MyModLoader", "1.2.0");
/// assert!(options.user_agent().unwrap().starts_with("MyModLoader/1.2.0"));
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Site root. API routes live under `{base_url}/api/`.
    pub base_url: String,
    /// Name of the application embedding this client.
    pub application_name: Option<String>,
    /// Version of the application embedding this client.
    pub version: Option<String>,
    /// Whole-request timeout for the default transport.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            application_name: None,
            version: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientOptions {
    /// Point the client at a different site root (mirrors, test servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identify the embedding application in the User-Agent.
    #[must_use]
    pub fn with_application(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the User-Agent header value.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::ConfigInvalid`] if an application name is
    /// given without a version.
    pub fn user_agent(&self) -> Result<String> {
        match (&self.application_name, &self.version) {
            (Some(name), Some(version)) => Ok(format!("{name}/{version} {LIBRARY_AGENT}")),
            (Some(_), None) => Err(BeatSaverError::ConfigInvalid(
                "application name requires a version".to_string(),
            )),
            (None, _) => Ok(LIBRARY_AGENT.to_string()),
        }
    }

    /// Parse the site root and derive the API root from it.
    pub(crate) fn urls(&self) -> Result<(Url, Url)> {
        // Ensure base URL ends with /
        let base_url_str = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        let site = Url::parse(&base_url_str)?;
        if site.cannot_be_a_base() {
            return Err(BeatSaverError::ConfigInvalid(format!(
                "'{}' cannot be used as a base URL",
                self.base_url
            )));
        }
        let api = site.join("api/")?;
        Ok((site, api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        let agent = ClientOptions::default().user_agent().unwrap();
        assert!(agent.starts_with("beatsaver-rs/"));
    }

    #[test]
    fn test_application_user_agent() {
        let options = ClientOptions::default().with_application("TestApp", "1.0");
        let agent = options.user_agent().unwrap();
        assert!(agent.starts_with("TestApp/1.0 beatsaver-rs/"));
    }

    #[test]
    fn test_application_without_version_rejected() {
        let options = ClientOptions {
            application_name: Some("TestApp".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            options.user_agent(),
            Err(BeatSaverError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_api_url_derived_from_site() {
        let (site, api) = ClientOptions::default()
            .with_base_url("http://127.0.0.1:4000")
            .urls()
            .unwrap();
        assert_eq!(site.as_str(), "http://127.0.0.1:4000/");
        assert_eq!(api.as_str(), "http://127.0.0.1:4000/api/");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let a = ClientOptions::default().with_base_url("https://beatsaver.com").urls().unwrap();
        let b = ClientOptions::default().with_base_url("https://beatsaver.com/").urls().unwrap();
        assert_eq!(a, b);
    }
}
