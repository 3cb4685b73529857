//! Error types for BeatSaver API operations.

use thiserror::Error;

/// Errors that can occur during BeatSaver API operations.
///
/// A missing resource is not an error: lookups and listings return
/// `Ok(None)` when the service answers 404.
#[derive(Debug, Error)]
pub enum BeatSaverError {
    /// A required identifier was empty. Raised before any request is made.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// A partial beatmap could not be resolved.
    #[error("Invalid partial beatmap: {0}")]
    InvalidPartial(String),

    /// No beatmap exists for the key a partial beatmap was built from.
    #[error("Invalid partial beatmap: no beatmap with key '{0}'")]
    InvalidPartialKey(String),

    /// No beatmap exists for the hash a partial beatmap was built from.
    #[error("Invalid partial beatmap: no beatmap with hash '{0}'")]
    InvalidPartialHash(String),

    /// The operation re-fetches by hash, but the beatmap has none.
    #[error("Beatmap has no hash to refresh from")]
    MissingHash,

    /// The operation addresses the beatmap by key, but it has none.
    #[error("Beatmap has no key")]
    MissingKey,

    /// The operation needs data that a partial beatmap does not carry.
    #[error("Cannot {operation} a partial beatmap; populate it first")]
    Unpopulated { operation: &'static str },

    /// The vote was rejected because of the submitted Steam ID.
    #[error("Invalid Steam ID '{0}'")]
    InvalidSteamId(String),

    /// The vote was rejected because of the authentication ticket.
    #[error("Invalid Steam authentication ticket")]
    InvalidTicket,

    /// The request was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The entity is not attached to a live client.
    #[error("Entity is not attached to a BeatSaver client")]
    ClientUnavailable,

    /// Client configuration is invalid.
    #[error("Invalid BeatSaver configuration: {0}")]
    ConfigInvalid(String),

    /// API request failed.
    #[error("BeatSaver API error: {message}")]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl BeatSaverError {
    /// Returns true if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if this error came from resolving a partial beatmap.
    pub fn is_partial_resolution(&self) -> bool {
        matches!(
            self,
            Self::InvalidPartial(_) | Self::InvalidPartialKey(_) | Self::InvalidPartialHash(_)
        )
    }

    pub(crate) fn invalid_argument(name: &'static str) -> Self {
        Self::InvalidArgument {
            name,
            reason: "must not be empty",
        }
    }
}

/// Result type alias for BeatSaver operations.
pub type Result<T> = core::result::Result<T, BeatSaverError>;

/// Reject empty or whitespace-only identifiers.
pub(crate) fn require_non_empty<'a>(name: &'static str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(BeatSaverError::invalid_argument(name));
    }
    Ok(value)
}
