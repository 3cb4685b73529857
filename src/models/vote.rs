//! Steam vote submission.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, BeatSaverError, Result};
use crate::models::beatmap::Beatmap;
use crate::models::metadata::Stats;
use crate::routes;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Wire representation: `"1"` or `"-1"`.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Up => "1",
            Self::Down => "-1",
        }
    }
}

/// A Steam authentication ticket, normalised to a hex string.
///
/// Raw bytes are hex encoded (uppercase); strings are taken to be hex
/// already and used unchanged.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTicket(String);

impl AuthTicket {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode_upper(bytes))
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

// Tickets are credentials; keep them out of logs.
impl fmt::Debug for AuthTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthTicket")
            .field(&format_args!("<{} hex chars>", self.0.len()))
            .finish()
    }
}

impl From<&[u8]> for AuthTicket {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> From<&[u8; N]> for AuthTicket {
    fn from(bytes: &[u8; N]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for AuthTicket {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl From<&str> for AuthTicket {
    fn from(hex: &str) -> Self {
        Self::from_hex(hex)
    }
}

impl From<String> for AuthTicket {
    fn from(hex: String) -> Self {
        Self::from_hex(hex)
    }
}

/// Error record returned by the service on rejected writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestError {
    pub code: i32,
    pub identifier: String,
}

impl RestError {
    pub fn new(code: i32, identifier: impl Into<String>) -> Self {
        Self {
            code,
            identifier: identifier.into(),
        }
    }
}

#[derive(Serialize)]
struct VotePayload<'a> {
    #[serde(rename = "steamID")]
    steam_id: &'a str,
    ticket: &'a str,
    direction: &'static str,
}

/// Only the stats of the returned beatmap are adopted.
#[derive(Deserialize)]
struct VoteResponse {
    stats: Stats,
}

/// Map a rejection onto the vote error taxonomy.
///
/// Identity and ticket problems are errors; any other identifier is a
/// plain rejection.
fn classify_rejection(error: &RestError, steam_id: &str) -> Result<bool> {
    match error.identifier.as_str() {
        "ERR_INVALID_STEAM_ID" | "ERR_STEAM_ID_MISMATCH" => {
            Err(BeatSaverError::InvalidSteamId(steam_id.to_string()))
        }
        "ERR_INVALID_TICKET" | "ERR_BAD_TICKET" => Err(BeatSaverError::InvalidTicket),
        other => {
            tracing::warn!(code = error.code, identifier = other, "vote rejected");
            Ok(false)
        }
    }
}

impl Beatmap {
    /// Submit a vote as the given Steam user.
    ///
    /// On success the beatmap's stats are replaced with the updated stats
    /// returned by the service and `Ok(true)` is returned.
    ///
    /// # Errors
    ///
    /// - [`BeatSaverError::InvalidSteamId`] for `ERR_INVALID_STEAM_ID` and
    ///   `ERR_STEAM_ID_MISMATCH`
    /// - [`BeatSaverError::InvalidTicket`] for `ERR_INVALID_TICKET` and
    ///   `ERR_BAD_TICKET`
    /// - [`BeatSaverError::ApiError`] if the failure body is not an error record
    ///
    /// Any other service identifier yields `Ok(false)`.
    #[tracing::instrument(skip(self, ticket), fields(key = ?self.key()))]
    pub async fn vote(
        &mut self,
        direction: VoteDirection,
        steam_id: &str,
        ticket: impl Into<AuthTicket> + Send,
    ) -> Result<bool> {
        let steam_id = require_non_empty("steam_id", steam_id)?;
        let ticket = ticket.into();
        require_non_empty("ticket", ticket.as_hex())?;
        let key = self.key().ok_or(BeatSaverError::MissingKey)?.to_string();
        let client = self.client()?;

        let payload = serde_json::to_value(VotePayload {
            steam_id,
            ticket: ticket.as_hex(),
            direction: direction.as_wire(),
        })?;

        let response = client.post_json(&routes::vote(&key), &payload).await?;

        if response.is_success() {
            let updated: VoteResponse = response.json()?;
            self.set_stats(updated.stats);
            return Ok(true);
        }

        match response.json::<RestError>() {
            Ok(error) => classify_rejection(&error, steam_id),
            Err(_) => Err(BeatSaverError::ApiError {
                message: response.error_message(),
                status_code: Some(response.status),
            }),
        }
    }

    /// Submit an upvote.
    pub async fn vote_up(
        &mut self,
        steam_id: &str,
        ticket: impl Into<AuthTicket> + Send,
    ) -> Result<bool> {
        self.vote(VoteDirection::Up, steam_id, ticket).await
    }

    /// Submit a downvote.
    pub async fn vote_down(
        &mut self,
        steam_id: &str,
        ticket: impl Into<AuthTicket> + Send,
    ) -> Result<bool> {
        self.vote(VoteDirection::Down, steam_id, ticket).await
    }
}
