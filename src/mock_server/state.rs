//! Mock server state management.
//!
//! Provides the in-memory catalog served by the mock BeatSaver server.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::{AutomapperQuery, BeatmapData, ListingType, Stats, User, VoteDirection};

/// Default number of beatmaps per page, as served by the public site.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page worth of beatmaps plus the cursors that go with it.
#[derive(Debug, Clone)]
pub struct PageSlice {
    pub docs: Vec<BeatmapData>,
    pub total_docs: u64,
    pub last_page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

/// Why a vote was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    UnknownBeatmap,
    InvalidSteamId,
    InvalidTicket,
    BadTicket,
}

impl VoteRejection {
    pub fn identifier(self) -> &'static str {
        match self {
            Self::UnknownBeatmap => "ERR_BEATMAP_NOT_FOUND",
            Self::InvalidSteamId => "ERR_INVALID_STEAM_ID",
            Self::InvalidTicket => "ERR_INVALID_TICKET",
            Self::BadTicket => "ERR_BAD_TICKET",
        }
    }
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug)]
pub struct MockState {
    /// Beatmaps indexed by key (e.g. "17f9").
    pub beatmaps: HashMap<String, BeatmapData>,

    /// Users indexed by ID. Uploaders of inserted beatmaps are added
    /// automatically.
    pub users: HashMap<String, User>,

    /// Tickets registered per Steam ID. A vote from a registered Steam ID
    /// must present exactly this ticket; unregistered IDs may use any
    /// well-formed ticket.
    pub tickets: HashMap<String, String>,

    /// Votes cast so far, keyed by (Steam ID, beatmap key).
    pub votes: HashMap<(String, String), VoteDirection>,

    /// Beatmaps per page.
    pub page_size: usize,

    /// Delay applied before every response.
    pub latency: Option<Duration>,

    /// Number of requests the server has handled.
    pub request_count: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            beatmaps: HashMap::new(),
            users: HashMap::new(),
            tickets: HashMap::new(),
            votes: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            request_count: 0,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a beatmap and its uploader.
    pub fn with_beatmap(mut self, beatmap: BeatmapData) -> Self {
        self.insert_beatmap(beatmap);
        self
    }

    /// Add a user that has not necessarily uploaded anything.
    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    /// Register the only ticket accepted for `steam_id`.
    pub fn with_ticket(mut self, steam_id: &str, ticket_hex: &str) -> Self {
        self.tickets
            .insert(steam_id.to_string(), ticket_hex.to_string());
        self
    }

    /// Set the number of beatmaps per page (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert_beatmap(&mut self, beatmap: BeatmapData) {
        self.users
            .entry(beatmap.uploader.id.clone())
            .or_insert_with(|| beatmap.uploader.clone());
        self.beatmaps.insert(beatmap.key.clone(), beatmap);
    }

    /// Get a beatmap by key.
    pub fn get_by_key(&self, key: &str) -> Option<&BeatmapData> {
        self.beatmaps.get(key)
    }

    /// Get a beatmap by hash, ignoring case.
    pub fn get_by_hash(&self, hash: &str) -> Option<&BeatmapData> {
        self.beatmaps
            .values()
            .find(|b| b.hash.eq_ignore_ascii_case(hash))
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// Beatmaps of a listing, ordered and filtered by automapper policy.
    pub fn listing(&self, listing: ListingType, automappers: AutomapperQuery) -> Vec<&BeatmapData> {
        let mut maps: Vec<&BeatmapData> = self
            .beatmaps
            .values()
            .filter(|b| {
                let automapped = b.metadata.is_automapped();
                match automappers {
                    AutomapperQuery::None => !automapped,
                    AutomapperQuery::Only => automapped,
                    AutomapperQuery::All => true,
                }
            })
            .collect();

        maps.sort_by(|a, b| match listing {
            ListingType::Latest => b.uploaded.cmp(&a.uploaded),
            ListingType::Hot => desc_f64(a.stats.heat, b.stats.heat),
            ListingType::Rating => desc_f64(a.stats.rating, b.stats.rating),
            ListingType::Downloads => b.stats.downloads.cmp(&a.stats.downloads),
            ListingType::Plays => b.stats.plays.cmp(&a.stats.plays),
        }
        .then_with(|| a.key.cmp(&b.key)));
        maps
    }

    /// Beatmaps uploaded by `user_id`, newest first.
    pub fn uploaded_by(&self, user_id: &str) -> Vec<&BeatmapData> {
        let mut maps: Vec<&BeatmapData> = self
            .beatmaps
            .values()
            .filter(|b| b.uploader.id == user_id)
            .collect();
        maps.sort_by(|a, b| b.uploaded.cmp(&a.uploaded).then_with(|| a.key.cmp(&b.key)));
        maps
    }

    /// Case-insensitive substring search over names and authors.
    pub fn search_text(&self, query: &str) -> Vec<&BeatmapData> {
        let needle = query.to_lowercase();
        self.search_by(|b| text_fields(b).any(|f| f.to_lowercase().contains(&needle)))
    }

    /// Search with whitespace-separated `field:value` terms, all of which
    /// must match. Bare terms behave like a text search.
    ///
    /// Recognised fields: `key`, `hash`, `name`, `uploader`, `songName`,
    /// `songAuthorName`, `levelAuthorName`.
    pub fn search_advanced(&self, query: &str) -> Vec<&BeatmapData> {
        let terms: Vec<(Option<String>, String)> = query
            .split_whitespace()
            .filter(|t| !t.eq_ignore_ascii_case("AND"))
            .map(|term| match term.split_once(':') {
                Some((field, value)) => (Some(field.to_string()), value.to_lowercase()),
                None => (None, term.to_lowercase()),
            })
            .collect();

        self.search_by(|b| {
            terms.iter().all(|(field, value)| {
                let contains = |s: &str| s.to_lowercase().contains(value.as_str());
                match field.as_deref() {
                    Some("key") => b.key.eq_ignore_ascii_case(value),
                    Some("hash") => b.hash.eq_ignore_ascii_case(value),
                    Some("name") => contains(&b.name),
                    Some("uploader") => contains(&b.uploader.username),
                    Some("songName") => contains(&b.metadata.song_name),
                    Some("songAuthorName") => contains(&b.metadata.song_author_name),
                    Some("levelAuthorName") => contains(&b.metadata.level_author_name),
                    Some(_) => false,
                    None => text_fields(b).any(contains),
                }
            })
        })
    }

    fn search_by(&self, predicate: impl Fn(&BeatmapData) -> bool) -> Vec<&BeatmapData> {
        let mut maps: Vec<&BeatmapData> = self.beatmaps.values().filter(|b| predicate(b)).collect();
        maps.sort_by(|a, b| {
            desc_f64(a.stats.rating, b.stats.rating).then_with(|| a.key.cmp(&b.key))
        });
        maps
    }

    /// Cut page `page` out of `maps`. Pages past the last one are `None`;
    /// an empty result still has a page 0.
    pub fn paginate(&self, maps: Vec<&BeatmapData>, page: u32) -> Option<PageSlice> {
        let size = self.page_size.max(1);
        let total = maps.len();
        let page_count = total.div_ceil(size).max(1);
        let last_page = u32::try_from(page_count - 1).unwrap_or(u32::MAX);

        if page > last_page {
            return None;
        }

        let start = page as usize * size;
        let docs = maps
            .into_iter()
            .skip(start)
            .take(size)
            .cloned()
            .collect();

        Some(PageSlice {
            docs,
            total_docs: total as u64,
            last_page,
            prev_page: page.checked_sub(1),
            next_page: (page < last_page).then_some(page + 1),
        })
    }

    /// Record a vote and return the updated beatmap.
    pub fn vote(
        &mut self,
        key: &str,
        steam_id: &str,
        ticket: &str,
        direction: VoteDirection,
    ) -> Result<&BeatmapData, VoteRejection> {
        if !self.beatmaps.contains_key(key) {
            return Err(VoteRejection::UnknownBeatmap);
        }
        if steam_id.is_empty() || !steam_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VoteRejection::InvalidSteamId);
        }
        if ticket.is_empty() || hex::decode(ticket).is_err() {
            return Err(VoteRejection::InvalidTicket);
        }
        if let Some(expected) = self.tickets.get(steam_id) {
            if !expected.eq_ignore_ascii_case(ticket) {
                return Err(VoteRejection::BadTicket);
            }
        }

        let previous = self
            .votes
            .insert((steam_id.to_string(), key.to_string()), direction);

        let beatmap = self
            .beatmaps
            .get_mut(key)
            .ok_or(VoteRejection::UnknownBeatmap)?;
        apply_vote(&mut beatmap.stats, previous, direction);
        Ok(beatmap)
    }
}

fn apply_vote(stats: &mut Stats, previous: Option<VoteDirection>, direction: VoteDirection) {
    if previous == Some(direction) {
        return;
    }
    match previous {
        Some(VoteDirection::Up) => stats.up_votes = stats.up_votes.saturating_sub(1),
        Some(VoteDirection::Down) => stats.down_votes = stats.down_votes.saturating_sub(1),
        None => {}
    }
    match direction {
        VoteDirection::Up => stats.up_votes += 1,
        VoteDirection::Down => stats.down_votes += 1,
    }

    let total = stats.total_votes();
    if total > 0 {
        stats.rating = stats.up_votes as f64 / total as f64;
    }
}

fn text_fields(b: &BeatmapData) -> impl Iterator<Item = &str> {
    [
        b.name.as_str(),
        b.metadata.song_name.as_str(),
        b.metadata.song_sub_name.as_str(),
        b.metadata.song_author_name.as_str(),
        b.metadata.level_author_name.as_str(),
    ]
    .into_iter()
}

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::Fixtures;

    fn state_with(count: usize, page_size: usize) -> MockState {
        let mut state = MockState::new().with_page_size(page_size);
        for i in 0..count {
            state.insert_beatmap(Fixtures::numbered_beatmap(i));
        }
        state
    }

    #[test]
    fn test_paginate_cursors() {
        let state = state_with(25, 10);
        let maps = state.listing(ListingType::Latest, AutomapperQuery::None);

        let first = state.paginate(maps.clone(), 0).unwrap();
        assert_eq!(first.docs.len(), 10);
        assert_eq!(first.total_docs, 25);
        assert_eq!(first.last_page, 2);
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(1));

        let last = state.paginate(maps.clone(), 2).unwrap();
        assert_eq!(last.docs.len(), 5);
        assert_eq!(last.prev_page, Some(1));
        assert_eq!(last.next_page, None);

        assert!(state.paginate(maps, 3).is_none());
    }

    #[test]
    fn test_empty_listing_has_page_zero() {
        let state = MockState::new();
        let page = state.paginate(Vec::new(), 0).unwrap();
        assert!(page.docs.is_empty());
        assert_eq!(page.last_page, 0);
        assert_eq!(page.next_page, None);
        assert!(state.paginate(Vec::new(), 1).is_none());
    }

    #[test]
    fn test_latest_is_newest_first() {
        let state = state_with(5, 10);
        let maps = state.listing(ListingType::Latest, AutomapperQuery::None);
        assert!(maps.windows(2).all(|w| w[0].uploaded >= w[1].uploaded));
    }

    #[test]
    fn test_automapper_filter() {
        let mut state = state_with(3, 10);
        state.insert_beatmap(Fixtures::automapped_beatmap("a001", "Beat Sage"));

        assert_eq!(state.listing(ListingType::Hot, AutomapperQuery::None).len(), 3);
        assert_eq!(state.listing(ListingType::Hot, AutomapperQuery::Only).len(), 1);
        assert_eq!(state.listing(ListingType::Hot, AutomapperQuery::All).len(), 4);
    }

    #[test]
    fn test_search() {
        let state = MockState::new()
            .with_beatmap(Fixtures::beatmap("17f9", "Centipede", "Freeek"))
            .with_beatmap(Fixtures::beatmap("2144", "Shrek", "Freeek"))
            .with_beatmap(Fixtures::beatmap("3a7f", "Crab Rave", "Elliot"));

        assert_eq!(state.search_text("crab").len(), 1);
        assert_eq!(state.search_text("FREEEK").len(), 2);
        assert_eq!(state.search_advanced("levelAuthorName:freeek name:shrek").len(), 1);
        assert_eq!(state.search_advanced("key:3A7F").len(), 1);
        assert!(state.search_advanced("unknown:field").is_empty());
    }

    #[test]
    fn test_vote_updates_counts() {
        let mut state =
            MockState::new().with_beatmap(Fixtures::beatmap("17f9", "Centipede", "Freeek"));
        let before = state.get_by_key("17f9").unwrap().stats.clone();

        let stats = state
            .vote("17f9", "76561198000000000", "0AFF", VoteDirection::Up)
            .unwrap()
            .stats
            .clone();
        assert_eq!(stats.up_votes, before.up_votes + 1);

        // Switching direction moves the vote.
        let stats = state
            .vote("17f9", "76561198000000000", "0AFF", VoteDirection::Down)
            .unwrap()
            .stats
            .clone();
        assert_eq!(stats.up_votes, before.up_votes);
        assert_eq!(stats.down_votes, before.down_votes + 1);
    }

    #[test]
    fn test_vote_rejections() {
        let mut state = MockState::new()
            .with_beatmap(Fixtures::beatmap("17f9", "Centipede", "Freeek"))
            .with_ticket("111", "ABCD");

        assert_eq!(
            state.vote("ffff", "111", "ABCD", VoteDirection::Up).unwrap_err(),
            VoteRejection::UnknownBeatmap
        );
        assert_eq!(
            state.vote("17f9", "steam", "ABCD", VoteDirection::Up).unwrap_err(),
            VoteRejection::InvalidSteamId
        );
        assert_eq!(
            state.vote("17f9", "111", "xyz", VoteDirection::Up).unwrap_err(),
            VoteRejection::InvalidTicket
        );
        assert_eq!(
            state.vote("17f9", "111", "0AFF", VoteDirection::Up).unwrap_err(),
            VoteRejection::BadTicket
        );
        assert!(state.vote("17f9", "111", "abcd", VoteDirection::Up).is_ok());
    }
}
