//! API route construction.
//!
//! Every path segment and query value is percent-encoded exactly once,
//! here, with `urlencoding`. Routes stored on a [`Page`](crate::Page) keep
//! their query values raw so that navigation never re-encodes them.

use serde::{Deserialize, Serialize};

/// Ordered listings served under `maps/{listing}/{page}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    /// Most recently uploaded first.
    Latest,
    /// Trending beatmaps.
    Hot,
    /// Highest rated first.
    Rating,
    /// Most downloaded first.
    Downloads,
    /// Most played first.
    Plays,
}

impl ListingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Hot => "hot",
            Self::Rating => "rating",
            Self::Downloads => "downloads",
            Self::Plays => "plays",
        }
    }

    /// Parse a route segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "latest" => Some(Self::Latest),
            "hot" => Some(Self::Hot),
            "rating" => Some(Self::Rating),
            "downloads" => Some(Self::Downloads),
            "plays" => Some(Self::Plays),
            _ => None,
        }
    }
}

/// Search flavours served under `search/{type}/{page}?q=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    /// Plain text search.
    Text,
    /// Lucene-style field query.
    Advanced,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Advanced => "advanced",
        }
    }
}

/// Whether automapped beatmaps appear in a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AutomapperQuery {
    /// Exclude automapped beatmaps (the service default).
    #[default]
    None,
    /// Only automapped beatmaps.
    Only,
    /// Human and automapped beatmaps.
    All,
}

impl AutomapperQuery {
    /// Value of the `automapper` query parameter, if one is sent.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Only => Some("-1"),
            Self::All => Some("1"),
        }
    }

    /// Inverse of [`query_value`](Self::query_value).
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value {
            Some("-1") => Self::Only,
            Some("1") => Self::All,
            _ => Self::None,
        }
    }
}

/// Template for producing any page of one listing or search.
///
/// Holds the base path (without page index) and the raw, unencoded query
/// parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRoute {
    base: String,
    params: Vec<(&'static str, String)>,
}

impl PageRoute {
    pub(crate) fn listing(listing: ListingType, automappers: AutomapperQuery) -> Self {
        let params = automappers
            .query_value()
            .map(|v| vec![("automapper", v.to_string())])
            .unwrap_or_default();

        Self {
            base: format!("maps/{}", listing.as_str()),
            params,
        }
    }

    pub(crate) fn search(search: SearchType, query: &str) -> Self {
        Self {
            base: format!("search/{}", search.as_str()),
            params: vec![("q", query.to_string())],
        }
    }

    pub(crate) fn uploader(user_id: &str) -> Self {
        Self {
            base: format!("maps/uploader/{}", urlencoding::encode(user_id)),
            params: Vec::new(),
        }
    }

    /// Base path without page index, e.g. `maps/hot`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Raw query parameters.
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Raw value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Relative API path for `page`, query included.
    pub(crate) fn path_for(&self, page: u32) -> String {
        let mut path = format!("{}/{page}", self.base);
        if !self.params.is_empty() {
            path.push('?');
            path.push_str(&encode_query(&self.params));
        }
        path
    }
}

fn encode_query(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn by_key(key: &str) -> String {
    format!("maps/key/{}", urlencoding::encode(key))
}

pub(crate) fn by_hash(hash: &str) -> String {
    format!("maps/hash/{}", urlencoding::encode(hash))
}

pub(crate) fn user(id: &str) -> String {
    format!("users/find/{}", urlencoding::encode(id))
}

pub(crate) fn vote(key: &str) -> String {
    format!("vote/steam/{}", urlencoding::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_routes() {
        let route = PageRoute::listing(ListingType::Hot, AutomapperQuery::None);
        assert_eq!(route.path_for(0), "maps/hot/0");

        let route = PageRoute::listing(ListingType::Latest, AutomapperQuery::Only);
        assert_eq!(route.path_for(3), "maps/latest/3?automapper=-1");

        let route = PageRoute::listing(ListingType::Plays, AutomapperQuery::All);
        assert_eq!(route.path_for(1), "maps/plays/1?automapper=1");
    }

    #[test]
    fn test_search_query_encoded_once() {
        let route = PageRoute::search(SearchType::Text, "tower of heaven & more");
        assert_eq!(route.param("q"), Some("tower of heaven & more"));
        assert_eq!(
            route.path_for(0),
            "search/text/0?q=tower%20of%20heaven%20%26%20more"
        );
        // Building another page does not re-encode the stored value.
        assert_eq!(
            route.path_for(1),
            "search/text/1?q=tower%20of%20heaven%20%26%20more"
        );
    }

    #[test]
    fn test_advanced_search_route() {
        let route = PageRoute::search(SearchType::Advanced, "uploader.username:lolpants");
        assert_eq!(
            route.path_for(2),
            "search/advanced/2?q=uploader.username%3Alolpants"
        );
    }

    #[test]
    fn test_uploader_route() {
        let route = PageRoute::uploader("5cff0b7398cc5a672c84efe4");
        assert_eq!(route.path_for(0), "maps/uploader/5cff0b7398cc5a672c84efe4/0");
    }

    #[test]
    fn test_single_routes() {
        assert_eq!(by_key("17f9"), "maps/key/17f9");
        assert_eq!(
            by_hash("108c239db3c0596f1ba7426353af1b4cc4fd8b08"),
            "maps/hash/108c239db3c0596f1ba7426353af1b4cc4fd8b08"
        );
        assert_eq!(user("a/b"), "users/find/a%2Fb");
        assert_eq!(vote("17f9"), "vote/steam/17f9");
    }

    #[test]
    fn test_automapper_values() {
        for mode in [AutomapperQuery::None, AutomapperQuery::Only, AutomapperQuery::All] {
            assert_eq!(AutomapperQuery::from_query_value(mode.query_value()), mode);
        }
        assert_eq!(ListingType::from_segment("rating"), Some(ListingType::Rating));
        assert_eq!(ListingType::from_segment("key"), None);
    }
}
