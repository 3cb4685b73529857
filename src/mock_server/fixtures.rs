//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    BeatmapData, Characteristic, CharacteristicDifficulty, Difficulties, Metadata, Stats, User,
};

/// 2020-01-01T00:00:00Z, the upload time of the oldest fixture.
const EPOCH_SECS: i64 = 1_577_836_800;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // User Fixtures
    // =========================================================================

    pub fn user(id: &str, username: &str) -> User {
        User::new(id, username)
    }

    pub fn freeek() -> User {
        Self::user("5cff0b7298cc5a672c84e8d3", "freeek")
    }

    pub fn elliot() -> User {
        Self::user("5cff0b7398cc5a672c84efe4", "elliot")
    }

    pub fn prolific_mapper() -> User {
        Self::user("5cff0b7498cc5a672c84f1a0", "prolific")
    }

    // =========================================================================
    // Beatmap Fixtures
    // =========================================================================

    /// Content hash derived from the key, 40 hex chars.
    pub fn hash_for(key: &str) -> String {
        format!("{:0>8}", key.to_lowercase()).repeat(5)
    }

    /// Create a beatmap with default stats, uploaded by a user named after
    /// `level_author`.
    pub fn beatmap(key: &str, name: &str, level_author: &str) -> BeatmapData {
        let uploader = Self::user(&format!("u-{level_author}"), level_author);
        let mut beatmap = Self::minimal_beatmap(key, name, uploader);
        beatmap.metadata.level_author_name = level_author.to_string();
        beatmap
    }

    /// Create a beatmap with every required field.
    pub fn minimal_beatmap(key: &str, name: &str, uploader: User) -> BeatmapData {
        let hash = Self::hash_for(key);
        BeatmapData {
            id: format!("5d{:0>22}", key),
            key: key.to_string(),
            name: name.to_string(),
            description: Some(format!("{name}\nMapped for testing.")),
            uploader,
            uploaded: uploaded_at(0),
            metadata: Self::metadata(name),
            stats: Stats {
                downloads: 100,
                plays: 40,
                up_votes: 8,
                down_votes: 2,
                rating: 0.8,
                heat: 50.0,
            },
            direct_download: format!("/cdn/{key}/{hash}.zip"),
            download_url: format!("/api/download/key/{key}"),
            cover_url: format!("/cdn/{key}/{hash}.jpg"),
            hash,
        }
    }

    /// Beatmap number `n` of a generated series. Every field that listings
    /// sort on is strictly ordered by `n`.
    pub fn numbered_beatmap(n: usize) -> BeatmapData {
        let key = format!("{:x}", 0x1000 + n);
        let mut beatmap =
            Self::minimal_beatmap(&key, &format!("Song {n}"), Self::prolific_mapper());
        let n64 = n as u64;
        beatmap.uploaded = uploaded_at(n as i64);
        beatmap.stats = Stats {
            downloads: 1_000 + n64 * 10,
            plays: 500 + n64 * 5,
            up_votes: n64,
            down_votes: 1,
            rating: n as f64 / (n as f64 + 1.0),
            heat: 10.0 + n as f64,
        };
        beatmap.metadata.level_author_name = "prolific".to_string();
        beatmap
    }

    /// Create a beatmap generated by `automapper`.
    pub fn automapped_beatmap(key: &str, automapper: &str) -> BeatmapData {
        let uploader = Self::user("u-bot", automapper);
        let mut beatmap = Self::minimal_beatmap(key, &format!("Auto {key}"), uploader);
        beatmap.metadata.automapper = Some(automapper.to_string());
        beatmap.metadata.level_author_name = automapper.to_string();
        beatmap
    }

    pub fn metadata(song_name: &str) -> Metadata {
        let mut standard = BTreeMap::new();
        standard.insert("easy".to_string(), None);
        standard.insert(
            "expert".to_string(),
            Some(CharacteristicDifficulty {
                duration: 420.5,
                length: 180,
                bombs: 4,
                notes: 612,
                obstacles: 20,
                note_jump_speed: 16.0,
                note_jump_speed_offset: 0.0,
            }),
        );

        Metadata {
            song_name: song_name.to_string(),
            song_sub_name: String::new(),
            song_author_name: "Test Artist".to_string(),
            level_author_name: String::new(),
            duration: 180,
            bpm: 128.0,
            difficulties: Difficulties {
                expert: true,
                ..Default::default()
            },
            characteristics: vec![Characteristic {
                name: "Standard".to_string(),
                difficulties: standard,
            }],
            automapper: None,
        }
    }

    // =========================================================================
    // Binary Payloads
    // =========================================================================

    /// Bytes served for a beatmap archive.
    pub fn archive_bytes(key: &str, hash: &str) -> Vec<u8> {
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(format!("{key}:{hash}").as_bytes());
        bytes.resize(4096, 0);
        bytes
    }

    /// Bytes served for a cover image.
    pub fn cover_bytes(hash: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(hash.as_bytes());
        bytes
    }

    // =========================================================================
    // Scenario Builders
    // =========================================================================

    /// Create a default set of test data for common scenarios.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario::new()
    }
}

fn uploaded_at(days: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH_SECS + days * 86_400, 0).unwrap_or_default()
}

/// A complete test scenario with related entities.
///
/// 25 human-made beatmaps (3 pages at the default page size) and 2
/// automapped ones.
pub struct DefaultScenario {
    pub users: Vec<User>,
    pub beatmaps: Vec<BeatmapData>,
}

impl DefaultScenario {
    /// Key of the best known fixture.
    pub const CENTIPEDE_KEY: &'static str = "17f9";

    fn new() -> Self {
        let users = vec![
            Fixtures::freeek(),
            Fixtures::elliot(),
            Fixtures::prolific_mapper(),
            Fixtures::user("5cff0b7598cc5a672c84f2b1", "lurker"),
        ];

        let mut centipede = Fixtures::minimal_beatmap("17f9", "Centipede", Fixtures::freeek());
        centipede.metadata.song_author_name = "Knife Party".to_string();
        centipede.metadata.level_author_name = "Freeek".to_string();
        centipede.uploaded = uploaded_at(400);
        centipede.stats.heat = 900.0;

        let mut shrek = Fixtures::minimal_beatmap("2144", "Shrekophone", Fixtures::freeek());
        shrek.metadata.level_author_name = "Freeek".to_string();
        shrek.uploaded = uploaded_at(410);

        let mut crab = Fixtures::minimal_beatmap("3a7f", "Crab Rave", Fixtures::elliot());
        crab.metadata.song_author_name = "Noisestorm".to_string();
        crab.metadata.level_author_name = "Elliot".to_string();
        crab.uploaded = uploaded_at(420);

        let mut beatmaps = vec![centipede, shrek, crab];
        beatmaps.extend((0..22).map(Fixtures::numbered_beatmap));
        beatmaps.push(Fixtures::automapped_beatmap("a001", "Beat Sage"));
        beatmaps.push(Fixtures::automapped_beatmap("a002", "Beat Sage"));

        Self { users, beatmaps }
    }
}
