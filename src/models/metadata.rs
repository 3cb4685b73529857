//! Read-only value groups attached to a beatmap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Play and vote statistics for a beatmap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub plays: u64,
    #[serde(default)]
    pub up_votes: u64,
    #[serde(default)]
    pub down_votes: u64,
    /// Rating in `[0, 1]`.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub heat: f64,
}

impl Stats {
    pub fn total_votes(&self) -> u64 {
        self.up_votes + self.down_votes
    }
}

/// Metadata read from the beatmap's info file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub song_name: String,
    pub song_sub_name: String,
    pub song_author_name: String,
    pub level_author_name: String,
    /// Duration of the audio file, in seconds.
    pub duration: u32,
    /// Beats per minute.
    pub bpm: f64,
    pub difficulties: Difficulties,
    pub characteristics: Vec<Characteristic>,
    /// Automapping tool that generated the beatmap, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automapper: Option<String>,
}

impl Metadata {
    pub fn is_automapped(&self) -> bool {
        self.automapper.is_some()
    }
}

/// Which difficulties a beatmap ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Difficulties {
    pub easy: bool,
    pub normal: bool,
    pub hard: bool,
    pub expert: bool,
    pub expert_plus: bool,
}

impl Difficulties {
    /// Number of difficulties present.
    pub fn count(&self) -> usize {
        [self.easy, self.normal, self.hard, self.expert, self.expert_plus]
            .iter()
            .filter(|d| **d)
            .count()
    }
}

/// A gameplay characteristic (e.g. "Standard", "OneSaber").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    /// Difficulty name to details; `None` when the difficulty is absent.
    #[serde(default)]
    pub difficulties: BTreeMap<String, Option<CharacteristicDifficulty>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicDifficulty {
    /// Length in beats.
    #[serde(default)]
    pub duration: f64,
    /// Length in seconds.
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub bombs: u32,
    #[serde(default)]
    pub notes: u32,
    #[serde(default)]
    pub obstacles: u32,
    #[serde(rename = "njs", default)]
    pub note_jump_speed: f64,
    #[serde(rename = "njsOffset", default)]
    pub note_jump_speed_offset: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_deserialize() {
        let json = r#"{"downloads": 10, "plays": 4, "upVotes": 3, "downVotes": 1, "rating": 0.7, "heat": 12.5}"#;
        let stats: Stats = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(stats.downloads, 10);
        assert_eq!(stats.total_votes(), 4);
        assert!((stats.heat - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metadata_deserialize() {
        let json = r#"{
            "songName": "Tower of Heaven",
            "songSubName": "",
            "songAuthorName": "Flashygoodness",
            "levelAuthorName": "zorowo",
            "duration": 0,
            "bpm": 150,
            "difficulties": {"easy": false, "normal": true, "hard": true, "expert": true, "expertPlus": false},
            "characteristics": [{
                "name": "Standard",
                "difficulties": {
                    "easy": null,
                    "hard": {"duration": 340.5, "length": 136, "bombs": 0, "notes": 402, "obstacles": 12, "njs": 10, "njsOffset": 0}
                }
            }]
        }"#;
        let metadata: Metadata = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(metadata.song_name, "Tower of Heaven");
        assert_eq!(metadata.difficulties.count(), 3);
        assert!(!metadata.is_automapped());

        let standard = &metadata.characteristics[0];
        assert!(standard.difficulties["easy"].is_none());
        let hard = standard.difficulties["hard"].as_ref().unwrap();
        assert_eq!(hard.notes, 402);
        assert!((hard.note_jump_speed - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metadata_empty() {
        let metadata: Metadata = serde_json::from_str("{}").expect("Failed to deserialize");
        assert!(metadata.characteristics.is_empty());
        assert_eq!(metadata.difficulties.count(), 0);
    }
}
