//! Trait definitions for catalog entities.
//!
//! Each entity type implements the traits it supports, hiding which route
//! serves it.

mod lookup;

pub use lookup::{BeatmapId, Lookup};
