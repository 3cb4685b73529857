//! BeatSaver API model types.

mod beatmap;
mod metadata;
mod user;
mod vote;

pub use beatmap::*;
pub use metadata::*;
pub use user::*;
pub use vote::*;
