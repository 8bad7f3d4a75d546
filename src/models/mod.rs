//! Core data models for games, plays and their statistics.

mod game;
mod ids;
mod play;
mod stats;

pub use game::*;
pub use ids::*;
pub use play::*;
pub use stats::*;
