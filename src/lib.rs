//! # Play Stats
//!
//! Rankings, skill ratings and statistics for recorded board game plays.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (games, play records, derived statistics)
//! - **calculate**: Rankings, ratings, correlations and aggregates
//! - **storage**: Loading exported games and plays (JSON, JSONL)
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod storage;

pub use models::*;

/// Parse a play duration into hours.
///
/// Accepts decimal hours ("2.5"), hours and minutes ("1:30"), and suffixed
/// values ("90m", "2h"). Empty, negative or unparsable input yields `None`.
pub fn parse_duration_hours(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let hours = if let Some((h, m)) = s.split_once(':') {
        let hours: u32 = h.trim().parse().ok()?;
        let minutes: u32 = m.trim().parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        hours as f64 + minutes as f64 / 60.0
    } else if let Some(n) = s.strip_suffix('h') {
        n.trim().parse::<f64>().ok()?
    } else if let Some(n) = s.strip_suffix('m') {
        n.trim().parse::<f64>().ok()? / 60.0
    } else {
        // Default to hours
        s.parse::<f64>().ok()?
    };

    if hours.is_finite() && hours >= 0.0 {
        Some(hours)
    } else {
        None
    }
}
