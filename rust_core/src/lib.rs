//! Entity Match Core - reconciling names and markets across data feeds.
//!
//! This crate provides:
//! - Team name normalization (abbreviations, mascots, punctuation)
//! - Blended edit-distance / token-overlap similarity
//! - Threshold team matching with a substring fallback
//! - Orientation-aware game matching (home/away swapped between feeds)
//! - Market event classification (weather, crypto, politics)
//! - Correlated bet detection over a bounded recency cache
//!
//! Every matching and correlation call is total: "no match" and "not
//! correlated" are ordinary values, never errors.

pub mod config;
pub mod correlation;
pub mod matching;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use config::{ConfigError, CorrelationConfig, MatchConfig, DEFAULT_MATCH_THRESHOLD};
pub use correlation::{
    extract_event_id, CorrelationCheck, CorrelationDetector, EventCategory, MarketEvent,
    SharedCorrelationDetector,
};
pub use matching::{
    batch_game_teams_match, game_teams_match, normalize, similarity, teams_match, GameOrientation,
    GamePair, MatchConfidence, MatchReason, MatchResult, TeamMatcher,
};

// ============================================================================
// PyO3 Bindings
// ============================================================================

/// Canonical form of a team name.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "normalize")]
fn py_normalize(raw: &str) -> String {
    normalize(raw)
}

/// Blended similarity of two already-normalized names.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "similarity")]
fn py_similarity(a: &str, b: &str) -> f64 {
    similarity(a, b)
}

/// Whether two raw team names denote the same team.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "teams_match", signature = (a, b, threshold = DEFAULT_MATCH_THRESHOLD))]
fn py_teams_match(a: &str, b: &str, threshold: f64) -> bool {
    teams_match(a, b, threshold)
}

/// Whether a pick and a scoreboard game involve the same two teams.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(
    name = "game_teams_match",
    signature = (pick_home, pick_away, espn_home, espn_away, threshold = DEFAULT_MATCH_THRESHOLD)
)]
fn py_game_teams_match(
    pick_home: &str,
    pick_away: &str,
    espn_home: &str,
    espn_away: &str,
    threshold: f64,
) -> bool {
    game_teams_match(pick_home, pick_away, espn_home, espn_away, threshold)
}

/// (event_id, category, location, date) for a market.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "extract_event_id")]
fn py_extract_event_id(
    ticker: &str,
    title: &str,
) -> (String, &'static str, Option<String>, Option<String>) {
    let event = extract_event_id(ticker, title);
    (
        event.event_id,
        event.category.as_str(),
        event.location,
        event.date,
    )
}

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn entity_match_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_normalize, m)?)?;
    m.add_function(wrap_pyfunction!(py_similarity, m)?)?;
    m.add_function(wrap_pyfunction!(py_teams_match, m)?)?;
    m.add_function(wrap_pyfunction!(py_game_teams_match, m)?)?;
    m.add_function(wrap_pyfunction!(py_extract_event_id, m)?)?;
    m.add_class::<correlation::PyCorrelationDetector>()?;
    Ok(())
}
