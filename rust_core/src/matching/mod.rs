//! Entity Matching
//!
//! Decides whether two free-text names from different feeds (scoreboards,
//! prediction engines, market listings) denote the same team.
//!
//! - `normalize`: canonical form of a raw name
//! - `similarity`: blended edit-distance / token-overlap score
//! - `team`: threshold decisions, substring fallback, home/away swap

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod normalize;
pub mod similarity;
pub mod team;

pub use normalize::normalize;
pub use similarity::{edit_distance, similarity, similarity_score, token_similarity};
pub use team::{
    batch_game_teams_match, game_teams_match, teams_match, GamePair, TeamMatcher,
};

/// Match confidence level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchConfidence {
    None = 0,
    Low = 1,    // Some overlap, below threshold
    Medium = 2, // Passed threshold or substring fallback
    High = 3,   // Blended score >= 0.85
    Exact = 4,  // Normalized names identical
}

/// Which step of the matcher produced the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// One side normalized to nothing (e.g. the name was only a mascot)
    EmptyName,
    /// Blended score reached the threshold
    Blended,
    /// Flattened names contain one another
    Substring,
    BelowThreshold,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchReason::EmptyName => "empty name after normalization",
            MatchReason::Blended => "blended score",
            MatchReason::Substring => "substring fallback",
            MatchReason::BelowThreshold => "below threshold",
        };
        f.write_str(s)
    }
}

/// Result of matching two entity names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub confidence: MatchConfidence,
    /// Blended similarity of the normalized names (0.0 when a side is empty)
    pub score: f64,
    pub reason: MatchReason,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self {
            confidence: MatchConfidence::None,
            score: 0.0,
            reason: MatchReason::EmptyName,
        }
    }

    pub fn blended(score: f64) -> Self {
        let confidence = if score >= 1.0 {
            MatchConfidence::Exact
        } else if score >= 0.85 {
            MatchConfidence::High
        } else {
            MatchConfidence::Medium
        };
        Self {
            confidence,
            score,
            reason: MatchReason::Blended,
        }
    }

    pub fn substring(score: f64) -> Self {
        Self {
            confidence: MatchConfidence::Medium,
            score,
            reason: MatchReason::Substring,
        }
    }

    pub fn below_threshold(score: f64) -> Self {
        let confidence = if score > 0.0 {
            MatchConfidence::Low
        } else {
            MatchConfidence::None
        };
        Self {
            confidence,
            score,
            reason: MatchReason::BelowThreshold,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self.reason, MatchReason::Blended | MatchReason::Substring)
    }
}

/// How a predicted game lines up with a scoreboard game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOrientation {
    /// home↔home and away↔away
    Direct,
    /// The two sources disagree on which side is home
    Swapped,
}
