//! Team Entity Matcher
//!
//! Threshold decision over the blended similarity of two normalized names,
//! with a substring fallback for compound names that different feeds split
//! differently ("Grambling" vs "Grambling State"), and an orientation-aware
//! game check for feeds that disagree on home/away.

use super::normalize::normalize;
use super::similarity::similarity;
use super::{GameOrientation, MatchResult};
use crate::config::MatchConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A predicted game and a scoreboard game to reconcile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePair {
    pub pick_home: String,
    pub pick_away: String,
    pub espn_home: String,
    pub espn_away: String,
}

/// Team name matcher for sports feeds
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamMatcher {
    config: MatchConfig,
}

impl TeamMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self::new(MatchConfig::with_threshold(threshold))
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Compare two raw names and explain the decision
    pub fn match_teams(&self, a: &str, b: &str) -> MatchResult {
        let a_norm = normalize(a);
        let b_norm = normalize(b);

        if a_norm.is_empty() || b_norm.is_empty() {
            return MatchResult::empty();
        }

        let score = similarity(&a_norm, &b_norm);
        if score >= self.config.threshold {
            return MatchResult::blended(score);
        }

        if self.flattened_contains(&a_norm, &b_norm) {
            debug!(
                "Substring fallback matched {:?} ~ {:?} (score {:.3})",
                a_norm, b_norm, score
            );
            return MatchResult::substring(score);
        }

        MatchResult::below_threshold(score)
    }

    /// Whether two raw names denote the same team
    pub fn teams_match(&self, a: &str, b: &str) -> bool {
        self.match_teams(a, b).is_match()
    }

    /// Orientation under which a pick lines up with a scoreboard game.
    /// Direct pairing is tried first.
    pub fn match_game(
        &self,
        pick_home: &str,
        pick_away: &str,
        espn_home: &str,
        espn_away: &str,
    ) -> Option<GameOrientation> {
        if self.teams_match(pick_home, espn_home) && self.teams_match(pick_away, espn_away) {
            return Some(GameOrientation::Direct);
        }
        if self.teams_match(pick_home, espn_away) && self.teams_match(pick_away, espn_home) {
            return Some(GameOrientation::Swapped);
        }
        None
    }

    /// Whether both teams match regardless of which feed calls which side home
    pub fn game_teams_match(
        &self,
        pick_home: &str,
        pick_away: &str,
        espn_home: &str,
        espn_away: &str,
    ) -> bool {
        self.match_game(pick_home, pick_away, espn_home, espn_away)
            .is_some()
    }

    /// Index and score of the best matching candidate. Ties keep the
    /// earliest candidate.
    pub fn best_match<S: AsRef<str>>(&self, name: &str, candidates: &[S]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let result = self.match_teams(name, candidate.as_ref());
            if !result.is_match() {
                continue;
            }
            match best {
                Some((_, score)) if score >= result.score => {}
                _ => best = Some((idx, result.score)),
            }
        }
        best
    }

    /// Containment check on space-free names, guarded so short generic
    /// names ("miami") cannot match long unrelated ones
    fn flattened_contains(&self, a_norm: &str, b_norm: &str) -> bool {
        let a_flat: String = a_norm.chars().filter(|c| *c != ' ').collect();
        let b_flat: String = b_norm.chars().filter(|c| *c != ' ').collect();

        let (shorter, longer) = if a_flat.chars().count() <= b_flat.chars().count() {
            (&a_flat, &b_flat)
        } else {
            (&b_flat, &a_flat)
        };
        let shorter_len = shorter.chars().count();
        let longer_len = longer.chars().count();

        if shorter_len < self.config.substring_min_len {
            return false;
        }
        if (shorter_len as f64 / longer_len as f64) < self.config.substring_min_ratio {
            return false;
        }

        longer.contains(shorter.as_str())
    }
}

/// Whether two raw names denote the same team at `threshold`
pub fn teams_match(a: &str, b: &str, threshold: f64) -> bool {
    TeamMatcher::with_threshold(threshold).teams_match(a, b)
}

/// Orientation-aware game match at `threshold`
pub fn game_teams_match(
    pick_home: &str,
    pick_away: &str,
    espn_home: &str,
    espn_away: &str,
    threshold: f64,
) -> bool {
    TeamMatcher::with_threshold(threshold).game_teams_match(pick_home, pick_away, espn_home, espn_away)
}

/// Grade many games in parallel. Output order follows `pairs`.
pub fn batch_game_teams_match(pairs: &[GamePair], config: &MatchConfig) -> Vec<bool> {
    let matcher = TeamMatcher::new(*config);
    pairs
        .par_iter()
        .map(|p| matcher.game_teams_match(&p.pick_home, &p.pick_away, &p.espn_home, &p.espn_away))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MATCH_THRESHOLD;
    use crate::matching::MatchReason;

    fn game(ph: &str, pa: &str, eh: &str, ea: &str) -> GamePair {
        GamePair {
            pick_home: ph.to_string(),
            pick_away: pa.to_string(),
            espn_home: eh.to_string(),
            espn_away: ea.to_string(),
        }
    }

    #[test]
    fn test_hyphen_and_mascot_match() {
        assert!(teams_match(
            "Arkansas-Little Rock Trojans",
            "Arkansas Little Rock",
            DEFAULT_MATCH_THRESHOLD
        ));
    }

    #[test]
    fn test_unlisted_mascot_does_not_match() {
        // "heat" is not stripped, leaving a 0.5 blend and a too-short substring
        let matcher = TeamMatcher::default();
        let result = matcher.match_teams("Miami", "Miami Heat");
        assert!(!result.is_match());
        assert_eq!(result.reason, MatchReason::BelowThreshold);
        assert!((result.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_substring_fallback() {
        let matcher = TeamMatcher::default();
        let result = matcher.match_teams("Grambling", "Grambling State");
        assert!(result.score < DEFAULT_MATCH_THRESHOLD);
        assert_eq!(result.reason, MatchReason::Substring);
        assert!(result.is_match());
    }

    #[test]
    fn test_substring_fallback_respects_guards() {
        // ratio 8/16 = 0.5 is under 0.6
        assert!(!teams_match("Brooklyn", "Brooklyn Tech Prep", DEFAULT_MATCH_THRESHOLD));

        let relaxed = TeamMatcher::new(MatchConfig {
            substring_min_ratio: 0.5,
            ..MatchConfig::default()
        });
        assert!(relaxed.teams_match("Brooklyn", "Brooklyn Tech Prep"));
    }

    #[test]
    fn test_substring_fallback_needs_eight_chars() {
        let matcher = TeamMatcher::default();

        // 7 chars, ratio 0.7, contained, blended ~0.57
        let short = matcher.match_teams("Abcdefg", "Abcdefg Hij");
        assert!(short.score < DEFAULT_MATCH_THRESHOLD);
        assert_eq!(short.reason, MatchReason::BelowThreshold);

        // exactly 8 chars is enough
        let eight = matcher.match_teams("Abcdefgh", "Abcdefgh Ijk");
        assert!(eight.score < DEFAULT_MATCH_THRESHOLD);
        assert_eq!(eight.reason, MatchReason::Substring);
    }

    #[test]
    fn test_substring_ratio_boundary_is_inclusive() {
        // 9 / 15 = 0.6
        let result = TeamMatcher::default().match_teams("Abcdefghi", "Abcdefghi Jklmno");
        assert!(result.score < DEFAULT_MATCH_THRESHOLD);
        assert_eq!(result.reason, MatchReason::Substring);

        // 9 / 16 falls under
        assert!(!teams_match("Abcdefghi", "Abcdefghi Jklmnop", DEFAULT_MATCH_THRESHOLD));
    }

    #[test]
    fn test_empty_after_normalization_never_matches() {
        let matcher = TeamMatcher::default();
        let result = matcher.match_teams("Wildcats", "Wildcats");
        assert_eq!(result.reason, MatchReason::EmptyName);
        assert!(!matcher.teams_match("", ""));
        assert!(!matcher.teams_match("Duke", ""));
    }

    #[test]
    fn test_identity() {
        assert!(teams_match("Gonzaga", "Gonzaga", DEFAULT_MATCH_THRESHOLD));
        assert!(teams_match("Gonzaga", "Gonzaga", 1.0));
    }

    #[test]
    fn test_abbreviation_expansion_helps() {
        assert!(teams_match("Mt St Mary's", "Mount State Marys", DEFAULT_MATCH_THRESHOLD));
        assert!(teams_match("App State Mountaineers", "Appalachian State", DEFAULT_MATCH_THRESHOLD));
    }

    #[test]
    fn test_unrelated_teams() {
        assert!(!teams_match("Duke Blue Devils", "Kansas Jayhawks", DEFAULT_MATCH_THRESHOLD));
    }

    #[test]
    fn test_game_direct_and_swapped() {
        let matcher = TeamMatcher::default();
        assert_eq!(
            matcher.match_game("Duke", "North Carolina", "Duke Blue Devils", "North Carolina Tar Heels"),
            Some(GameOrientation::Direct)
        );
        assert_eq!(
            matcher.match_game("Duke", "North Carolina", "North Carolina Tar Heels", "Duke Blue Devils"),
            Some(GameOrientation::Swapped)
        );
        assert_eq!(
            matcher.match_game("Duke", "North Carolina", "Kansas", "Kentucky"),
            None
        );
    }

    #[test]
    fn test_game_needs_both_sides() {
        assert!(!game_teams_match(
            "Duke",
            "North Carolina",
            "Duke",
            "Kansas",
            DEFAULT_MATCH_THRESHOLD
        ));
    }

    #[test]
    fn test_best_match_picks_highest_score() {
        let matcher = TeamMatcher::default();
        let candidates = ["Kansas State Wildcats", "Kansas Jayhawks", "Arkansas"];
        let (idx, score) = matcher.best_match("Kansas", &candidates).unwrap();
        assert_eq!(idx, 1);
        assert!((score - 1.0).abs() < 1e-9);
        assert!(matcher.best_match("Gonzaga", &candidates).is_none());
    }

    #[test]
    fn test_batch_preserves_order() {
        let pairs = vec![
            game("Duke", "Kansas", "Kansas", "Duke"),
            game("Duke", "Kansas", "Purdue", "Houston"),
            game("Grambling", "Southern", "Grambling State Tigers", "Southern Jaguars"),
        ];
        let results = batch_game_teams_match(&pairs, &MatchConfig::default());
        assert_eq!(results, vec![true, false, false]);
    }
}
