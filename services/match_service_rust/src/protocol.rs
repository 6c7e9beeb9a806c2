//! Line-delimited JSON protocol.
//!
//! Each request is one JSON object tagged by `op`; each response is one
//! JSON object with `ok` plus op-specific fields, or `ok: false` and an
//! `error` message. A bad line never stops the service.

use crate::config::Config;
use anyhow::{Context, Result};
use entity_match_core::{
    extract_event_id, CorrelationDetector, MatchConfig, TeamMatcher,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    TeamsMatch {
        a: String,
        b: String,
        #[serde(default)]
        threshold: Option<f64>,
    },
    GameTeamsMatch {
        pick_home: String,
        pick_away: String,
        espn_home: String,
        espn_away: String,
        #[serde(default)]
        threshold: Option<f64>,
    },
    ExtractEventId {
        ticker: String,
        #[serde(default)]
        title: String,
    },
    IsCorrelated {
        ticker: String,
        #[serde(default)]
        title: String,
    },
    RecordBet {
        market_id: String,
        ticker: String,
        #[serde(default)]
        title: String,
    },
    RemoveBet {
        market_id: String,
    },
    Clear,
}

/// Owns the matcher and the one correlation detector of this process
pub struct MatchService {
    matcher: TeamMatcher,
    detector: CorrelationDetector,
}

impl MatchService {
    pub fn new(config: Config) -> Self {
        Self {
            matcher: TeamMatcher::new(config.matching),
            detector: CorrelationDetector::new(config.correlation),
        }
    }

    /// Handle one raw input line, which may not be valid UTF-8
    pub fn handle_bytes(&mut self, raw: &[u8]) -> Value {
        match std::str::from_utf8(raw) {
            Ok(line) => self.handle_line(line),
            Err(e) => reject(anyhow::Error::new(e).context("Request is not valid UTF-8")),
        }
    }

    /// Decode, dispatch and encode one request line
    pub fn handle_line(&mut self, line: &str) -> Value {
        let result = serde_json::from_str::<Request>(line)
            .context("Malformed request")
            .and_then(|request| self.handle(request));

        result.unwrap_or_else(reject)
    }

    pub fn handle(&mut self, request: Request) -> Result<Value> {
        debug!("Handling {:?}", request);
        match request {
            Request::TeamsMatch { a, b, threshold } => {
                let result = self.matcher_for(threshold)?.match_teams(&a, &b);
                Ok(json!({
                    "ok": true,
                    "matched": result.is_match(),
                    "score": result.score,
                    "reason": result.reason,
                    "confidence": result.confidence,
                }))
            }
            Request::GameTeamsMatch {
                pick_home,
                pick_away,
                espn_home,
                espn_away,
                threshold,
            } => {
                let orientation = self.matcher_for(threshold)?.match_game(
                    &pick_home,
                    &pick_away,
                    &espn_home,
                    &espn_away,
                );
                Ok(json!({
                    "ok": true,
                    "matched": orientation.is_some(),
                    "orientation": orientation,
                }))
            }
            Request::ExtractEventId { ticker, title } => Ok(json!({
                "ok": true,
                "event": extract_event_id(&ticker, &title),
            })),
            Request::IsCorrelated { ticker, title } => {
                let check = self.detector.is_correlated(&ticker, &title);
                Ok(json!({
                    "ok": true,
                    "correlated": check.correlated,
                    "reason": check.reason,
                }))
            }
            Request::RecordBet {
                market_id,
                ticker,
                title,
            } => {
                self.detector.record_bet(&market_id, &ticker, &title);
                Ok(json!({ "ok": true }))
            }
            Request::RemoveBet { market_id } => {
                self.detector.remove_bet(&market_id);
                Ok(json!({ "ok": true }))
            }
            Request::Clear => {
                self.detector.clear();
                Ok(json!({ "ok": true }))
            }
        }
    }

    fn matcher_for(&self, threshold: Option<f64>) -> Result<TeamMatcher> {
        let Some(threshold) = threshold else {
            return Ok(self.matcher);
        };
        let config = MatchConfig {
            threshold,
            ..*self.matcher.config()
        };
        config.validate().context("Invalid threshold override")?;
        Ok(TeamMatcher::new(config))
    }
}

fn reject(e: anyhow::Error) -> Value {
    warn!("Rejected request: {:#}", e);
    json!({ "ok": false, "error": format!("{:#}", e) })
}
