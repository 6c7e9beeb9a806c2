//! Market event identification.
//!
//! Tickers and titles from prediction markets are classified by an ordered
//! rule table. The first rule whose patterns are all present wins; anything
//! unclassified falls through to an `Unknown` event keyed by the raw ticker.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Real-world event category a market resolves on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Weather,
    Crypto,
    Politics,
    Unknown,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Weather => "weather",
            EventCategory::Crypto => "crypto",
            EventCategory::Politics => "politics",
            EventCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured identity of the event behind a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub event_id: String,
    pub category: EventCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Ticker and title handed to every rule, raw and lowercased
#[derive(Debug)]
pub struct RuleInput {
    pub raw_ticker: String,
    pub raw_title: String,
    pub ticker: String,
    pub title: String,
}

impl RuleInput {
    pub fn new(ticker: &str, title: &str) -> Self {
        Self {
            raw_ticker: ticker.to_string(),
            raw_title: title.to_string(),
            ticker: ticker.to_lowercase(),
            title: title.to_lowercase(),
        }
    }

    /// First capture group of `pattern`, looked up in the ticker and then
    /// in the title
    fn capture(&self, pattern: &'static Pattern) -> Option<String> {
        let re = pattern.get()?;
        re.captures(&self.ticker)
            .or_else(|| re.captures(&self.title))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Uppercase code (airport, state) from the raw ticker or title. A
    /// lowercased ticker may still carry one as a standalone token; titles
    /// are prose, so their lowercase words ("the", "in") never count.
    fn code(&self, upper: &'static Pattern, lower: &'static Pattern) -> Option<String> {
        let found = upper.get().and_then(|re| {
            re.captures(&self.raw_ticker)
                .or_else(|| re.captures(&self.raw_title))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase())
        });
        found.or_else(|| {
            lower
                .get()?
                .captures(&self.ticker)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

/// One classification rule: all of its patterns must be found for `build`
/// to produce an event
#[derive(Clone, Copy)]
pub struct EventRule {
    pub category: EventCategory,
    pub build: fn(&RuleInput) -> Option<MarketEvent>,
}

/// Classification order. Earlier rules win when several would apply.
pub const EVENT_RULES: [EventRule; 3] = [
    EventRule {
        category: EventCategory::Weather,
        build: weather_event,
    },
    EventRule {
        category: EventCategory::Crypto,
        build: crypto_event,
    },
    EventRule {
        category: EventCategory::Politics,
        build: politics_event,
    },
];

/// Lazily compiled regex
struct Pattern {
    source: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl Pattern {
    const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    fn get(&'static self) -> Option<&'static Regex> {
        self.compiled
            .get_or_init(|| Regex::new(self.source).ok())
            .as_ref()
    }
}

// Keywords run on lowercased text and may sit inside concatenated tickers
// ("kxbtcd"). Airport and state codes are standalone uppercase tokens.
static LOCATION_CODE: Pattern = Pattern::new(r"\b([A-Z]{3})\b");
static LOCATION_TOKEN: Pattern = Pattern::new(r"\b([a-z]{3})\b");
static DATE: Pattern = Pattern::new(r"(\d{4}-\d{2}-\d{2})");
static WEATHER_METRIC: Pattern = Pattern::new(r"(temp|temperature|rain|snow|wind)");
static CRYPTO_ASSET: Pattern = Pattern::new(r"(btc|eth|sol|bitcoin|ethereum|solana)");
static PRICE_DIRECTION: Pattern = Pattern::new(r"(price|above|below)");
static ELECTION: Pattern = Pattern::new(r"(election|president|senate|house)");
static STATE_CODE: Pattern = Pattern::new(r"\b([A-Z]{2})\b");
static STATE_TOKEN: Pattern = Pattern::new(r"\b([a-z]{2})\b");

fn weather_event(input: &RuleInput) -> Option<MarketEvent> {
    let location = input.code(&LOCATION_CODE, &LOCATION_TOKEN)?;
    let date = input.capture(&DATE)?;
    let metric = input.capture(&WEATHER_METRIC)?;
    Some(MarketEvent {
        event_id: format!("{}-{}-{}", location, metric, date),
        category: EventCategory::Weather,
        location: Some(location),
        date: Some(date),
    })
}

fn crypto_event(input: &RuleInput) -> Option<MarketEvent> {
    let asset = input.capture(&CRYPTO_ASSET)?;
    let direction = input.capture(&PRICE_DIRECTION)?;
    let date = input.capture(&DATE)?;
    Some(MarketEvent {
        event_id: format!("{}-{}-{}", asset, direction, date),
        category: EventCategory::Crypto,
        location: None,
        date: Some(date),
    })
}

fn politics_event(input: &RuleInput) -> Option<MarketEvent> {
    let election = input.capture(&ELECTION)?;
    let state = input.code(&STATE_CODE, &STATE_TOKEN)?;
    let date = input.capture(&DATE)?;
    Some(MarketEvent {
        event_id: format!("{}-{}-{}", election, state, date),
        category: EventCategory::Politics,
        location: Some(state),
        date: Some(date),
    })
}

/// Classify a market by its ticker and title. Never fails: markets no rule
/// recognizes become `Unknown` events keyed by the raw ticker.
pub fn extract_event_id(ticker: &str, title: &str) -> MarketEvent {
    let input = RuleInput::new(ticker, title);

    for rule in EVENT_RULES.iter() {
        if let Some(event) = (rule.build)(&input) {
            debug!("Classified {} as {} event {}", ticker, rule.category, event.event_id);
            return event;
        }
    }

    MarketEvent {
        event_id: ticker.to_string(),
        category: EventCategory::Unknown,
        location: None,
        date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_ticker() {
        let event = extract_event_id("LAX-TEMP-2025-01-01", "LA temperature forecast");
        assert_eq!(
            event,
            MarketEvent {
                event_id: "lax-temp-2025-01-01".to_string(),
                category: EventCategory::Weather,
                location: Some("lax".to_string()),
                date: Some("2025-01-01".to_string()),
            }
        );
    }

    #[test]
    fn test_weather_metric_from_title() {
        let event = extract_event_id("JFK-2025-02-10", "Will it snow at JFK?");
        assert_eq!(event.category, EventCategory::Weather);
        assert_eq!(event.event_id, "jfk-snow-2025-02-10");
    }

    #[test]
    fn test_crypto_ticker() {
        let event = extract_event_id("KXBTCD-2025-03-01", "Bitcoin above 100k?");
        assert_eq!(event.category, EventCategory::Crypto);
        assert_eq!(event.event_id, "btc-above-2025-03-01");
        assert_eq!(event.location, None);
        assert_eq!(event.date.as_deref(), Some("2025-03-01"));
    }

    #[test]
    fn test_politics_ticker() {
        let event = extract_event_id("SENATE-PA-2026-11-03", "Pennsylvania senate race");
        assert_eq!(event.category, EventCategory::Politics);
        assert_eq!(event.event_id, "senate-pa-2026-11-03");
        assert_eq!(event.location.as_deref(), Some("pa"));
    }

    #[test]
    fn test_missing_date_falls_back() {
        let event = extract_event_id("KXBTC-ABOVE", "Bitcoin above 100k this year?");
        assert_eq!(event.category, EventCategory::Unknown);
        assert_eq!(event.event_id, "KXBTC-ABOVE");
        assert_eq!(event.location, None);
        assert_eq!(event.date, None);
    }

    #[test]
    fn test_rule_order_breaks_ties() {
        // satisfies both the weather and crypto rules; weather is listed first
        let event = extract_event_id("SOL-WIND-PRICE-2025-05-05", "");
        assert_eq!(event.category, EventCategory::Weather);
        assert_eq!(event.event_id, "sol-wind-2025-05-05");
    }

    #[test]
    fn test_empty_inputs_are_unknown() {
        let event = extract_event_id("", "");
        assert_eq!(event.category, EventCategory::Unknown);
        assert_eq!(event.event_id, "");
    }

    #[test]
    fn test_title_stop_words_are_not_locations() {
        let event = extract_event_id("KXHIGHTEMP-2025-01-01", "Will the high temp top 70 on 2025-01-01?");
        assert_eq!(event.category, EventCategory::Unknown);

        let nyc = extract_event_id("KXHIGHTEMP-2025-01-01", "Will the high temp in NYC top 40?");
        assert_eq!(nyc.event_id, "nyc-temp-2025-01-01");
        assert_eq!(nyc.location.as_deref(), Some("nyc"));
    }

    #[test]
    fn test_lowercase_ticker_code() {
        let event = extract_event_id("lax-temp-2025-01-01", "");
        assert_eq!(event.event_id, "lax-temp-2025-01-01");

        let senate = extract_event_id("senate-pa-2026-11-03", "");
        assert_eq!(senate.location.as_deref(), Some("pa"));
    }

    #[test]
    fn test_rule_table_order() {
        let order: Vec<EventCategory> = EVENT_RULES.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![EventCategory::Weather, EventCategory::Crypto, EventCategory::Politics]
        );
    }

    #[test]
    fn test_category_serializes_lowercase() {
        let event = extract_event_id("LAX-TEMP-2025-01-01", "");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "weather");
        assert_eq!(json["event_id"], "lax-temp-2025-01-01");

        let unknown = serde_json::to_value(extract_event_id("ABC", "")).unwrap();
        assert!(unknown.get("location").is_none());
    }
}
