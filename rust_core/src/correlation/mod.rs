//! Correlated bet detection.
//!
//! Before a wager is placed, its market is reduced to a `MarketEvent` and
//! compared with recently recorded bets. Two markets are correlated when
//! they share an event id, or the same category, location and date.
//!
//! The detector is a plain owned struct. Services that share one across
//! threads use `SharedCorrelationDetector`, which serializes every call.

use crate::config::CorrelationConfig;
use chrono::Utc;
use parking_lot::Mutex;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub mod event_id;
pub mod recency;

pub use event_id::{extract_event_id, EventCategory, EventRule, MarketEvent, EVENT_RULES};
pub use recency::{RecencyCache, RecordedBet};

/// Outcome of a correlation check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationCheck {
    pub correlated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CorrelationCheck {
    pub fn independent() -> Self {
        Self {
            correlated: false,
            reason: None,
        }
    }

    pub fn correlated(reason: String) -> Self {
        Self {
            correlated: true,
            reason: Some(reason),
        }
    }
}

/// Tracks recently placed bets and flags new ones on the same event
#[derive(Debug, Clone)]
pub struct CorrelationDetector {
    config: CorrelationConfig,
    cache: RecencyCache,
}

impl Default for CorrelationDetector {
    fn default() -> Self {
        Self::new(CorrelationConfig::default())
    }
}

impl CorrelationDetector {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            cache: RecencyCache::new(config.capacity),
            config,
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Check a candidate bet against recorded bets
    pub fn is_correlated(&self, ticker: &str, title: &str) -> CorrelationCheck {
        self.is_correlated_at(ticker, title, now_ms())
    }

    /// Same as `is_correlated` with an explicit clock, in epoch millis.
    ///
    /// Recorded bets are scanned oldest first and the first conflict wins.
    pub fn is_correlated_at(&self, ticker: &str, title: &str, now_ms: i64) -> CorrelationCheck {
        let event = extract_event_id(ticker, title);
        let cutoff = self.cutoff_ms(now_ms);

        for bet in self.cache.iter() {
            if cutoff.map_or(false, |c| bet.recorded_at_ms < c) {
                continue;
            }
            let cached = bet.event;

            if cached.event_id == event.event_id {
                debug!("{} shares event {} with market {}", ticker, event.event_id, bet.market_id);
                return CorrelationCheck::correlated(format!(
                    "Same event {} as existing bet on market {}",
                    event.event_id, bet.market_id
                ));
            }

            if cached.category == event.category
                && cached.location == event.location
                && cached.date == event.date
            {
                debug!("{} is related to market {}", ticker, bet.market_id);
                return CorrelationCheck::correlated(format!(
                    "Related {} event at {} on {} as existing bet on market {}",
                    event.category,
                    event.location.as_deref().unwrap_or("unspecified location"),
                    event.date.as_deref().unwrap_or("unspecified date"),
                    bet.market_id
                ));
            }
        }

        CorrelationCheck::independent()
    }

    /// Remember a placed bet, overwriting any earlier record for `market_id`
    pub fn record_bet(&mut self, market_id: &str, ticker: &str, title: &str) {
        self.record_bet_at(market_id, ticker, title, now_ms());
    }

    /// Same as `record_bet` with an explicit clock, in epoch millis
    pub fn record_bet_at(&mut self, market_id: &str, ticker: &str, title: &str, now_ms: i64) {
        if let Some(cutoff) = self.cutoff_ms(now_ms) {
            let pruned = self.cache.prune_before(cutoff);
            if pruned > 0 {
                debug!("Pruned {} bets older than the correlation window", pruned);
            }
        }

        let event = extract_event_id(ticker, title);
        if let Some(evicted) = self.cache.insert(market_id, event, now_ms) {
            info!(
                "Correlation cache full ({}), evicted oldest market {}",
                self.cache.capacity(),
                evicted
            );
        }
    }

    pub fn remove_bet(&mut self, market_id: &str) {
        self.cache.remove(market_id);
    }

    pub fn clear(&mut self) {
        info!("Clearing {} recorded bets", self.cache.len());
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.cache.contains(market_id)
    }

    pub fn get(&self, market_id: &str) -> Option<&MarketEvent> {
        self.cache.get(market_id)
    }

    /// Recorded bets, oldest insertion first
    pub fn events(&self) -> impl Iterator<Item = RecordedBet<'_>> + '_ {
        self.cache.iter()
    }

    fn cutoff_ms(&self, now_ms: i64) -> Option<i64> {
        self.config
            .window
            .map(|w| now_ms.saturating_sub(i64::try_from(w.as_millis()).unwrap_or(i64::MAX)))
    }
}

/// Thread-safe handle to one detector, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct SharedCorrelationDetector {
    inner: Arc<Mutex<CorrelationDetector>>,
}

impl SharedCorrelationDetector {
    pub fn new(config: CorrelationConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CorrelationDetector::new(config))),
        }
    }

    pub fn is_correlated(&self, ticker: &str, title: &str) -> CorrelationCheck {
        self.inner.lock().is_correlated(ticker, title)
    }

    pub fn record_bet(&self, market_id: &str, ticker: &str, title: &str) {
        self.inner.lock().record_bet(market_id, ticker, title);
    }

    pub fn remove_bet(&self, market_id: &str) {
        self.inner.lock().remove_bet(market_id);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Check and, when independent, record in one critical section so two
    /// callers cannot both pass the check for the same event
    pub fn check_and_record(&self, market_id: &str, ticker: &str, title: &str) -> CorrelationCheck {
        let mut detector = self.inner.lock();
        let now = now_ms();
        let check = detector.is_correlated_at(ticker, title, now);
        if !check.correlated {
            detector.record_bet_at(market_id, ticker, title, now);
        }
        check
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// PyO3 Bindings
// ============================================================================

/// Python wrapper for CorrelationDetector
#[cfg(feature = "python")]
#[pyclass(name = "CorrelationDetector")]
pub struct PyCorrelationDetector {
    inner: CorrelationDetector,
}

#[cfg(feature = "python")]
#[pymethods]
impl PyCorrelationDetector {
    #[new]
    #[pyo3(signature = (capacity = crate::config::DEFAULT_CORRELATION_CAPACITY))]
    fn new(capacity: usize) -> Self {
        Self {
            inner: CorrelationDetector::new(CorrelationConfig {
                capacity: capacity.max(1),
                window: None,
            }),
        }
    }

    /// Returns (correlated, reason)
    fn is_correlated(&self, ticker: &str, title: &str) -> (bool, Option<String>) {
        let check = self.inner.is_correlated(ticker, title);
        (check.correlated, check.reason)
    }

    fn record_bet(&mut self, market_id: &str, ticker: &str, title: &str) {
        self.inner.record_bet(market_id, ticker, title);
    }

    fn remove_bet(&mut self, market_id: &str) {
        self.inner.remove_bet(market_id);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}
