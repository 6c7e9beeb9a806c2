//! Insertion-ordered recency cache of recorded bets.
//!
//! A `VecDeque` ring buffer holds keys in insertion order and a hash map
//! holds the entries. Removed keys leave stale slots in the ring which are
//! skipped on iteration and eviction and compacted once they pile up.
//! Overwriting an existing key keeps its original position.

use super::event_id::MarketEvent;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct Entry {
    slot: u64,
    event: MarketEvent,
    recorded_at_ms: i64,
}

/// A cached bet as seen by readers
#[derive(Debug, Clone, Copy)]
pub struct RecordedBet<'a> {
    pub market_id: &'a str,
    pub event: &'a MarketEvent,
    pub recorded_at_ms: i64,
}

/// Bounded map of market id -> event, evicting the oldest insertion first
#[derive(Debug, Clone)]
pub struct RecencyCache {
    capacity: usize,
    order: VecDeque<(String, u64)>,
    entries: FxHashMap<String, Entry>,
    next_slot: u64,
}

impl RecencyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            entries: FxHashMap::default(),
            next_slot: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.entries.contains_key(market_id)
    }

    pub fn get(&self, market_id: &str) -> Option<&MarketEvent> {
        self.entries.get(market_id).map(|e| &e.event)
    }

    /// Insert or overwrite, then evict the single oldest entry if over
    /// capacity. Returns the evicted market id.
    pub fn insert(&mut self, market_id: &str, event: MarketEvent, now_ms: i64) -> Option<String> {
        if let Some(entry) = self.entries.get_mut(market_id) {
            entry.event = event;
            entry.recorded_at_ms = now_ms;
            return None;
        }

        let slot = self.next_slot;
        self.next_slot += 1;
        self.order.push_back((market_id.to_string(), slot));
        self.entries.insert(
            market_id.to_string(),
            Entry {
                slot,
                event,
                recorded_at_ms: now_ms,
            },
        );

        let evicted = if self.entries.len() > self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.compact_if_sparse();
        evicted
    }

    pub fn remove(&mut self, market_id: &str) -> Option<MarketEvent> {
        let removed = self.entries.remove(market_id).map(|e| e.event);
        self.compact_if_sparse();
        removed
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Drop entries recorded before `cutoff_ms`. Returns how many were dropped.
    pub fn prune_before(&mut self, cutoff_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.recorded_at_ms >= cutoff_ms);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.compact_if_sparse();
        }
        dropped
    }

    /// Live entries, oldest insertion first
    pub fn iter(&self) -> impl Iterator<Item = RecordedBet<'_>> + '_ {
        self.order.iter().filter_map(move |(market_id, slot)| {
            self.live(market_id, *slot).map(|entry| RecordedBet {
                market_id: market_id.as_str(),
                event: &entry.event,
                recorded_at_ms: entry.recorded_at_ms,
            })
        })
    }

    fn live(&self, market_id: &str, slot: u64) -> Option<&Entry> {
        self.entries.get(market_id).filter(|e| e.slot == slot)
    }

    fn evict_oldest(&mut self) -> Option<String> {
        while let Some((market_id, slot)) = self.order.pop_front() {
            if self.live(&market_id, slot).is_some() {
                self.entries.remove(&market_id);
                return Some(market_id);
            }
        }
        None
    }

    fn compact_if_sparse(&mut self) {
        if self.order.len() > 2 * self.entries.len() + 16 {
            let entries = &self.entries;
            self.order
                .retain(|(market_id, slot)| entries.get(market_id).map_or(false, |e| e.slot == *slot));
        }
    }
}
