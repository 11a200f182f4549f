use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Composite cache key for a computed change value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FillCacheKey {
    channel: String,
    timestamp: i64,
    column: usize,
}

impl FillCacheKey {
    pub fn new(channel: &str, timestamp: i64, column: usize) -> Self {
        Self {
            channel: channel.to_string(),
            timestamp,
            column,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheSlot {
    value: f64,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<FillCacheKey, CacheSlot>,
    order: VecDeque<FillCacheKey>,
}

/// Bounded memoization cache for computed change values. Evicts
/// oldest-inserted entries when over capacity and, when a TTL is configured,
/// drops stale entries on access. Purely an optimization: any miss triggers
/// recomputation, so correctness never depends on contents. A poisoned lock
/// degrades to a permanent miss for the same reason.
#[derive(Debug)]
pub struct FillCache {
    inner: Mutex<CacheState>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl FillCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, key: &FillCacheKey) -> Option<f64> {
        let mut state = self.inner.lock().ok()?;
        let slot = state.entries.get(key).copied()?;
        if let Some(ttl) = self.ttl {
            if slot.stored_at.elapsed() > ttl {
                state.entries.remove(key);
                return None;
            }
        }
        Some(slot.value)
    }

    pub fn set(&self, key: FillCacheKey, value: f64) {
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        let slot = CacheSlot {
            value,
            stored_at: Instant::now(),
        };
        if state.entries.insert(key.clone(), slot).is_none() {
            state.order.push_back(key);
        }

        if let Some(ttl) = self.ttl {
            while let Some(front) = state.order.front() {
                match state.entries.get(front) {
                    Some(slot) if slot.stored_at.elapsed() > ttl => {
                        let front = front.clone();
                        state.entries.remove(&front);
                        state.order.pop_front();
                    }
                    Some(_) => break,
                    // Key already expired via get; drop the stale queue entry.
                    None => {
                        state.order.pop_front();
                    }
                }
            }
        }

        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
