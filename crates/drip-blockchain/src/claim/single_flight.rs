use std::{hash::Hash, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};

/// Set of keys with an operation in progress.
///
/// [`SingleFlight::try_acquire`] hands out at most one live guard per key; the
/// key is released when that guard drops.
#[derive(Debug)]
pub struct SingleFlight<K: Eq + Hash> {
    in_flight: Arc<DashMap<K, ()>>,
}

impl<K: Eq + Hash> Default for SingleFlight<K> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

impl<K: Eq + Hash> Clone for SingleFlight<K> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<K: Eq + Hash + Clone> SingleFlight<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another guard for `key` is alive.
    pub fn try_acquire(&self, key: K) -> Option<SingleFlightGuard<K>> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(SingleFlightGuard {
                    in_flight: Arc::clone(&self.in_flight),
                    key,
                })
            }
        }
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }
}

#[derive(Debug)]
pub struct SingleFlightGuard<K: Eq + Hash> {
    in_flight: Arc<DashMap<K, ()>>,
    key: K,
}

impl<K: Eq + Hash> Drop for SingleFlightGuard<K> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}
