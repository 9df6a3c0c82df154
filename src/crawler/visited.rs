//! Concurrency-safe visited set
//!
//! Shared by every task resolving links below one seed, so that a dataset
//! reachable along several paths (or through a cycle of any length) is
//! fetched once.

use crate::url::visit_key;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Result of offering a URL to the visited set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time seen; the caller should resolve it
    Admitted,
    /// Already resolved or in progress
    AlreadySeen,
    /// The set is full; the URL is refused
    CapacityReached,
}

/// Bounded set of normalized URLs
#[derive(Debug, Clone)]
pub struct VisitedSet {
    seen: Arc<Mutex<HashSet<String>>>,
    capacity: usize,
}

impl VisitedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: Arc::new(Mutex::new(HashSet::new())),
            capacity,
        }
    }

    /// Records `url` and reports whether it was new
    pub fn admit(&self, url: &str) -> Admission {
        let key = visit_key(url);
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());

        if seen.contains(&key) {
            Admission::AlreadySeen
        } else if seen.len() >= self.capacity {
            Admission::CapacityReached
        } else {
            seen.insert(key);
            Admission::Admitted
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.contains(&visit_key(url))
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
