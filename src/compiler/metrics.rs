use std::collections::BTreeMap;

use dashmap::DashMap;

/// Named counters recorded by one pass invocation.
///
/// Counters start at zero and may be updated from any thread.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: DashMap<String, i64>,
}

impl Metrics {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the counter `name` and returns the new total.
    pub fn incr_metric(&self, name: &str, value: i64) -> i64 {
        let mut counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += value;
        *counter
    }

    /// Current value of `name`, zero if it was never incremented.
    #[must_use]
    pub fn get_metric(&self, name: &str) -> i64 {
        self.counters.get(name).map_or(0, |counter| *counter)
    }

    /// Copies every counter, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .iter()
            .map(|counter| (counter.key().clone(), *counter.value()))
            .collect()
    }

    /// Number of distinct counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
