// Eviction policy: decide which aggregates to drop to keep the index bounded.
//
// Purpose
// - Age rule: drop aggregates whose latest event is strictly older than now - max_age.
// - Count rule: keep at most max_count aggregates, dropping the least recently active first.
//
// Ranking for the count rule
// - Activity is (last_activity_at, activity_seq). last_activity_at is the latest event
//   timestamp, or the creation time for an aggregate without events. activity_seq is a
//   store wide stamp taken on creation and on every commit, so ties within one millisecond
//   still rank in commit order.
//
// Boundaries
// - Pure planning. The store applies the plan one aggregate at a time.

use crate::shared::core::clock::duration_to_millis;
use crate::shared::infrastructure::event_store::AggregateKey;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_age: Option<Duration>,
    pub max_count: Option<usize>,
}

impl EvictionPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.max_age.is_none() && self.max_count.is_none()
    }

    pub fn plan(&self, now: i64, mut candidates: Vec<EvictionCandidate>) -> EvictionPlan {
        let mut plan = EvictionPlan::default();

        if let Some(max_age) = self.max_age {
            let horizon = now.saturating_sub(duration_to_millis(max_age));
            let (expired, kept): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|c| c.last_event_at.is_some_and(|at| at < horizon));
            plan.by_age = expired.into_iter().map(|c| c.key).collect();
            candidates = kept;
        }

        if let Some(max_count) = self.max_count {
            if candidates.len() > max_count {
                candidates.sort_by_key(|c| (c.last_activity_at, c.activity_seq));
                let excess = candidates.len() - max_count;
                plan.by_count = candidates.into_iter().take(excess).map(|c| c.key).collect();
            }
        }

        plan
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    pub key: AggregateKey,
    pub last_event_at: Option<i64>,
    pub last_activity_at: i64,
    pub activity_seq: u64,
}

impl EvictionCandidate {
    /// An aggregate whose lock is held by a writer right now. It is as fresh as it gets.
    pub fn busy(key: AggregateKey) -> Self {
        Self {
            key,
            last_event_at: None,
            last_activity_at: i64::MAX,
            activity_seq: u64::MAX,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    pub by_age: Vec<AggregateKey>,
    pub by_count: Vec<AggregateKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionReport {
    pub by_age: usize,
    pub by_count: usize,
}

impl EvictionReport {
    pub fn total(&self) -> usize {
        self.by_age + self.by_count
    }
}
