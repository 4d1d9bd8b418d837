use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: u64 = 60 * 60;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Snapshot of the current reward epoch, read from the challenge manager.
///
/// Timestamps are unix seconds. The remaining-time helpers take `now` so the
/// caller decides which clock to trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub epoch: u64,
    pub description: String,
    pub participant_count: u64,
    /// Total stake in the pool, formatted in reward-token units.
    pub total_staked_amount: String,
    pub start_time: u64,
    pub end_time: u64,
}

impl EpochInfo {
    pub fn is_active(&self, now: u64) -> bool {
        now < self.end_time
    }

    pub fn seconds_remaining(&self, now: u64) -> u64 {
        self.end_time.saturating_sub(now)
    }

    /// Whole hours until the epoch ends, rounded down.
    pub fn hours_remaining(&self, now: u64) -> u64 {
        self.seconds_remaining(now) / SECONDS_PER_HOUR
    }

    /// Whole days until the epoch ends, rounded down.
    pub fn days_remaining(&self, now: u64) -> u64 {
        self.seconds_remaining(now) / SECONDS_PER_DAY
    }

    pub fn displayed_participants(&self) -> String {
        self.participant_count.to_string()
    }
}
