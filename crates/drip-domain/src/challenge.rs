use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// A challenge listed by the profile contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub creator: Address,
    pub description: String,
    /// Stake required to join, formatted in reward-token units.
    pub stake_amount: String,
    pub start_time: u64,
    pub end_time: u64,
    pub participant_count: u64,
}

impl Challenge {
    pub fn is_open(&self, now: u64) -> bool {
        self.start_time <= now && now < self.end_time
    }
}
