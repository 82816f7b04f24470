use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transfer record attached to a block.
///
/// Transactions are stored for auditability only: no balances are tracked and
/// the amount is never checked against anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            timestamp,
        }
    }

    /// The reward credited to the miner of a block created at `timestamp`.
    pub fn reward(
        sender: &str,
        miner_address: &str,
        amount: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(sender, miner_address, amount, timestamp)
    }
}
