use thiserror::Error;

/// Why a candidate block (or candidate chain) was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("previous_hash does not match the predecessor's hash")]
    InvalidPredecessorLink,

    #[error("stored hash does not match the block contents")]
    HashMismatch,

    #[error("hash does not have the required leading zeros")]
    DifficultyNotMet,

    #[error("index is not the predecessor's index + 1")]
    IndexMismatch,

    #[error("chain tip moved while the block was being mined")]
    StaleTip,
}

impl RejectionReason {
    /// Stable identifier returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidPredecessorLink => "InvalidPredecessorLink",
            RejectionReason::HashMismatch => "HashMismatch",
            RejectionReason::DifficultyNotMet => "DifficultyNotMet",
            RejectionReason::IndexMismatch => "IndexMismatch",
            RejectionReason::StaleTip => "StaleTip",
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("mining was cancelled")]
    MiningCancelled,

    #[error("chain lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// Whether the node can no longer serve a consistent chain.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::LockPoisoned)
    }

    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Rejected(reason) => reason.code(),
            LedgerError::MiningCancelled => "MiningCancelled",
            LedgerError::LockPoisoned => "LockPoisoned",
        }
    }
}
