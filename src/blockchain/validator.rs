use super::block::{Block, genesis_hash, meets_difficulty};
use super::error::RejectionReason;

/// Check `candidate` as the direct successor of `predecessor`.
///
/// Checks run in a fixed order (index, link, hash, proof-of-work) and the
/// first failure is returned.
pub fn validate_block(candidate: &Block, predecessor: &Block) -> Result<(), RejectionReason> {
    if predecessor.index.checked_add(1) != Some(candidate.index) {
        return Err(RejectionReason::IndexMismatch);
    }
    if candidate.previous_hash != predecessor.hash {
        return Err(RejectionReason::InvalidPredecessorLink);
    }
    if candidate.compute_hash() != candidate.hash {
        return Err(RejectionReason::HashMismatch);
    }
    if !meets_difficulty(&candidate.hash, candidate.difficulty) {
        return Err(RejectionReason::DifficultyNotMet);
    }
    Ok(())
}

pub fn is_block_valid(candidate: &Block, predecessor: &Block) -> bool {
    validate_block(candidate, predecessor).is_ok()
}

/// Validate a whole chain: canonical genesis first, then every link.
pub fn validate_chain(blocks: &[Block]) -> Result<(), RejectionReason> {
    let Some(genesis) = blocks.first() else {
        return Err(RejectionReason::IndexMismatch);
    };
    if !genesis.is_genesis() {
        return Err(RejectionReason::IndexMismatch);
    }
    if !genesis.previous_hash.is_empty() {
        return Err(RejectionReason::InvalidPredecessorLink);
    }
    if genesis.hash != genesis_hash() {
        return Err(RejectionReason::HashMismatch);
    }

    for pair in blocks.windows(2) {
        validate_block(&pair[1], &pair[0])?;
    }
    Ok(())
}
