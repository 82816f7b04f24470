//! Periodic difficulty retargeting.
//!
//! Every `difficulty_adjustment_interval` blocks the time taken by the last
//! window is compared with the expected time. Finishing in under half the
//! expected time raises the difficulty by one, taking more than twice as long
//! lowers it by one. The step starts from the reference block's difficulty,
//! raised to the configured minimum, and the result is clamped to that minimum.

use log::warn;

use super::block::Block;
use crate::config::ConsensusParams;

/// A hex SHA-256 digest has 64 characters.
pub const MAX_DIFFICULTY: u32 = 64;

/// Difficulty to use for the block that will follow the last block of `chain`.
pub fn next_difficulty(chain: &[Block], params: &ConsensusParams) -> u32 {
    let Some(tip) = chain.last() else {
        return params.min_difficulty;
    };
    clamp(unclamped_next(chain, tip, params), params)
}

fn unclamped_next(chain: &[Block], tip: &Block, params: &ConsensusParams) -> u32 {
    let interval = params.difficulty_adjustment_interval;
    if interval == 0 || tip.index == 0 || tip.index % interval != 0 {
        return tip.difficulty;
    }

    let reference = tip
        .index
        .checked_sub(interval)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| chain.get(i))
        .filter(|b| b.index.checked_add(interval) == Some(tip.index));

    match reference {
        Some(reference) => adjust(tip, reference, params),
        None => {
            warn!(
                "difficulty adjustment skipped at block #{}: no block {} positions back",
                tip.index, interval
            );
            tip.difficulty
        }
    }
}

/// Retarget rule for one window, as a pure function of its two end blocks.
pub fn adjust(tip: &Block, reference: &Block, params: &ConsensusParams) -> u32 {
    let expected = params.expected_window_secs();
    let actual = (tip.timestamp - reference.timestamp).num_seconds();
    // genesis sits at 0, below any configured floor
    let base = reference.difficulty.max(params.min_difficulty);

    if actual < expected / 2 {
        base.saturating_add(1)
    } else if actual > expected.saturating_mul(2) {
        base.saturating_sub(1)
    } else {
        base
    }
}

fn clamp(difficulty: u32, params: &ConsensusParams) -> u32 {
    difficulty.clamp(params.min_difficulty.min(MAX_DIFFICULTY), MAX_DIFFICULTY)
}
