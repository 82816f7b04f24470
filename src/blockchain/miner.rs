use chrono::{DateTime, Utc};
use log::debug;

use super::block::{Block, meets_difficulty};
use crate::config::ConsensusParams;
use crate::transaction::Transaction;

/// How many nonces are tried between two polls of the stop predicate.
pub const STOP_CHECK_INTERVAL: u64 = 1024;

/// Outcome of a search that did not find a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted {
    pub attempts: u64,
}

/// Builds candidate blocks and searches for a nonce satisfying their difficulty.
#[derive(Debug, Clone)]
pub struct Miner {
    reward_sender: String,
    miner_address: String,
    reward: u64,
}

impl Miner {
    pub fn new(params: &ConsensusParams) -> Self {
        Self {
            reward_sender: params.reward_sender.clone(),
            miner_address: params.miner_address.clone(),
            reward: params.mining_reward,
        }
    }

    /// Unmined successor of `predecessor`, stamped with the current time.
    pub fn candidate(&self, predecessor: &Block, payload: i64, difficulty: u32) -> Block {
        self.candidate_at(predecessor, payload, difficulty, Utc::now())
    }

    /// Unmined successor of `predecessor` created at `timestamp`.
    ///
    /// The reward transaction is attached here; it is stored on the block but
    /// is not part of the hash preimage.
    pub fn candidate_at(
        &self,
        predecessor: &Block,
        payload: i64,
        difficulty: u32,
        timestamp: DateTime<Utc>,
    ) -> Block {
        let reward = Transaction::reward(
            &self.reward_sender,
            &self.miner_address,
            self.reward,
            timestamp,
        );
        Block {
            index: predecessor.index + 1,
            timestamp,
            payload,
            hash: String::new(),
            previous_hash: predecessor.hash.clone(),
            transactions: vec![reward],
            nonce: 0,
            difficulty,
        }
    }

    /// Search nonces from zero until the hash meets the block's difficulty.
    ///
    /// `should_stop` is polled every [`STOP_CHECK_INTERVAL`] attempts; once it
    /// returns true the search is abandoned.
    pub fn mine<F>(&self, mut block: Block, should_stop: F) -> Result<Block, Interrupted>
    where
        F: Fn() -> bool,
    {
        block.nonce = 0;
        let mut attempts: u64 = 0;
        loop {
            block.hash = block.compute_hash();
            attempts += 1;
            if meets_difficulty(&block.hash, block.difficulty) {
                debug!(
                    "MINER - block #{} sealed after {} attempts (nonce={}, diff={})",
                    block.index, attempts, block.nonce, block.difficulty
                );
                return Ok(block);
            }
            if attempts % STOP_CHECK_INTERVAL == 0 && should_stop() {
                debug!(
                    "MINER - block #{} abandoned after {} attempts",
                    block.index, attempts
                );
                return Err(Interrupted { attempts });
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
    }
}
