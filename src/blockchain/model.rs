use log::{debug, info, warn};

use super::Block;
use super::difficulty;
use super::error::RejectionReason;
use super::validator::{validate_block, validate_chain};
use crate::config::ConsensusParams;

/// In-memory canonical chain. Never empty: index 0 is always the genesis block.
///
/// Not synchronized; the [`Ledger`](super::Ledger) owns one behind a lock.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new() -> Self {
        Self::with_genesis(Block::genesis())
    }

    pub fn with_genesis(genesis: Block) -> Self {
        debug!("genesis block: {:#?}", genesis);
        Self {
            chain: vec![genesis],
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Difficulty the next block must be mined at.
    pub fn next_difficulty(&self, params: &ConsensusParams) -> u32 {
        difficulty::next_difficulty(&self.chain, params)
    }

    /// Validate `block` against the current tip and append it.
    pub fn append(&mut self, block: Block) -> Result<&Block, RejectionReason> {
        validate_block(&block, self.last_block())?;
        info!(
            "appended block #{} (hash={}, nonce={}, diff={})",
            block.index, block.hash, block.nonce, block.difficulty
        );
        debug!("{:#?}", block);
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Longest-chain rule: adopt `candidate` only when it is strictly longer.
    ///
    /// Returns `Ok(false)` when the current chain is kept. A longer candidate
    /// is re-validated block by block before it is adopted.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> Result<bool, RejectionReason> {
        if candidate.len() <= self.chain.len() {
            debug!(
                "replacement ignored: candidate length {} <= current {}",
                candidate.len(),
                self.chain.len()
            );
            return Ok(false);
        }
        if let Err(reason) = validate_chain(&candidate) {
            warn!("replacement rejected: {}", reason);
            return Err(reason);
        }
        info!(
            "chain replaced: length {} -> {}",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        Ok(true)
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW.
    pub fn is_valid_chain(&self) -> bool {
        validate_chain(&self.chain).is_ok()
    }
}
