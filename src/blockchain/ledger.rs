use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::{error, info, warn};

use super::error::{LedgerError, RejectionReason};
use super::miner::Miner;
use super::{Block, Blockchain};
use crate::config::ConsensusParams;

/// Tip snapshot a block is mined against.
#[derive(Debug, Clone)]
pub struct MiningJob {
    pub tip: Block,
    pub difficulty: u32,
    version: u64,
}

/// Read-only timing figures for the stats endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub height: usize,
    pub difficulty: u32,
    pub next_difficulty: u32,
    pub last_interval_secs: Option<i64>,
    pub avg_interval_secs: Option<f64>,
}

/// Result of validating the whole chain under a single lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCheck {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

/// The shared consensus engine.
///
/// All reads and writes of the chain go through one mutex. Mining happens
/// outside of it: a proposal snapshots the tip, mines without the lock, then
/// re-locks and appends only if the tip is still the one it mined on.
pub struct Ledger {
    chain: Mutex<Blockchain>,
    // bumped under the lock on every append or replacement
    tip_version: AtomicU64,
    shutdown: AtomicBool,
    params: ConsensusParams,
    miner: Miner,
}

impl Ledger {
    pub fn new(params: ConsensusParams) -> Self {
        Self::with_chain(params, Blockchain::default())
    }

    pub fn with_chain(params: ConsensusParams, chain: Blockchain) -> Self {
        info!(
            "ledger ready: genesis={} min_difficulty={} adjust_every={} blocks",
            chain.blocks()[0].hash,
            params.min_difficulty,
            params.difficulty_adjustment_interval
        );
        Self {
            chain: Mutex::new(chain),
            tip_version: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            miner: Miner::new(&params),
            params,
        }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    fn lock(&self) -> Result<MutexGuard<'_, Blockchain>, LedgerError> {
        self.chain.lock().map_err(|_| {
            error!("chain mutex poisoned; refusing to serve a possibly inconsistent chain");
            LedgerError::LockPoisoned
        })
    }

    /// Full ordered copy of the chain.
    pub fn chain(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.lock()?.blocks().to_vec())
    }

    pub fn tip(&self) -> Result<Block, LedgerError> {
        Ok(self.lock()?.last_block().clone())
    }

    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.lock()?.len())
    }

    /// Validate the current chain from genesis to tip.
    pub fn validate(&self) -> Result<ChainCheck, LedgerError> {
        let bc = self.lock()?;
        Ok(ChainCheck {
            valid: bc.is_valid_chain(),
            length: bc.len(),
            difficulty: bc.last_block().difficulty,
        })
    }

    pub fn stats(&self) -> Result<ChainStats, LedgerError> {
        let bc = self.lock()?;
        let blocks = bc.blocks();
        let height = blocks.len();

        let last_interval_secs = match blocks {
            [.., older, newer] => {
                Some((newer.timestamp - older.timestamp).num_seconds().max(0))
            }
            _ => None,
        };

        let window = usize::try_from(self.params.difficulty_adjustment_interval)
            .unwrap_or(usize::MAX);
        let avg_interval_secs = if window > 0 && height > window {
            let newer = &blocks[height - 1];
            let older = &blocks[height - 1 - window];
            let total = (newer.timestamp - older.timestamp).num_seconds().max(0);
            Some(total as f64 / window as f64)
        } else {
            None
        };

        Ok(ChainStats {
            height,
            difficulty: bc.last_block().difficulty,
            next_difficulty: bc.next_difficulty(&self.params),
            last_interval_secs,
            avg_interval_secs,
        })
    }

    /// Snapshot the tip and the difficulty the next block needs.
    pub fn begin_mining(&self) -> Result<MiningJob, LedgerError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(LedgerError::MiningCancelled);
        }
        let bc = self.lock()?;
        Ok(MiningJob {
            tip: bc.last_block().clone(),
            difficulty: bc.next_difficulty(&self.params),
            version: self.tip_version.load(Ordering::SeqCst),
        })
    }

    /// Mine a successor of the job's tip without holding the chain lock.
    ///
    /// The search stops early once the ledger is shut down or the tip moves.
    pub fn mine(&self, job: &MiningJob, payload: i64) -> Result<Block, LedgerError> {
        let candidate = self.miner.candidate(&job.tip, payload, job.difficulty);
        let stop = || {
            self.shutdown.load(Ordering::Relaxed)
                || self.tip_version.load(Ordering::Relaxed) != job.version
        };
        match self.miner.mine(candidate, stop) {
            Ok(block) => Ok(block),
            Err(_) if self.shutdown.load(Ordering::SeqCst) => Err(LedgerError::MiningCancelled),
            Err(_) => {
                warn!("mining on tip #{} abandoned: tip moved", job.tip.index);
                Err(RejectionReason::StaleTip.into())
            }
        }
    }

    /// Append a block mined from `job`, provided the tip has not moved since.
    pub fn submit(&self, job: &MiningJob, block: Block) -> Result<Block, LedgerError> {
        let mut bc = self.lock()?;
        if self.tip_version.load(Ordering::SeqCst) != job.version
            || bc.last_block().hash != job.tip.hash
        {
            warn!(
                "block #{} discarded: mined on stale tip {}",
                block.index, job.tip.hash
            );
            return Err(RejectionReason::StaleTip.into());
        }
        if let Err(reason) = bc.append(block) {
            warn!("proposed block rejected: {}", reason);
            return Err(reason.into());
        }
        self.tip_version.fetch_add(1, Ordering::SeqCst);
        Ok(bc.last_block().clone())
    }

    /// Mine a block carrying `payload` on the current tip and append it.
    pub fn propose_block(&self, payload: i64) -> Result<Block, LedgerError> {
        let job = self.begin_mining()?;
        let block = self.mine(&job, payload)?;
        self.submit(&job, block)
    }

    /// Fork choice: adopt `candidate` if it is valid and strictly longer.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> Result<bool, LedgerError> {
        let mut bc = self.lock()?;
        let replaced = bc.replace_chain(candidate)?;
        if replaced {
            self.tip_version.fetch_add(1, Ordering::SeqCst);
        }
        Ok(replaced)
    }

    /// Abort every in-flight search and refuse new ones.
    pub fn cancel_mining(&self) {
        info!("cancelling in-flight mining");
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::test_support::mined_chain;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn params(min_difficulty: u32) -> ConsensusParams {
        ConsensusParams {
            min_difficulty,
            ..ConsensusParams::default()
        }
    }

    #[test]
    fn genesis_is_served_before_any_proposal() {
        let ledger = Ledger::new(params(1));
        let chain = ledger.chain().unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index, 0);
        assert_eq!(chain[0].previous_hash, "");
        assert_eq!(chain[0].hash, crate::blockchain::block::genesis_hash());
    }

    #[test]
    fn propose_42_on_genesis_at_difficulty_4() {
        let ledger = Ledger::new(params(4));
        let genesis = ledger.tip().unwrap();

        let block = ledger.propose_block(42).unwrap();
        assert!(block.hash.starts_with("0000"));
        assert_eq!(block.index, 1);
        assert_eq!(block.payload, 42);
        assert_eq!(block.difficulty, 4);
        assert_eq!(block.previous_hash, genesis.hash);
        assert_eq!(ledger.len().unwrap(), 2);
        assert!(ledger.validate().unwrap().valid);
    }

    #[test]
    fn proposals_from_the_same_tip_leave_one_stale() {
        let ledger = Ledger::new(params(1));
        let a = ledger.begin_mining().unwrap();
        let b = ledger.begin_mining().unwrap();

        let block_a = ledger.mine(&a, 1).unwrap();
        let block_b = ledger.mine(&b, 2).unwrap();

        assert!(ledger.submit(&a, block_a).is_ok());
        let err = ledger.submit(&b, block_b).unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(RejectionReason::StaleTip)));
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn concurrent_proposals_extend_by_exactly_one() {
        let ledger = Arc::new(Ledger::new(params(2)));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|payload| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let job = ledger.begin_mining().unwrap();
                    // both snapshots are taken before either block lands
                    barrier.wait();
                    let block = ledger.mine(&job, payload)?;
                    ledger.submit(&job, block)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let stale = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::Rejected(RejectionReason::StaleTip))))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(stale, 1);
        assert_eq!(ledger.len().unwrap(), 2);
        assert!(ledger.validate().unwrap().valid);
    }

    #[test]
    fn foreign_block_is_rejected_with_reason() {
        let ledger = Ledger::new(params(1));
        let job = ledger.begin_mining().unwrap();
        let mut block = ledger.mine(&job, 7).unwrap();
        block.payload = 8;
        let err = ledger.submit(&job, block).unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(RejectionReason::HashMismatch)));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn cancel_aborts_in_flight_and_future_mining() {
        let ledger = Arc::new(Ledger::new(params(1)));
        let mut job = ledger.begin_mining().unwrap();
        job.difficulty = 64;

        let worker = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.mine(&job, 1))
        };
        ledger.cancel_mining();
        let res = worker.join().unwrap();
        assert!(matches!(res, Err(LedgerError::MiningCancelled)));
        assert!(matches!(
            ledger.propose_block(1),
            Err(LedgerError::MiningCancelled)
        ));
    }

    #[test]
    fn in_flight_search_stops_when_another_block_lands() {
        let ledger = Arc::new(Ledger::new(params(1)));
        let mut job = ledger.begin_mining().unwrap();
        job.difficulty = 64;

        let worker = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.mine(&job, 1))
        };
        let landed = ledger.propose_block(2).unwrap();
        assert_eq!(landed.index, 1);

        let res = worker.join().unwrap();
        assert!(matches!(
            res,
            Err(LedgerError::Rejected(RejectionReason::StaleTip))
        ));
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn validation_reports_length_and_tip_difficulty() {
        let ledger = Ledger::new(params(0));
        assert!(ledger.replace_chain(mined_chain(4, 1)).unwrap());
        let check = ledger.validate().unwrap();
        assert_eq!(
            check,
            ChainCheck {
                valid: true,
                length: 4,
                difficulty: 1,
            }
        );
    }

    #[test]
    fn replacement_bumps_tip_and_invalidates_jobs() {
        let ledger = Ledger::new(params(0));
        let job = ledger.begin_mining().unwrap();
        let block = ledger.mine(&job, 1).unwrap();

        let longer = mined_chain(3, 0);
        assert!(ledger.replace_chain(longer.clone()).unwrap());
        assert_eq!(ledger.chain().unwrap(), longer);

        let err = ledger.submit(&job, block).unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(RejectionReason::StaleTip)));
        assert!(!ledger.replace_chain(longer).unwrap());
    }

    #[test]
    fn stats_report_intervals() {
        let chain = crate::blockchain::test_support::timed_chain(12, 3, 0);
        let ledger = Ledger::new(params(0));
        assert!(ledger.replace_chain(chain).unwrap());
        let stats = ledger.stats().unwrap();
        assert_eq!(stats.height, 12);
        assert_eq!(stats.last_interval_secs, Some(3));
        assert_eq!(stats.avg_interval_secs, Some(3.0));
    }
}
