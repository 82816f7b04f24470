pub mod block;
pub mod difficulty;
pub mod error;
pub mod ledger;
pub mod miner;
pub mod model;
pub mod validator;

pub use block::Block;
pub use error::{LedgerError, RejectionReason};
pub use ledger::{ChainCheck, ChainStats, Ledger};
pub use model::Blockchain;
