use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::blockchain::difficulty::MAX_DIFFICULTY;

/// Default initial (and minimum) Proof-of-Work difficulty.
pub const DEFAULT_MINING_DIFFICULTY: u32 = 4;

/// Reward credited to the miner of every block.
pub const DEFAULT_MINING_REWARD: u64 = 10;

/// Identity used as the sender of reward transactions.
pub const DEFAULT_MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Placeholder recipient of the mining reward.
pub const DEFAULT_MINER_ADDRESS: &str = "MinerAddress";

/// Target seconds per block.
pub const DEFAULT_BLOCK_GENERATION_INTERVAL: u64 = 10;

/// Blocks between two difficulty adjustments.
pub const DEFAULT_DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("{key} = {value} is above the maximum of {max}")]
    TooLarge {
        key: &'static str,
        value: u32,
        max: u32,
    },
}

/// Consensus constants shared by the miner, the difficulty adjuster and the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParams {
    pub min_difficulty: u32,
    pub mining_reward: u64,
    pub reward_sender: String,
    pub miner_address: String,
    pub block_generation_interval_secs: u64,
    pub difficulty_adjustment_interval: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            min_difficulty: DEFAULT_MINING_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            reward_sender: DEFAULT_MINING_SENDER.to_string(),
            miner_address: DEFAULT_MINER_ADDRESS.to_string(),
            block_generation_interval_secs: DEFAULT_BLOCK_GENERATION_INTERVAL,
            difficulty_adjustment_interval: DEFAULT_DIFFICULTY_ADJUSTMENT_INTERVAL,
        }
    }
}

impl ConsensusParams {
    /// Seconds one full adjustment window is expected to take.
    pub fn expected_window_secs(&self) -> i64 {
        let secs = self
            .block_generation_interval_secs
            .saturating_mul(self.difficulty_adjustment_interval);
        i64::try_from(secs).unwrap_or(i64::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::TooLarge {
                key: "MINING_DIFFICULTY",
                value: self.min_difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        if self.block_generation_interval_secs == 0 {
            return Err(ConfigError::Zero {
                key: "BLOCK_GENERATION_INTERVAL",
            });
        }
        if self.difficulty_adjustment_interval == 0 {
            return Err(ConfigError::Zero {
                key: "DIFFICULTY_ADJUSTMENT_INTERVAL",
            });
        }
        if self.reward_sender.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "MINING_SENDER",
            });
        }
        if self.miner_address.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "MINER_ADDRESS",
            });
        }
        Ok(())
    }
}

/// Process configuration: listener address plus consensus constants.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub host: String,
    pub port: u16,
    pub consensus: ConsensusParams,
}

impl ChainConfig {
    /// Read the configuration from the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        // ADDR is the variable name older deployments used for the port.
        let port = match lookup("PORT") {
            Some(v) => parse_value("PORT", &v)?,
            None => match lookup("ADDR") {
                Some(v) => parse_value("ADDR", v.trim_start_matches(':'))?,
                None => 8080,
            },
        };

        let consensus = ConsensusParams {
            min_difficulty: parse_or(&lookup, "MINING_DIFFICULTY", DEFAULT_MINING_DIFFICULTY)?,
            mining_reward: parse_or(&lookup, "MINING_REWARD", DEFAULT_MINING_REWARD)?,
            reward_sender: lookup("MINING_SENDER")
                .unwrap_or_else(|| DEFAULT_MINING_SENDER.to_string()),
            miner_address: lookup("MINER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_MINER_ADDRESS.to_string()),
            block_generation_interval_secs: parse_or(
                &lookup,
                "BLOCK_GENERATION_INTERVAL",
                DEFAULT_BLOCK_GENERATION_INTERVAL,
            )?,
            difficulty_adjustment_interval: parse_or(
                &lookup,
                "DIFFICULTY_ADJUSTMENT_INTERVAL",
                DEFAULT_DIFFICULTY_ADJUSTMENT_INTERVAL,
            )?,
        };
        consensus.validate()?;

        Ok(Self {
            host,
            port,
            consensus,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
