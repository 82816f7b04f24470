use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Ledger};

/// Shared application state: the one ledger every handler works on.
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Deserialize)]
pub struct ProposeRequest {
    #[serde(alias = "BPM")]
    pub payload: i64,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub replaced: bool,
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
    pub next_difficulty: u32,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub next_difficulty: u32,
    pub min_difficulty: u32,
    pub target_block_time_secs: u64,
    pub adjust_interval: u64,
    pub last_interval_secs: Option<i64>,
    pub avg_interval_secs: Option<f64>,
}
