//! Single-node proof-of-work ledger.
//!
//! The [`blockchain`] module holds the consensus engine (hashing, mining,
//! difficulty retargeting, validation and fork choice); [`api`] exposes it
//! over HTTP.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod transaction;
