//! Append-only, hash-linked ticket ledger.
//!
//! This crate is the heart of the workspace. It provides:
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `TicketLedger`, the staging buffer plus committed block chain
//! - Chain validation with a detailed violation report
//! - Lifecycle projections (per-event counts, explorer rows)
//! - An opt-in crash-tolerant journal for persistence across restarts
//! - TOML-loadable configuration

pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod projection;
pub mod traits;
pub mod validation;

pub use config::{ConfigError, JournalConfig, LedgerConfig};
pub use error::LedgerError;
pub use journal::{Journal, JournalError, JournalRecord, SyncMode};
pub use ledger::TicketLedger;
pub use projection::{EventStats, ExplorerEntry, LedgerSummary, ProjectionBuilder};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
