use std::collections::BTreeMap;

use serde::Serialize;
use tix_types::{BlockHash, Timestamp};

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Per-event ticket counts over the committed chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventStats {
    pub event_name: String,
    pub issued: u64,
    pub scanned: u64,
    pub unscanned: u64,
}

/// Ledger-wide aggregate view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub block_count: u64,
    pub committed_tickets: u64,
    pub pending_tickets: u64,
    pub scanned_tickets: u64,
    /// Sorted by event name.
    pub events: Vec<EventStats>,
}

/// One row of the block explorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExplorerEntry {
    pub index: u64,
    pub timestamp: Timestamp,
    pub previous_hash: BlockHash,
    pub hash: BlockHash,
    pub ticket_count: usize,
}

/// Deterministic projection builders.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    pub fn event_stats<R: LedgerReader>(
        reader: &R,
        event_name: &str,
    ) -> Result<EventStats, LedgerError> {
        let chain = reader.chain_snapshot()?;
        let mut stats = EventStats {
            event_name: event_name.to_string(),
            ..EventStats::default()
        };
        for tx in chain.iter().flat_map(|b| &b.transactions) {
            if tx.event_name == event_name {
                stats.issued += 1;
                if tx.scanned {
                    stats.scanned += 1;
                }
            }
        }
        stats.unscanned = stats.issued - stats.scanned;
        Ok(stats)
    }

    pub fn summary<R: LedgerReader>(reader: &R) -> Result<LedgerSummary, LedgerError> {
        let chain = reader.chain_snapshot()?;
        let pending = reader.pending()?;
        let mut events: BTreeMap<String, EventStats> = BTreeMap::new();

        for tx in chain.iter().flat_map(|b| &b.transactions) {
            let stats = events
                .entry(tx.event_name.clone())
                .or_insert_with(|| EventStats {
                    event_name: tx.event_name.clone(),
                    ..EventStats::default()
                });
            stats.issued += 1;
            if tx.scanned {
                stats.scanned += 1;
            } else {
                stats.unscanned += 1;
            }
        }

        let events: Vec<EventStats> = events.into_values().collect();
        Ok(LedgerSummary {
            block_count: chain.len() as u64,
            committed_tickets: events.iter().map(|e| e.issued).sum(),
            pending_tickets: pending.len() as u64,
            scanned_tickets: events.iter().map(|e| e.scanned).sum(),
            events,
        })
    }

    /// Explorer rows, newest block first.
    pub fn explorer<R: LedgerReader>(reader: &R) -> Result<Vec<ExplorerEntry>, LedgerError> {
        let chain = reader.chain_snapshot()?;
        Ok(chain
            .iter()
            .rev()
            .map(|block| ExplorerEntry {
                index: block.index,
                timestamp: block.timestamp,
                previous_hash: block.previous_hash.clone(),
                hash: block.hash.clone(),
                ticket_count: block.transactions.len(),
            })
            .collect())
    }
}
