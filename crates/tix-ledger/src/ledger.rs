use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tix_crypto::{derive_ticket_id, BlockHasher, HashChainVerifier};
use tix_types::{
    Block, BlockHash, TicketDetails, TicketId, TicketStatus, Timestamp, Transaction,
};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::journal::{Journal, JournalError, JournalRecord};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{ChainValidator, ValidationReport};

/// Single-writer ticket ledger: a committed block chain plus a staging
/// buffer of not-yet-committed transactions.
///
/// All state lives behind one lock. Every mutation holds the write lock for
/// its whole critical section, so a commit's snapshot of the staging buffer
/// is atomic with respect to concurrent stagings and block indices are
/// assigned in the same step as the append.
pub struct TicketLedger {
    config: LedgerConfig,
    sentinel: BlockHash,
    inner: RwLock<LedgerState>,
}

struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    /// Tickets issued so far; salts ticket id derivation.
    issued: u64,
    journal: Option<Journal>,
}

impl LedgerState {
    fn record(&mut self, record: &JournalRecord) -> Result<(), LedgerError> {
        if let Some(journal) = self.journal.as_mut() {
            journal.append(record)?;
        }
        Ok(())
    }

    /// Earliest committed occurrence of a ticket as (block position, tx position).
    fn locate(&self, ticket_id: &TicketId, event_name: Option<&str>) -> Option<(usize, usize)> {
        self.chain.iter().enumerate().find_map(|(b, block)| {
            block
                .transactions
                .iter()
                .position(|tx| {
                    &tx.ticket_id == ticket_id
                        && event_name.map_or(true, |event| tx.event_name == event)
                })
                .map(|t| (b, t))
        })
    }
}

impl TicketLedger {
    /// Create a ledger. With a journal configured, previously journaled
    /// blocks and scans are replayed; otherwise a fresh genesis block is
    /// created.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        let sentinel = BlockHash::new(config.genesis_previous_hash.clone());

        let mut state = LedgerState {
            chain: Vec::new(),
            pending: Vec::new(),
            issued: 0,
            journal: None,
        };

        if let Some(journal_config) = &config.journal {
            let mut journal = Journal::open(&journal_config.path, journal_config.sync_mode)?;
            let records = journal.recover_and_repair()?;
            info!(
                path = %journal_config.path.display(),
                records = records.len(),
                "journal opened"
            );
            replay(&mut state.chain, records)?;
            state.issued = state
                .chain
                .iter()
                .map(|b| b.transactions.len() as u64)
                .sum();
            state.journal = Some(journal);
        }

        if state.chain.is_empty() {
            let genesis = BlockHasher::BLOCK.seal(Block::unsealed(
                1,
                Timestamp::now(),
                Vec::new(),
                config.genesis_proof,
                sentinel.clone(),
            ))?;
            state.record(&JournalRecord::Committed(genesis.clone()))?;
            debug!(hash = %genesis.hash.short(), "genesis block created");
            state.chain.push(genesis);
        }

        Ok(Self {
            config,
            sentinel,
            inner: RwLock::new(state),
        })
    }

    /// In-memory ledger with default configuration.
    pub fn in_memory() -> Result<Self, LedgerError> {
        Self::new(LedgerConfig::in_memory())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The `previous_hash` value carried by genesis.
    pub fn sentinel(&self) -> &BlockHash {
        &self.sentinel
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    fn scan(
        &self,
        ticket_id: &TicketId,
        event_name: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let mut state = self.write_state()?;

        let Some((b, t)) = state.locate(ticket_id, event_name) else {
            warn!(ticket = %ticket_id, event = ?event_name, "scan rejected: ticket not found");
            return Err(LedgerError::NotFound(ticket_id.clone()));
        };

        if state.chain[b].transactions[t].scanned {
            warn!(ticket = %ticket_id, "scan rejected: already scanned");
            return Err(LedgerError::AlreadyScanned(ticket_id.clone()));
        }

        let block_index = state.chain[b].index;
        state.record(&JournalRecord::Scanned {
            block_index,
            ticket_id: ticket_id.clone(),
        })?;

        let tx = &mut state.chain[b].transactions[t];
        tx.scanned = true;
        debug!(ticket = %ticket_id, block = block_index, "ticket scanned");
        Ok(tx.clone())
    }
}

/// Rebuild the chain from journal records.
fn replay(chain: &mut Vec<Block>, records: Vec<JournalRecord>) -> Result<(), JournalError> {
    for record in records {
        match record {
            JournalRecord::Committed(block) => {
                let expected = chain.len() as u64 + 1;
                if block.index != expected {
                    return Err(JournalError::Replay(format!(
                        "expected block {expected}, found block {}",
                        block.index
                    )));
                }
                chain.push(block);
            }
            JournalRecord::Scanned {
                block_index,
                ticket_id,
            } => {
                let tx = block_index
                    .checked_sub(1)
                    .and_then(|pos| chain.get_mut(pos as usize))
                    .and_then(|block| {
                        block
                            .transactions
                            .iter_mut()
                            .find(|tx| tx.ticket_id == ticket_id)
                    });
                match tx {
                    Some(tx) => tx.scanned = true,
                    None => warn!(
                        block = block_index,
                        ticket = %ticket_id,
                        "journaled scan refers to unknown ticket; skipping"
                    ),
                }
            }
        }
    }
    Ok(())
}

impl LedgerWriter for TicketLedger {
    fn stage_transaction(&self, details: TicketDetails) -> Result<TicketId, LedgerError> {
        if details.event_name.trim().is_empty() {
            return Err(LedgerError::Validation("event name is required".into()));
        }
        let holder = details
            .holder()
            .ok_or_else(|| LedgerError::Validation("buyer or customer name is required".into()))?
            .to_string();

        let mut state = self.write_state()?;
        let issued_at = Timestamp::now();
        let ticket_id = derive_ticket_id(
            &holder,
            &details.event_name,
            issued_at,
            state.issued,
            self.config.ticket_id_len,
        );

        state.issued += 1;
        state
            .pending
            .push(Transaction::issue(ticket_id.clone(), details, issued_at));

        debug!(ticket = %ticket_id, pending = state.pending.len(), "transaction staged");
        Ok(ticket_id)
    }

    fn commit(&self) -> Result<Block, LedgerError> {
        self.commit_with_proof(self.config.block_proof)
    }

    fn commit_with_proof(&self, proof: u64) -> Result<Block, LedgerError> {
        let mut state = self.write_state()?;

        if state.pending.is_empty() && !self.config.commit_empty {
            return Err(LedgerError::NothingToCommit);
        }

        let previous_hash = state
            .chain
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| self.sentinel.clone());
        let block = BlockHasher::BLOCK.seal(Block::unsealed(
            state.chain.len() as u64 + 1,
            Timestamp::now(),
            state.pending.clone(),
            proof,
            previous_hash,
        ))?;

        // Journal first: a failed write leaves both chain and buffer intact.
        state.record(&JournalRecord::Committed(block.clone()))?;
        state.chain.push(block.clone());
        state.pending.clear();

        debug!(
            index = block.index,
            tickets = block.transactions.len(),
            hash = %block.hash.short(),
            "block committed"
        );
        Ok(block)
    }

    fn mark_scanned(&self, ticket_id: &TicketId) -> Result<Transaction, LedgerError> {
        self.scan(ticket_id, None)
    }

    fn mark_scanned_for_event(
        &self,
        ticket_id: &TicketId,
        event_name: &str,
    ) -> Result<Transaction, LedgerError> {
        self.scan(ticket_id, Some(event_name))
    }
}

impl LedgerReader for TicketLedger {
    fn chain_snapshot(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.read_state()?.chain.clone())
    }

    fn pending(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.read_state()?.pending.clone())
    }

    fn last_block(&self) -> Result<Block, LedgerError> {
        self.read_state()?
            .chain
            .last()
            .cloned()
            .ok_or_else(|| LedgerError::Validation("ledger has no genesis block".into()))
    }

    fn block_count(&self) -> Result<u64, LedgerError> {
        Ok(self.read_state()?.chain.len() as u64)
    }

    fn find_ticket(&self, ticket_id: &TicketId) -> Result<Option<Transaction>, LedgerError> {
        let state = self.read_state()?;
        Ok(state
            .locate(ticket_id, None)
            .map(|(b, t)| state.chain[b].transactions[t].clone()))
    }

    fn ticket_status(&self, ticket_id: &TicketId) -> Result<Option<TicketStatus>, LedgerError> {
        let state = self.read_state()?;
        if let Some((b, t)) = state.locate(ticket_id, None) {
            let status = if state.chain[b].transactions[t].scanned {
                TicketStatus::Scanned
            } else {
                TicketStatus::Committed
            };
            return Ok(Some(status));
        }
        Ok(state
            .pending
            .iter()
            .any(|tx| &tx.ticket_id == ticket_id)
            .then_some(TicketStatus::Pending))
    }

    fn scanned_count(&self, event_name: &str) -> Result<u64, LedgerError> {
        let state = self.read_state()?;
        Ok(state
            .chain
            .iter()
            .flat_map(|b| &b.transactions)
            .filter(|tx| tx.scanned && tx.event_name == event_name)
            .count() as u64)
    }

    fn validate(&self) -> Result<ValidationReport, LedgerError> {
        let state = self.read_state()?;
        Ok(ChainValidator::validate(&state.chain, &self.sentinel))
    }

    fn is_chain_valid(&self) -> bool {
        match self.read_state() {
            Ok(state) => HashChainVerifier::verify_chain(&state.chain, &self.sentinel).is_ok(),
            Err(_) => false,
        }
    }
}
