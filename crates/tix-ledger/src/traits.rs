use tix_types::{Block, TicketDetails, TicketId, TicketStatus, Transaction};

use crate::error::LedgerError;
use crate::validation::ValidationReport;

/// Write boundary for ticket ledger mutations.
pub trait LedgerWriter: Send + Sync {
    /// Validate and stage a new unscanned ticket. Returns its id.
    fn stage_transaction(&self, details: TicketDetails) -> Result<TicketId, LedgerError>;

    /// Seal the staging buffer into a new block with the configured proof.
    fn commit(&self) -> Result<Block, LedgerError>;

    /// Seal the staging buffer into a new block with an explicit proof.
    fn commit_with_proof(&self, proof: u64) -> Result<Block, LedgerError>;

    /// Flip a committed ticket to scanned.
    fn mark_scanned(&self, ticket_id: &TicketId) -> Result<Transaction, LedgerError>;

    /// Flip a committed ticket to scanned, matching only tickets issued for
    /// `event_name`.
    fn mark_scanned_for_event(
        &self,
        ticket_id: &TicketId,
        event_name: &str,
    ) -> Result<Transaction, LedgerError>;
}

/// Read boundary for ticket ledger queries. All results are copies.
pub trait LedgerReader: Send + Sync {
    fn chain_snapshot(&self) -> Result<Vec<Block>, LedgerError>;

    fn pending(&self) -> Result<Vec<Transaction>, LedgerError>;

    fn last_block(&self) -> Result<Block, LedgerError>;

    fn block_count(&self) -> Result<u64, LedgerError>;

    /// Earliest committed transaction with this id. Pending tickets are not
    /// returned.
    fn find_ticket(&self, ticket_id: &TicketId) -> Result<Option<Transaction>, LedgerError>;

    /// Lifecycle state, consulting the staging buffer as well as the chain.
    fn ticket_status(&self, ticket_id: &TicketId) -> Result<Option<TicketStatus>, LedgerError>;

    /// Number of scanned committed tickets for an event.
    fn scanned_count(&self, event_name: &str) -> Result<u64, LedgerError>;

    /// Full integrity report over the committed chain.
    fn validate(&self) -> Result<ValidationReport, LedgerError>;

    /// Whether every block links to its predecessor and matches its digest.
    fn is_chain_valid(&self) -> bool;
}
