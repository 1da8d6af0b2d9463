use tix_types::TicketId;

/// Errors produced by ledger operations.
///
/// Chain integrity problems are not represented here: they are reported by
/// [`crate::ValidationReport`] and never raised from normal operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("ticket not found: {0}")]
    NotFound(TicketId),

    #[error("ticket already scanned: {0}")]
    AlreadyScanned(TicketId),

    #[error("staging buffer is empty; nothing to commit")]
    NothingToCommit,

    #[error("journal error: {0}")]
    Journal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl From<tix_crypto::HasherError> for LedgerError {
    fn from(err: tix_crypto::HasherError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::journal::JournalError> for LedgerError {
    fn from(err: crate::journal::JournalError) -> Self {
        Self::Journal(err.to_string())
    }
}

impl From<crate::config::ConfigError> for LedgerError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
