use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::journal::SyncMode;

/// Shortest accepted ticket id.
pub const MIN_TICKET_ID_LEN: usize = 4;
/// Longest accepted ticket id (the full hex digest).
pub const MAX_TICKET_ID_LEN: usize = 64;

/// Configuration for a [`crate::TicketLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// `previous_hash` carried by the genesis block.
    pub genesis_previous_hash: String,
    /// Placeholder proof stored in the genesis block.
    pub genesis_proof: u64,
    /// Placeholder proof stored in every regular block.
    pub block_proof: u64,
    /// Number of hex characters kept from the ticket id digest.
    pub ticket_id_len: usize,
    /// When `false`, committing an empty staging buffer is refused instead
    /// of producing an empty block.
    pub commit_empty: bool,
    /// Journal location; `None` keeps the ledger in memory only.
    pub journal: Option<JournalConfig>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_previous_hash: "1".into(),
            genesis_proof: 100,
            block_proof: 123,
            ticket_id_len: 10,
            commit_empty: true,
            journal: None,
        }
    }
}

impl LedgerConfig {
    /// In-memory configuration with defaults.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Default configuration journaled at `path`.
    pub fn journaled(path: impl Into<PathBuf>) -> Self {
        Self {
            journal: Some(JournalConfig::new(path)),
            ..Self::default()
        }
    }

    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.genesis_previous_hash.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "genesis_previous_hash must not be empty".into(),
            ));
        }
        if !(MIN_TICKET_ID_LEN..=MAX_TICKET_ID_LEN).contains(&self.ticket_id_len) {
            return Err(ConfigError::Invalid(format!(
                "ticket_id_len must be between {MIN_TICKET_ID_LEN} and {MAX_TICKET_ID_LEN}, got {}",
                self.ticket_id_len
            )));
        }
        Ok(())
    }
}

/// Where and how the journal is written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub sync_mode: SyncMode,
}

impl JournalConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_mode: SyncMode::default(),
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.genesis_previous_hash, "1");
        assert_eq!(c.genesis_proof, 100);
        assert_eq!(c.block_proof, 123);
        assert_eq!(c.ticket_id_len, 10);
        assert!(c.commit_empty);
        assert!(c.journal.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = LedgerConfig::from_toml_str("ticket_id_len = 12\ncommit_empty = false\n").unwrap();
        assert_eq!(c.ticket_id_len, 12);
        assert!(!c.commit_empty);
        assert_eq!(c.block_proof, 123);
    }

    #[test]
    fn journal_section_parses() {
        let c = LedgerConfig::from_toml_str(
            "[journal]\npath = \"data/ledger.journal\"\nsync_mode = \"every_write\"\n",
        )
        .unwrap();
        let journal = c.journal.unwrap();
        assert_eq!(journal.path, PathBuf::from("data/ledger.journal"));
        assert_eq!(journal.sync_mode, SyncMode::EveryWrite);
    }

    #[test]
    fn rejects_out_of_range_ticket_len() {
        let err = LedgerConfig::from_toml_str("ticket_id_len = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_sentinel() {
        let err = LedgerConfig::from_toml_str("genesis_previous_hash = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = LedgerConfig::from_toml_str("ticket_id_len = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = LedgerConfig::load(Path::new("/nonexistent/tix.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
