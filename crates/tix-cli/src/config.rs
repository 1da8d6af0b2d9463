use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tix_ledger::{JournalConfig, LedgerConfig};

/// Journal location used when neither the config file nor `--journal`
/// names one.
pub const DEFAULT_JOURNAL: &str = ".tix/ledger.journal";

/// Front-end configuration: ledger settings plus the static event catalog.
///
/// ```toml
/// [ledger]
/// ticket_id_len = 10
///
/// [ledger.journal]
/// path = "data/ledger.journal"
///
/// [events]
/// "Diwali Dance" = 150
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Event name → venue capacity.
    #[serde(default = "default_events")]
    pub events: BTreeMap<String, u64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            events: default_events(),
        }
    }
}

fn default_events() -> BTreeMap<String, u64> {
    [
        ("Navratri Pooja", 100),
        ("Diwali Dance", 150),
        ("Freshers", 200),
        ("Ravan Dehan", 120),
    ]
    .into_iter()
    .map(|(name, capacity)| (name.to_string(), capacity))
    .collect()
}

impl CliConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(input).context("invalid configuration TOML")?;
        config.ledger.validate()?;
        Ok(config)
    }

    /// Load the config file if given, then apply the `--journal` override.
    /// Without any journal setting the ledger is journaled at
    /// [`DEFAULT_JOURNAL`] so state carries across invocations.
    pub fn resolve(path: Option<&Path>, journal: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let input = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_toml_str(&input)?
            }
            None => Self::default(),
        };

        match (journal, config.ledger.journal.as_mut()) {
            (Some(path), Some(existing)) => existing.path = path,
            (Some(path), None) => config.ledger.journal = Some(JournalConfig::new(path)),
            (None, Some(_)) => {}
            (None, None) => config.ledger.journal = Some(JournalConfig::new(DEFAULT_JOURNAL)),
        }

        Ok(config)
    }

    pub fn capacity(&self, event_name: &str) -> Option<u64> {
        self.events.get(event_name).copied()
    }

    pub fn ensure_known_event(&self, event_name: &str) -> anyhow::Result<u64> {
        self.capacity(event_name).with_context(|| {
            let known: Vec<_> = self.events.keys().map(String::as_str).collect();
            format!("unknown event {event_name:?}; known events: {}", known.join(", "))
        })
    }
}
