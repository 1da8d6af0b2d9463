use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Timestamp;
use crate::ticket::{TicketId, Transaction};

/// Hex-encoded block digest.
///
/// Regular digests are 64 lowercase hex characters (32 bytes). The genesis
/// block's `previous_hash` holds a configured sentinel instead, which need
/// not be a valid digest, so construction through [`BlockHash::new`] is
/// unchecked and [`BlockHash::from_hex`] is the validating path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    /// Wrap a raw string without validation (sentinels, placeholders).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Encode a 32-byte digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse and validate a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The empty placeholder used before a block is sealed.
    pub fn unsealed() -> Self {
        Self(String::new())
    }

    pub fn is_unsealed(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for display.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sealed batch of ticket transactions.
///
/// `hash` is the digest of every other field. After sealing, the only field
/// that may change is the `scanned` flag of an embedded transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    /// Commit time.
    pub timestamp: Timestamp,
    /// Snapshot of the staging buffer at commit, in staging order.
    pub transactions: Vec<Transaction>,
    /// Placeholder carried for format compatibility; no puzzle is solved.
    pub proof: u64,
    /// Hash of the preceding block, or the sentinel for genesis.
    pub previous_hash: BlockHash,
    pub hash: BlockHash,
}

impl Block {
    /// Assemble an unsealed block. The caller computes and sets `hash`.
    pub fn unsealed(
        index: u64,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: BlockHash,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
            hash: BlockHash::unsealed(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }

    /// Position of a ticket within this block's transactions.
    pub fn position_of(&self, ticket_id: &TicketId) -> Option<usize> {
        self.transactions
            .iter()
            .position(|tx| &tx.ticket_id == ticket_id)
    }

    pub fn ticket_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketDetails;

    #[test]
    fn from_bytes_is_64_hex_chars() {
        let hash = BlockHash::from_bytes([0xab; 32]);
        assert_eq!(hash.as_str().len(), 64);
        assert_eq!(hash.short(), "abababab");
    }

    #[test]
    fn from_hex_validates_length() {
        let err = BlockHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
        assert!(matches!(
            BlockHash::from_hex("zz").unwrap_err(),
            TypeError::InvalidHex(_)
        ));
    }

    #[test]
    fn from_hex_roundtrips_display() {
        let hash = BlockHash::from_bytes([7; 32]);
        let parsed = BlockHash::from_hex(&hash.to_string()).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn sentinel_short_does_not_panic() {
        assert_eq!(BlockHash::new("1").short(), "1");
        assert!(BlockHash::unsealed().is_unsealed());
    }

    #[test]
    fn short_counts_characters_not_bytes() {
        assert_eq!(BlockHash::new("日本語genesis").short(), "日本語genes");
        assert_eq!(BlockHash::new("ÿÿÿ").short(), "ÿÿÿ");
        assert_eq!(BlockHash::from_bytes([0xab; 32]).short(), "abababab");
    }

    #[test]
    fn position_of_finds_ticket() {
        let tx = Transaction::issue(
            TicketId::from("t-2"),
            TicketDetails::new("Freshers").with_buyer("Bob"),
            Timestamp::zero(),
        );
        let block = Block::unsealed(2, Timestamp::zero(), vec![tx], 123, BlockHash::new("x"));
        assert_eq!(block.position_of(&TicketId::from("t-2")), Some(0));
        assert_eq!(block.position_of(&TicketId::from("nope")), None);
        assert!(!block.is_genesis());
    }

    #[test]
    fn persisted_layout_uses_expected_keys() {
        let block = Block::unsealed(1, Timestamp::zero(), vec![], 100, BlockHash::new("1"));
        let value = serde_json::to_value(&block).unwrap();
        for key in ["index", "timestamp", "transactions", "proof", "previous_hash", "hash"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["previous_hash"], "1");
    }
}
